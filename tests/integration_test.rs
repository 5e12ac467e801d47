use searchy::{discover_notes, Config, Error, NoteIndex, Result, SearchIndex};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Notes directory plus a separate place for the index
struct Fixture {
    notes: TempDir,
    index_root: TempDir,
}

impl Fixture {
    fn new(files: &[(&str, &str)]) -> Self {
        let notes = TempDir::new().unwrap();
        for (name, content) in files {
            let path = notes.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }
        Self {
            notes,
            index_root: TempDir::new().unwrap(),
        }
    }

    fn location(&self) -> std::path::PathBuf {
        self.index_root.path().join("indexdir")
    }

    fn build(&self) -> Result<NoteIndex> {
        let (index, _) = NoteIndex::build(&self.location(), discover_notes(self.notes.path())?)?;
        Ok(index)
    }
}

fn file_names(index: &impl SearchIndex, query: &str) -> Vec<String> {
    index
        .search_str(query, 10)
        .unwrap()
        .into_iter()
        .map(|doc| {
            Path::new(&doc.path)
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect()
}

fn file_set(index: &impl SearchIndex, query: &str) -> BTreeSet<String> {
    file_names(index, query).into_iter().collect()
}

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[test]
fn test_hello_world_scenario() -> Result<()> {
    let fixture = Fixture::new(&[("a.md", "hello world"), ("b.md", "hello there")]);
    let index = fixture.build()?;

    assert_eq!(file_names(&index, "hello"), vec!["a.md", "b.md"]);
    assert_eq!(file_names(&index, "world"), vec!["a.md"]);
    assert!(file_names(&index, "NOT hello").is_empty());

    Ok(())
}

#[test]
fn test_results_carry_title_and_absolute_path() -> Result<()> {
    let fixture = Fixture::new(&[("weekly review.md", "plans for the week")]);
    let index = fixture.build()?;

    let results = index.search_str("plans", 10)?;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title, "weekly review");
    assert!(Path::new(&results[0].path).is_absolute());
    assert!(results[0].path.ends_with("weekly review.md"));

    Ok(())
}

#[test]
fn test_boolean_operators() -> Result<()> {
    let fixture = Fixture::new(&[
        ("both.md", "apples and bananas"),
        ("apples.md", "only apples here"),
        ("bananas.md", "just bananas"),
        ("neither.md", "cherries"),
    ]);
    let index = fixture.build()?;

    assert_eq!(file_set(&index, "apples AND bananas"), set(&["both.md"]));
    assert_eq!(
        file_set(&index, "apples OR bananas"),
        set(&["both.md", "apples.md", "bananas.md"])
    );
    assert_eq!(file_set(&index, "apples NOT bananas"), set(&["apples.md"]));
    assert_eq!(
        file_set(&index, "NOT apples"),
        set(&["bananas.md", "neither.md"])
    );
    assert_eq!(
        file_set(&index, "(apples OR cherries) NOT bananas"),
        set(&["apples.md", "neither.md"])
    );

    Ok(())
}

#[test]
fn test_more_matches_rank_higher() -> Result<()> {
    let fixture = Fixture::new(&[
        ("once.md", "rust is mentioned once among many other unrelated words here"),
        ("often.md", "rust rust rust"),
    ]);
    let index = fixture.build()?;

    assert_eq!(file_names(&index, "rust"), vec!["often.md", "once.md"]);

    Ok(())
}

#[test]
fn test_nested_notes_are_indexed() -> Result<()> {
    let fixture = Fixture::new(&[
        ("top.md", "garden"),
        ("projects/deep/nested.md", "garden plans"),
        ("projects/readme.txt", "garden"),
    ]);
    let index = fixture.build()?;

    assert_eq!(index.num_docs(), 2);
    assert_eq!(file_set(&index, "garden"), set(&["top.md", "nested.md"]));

    Ok(())
}

#[test]
fn test_directory_without_notes_is_empty() -> Result<()> {
    let fixture = Fixture::new(&[("a.txt", "hello"), ("b.rs", "fn hello() {}")]);
    let index = fixture.build()?;

    assert_eq!(index.num_docs(), 0);
    assert!(file_names(&index, "hello").is_empty());
    assert!(file_names(&index, "NOT hello").is_empty());

    Ok(())
}

#[test]
fn test_reopen_matches_original_build() -> Result<()> {
    let fixture = Fixture::new(&[
        ("a.md", "hello world"),
        ("b.md", "hello there"),
        ("c.md", "goodbye world"),
    ]);
    let built = fixture.build()?;
    let opened = NoteIndex::open(&fixture.location())?;

    for query in ["hello", "world", "hello OR goodbye", "world NOT hello", "title:c"] {
        assert_eq!(
            built.search_str(query, 10)?,
            opened.search_str(query, 10)?,
            "results differ for {query}"
        );
    }

    Ok(())
}

#[test]
fn test_open_without_build_fails() {
    let fixture = Fixture::new(&[("a.md", "hello")]);
    let result = NoteIndex::open(&fixture.location());
    assert!(matches!(result, Err(Error::IndexNotFound { .. })));
}

#[test]
fn test_malformed_queries_are_syntax_errors() -> Result<()> {
    let fixture = Fixture::new(&[("a.md", "hello")]);
    let index = fixture.build()?;

    for query in ["hello AND", "OR hello", "(hello", "\"hello", "title:(hello)"] {
        let err = index.search_str(query, 10).unwrap_err();
        assert!(err.is_query_syntax(), "{query} should be a syntax error");
    }

    Ok(())
}

#[test]
fn test_colon_words_search_as_text() -> Result<()> {
    let fixture = Fixture::new(&[
        ("a.md", "meeting at 10:30 see https://example.com"),
        ("b.md", "meeting at 11:00, tag:rust"),
    ]);
    let index = fixture.build()?;

    assert_eq!(file_names(&index, "10:30"), vec!["a.md"]);
    assert_eq!(file_names(&index, "meeting 10:30"), vec!["a.md"]);
    assert_eq!(file_names(&index, "https://example.com"), vec!["a.md"]);
    assert_eq!(file_names(&index, "tag:rust"), vec!["b.md"]);
    assert_eq!(file_names(&index, "title:b"), vec!["b.md"]);

    Ok(())
}

#[test]
fn test_config_rejects_missing_data_before_indexing() {
    let index_root = TempDir::new().unwrap();
    let mut config = Config::new(index_root.path().join("missing"));
    config.index_dir = index_root.path().join("indexdir");

    assert!(matches!(config.validate(), Err(Error::Config(_))));
    assert!(!config.index_dir.exists());
}
