use crate::core::error::{Error, Result};
use crate::indexing::discovery::Note;
use crate::search::compile::QueryCompiler;
use crate::search::query::Query;
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use tantivy::collector::TopDocs;
use tantivy::schema::{Field, Schema, Value, STORED, STRING, TEXT};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};
use tracing::{debug, info, warn};

/// Heap given to the single indexing thread (50 MB)
const WRITER_HEAP_SIZE: usize = 50_000_000;

/// File tantivy writes into every index directory
const META_FILE: &str = "meta.json";

/// A search hit. The score orders results and is never shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: String,
    pub path: String,
    pub score: f32,
}

/// Outcome of a fresh build
#[derive(Debug, Default, Clone)]
pub struct BuildStats {
    /// Notes added to the corpus
    pub indexed: usize,
    /// Notes that could not be read and were left out
    pub skipped: Vec<PathBuf>,
}

/// Anything that can answer boolean queries over the notes corpus
pub trait SearchIndex {
    /// Documents matching `query`, best first, at most `limit` of them
    fn search(&self, query: &Query, limit: usize) -> Result<Vec<Document>>;

    /// Parse `text` and search with it
    fn search_str(&self, text: &str, limit: usize) -> Result<Vec<Document>> {
        let query = Query::parse(text)?;
        self.search(&query, limit)
    }
}

/// Field handles of the notes schema
#[derive(Debug, Clone, Copy)]
pub struct NoteFields {
    pub title: Field,
    pub path: Field,
    pub content: Field,
}

impl NoteFields {
    fn schema() -> (Schema, Self) {
        let mut builder = Schema::builder();
        let title = builder.add_text_field("title", TEXT | STORED);
        // Paths are looked up whole, never tokenized
        let path = builder.add_text_field("path", STRING | STORED);
        let content = builder.add_text_field("content", TEXT);
        (
            builder.build(),
            Self {
                title,
                path,
                content,
            },
        )
    }

    fn from_schema(schema: &Schema) -> Result<Self> {
        let field = |name: &str| {
            schema
                .get_field(name)
                .map_err(|e| Error::index("Index schema does not match", &e))
        };
        Ok(Self {
            title: field("title")?,
            path: field("path")?,
            content: field("content")?,
        })
    }
}

/// Handle to a built or reopened corpus of notes
pub struct NoteIndex {
    index: Index,
    reader: IndexReader,
    fields: NoteFields,
}

impl NoteIndex {
    /// Build a fresh corpus at `location`, replacing any previous one
    pub fn build<I>(location: &Path, notes: I) -> Result<(Self, BuildStats)>
    where
        I: IntoIterator<Item = Note>,
    {
        prepare_location(location)?;

        let (schema, fields) = NoteFields::schema();
        let index = Index::create_in_dir(location, schema)
            .map_err(|e| Error::index("Failed to create index", &e))?;

        let mut writer: IndexWriter = index
            .writer_with_num_threads(1, WRITER_HEAP_SIZE)
            .map_err(|e| Error::index("Failed to open index writer", &e))?;

        let mut stats = BuildStats::default();
        for note in notes {
            let content = match note.content() {
                Ok(content) => content,
                Err(err) => {
                    warn!("Skipping note: {}", err);
                    stats.skipped.push(note.path);
                    continue;
                }
            };

            let mut doc = TantivyDocument::new();
            doc.add_text(fields.title, &note.name);
            doc.add_text(fields.path, note.path.to_string_lossy());
            doc.add_text(fields.content, &content);
            writer
                .add_document(doc)
                .map_err(|e| Error::index("Failed to add note", &e))?;
            stats.indexed += 1;
        }

        writer
            .commit()
            .map_err(|e| Error::index("Failed to commit index", &e))?;

        info!(
            indexed = stats.indexed,
            skipped = stats.skipped.len(),
            location = %location.display(),
            "index built"
        );

        Ok((Self::from_index(index, fields)?, stats))
    }

    /// Reopen a corpus built by an earlier run
    pub fn open(location: &Path) -> Result<Self> {
        if !location.join(META_FILE).is_file() {
            return Err(Error::IndexNotFound {
                path: location.to_path_buf(),
            });
        }

        let index = Index::open_in_dir(location)
            .map_err(|e| Error::index("Failed to open index", &e))?;
        let fields = NoteFields::from_schema(&index.schema())?;

        debug!(location = %location.display(), "index opened");
        Self::from_index(index, fields)
    }

    fn from_index(index: Index, fields: NoteFields) -> Result<Self> {
        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| Error::index("Failed to open index reader", &e))?;

        Ok(Self {
            index,
            reader,
            fields,
        })
    }

    /// Number of notes in the corpus
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}

impl SearchIndex for NoteIndex {
    fn search(&self, query: &Query, limit: usize) -> Result<Vec<Document>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let compiled = QueryCompiler::new(&self.index, &self.fields).compile(query.expr())?;
        let searcher = self.reader.searcher();
        let corpus = usize::try_from(searcher.num_docs()).unwrap_or(usize::MAX);

        // Widen the collection while scores still tie at the cut-off, so the
        // path order decides which of the tied notes make it in
        let mut fetch = limit;
        let top_docs = loop {
            let top_docs = searcher
                .search(&*compiled, &TopDocs::with_limit(fetch))
                .map_err(|e| Error::index("Search failed", &e))?;
            let tied_at_cut = top_docs.len() == fetch
                && fetch < corpus
                && top_docs[limit - 1].0 == top_docs[fetch - 1].0;
            if !tied_at_cut {
                break top_docs;
            }
            fetch = fetch.saturating_mul(2).min(corpus);
        };

        let mut documents = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| Error::index("Failed to load document", &e))?;
            documents.push(Document {
                title: text_value(&doc, self.fields.title),
                path: text_value(&doc, self.fields.path),
                score,
            });
        }

        documents.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.path.cmp(&b.path))
        });
        documents.truncate(limit);

        debug!(query = %query, hits = documents.len(), "search complete");
        Ok(documents)
    }
}

fn text_value(doc: &TantivyDocument, field: Field) -> String {
    doc.get_first(field)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

/// Clear out a previous index, but never a directory that holds something else
fn prepare_location(location: &Path) -> Result<()> {
    if location.join(META_FILE).is_file() {
        fs::remove_dir_all(location)?;
    } else if location.exists() && fs::read_dir(location)?.next().is_some() {
        return Err(Error::Config(format!(
            "Refusing to overwrite {}: it exists and is not an index",
            location.display()
        )));
    }

    fs::create_dir_all(location)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexing::discovery::discover_notes;
    use tempfile::TempDir;

    fn build(notes_dir: &Path, index_dir: &Path) -> (NoteIndex, BuildStats) {
        NoteIndex::build(index_dir, discover_notes(notes_dir).unwrap()).unwrap()
    }

    fn titles(index: &NoteIndex, query: &str) -> Vec<String> {
        index
            .search_str(query, 10)
            .unwrap()
            .into_iter()
            .map(|doc| doc.title)
            .collect()
    }

    #[test]
    fn test_build_writes_meta_file() {
        let notes = TempDir::new().unwrap();
        let index_root = TempDir::new().unwrap();
        let location = index_root.path().join("indexdir");
        fs::write(notes.path().join("a.md"), "hello world").unwrap();

        let (index, stats) = build(notes.path(), &location);
        assert!(location.join(META_FILE).exists());
        assert_eq!(stats.indexed, 1);
        assert!(stats.skipped.is_empty());
        assert_eq!(index.num_docs(), 1);
    }

    #[test]
    fn test_rebuild_replaces_previous_corpus() {
        let notes = TempDir::new().unwrap();
        let index_root = TempDir::new().unwrap();
        let location = index_root.path().join("indexdir");

        fs::write(notes.path().join("a.md"), "alpha").unwrap();
        let (index, _) = build(notes.path(), &location);
        assert_eq!(titles(&index, "alpha"), vec!["a"]);
        drop(index);

        fs::remove_file(notes.path().join("a.md")).unwrap();
        fs::write(notes.path().join("b.md"), "beta").unwrap();
        let (index, _) = build(notes.path(), &location);
        assert_eq!(index.num_docs(), 1);
        assert!(titles(&index, "alpha").is_empty());
        assert_eq!(titles(&index, "beta"), vec!["b"]);
    }

    #[test]
    fn test_build_refuses_foreign_directory() {
        let notes = TempDir::new().unwrap();
        let location = TempDir::new().unwrap();
        fs::write(location.path().join("important.txt"), "keep me").unwrap();

        let result = NoteIndex::build(location.path(), discover_notes(notes.path()).unwrap());
        assert!(matches!(result, Err(Error::Config(_))));
        assert!(location.path().join("important.txt").exists());
    }

    #[test]
    fn test_build_skips_unreadable_notes() {
        let notes = TempDir::new().unwrap();
        let index_root = TempDir::new().unwrap();
        fs::write(notes.path().join("good.md"), "readable text").unwrap();
        fs::write(notes.path().join("bad.md"), [0xff, 0xfe, 0xfd]).unwrap();

        let (index, stats) = build(notes.path(), &index_root.path().join("idx"));
        assert_eq!(stats.indexed, 1);
        assert_eq!(stats.skipped.len(), 1);
        assert!(stats.skipped[0].ends_with("bad.md"));
        assert_eq!(index.num_docs(), 1);
    }

    #[test]
    fn test_open_missing_index() {
        let index_root = TempDir::new().unwrap();
        let result = NoteIndex::open(&index_root.path().join("indexdir"));
        assert!(matches!(result, Err(Error::IndexNotFound { .. })));
    }

    #[test]
    fn test_open_after_build() {
        let notes = TempDir::new().unwrap();
        let index_root = TempDir::new().unwrap();
        let location = index_root.path().join("indexdir");
        fs::write(notes.path().join("a.md"), "hello world").unwrap();
        fs::write(notes.path().join("b.md"), "hello there").unwrap();

        let (built, _) = build(notes.path(), &location);
        let opened = NoteIndex::open(&location).unwrap();

        assert_eq!(opened.num_docs(), 2);
        for query in ["hello", "world", "hello NOT there", "NOT hello"] {
            assert_eq!(
                built.search_str(query, 10).unwrap(),
                opened.search_str(query, 10).unwrap(),
                "results differ for {query}"
            );
        }
    }

    #[test]
    fn test_search_title_field() {
        let notes = TempDir::new().unwrap();
        let index_root = TempDir::new().unwrap();
        fs::write(notes.path().join("groceries.md"), "milk and eggs").unwrap();
        fs::write(notes.path().join("journal.md"), "bought groceries").unwrap();

        let (index, _) = build(notes.path(), &index_root.path().join("idx"));
        assert_eq!(titles(&index, "title:groceries"), vec!["groceries"]);
        assert_eq!(titles(&index, "groceries"), vec!["journal"]);
    }

    #[test]
    fn test_search_phrase_and_case() {
        let notes = TempDir::new().unwrap();
        let index_root = TempDir::new().unwrap();
        fs::write(notes.path().join("a.md"), "Quick brown fox").unwrap();
        fs::write(notes.path().join("b.md"), "brown quick fox").unwrap();

        let (index, _) = build(notes.path(), &index_root.path().join("idx"));
        assert_eq!(titles(&index, "\"quick brown\"").len(), 1);
        assert_eq!(titles(&index, "\"quick brown\""), vec!["a"]);
        assert_eq!(titles(&index, "QUICK").len(), 2);
        assert!(titles(&index, "!!!").is_empty());
    }

    #[test]
    fn test_search_limit() {
        let notes = TempDir::new().unwrap();
        let index_root = TempDir::new().unwrap();
        for i in 0..5 {
            fs::write(notes.path().join(format!("n{i}.md")), "shared word").unwrap();
        }

        let (index, _) = build(notes.path(), &index_root.path().join("idx"));
        assert_eq!(index.search_str("shared", 3).unwrap().len(), 3);
        assert!(index.search_str("shared", 0).unwrap().is_empty());
    }

    #[test]
    fn test_search_limit_keeps_tied_notes_in_path_order() {
        let notes = TempDir::new().unwrap();
        let index_root = TempDir::new().unwrap();
        // Walked as a/c.md then a-b.md, but "a-b.md" sorts first as a path
        fs::create_dir_all(notes.path().join("a")).unwrap();
        fs::write(notes.path().join("a").join("c.md"), "shared word").unwrap();
        fs::write(notes.path().join("a-b.md"), "shared word").unwrap();
        fs::write(notes.path().join("z.md"), "other word").unwrap();

        let (index, _) = build(notes.path(), &index_root.path().join("idx"));
        let first = index.search_str("shared", 1).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].title, "a-b");

        let both: Vec<String> = index
            .search_str("shared", 2)
            .unwrap()
            .into_iter()
            .map(|doc| doc.title)
            .collect();
        assert_eq!(both, vec!["a-b", "c"]);
    }

    #[test]
    fn test_search_syntax_error() {
        let notes = TempDir::new().unwrap();
        let index_root = TempDir::new().unwrap();
        let (index, _) = build(notes.path(), &index_root.path().join("idx"));

        let err = index.search_str("hello AND", 10).unwrap_err();
        assert!(err.is_query_syntax());
    }
}
