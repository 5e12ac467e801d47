//! Turns a parsed [`QueryExpr`] into a tantivy query.
//!
//! Terms are run through the same analyzer the field was indexed with, so
//! `Hello` finds `hello` and `foo-bar` becomes the phrase `foo bar`.

use crate::core::error::{Error, Result};
use crate::search::query::{QueryExpr, QueryField};
use crate::storage::index::NoteFields;
use tantivy::query::{AllQuery, BooleanQuery, EmptyQuery, Occur, PhraseQuery, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::tokenizer::TokenStream;
use tantivy::{Index, Term};

pub(crate) struct QueryCompiler<'a> {
    index: &'a Index,
    fields: &'a NoteFields,
}

impl<'a> QueryCompiler<'a> {
    pub(crate) fn new(index: &'a Index, fields: &'a NoteFields) -> Self {
        Self { index, fields }
    }

    pub(crate) fn compile(&self, expr: &QueryExpr) -> Result<Box<dyn Query>> {
        match expr {
            QueryExpr::Term { field, text } | QueryExpr::Phrase { field, text } => {
                self.compile_text(*field, text)
            }
            QueryExpr::And(items) => {
                let mut clauses = Vec::with_capacity(items.len() + 1);
                for item in items {
                    match item {
                        QueryExpr::Not(inner) => {
                            clauses.push((Occur::MustNot, self.compile(inner)?))
                        }
                        _ => clauses.push((Occur::Must, self.compile(item)?)),
                    }
                }
                Ok(Box::new(BooleanQuery::new(with_positive_clause(clauses))))
            }
            QueryExpr::Or(items) => {
                let clauses = items
                    .iter()
                    .map(|item| Ok((Occur::Should, self.compile(item)?)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Box::new(BooleanQuery::new(clauses)))
            }
            QueryExpr::Not(inner) => {
                let clauses = vec![(Occur::MustNot, self.compile(inner)?)];
                Ok(Box::new(BooleanQuery::new(with_positive_clause(clauses))))
            }
        }
    }

    fn compile_text(&self, field: QueryField, text: &str) -> Result<Box<dyn Query>> {
        let field = self.field(field);
        let mut terms = self.analyze(field, text)?;

        Ok(match terms.len() {
            0 => Box::new(EmptyQuery),
            1 => {
                let term = terms.remove(0);
                Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs))
            }
            _ => Box::new(PhraseQuery::new(terms)),
        })
    }

    fn analyze(&self, field: Field, text: &str) -> Result<Vec<Term>> {
        let mut analyzer = self
            .index
            .tokenizer_for_field(field)
            .map_err(|e| Error::index("Failed to load tokenizer", &e))?;

        let mut stream = analyzer.token_stream(text);
        let mut terms = Vec::new();
        while let Some(token) = stream.next() {
            terms.push(Term::from_field_text(field, &token.text));
        }
        Ok(terms)
    }

    fn field(&self, field: QueryField) -> Field {
        match field {
            QueryField::Title => self.fields.title,
            QueryField::Content => self.fields.content,
        }
    }
}

/// A boolean query with only exclusions matches nothing in tantivy, so
/// exclusions are taken relative to the whole corpus.
fn with_positive_clause(
    mut clauses: Vec<(Occur, Box<dyn Query>)>,
) -> Vec<(Occur, Box<dyn Query>)> {
    if clauses.iter().all(|(occur, _)| *occur == Occur::MustNot) {
        clauses.push((Occur::Must, Box::new(AllQuery)));
    }
    clauses
}
