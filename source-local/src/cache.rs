//! The in-memory document cache.

use std::collections::HashSet;
use std::sync::Arc;

use contentsync_schema::SchemaDef;
use serde::Serialize;

use crate::document::Document;

/// Documents currently loaded from the content directory, plus the schema.
///
/// Holds at most one document per id. Only the
/// [`CacheSynchronizer`](crate::synchronizer::CacheSynchronizer) mutates a
/// cache; consumers receive snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct Cache {
    /// Loaded documents.
    pub documents: Vec<Document>,

    /// Static schema metadata.
    pub schema: Arc<SchemaDef>,
}

impl Cache {
    /// Create an empty cache.
    pub fn new(schema: Arc<SchemaDef>) -> Self {
        Self {
            documents: Vec::new(),
            schema,
        }
    }

    /// Build a cache from scanned documents. The last document wins on
    /// duplicate ids.
    pub(crate) fn from_documents(schema: Arc<SchemaDef>, documents: Vec<Document>) -> Self {
        let mut seen = HashSet::new();
        let mut documents: Vec<Document> = documents
            .into_iter()
            .rev()
            .filter(|d| seen.insert(d.id.clone()))
            .collect();
        documents.reverse();

        Self { documents, schema }
    }

    /// Get a document by id.
    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Ids of all documents, in cache order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(|d| d.id.as_str())
    }

    /// Documents of one type.
    pub fn documents_of_type<'a>(
        &'a self,
        type_name: &'a str,
    ) -> impl Iterator<Item = &'a Document> + 'a {
        self.documents.iter().filter(move |d| d.type_name == type_name)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Replace any document with the same id, then append.
    pub(crate) fn upsert(&mut self, document: Document) {
        self.remove(&document.id);
        self.documents.push(document);
    }

    /// Remove the document with `id`. Returns whether one was present.
    pub(crate) fn remove(&mut self, id: &str) -> bool {
        let before = self.documents.len();
        self.documents.retain(|d| d.id != id);
        self.documents.len() != before
    }
}
