use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document update conflict")]
    Conflict,
    #[error("Database does not exist: {0}")]
    NoSuchDatabase(String),
    #[error("Database already exists: {0}")]
    DatabaseExists(String),
    #[error("{0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDoc {
    pub body: Vec<u8>,
    pub revision: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocSummary {
    pub id: String,
    pub revision: String,
}

/// A revisioned document store. Every write is tagged with an opaque
/// revision token and a write naming a stale token fails with
/// [`StoreError::Conflict`], which callers must be able to tell apart
/// from every other failure.
pub trait RevisionStore {
    fn all_databases(&self) -> Result<Vec<String>, StoreError>;
    fn database_exists(&self, name: &str) -> Result<bool, StoreError>;
    fn create_database(&mut self, name: &str) -> Result<(), StoreError>;
    fn delete_database(&mut self, name: &str) -> Result<(), StoreError>;
    fn doc_count(&self, name: &str) -> Result<usize, StoreError>;

    fn fetch(&self, db: &str, id: &str) -> Result<Option<FetchedDoc>, StoreError>;

    /// Conditional save. An absent document is created only when
    /// `revision` is `None`; an existing document is replaced only when
    /// `revision` names its current token. Returns the new token.
    fn save(
        &mut self,
        db: &str,
        id: &str,
        revision: Option<&str>,
        body: &[u8],
    ) -> Result<String, StoreError>;

    fn all_docs(&self, db: &str, prefix: Option<&str>) -> Result<Vec<DocSummary>, StoreError>;
}

struct StoredDoc {
    body: Vec<u8>,
    revision: String,
    generation: u64,
}

/// In-process store keeping bodies verbatim: the bytes saved are the
/// bytes fetched.
#[derive(Default)]
pub struct MemoryStore {
    databases: HashMap<String, HashMap<String, StoredDoc>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn docs(&self, name: &str) -> Result<&HashMap<String, StoredDoc>, StoreError> {
        self.databases
            .get(name)
            .ok_or_else(|| StoreError::NoSuchDatabase(name.to_string()))
    }
}

impl RevisionStore for MemoryStore {
    fn all_databases(&self) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = self.databases.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn database_exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.databases.contains_key(name))
    }

    fn create_database(&mut self, name: &str) -> Result<(), StoreError> {
        if self.databases.contains_key(name) {
            return Err(StoreError::DatabaseExists(name.to_string()));
        }
        debug!(name, "creating database");
        self.databases.insert(name.to_string(), HashMap::new());
        Ok(())
    }

    fn delete_database(&mut self, name: &str) -> Result<(), StoreError> {
        if self.databases.remove(name).is_none() {
            return Err(StoreError::NoSuchDatabase(name.to_string()));
        }
        debug!(name, "deleted database");
        Ok(())
    }

    fn doc_count(&self, name: &str) -> Result<usize, StoreError> {
        Ok(self.docs(name)?.len())
    }

    fn fetch(&self, db: &str, id: &str) -> Result<Option<FetchedDoc>, StoreError> {
        Ok(self.docs(db)?.get(id).map(|doc| FetchedDoc {
            body: doc.body.clone(),
            revision: doc.revision.clone(),
        }))
    }

    fn save(
        &mut self,
        db: &str,
        id: &str,
        revision: Option<&str>,
        body: &[u8],
    ) -> Result<String, StoreError> {
        let docs = self
            .databases
            .get_mut(db)
            .ok_or_else(|| StoreError::NoSuchDatabase(db.to_string()))?;

        match docs.get_mut(id) {
            Some(doc) => {
                if revision != Some(doc.revision.as_str()) {
                    debug!(db, id, "stale revision, rejecting save");
                    return Err(StoreError::Conflict);
                }
                doc.generation += 1;
                doc.body = body.to_vec();
                doc.revision = revision_token(doc.generation, body);
                Ok(doc.revision.clone())
            }
            None => {
                if revision.is_some() {
                    return Err(StoreError::Conflict);
                }
                let token = revision_token(1, body);
                docs.insert(
                    id.to_string(),
                    StoredDoc {
                        body: body.to_vec(),
                        revision: token.clone(),
                        generation: 1,
                    },
                );
                Ok(token)
            }
        }
    }

    fn all_docs(&self, db: &str, prefix: Option<&str>) -> Result<Vec<DocSummary>, StoreError> {
        let mut rows: Vec<DocSummary> = self
            .docs(db)?
            .iter()
            .filter(|(id, _)| prefix.is_none_or(|p| id.starts_with(p)))
            .map(|(id, doc)| DocSummary {
                id: id.clone(),
                revision: doc.revision.clone(),
            })
            .collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(rows)
    }
}

// CouchDB-style "generation-hash" token. Opaque to callers; only the
// store compares them.
fn revision_token(generation: u64, body: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    generation.hash(&mut hasher);
    body.hash(&mut hasher);
    format!("{generation}-{:016x}", hasher.finish())
}
