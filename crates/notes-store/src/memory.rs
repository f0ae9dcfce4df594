//! In-process document store.
//!
//! Used by tests and by the server when no database is configured. Data
//! lives only as long as the process.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::document::{DocumentQuery, Fields, StoredDocument};
use crate::error::{StoreError, StoreResult};
use crate::store::DocumentStore;

type Collection = BTreeMap<String, Fields>;

/// Document store backed by in-memory maps.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> StoreResult<Option<StoredDocument>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| StoredDocument {
                id: id.to_string(),
                fields: fields.clone(),
            }))
    }

    async fn add_document(&self, collection: &str, fields: Fields) -> StoreResult<StoredDocument> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        let mut id = Uuid::new_v4().simple().to_string();
        while docs.contains_key(&id) {
            id = Uuid::new_v4().simple().to_string();
        }
        docs.insert(id.clone(), fields.clone());

        Ok(StoredDocument { id, fields })
    }

    async fn put_document(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> StoreResult<StoredDocument> {
        let mut collections = self.collections.write().await;
        let existing = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::DocumentNotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        *existing = fields.clone();

        Ok(StoredDocument {
            id: id.to_string(),
            fields,
        })
    }

    async fn query_documents(
        &self,
        collection: &str,
        query: &DocumentQuery,
    ) -> StoreResult<Vec<StoredDocument>> {
        let collections = self.collections.read().await;
        let mut docs: Vec<StoredDocument> = collections
            .get(collection)
            .into_iter()
            .flat_map(|docs| docs.iter())
            .filter(|(_, fields)| query.matches(fields))
            .map(|(id, fields)| StoredDocument {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect();
        query.sort(&mut docs);
        Ok(docs)
    }

    async fn delete_document(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some())
    }
}
