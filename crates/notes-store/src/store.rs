//! The document store capability set.

use async_trait::async_trait;

use crate::document::{DocumentQuery, Fields, StoredDocument};
use crate::error::StoreResult;

/// Operations the service needs from a document database.
///
/// Implementations own durability, id assignment, and filtering. Each call
/// is a single logical interaction; there is no transaction spanning calls.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Fetch one document, or `None` if it does not exist.
    async fn get_document(&self, collection: &str, id: &str)
    -> StoreResult<Option<StoredDocument>>;

    /// Insert a new document. The store assigns a fresh, never reused id.
    async fn add_document(&self, collection: &str, fields: Fields) -> StoreResult<StoredDocument>;

    /// Replace the fields of an existing document.
    ///
    /// Fails with [`StoreError::DocumentNotFound`](crate::StoreError::DocumentNotFound)
    /// if the document does not exist, so a write racing a delete cannot
    /// bring the document back.
    async fn put_document(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> StoreResult<StoredDocument>;

    /// All documents matching the query's filters, in the query's order.
    async fn query_documents(
        &self,
        collection: &str,
        query: &DocumentQuery,
    ) -> StoreResult<Vec<StoredDocument>>;

    /// Delete a document. Returns `false` if it did not exist.
    async fn delete_document(&self, collection: &str, id: &str) -> StoreResult<bool>;
}
