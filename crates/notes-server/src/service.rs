//! The notes service: every operation is scoped to the calling user.
//!
//! A note owned by someone else is reported exactly like a note that does
//! not exist, so callers cannot probe for other users' ids.

use std::sync::Arc;

use notes_core::{Note, NoteId, NotePatch, UserId, ValidNote, now_micros};
use notes_store::mapper::{field, from_store, note_to_fields, to_store};
use notes_store::{DocumentQuery, DocumentStore, SortDirection, StoreError, StoreResult};

use crate::config::ServerConfig;

/// Service-level failures.
#[derive(Debug, thiserror::Error)]
pub enum NotesError {
    #[error("invalid pagination: {0}")]
    InvalidPagination(String),

    /// Absent, or owned by another user.
    #[error("note not found: {0}")]
    NotFound(NoteId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One page of a user's notes.
#[derive(Debug, Clone, PartialEq)]
pub struct NotePage {
    pub items: Vec<Note>,
    /// Matching notes across all pages.
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

impl NotePage {
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.page_size.max(1))
    }
}

/// Note operations over a document store collection.
pub struct NotesService {
    store: Arc<dyn DocumentStore>,
    collection: String,
    default_page_size: u32,
    max_page_size: u32,
}

impl NotesService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        collection: impl Into<String>,
        default_page_size: u32,
        max_page_size: u32,
    ) -> Self {
        Self {
            store,
            collection: collection.into(),
            default_page_size,
            max_page_size,
        }
    }

    pub fn from_config(store: Arc<dyn DocumentStore>, config: &ServerConfig) -> Self {
        Self::new(
            store,
            config.notes_collection.clone(),
            config.default_page_size,
            config.max_page_size,
        )
    }

    /// Name of the backing store, for logs.
    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// List the user's notes, pinned first, then most recently updated.
    ///
    /// `query` is a case-insensitive substring match over title, content,
    /// and tags. `page` is 1-based; both `page` and `page_size` fall back to
    /// defaults when `None`.
    pub async fn list(
        &self,
        user_id: &UserId,
        query: Option<&str>,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<NotePage, NotesError> {
        let (page, page_size) = self.check_pagination(page, page_size)?;

        let doc_query = DocumentQuery::new()
            .where_eq(field::USER_ID, user_id.as_str())
            .order_by(field::IS_PINNED, SortDirection::Descending)
            .order_by(field::UPDATED_AT, SortDirection::Descending);
        let docs = self
            .store
            .query_documents(&self.collection, &doc_query)
            .await?;
        let mut notes = docs.iter().map(from_store).collect::<StoreResult<Vec<_>>>()?;

        let needle = query.map(|q| q.trim().to_lowercase()).unwrap_or_default();
        if !needle.is_empty() {
            notes.retain(|note| note.matches_query(&needle));
        }

        let total = notes.len() as u64;
        let skip = usize::try_from((page - 1).saturating_mul(page_size)).unwrap_or(usize::MAX);
        let take = usize::try_from(page_size).unwrap_or(usize::MAX);
        let items: Vec<Note> = notes.into_iter().skip(skip).take(take).collect();

        tracing::debug!(
            user_id = %user_id,
            total,
            page,
            page_size,
            returned = items.len(),
            "Listed notes"
        );

        Ok(NotePage {
            items,
            total,
            page,
            page_size,
        })
    }

    fn check_pagination(
        &self,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<(u64, u64), NotesError> {
        let page = page.unwrap_or(1);
        if page < 1 {
            return Err(NotesError::InvalidPagination(format!(
                "page must be a positive integer, got {page}"
            )));
        }

        let page_size = page_size.unwrap_or(i64::from(self.default_page_size));
        if page_size < 1 || page_size > i64::from(self.max_page_size) {
            return Err(NotesError::InvalidPagination(format!(
                "page_size must be between 1 and {}, got {page_size}",
                self.max_page_size
            )));
        }

        Ok((page as u64, page_size as u64))
    }

    /// Fetch one of the user's notes.
    pub async fn get(&self, user_id: &UserId, id: &NoteId) -> Result<Note, NotesError> {
        self.fetch_owned(user_id, id).await
    }

    /// Create a note owned by `user_id`.
    pub async fn create(&self, user_id: &UserId, note: &ValidNote) -> Result<Note, NotesError> {
        let fields = to_store(note, user_id, now_micros());
        let doc = self.store.add_document(&self.collection, fields).await?;
        let note = from_store(&doc)?;

        tracing::info!(note_id = %note.id, user_id = %user_id, "Created note");
        Ok(note)
    }

    /// Apply `patch` to one of the user's notes.
    pub async fn update(
        &self,
        user_id: &UserId,
        id: &NoteId,
        patch: &NotePatch,
    ) -> Result<Note, NotesError> {
        let mut note = self.fetch_owned(user_id, id).await?;
        patch.apply(&mut note);

        let doc = self
            .store
            .put_document(&self.collection, id.as_str(), note_to_fields(&note))
            .await
            .map_err(|e| match e {
                // Deleted between our read and write.
                StoreError::DocumentNotFound { .. } => NotesError::NotFound(id.clone()),
                other => other.into(),
            })?;
        let note = from_store(&doc)?;

        tracing::info!(note_id = %id, user_id = %user_id, "Updated note");
        Ok(note)
    }

    /// Permanently delete one of the user's notes.
    pub async fn delete(&self, user_id: &UserId, id: &NoteId) -> Result<(), NotesError> {
        self.fetch_owned(user_id, id).await?;

        if !self
            .store
            .delete_document(&self.collection, id.as_str())
            .await?
        {
            return Err(NotesError::NotFound(id.clone()));
        }

        tracing::info!(note_id = %id, user_id = %user_id, "Deleted note");
        Ok(())
    }

    async fn fetch_owned(&self, user_id: &UserId, id: &NoteId) -> Result<Note, NotesError> {
        let doc = self
            .store
            .get_document(&self.collection, id.as_str())
            .await?
            .ok_or_else(|| NotesError::NotFound(id.clone()))?;
        let note = from_store(&doc)?;

        if note.user_id != *user_id {
            tracing::debug!(note_id = %id, user_id = %user_id, "Note owned by another user");
            return Err(NotesError::NotFound(id.clone()));
        }
        Ok(note)
    }
}

impl std::fmt::Debug for NotesService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotesService")
            .field("backend", &self.store.backend())
            .field("collection", &self.collection)
            .field("default_page_size", &self.default_page_size)
            .field("max_page_size", &self.max_page_size)
            .finish()
    }
}
