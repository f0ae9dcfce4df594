//! notes-store: persistence for the Notes API.
//!
//! This crate provides:
//! - A narrow [`DocumentStore`] capability trait modelled on a managed
//!   document database (get / add / put / query / delete)
//! - A typed document model ([`FieldValue`], [`Fields`]) matching the store's
//!   native value types
//! - The note [`mapper`] between validated schema values and documents
//! - Two backends: [`MemoryDocumentStore`] and [`PgDocumentStore`]
//!
//! # Usage
//!
//! ```rust,ignore
//! use notes_store::{DocumentStore, PgDocumentStore, StoreConfig};
//!
//! let store = PgDocumentStore::connect(StoreConfig {
//!     database_url: "postgres://localhost/notes".into(),
//!     ..StoreConfig::default()
//! })
//! .await?;
//! let doc = store.get_document("notes", "some-id").await?;
//! ```

pub mod document;
pub mod error;
pub mod mapper;
pub mod memory;
pub mod postgres;
pub mod schema;
pub mod store;

pub use document::{DocumentQuery, FieldValue, Fields, OrderBy, SortDirection, StoredDocument};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryDocumentStore;
pub use postgres::{PgDocumentStore, StoreConfig};
pub use store::DocumentStore;

// Re-export notes-core for downstream crates
pub use notes_core;
