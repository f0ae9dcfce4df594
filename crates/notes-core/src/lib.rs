//! notes-core: the Note entity and its request/response schema.
//!
//! This crate provides:
//! - Identifier newtypes ([`NoteId`], [`UserId`])
//! - The [`Note`] entity as the rest of the system sees it
//! - Pure validation of create/update bodies ([`schema::validate_create`],
//!   [`schema::validate_update`]) with field-level error reporting
//! - Deterministic response serialization ([`schema::serialize`])
//!
//! Nothing here performs I/O.

pub mod schema;
pub mod types;

pub use schema::{
    FieldError, NotePatch, NoteResponse, ValidNote, ValidationError, serialize, validate_create,
    validate_update,
};
pub use types::{Note, NoteId, UserId, next_update_timestamp, now_micros};
