//! Core data types for the Notes API.
//!
//! Identifiers are opaque strings: note ids are assigned by the document
//! store and user ids come from the identity provider's `sub` claim, so
//! neither side promises a UUID.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ID Types
// ============================================================================

/// Identifier of a note, assigned by the document store on creation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Wraps a store-assigned identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a user, taken from a verified token's subject.
///
/// This is the ownership key for every note operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Note
// ============================================================================

/// A user's note as stored and returned by the service.
///
/// Invariant: `created_at <= updated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub user_id: UserId,
    pub title: String,
    pub content: Option<String>,
    pub is_pinned: bool,
    pub tags: Vec<String>,
    /// `#RRGGBB` when present.
    pub color: Option<String>,
    /// Client-informational; echoed back unchanged.
    pub synced: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Whether `needle` (already lowercased) occurs in the title, content,
    /// or any tag, ignoring case.
    pub fn matches_query(&self, needle: &str) -> bool {
        if self.title.to_lowercase().contains(needle) {
            return true;
        }
        if let Some(content) = &self.content {
            if content.to_lowercase().contains(needle) {
                return true;
            }
        }
        self.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
    }
}

// ============================================================================
// Timestamps
// ============================================================================

/// Current time truncated to microseconds, the precision timestamps keep
/// through the document store and the JSON responses.
#[must_use]
pub fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Timestamp for a mutation of a note last updated at `previous`.
///
/// Always strictly greater than `previous`.
#[must_use]
pub fn next_update_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = now_micros();
    let floor = previous + Duration::microseconds(1);
    if now > floor { now } else { floor }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_note() -> Note {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        Note {
            id: NoteId::new("n1"),
            user_id: UserId::new("u1"),
            title: "Grocery List".into(),
            content: Some("Milk and EGGS".into()),
            is_pinned: false,
            tags: vec!["Home".into()],
            color: None,
            synced: true,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn test_note_id_display() {
        assert_eq!(NoteId::new("abc").to_string(), "abc");
    }

    #[test]
    fn test_note_id_serializes_transparently() {
        let json = serde_json::to_string(&NoteId::new("abc")).unwrap();
        assert_eq!(json, "\"abc\"");
    }

    #[test]
    fn test_matches_query_title_content_and_tags() {
        let note = sample_note();
        assert!(note.matches_query("grocery"));
        assert!(note.matches_query("eggs"));
        assert!(note.matches_query("home"));
        assert!(!note.matches_query("zzz-no-match"));
    }

    #[test]
    fn test_now_micros_has_no_nanosecond_remainder() {
        let now = now_micros();
        assert_eq!(now.timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn test_next_update_timestamp_strictly_increases() {
        let future = now_micros() + Duration::hours(1);
        let next = next_update_timestamp(future);
        assert!(next > future);
        assert_eq!(next - future, Duration::microseconds(1));

        let past = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert!(next_update_timestamp(past) > past);
    }
}
