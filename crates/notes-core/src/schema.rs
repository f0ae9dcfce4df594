//! Request validation and response shaping for notes.
//!
//! Bodies arrive as untyped JSON. Every field is checked independently and
//! all failures are reported together, so a client fixing a request sees
//! the whole list at once rather than one error per round trip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{Note, NoteId, next_update_timestamp};

/// Maximum title length in characters.
pub const TITLE_MAX_CHARS: usize = 200;
/// Maximum content length in characters.
pub const CONTENT_MAX_CHARS: usize = 10_000;
/// Maximum number of tags on a note.
pub const MAX_TAGS: usize = 20;
/// Maximum length of a single tag in characters.
pub const TAG_MAX_CHARS: usize = 50;

// ============================================================================
// Errors
// ============================================================================

/// One violated rule on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Body field name, e.g. `"color"`.
    pub field: String,
    /// Short rule identifier: `required`, `type`, `max_length`, `format`, `max_items`.
    pub rule: String,
    /// Human-readable explanation.
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, rule: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            rule: rule.to_string(),
            message: message.into(),
        }
    }
}

/// Why a create or update body was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// The body is valid JSON but not an object.
    #[error("request body must be a JSON object")]
    NotAnObject,

    /// An update body set no fields at all.
    #[error("update must set at least one field")]
    EmptyUpdate,

    /// One or more fields broke a rule.
    #[error("invalid fields: {}", field_names(.0))]
    Fields(Vec<FieldError>),
}

fn field_names(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Validated payloads
// ============================================================================

/// A create body that passed validation, with defaults filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidNote {
    pub title: String,
    pub content: Option<String>,
    pub is_pinned: bool,
    pub tags: Vec<String>,
    pub color: Option<String>,
    pub synced: bool,
}

/// An update body that passed validation. `None` leaves a field untouched.
///
/// `content` and `color` are doubly optional: `Some(None)` clears them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<Option<String>>,
    pub is_pinned: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub color: Option<Option<String>>,
    pub synced: Option<bool>,
}

impl NotePatch {
    /// True when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.is_pinned.is_none()
            && self.tags.is_none()
            && self.color.is_none()
            && self.synced.is_none()
    }

    /// Apply the supplied fields to `note` and advance `updated_at`.
    pub fn apply(&self, note: &mut Note) {
        if let Some(title) = &self.title {
            note.title = title.clone();
        }
        if let Some(content) = &self.content {
            note.content = content.clone();
        }
        if let Some(is_pinned) = self.is_pinned {
            note.is_pinned = is_pinned;
        }
        if let Some(tags) = &self.tags {
            note.tags = tags.clone();
        }
        if let Some(color) = &self.color {
            note.color = color.clone();
        }
        if let Some(synced) = self.synced {
            note.synced = synced;
        }
        note.updated_at = next_update_timestamp(note.updated_at);
    }
}

// ============================================================================
// Validation
// ============================================================================

/// How a field appears in a body.
enum Slot<'a> {
    Absent,
    Null,
    Present(&'a Value),
}

fn slot<'a>(body: &'a Map<String, Value>, field: &str) -> Slot<'a> {
    match body.get(field) {
        None => Slot::Absent,
        Some(Value::Null) => Slot::Null,
        Some(value) => Slot::Present(value),
    }
}

/// Collects field errors while individual checks run.
///
/// Each check returns `None` after recording an error.
#[derive(Default)]
struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    fn fail(&mut self, field: &str, rule: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, rule, message));
    }

    fn string<'a>(&mut self, field: &str, value: &'a Value) -> Option<&'a str> {
        match value.as_str() {
            Some(s) => Some(s),
            None => {
                self.fail(field, "type", format!("{field} must be a string"));
                None
            }
        }
    }

    fn boolean(&mut self, field: &str, value: &Value) -> Option<bool> {
        match value.as_bool() {
            Some(b) => Some(b),
            None => {
                self.fail(field, "type", format!("{field} must be a boolean"));
                None
            }
        }
    }

    fn title(&mut self, value: &Value) -> Option<String> {
        let title = self.string("title", value)?.trim();
        if title.is_empty() {
            self.fail("title", "required", "title must not be empty");
            return None;
        }
        if title.chars().count() > TITLE_MAX_CHARS {
            self.fail(
                "title",
                "max_length",
                format!("title must be at most {TITLE_MAX_CHARS} characters"),
            );
            return None;
        }
        Some(title.to_string())
    }

    /// Whitespace-only content is treated as no content.
    fn content(&mut self, value: &Value) -> Option<Option<String>> {
        let content = self.string("content", value)?.trim();
        if content.chars().count() > CONTENT_MAX_CHARS {
            self.fail(
                "content",
                "max_length",
                format!("content must be at most {CONTENT_MAX_CHARS} characters"),
            );
            return None;
        }
        Some((!content.is_empty()).then(|| content.to_string()))
    }

    fn color(&mut self, value: &Value) -> Option<String> {
        let color = self.string("color", value)?;
        if !is_hex_color(color) {
            self.fail(
                "color",
                "format",
                format!("color must match #RRGGBB, got {color:?}"),
            );
            return None;
        }
        Some(color.to_string())
    }

    fn tags(&mut self, value: &Value) -> Option<Vec<String>> {
        let Some(items) = value.as_array() else {
            self.fail("tags", "type", "tags must be an array of strings");
            return None;
        };
        if items.len() > MAX_TAGS {
            self.fail(
                "tags",
                "max_items",
                format!("at most {MAX_TAGS} tags are allowed"),
            );
            return None;
        }

        let mut tags: Vec<String> = Vec::with_capacity(items.len());
        let mut ok = true;
        for (index, item) in items.iter().enumerate() {
            let Some(tag) = item.as_str().map(str::trim) else {
                self.fail("tags", "type", format!("tag {index} must be a string"));
                ok = false;
                continue;
            };
            if tag.is_empty() {
                self.fail("tags", "required", format!("tag {index} must not be empty"));
                ok = false;
                continue;
            }
            if tag.chars().count() > TAG_MAX_CHARS {
                self.fail(
                    "tags",
                    "max_length",
                    format!("tag {index} must be at most {TAG_MAX_CHARS} characters"),
                );
                ok = false;
                continue;
            }
            if !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
        ok.then_some(tags)
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Fields(self.errors))
        }
    }
}

/// `#RRGGBB`, hex digits in either case.
pub fn is_hex_color(s: &str) -> bool {
    s.len() == 7
        && s.starts_with('#')
        && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Validate a create body.
///
/// `title` is required; everything else falls back to its default.
pub fn validate_create(body: &Value) -> Result<ValidNote, ValidationError> {
    let object = body.as_object().ok_or(ValidationError::NotAnObject)?;
    let mut checker = Checker::default();

    let title = match slot(object, "title") {
        Slot::Absent | Slot::Null => {
            checker.fail("title", "required", "title is required");
            None
        }
        Slot::Present(v) => checker.title(v),
    };
    let content = match slot(object, "content") {
        Slot::Absent | Slot::Null => None,
        Slot::Present(v) => checker.content(v).flatten(),
    };
    let is_pinned = match slot(object, "is_pinned") {
        Slot::Absent | Slot::Null => None,
        Slot::Present(v) => checker.boolean("is_pinned", v),
    };
    let tags = match slot(object, "tags") {
        Slot::Absent | Slot::Null => None,
        Slot::Present(v) => checker.tags(v),
    };
    let color = match slot(object, "color") {
        Slot::Absent | Slot::Null => None,
        Slot::Present(v) => checker.color(v),
    };
    let synced = match slot(object, "synced") {
        Slot::Absent | Slot::Null => None,
        Slot::Present(v) => checker.boolean("synced", v),
    };

    checker.finish()?;
    let title = title.ok_or_else(|| {
        ValidationError::Fields(vec![FieldError::new("title", "required", "title is required")])
    })?;

    Ok(ValidNote {
        title,
        content,
        is_pinned: is_pinned.unwrap_or(false),
        tags: tags.unwrap_or_default(),
        color,
        synced: synced.unwrap_or(true),
    })
}

/// Validate an update body. Every field is optional, but at least one must
/// be set.
pub fn validate_update(body: &Value) -> Result<NotePatch, ValidationError> {
    let object = body.as_object().ok_or(ValidationError::NotAnObject)?;
    let mut checker = Checker::default();

    let title = match slot(object, "title") {
        Slot::Absent | Slot::Null => None,
        Slot::Present(v) => checker.title(v),
    };
    let content = match slot(object, "content") {
        Slot::Absent => None,
        Slot::Null => Some(None),
        Slot::Present(v) => checker.content(v),
    };
    let is_pinned = match slot(object, "is_pinned") {
        Slot::Absent | Slot::Null => None,
        Slot::Present(v) => checker.boolean("is_pinned", v),
    };
    let tags = match slot(object, "tags") {
        Slot::Absent | Slot::Null => None,
        Slot::Present(v) => checker.tags(v),
    };
    let color = match slot(object, "color") {
        Slot::Absent => None,
        Slot::Null => Some(None),
        Slot::Present(v) => checker.color(v).map(Some),
    };
    let synced = match slot(object, "synced") {
        Slot::Absent | Slot::Null => None,
        Slot::Present(v) => checker.boolean("synced", v),
    };

    checker.finish()?;

    let patch = NotePatch {
        title,
        content,
        is_pinned,
        tags,
        color,
        synced,
    };
    if patch.is_empty() {
        return Err(ValidationError::EmptyUpdate);
    }
    Ok(patch)
}

// ============================================================================
// Response
// ============================================================================

/// JSON shape of a note returned to clients.
///
/// Field order is fixed by declaration order. `user_id` is not exposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteResponse {
    pub id: NoteId,
    pub title: String,
    pub content: Option<String>,
    pub is_pinned: bool,
    pub tags: Vec<String>,
    pub color: Option<String>,
    pub synced: bool,
    #[serde(with = "rfc3339_micros")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "rfc3339_micros")]
    pub updated_at: DateTime<Utc>,
}

/// Shape a note for a response body.
pub fn serialize(note: &Note) -> NoteResponse {
    NoteResponse {
        id: note.id.clone(),
        title: note.title.clone(),
        content: note.content.clone(),
        is_pinned: note.is_pinned,
        tags: note.tags.clone(),
        color: note.color.clone(),
        synced: note.synced,
        created_at: note.created_at,
        updated_at: note.updated_at,
    }
}

impl From<&Note> for NoteResponse {
    fn from(note: &Note) -> Self {
        serialize(note)
    }
}

/// ISO-8601 UTC with microseconds and a `Z` suffix.
pub mod rfc3339_micros {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
