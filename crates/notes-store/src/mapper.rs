//! Mapping between notes and store documents.
//!
//! Writes always take the owner from the authenticated identity. Reads are
//! lenient about optional fields so documents written by older or newer
//! versions of the schema still load.

use chrono::{DateTime, Utc};

use notes_core::{Note, NoteId, UserId, ValidNote};

use crate::document::{FieldValue, Fields, StoredDocument};
use crate::error::{StoreError, StoreResult};

/// Document field names.
pub mod field {
    pub const USER_ID: &str = "user_id";
    pub const TITLE: &str = "title";
    pub const CONTENT: &str = "content";
    pub const IS_PINNED: &str = "is_pinned";
    pub const TAGS: &str = "tags";
    pub const COLOR: &str = "color";
    pub const SYNCED: &str = "synced";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";
}

/// Build the document for a new note owned by `user_id`, created at `now`.
pub fn to_store(note: &ValidNote, user_id: &UserId, now: DateTime<Utc>) -> Fields {
    let mut fields = Fields::new();
    fields.insert(field::USER_ID.into(), user_id.as_str().into());
    fields.insert(field::TITLE.into(), note.title.clone().into());
    if let Some(content) = &note.content {
        fields.insert(field::CONTENT.into(), content.clone().into());
    }
    fields.insert(field::IS_PINNED.into(), note.is_pinned.into());
    fields.insert(field::TAGS.into(), FieldValue::string_array(&note.tags));
    if let Some(color) = &note.color {
        fields.insert(field::COLOR.into(), color.clone().into());
    }
    fields.insert(field::SYNCED.into(), note.synced.into());
    fields.insert(field::CREATED_AT.into(), now.into());
    fields.insert(field::UPDATED_AT.into(), now.into());
    fields
}

/// Build the full document for an existing note, e.g. after a patch.
pub fn note_to_fields(note: &Note) -> Fields {
    let valid = ValidNote {
        title: note.title.clone(),
        content: note.content.clone(),
        is_pinned: note.is_pinned,
        tags: note.tags.clone(),
        color: note.color.clone(),
        synced: note.synced,
    };
    let mut fields = to_store(&valid, &note.user_id, note.created_at);
    fields.insert(field::UPDATED_AT.into(), note.updated_at.into());
    fields
}

/// Read a note back from a stored document.
///
/// Absent optional fields take their defaults; missing required fields or
/// fields of the wrong type are a [`StoreError::CorruptDocument`].
pub fn from_store(doc: &StoredDocument) -> StoreResult<Note> {
    let reader = Reader { doc };

    let user_id = reader.required_str(field::USER_ID)?;
    let title = reader.required_str(field::TITLE)?;
    let content = reader.optional_str(field::CONTENT)?;
    let is_pinned = reader.optional_bool(field::IS_PINNED)?.unwrap_or(false);
    let tags = reader.optional_string_array(field::TAGS)?.unwrap_or_default();
    let color = reader.optional_str(field::COLOR)?;
    let synced = reader.optional_bool(field::SYNCED)?.unwrap_or(true);
    let created_at = reader
        .optional_timestamp(field::CREATED_AT)?
        .ok_or_else(|| StoreError::corrupt(&doc.id, "missing created_at"))?;
    let updated_at = reader
        .optional_timestamp(field::UPDATED_AT)?
        .unwrap_or(created_at);

    Ok(Note {
        id: NoteId::new(doc.id.clone()),
        user_id: UserId::new(user_id),
        title,
        content,
        is_pinned,
        tags,
        color,
        synced,
        created_at,
        updated_at,
    })
}

struct Reader<'a> {
    doc: &'a StoredDocument,
}

impl Reader<'_> {
    fn wrong_type(&self, name: &str, expected: &str) -> StoreError {
        StoreError::corrupt(&self.doc.id, format!("{name} is not a {expected}"))
    }

    fn optional_str(&self, name: &str) -> StoreResult<Option<String>> {
        match self.doc.fields.get(name) {
            None => Ok(None),
            Some(value) => value
                .as_str()
                .map(|s| Some(s.to_string()))
                .ok_or_else(|| self.wrong_type(name, "string")),
        }
    }

    fn required_str(&self, name: &str) -> StoreResult<String> {
        self.optional_str(name)?
            .ok_or_else(|| StoreError::corrupt(&self.doc.id, format!("missing {name}")))
    }

    fn optional_bool(&self, name: &str) -> StoreResult<Option<bool>> {
        match self.doc.fields.get(name) {
            None => Ok(None),
            Some(value) => value
                .as_bool()
                .map(Some)
                .ok_or_else(|| self.wrong_type(name, "boolean")),
        }
    }

    fn optional_timestamp(&self, name: &str) -> StoreResult<Option<DateTime<Utc>>> {
        match self.doc.fields.get(name) {
            None => Ok(None),
            Some(value) => value
                .as_timestamp()
                .map(Some)
                .ok_or_else(|| self.wrong_type(name, "timestamp")),
        }
    }

    fn optional_string_array(&self, name: &str) -> StoreResult<Option<Vec<String>>> {
        let Some(value) = self.doc.fields.get(name) else {
            return Ok(None);
        };
        let items = value
            .as_array()
            .ok_or_else(|| self.wrong_type(name, "array"))?;
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.wrong_type(name, "array of strings"))
            })
            .collect::<StoreResult<Vec<_>>>()
            .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use notes_core::validate_create;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_round_trip_reproduces_every_field() {
        let body = json!({
            "title": "Grocery List",
            "content": "milk",
            "is_pinned": true,
            "tags": ["home", "errands"],
            "color": "#1A2B3C",
            "synced": false,
        });
        let valid = validate_create(&body).unwrap();
        let uid = UserId::new("user-1");

        let doc = StoredDocument {
            id: "doc-1".into(),
            fields: to_store(&valid, &uid, now()),
        };
        let note = from_store(&doc).unwrap();

        assert_eq!(note.id, NoteId::new("doc-1"));
        assert_eq!(note.user_id, uid);
        assert_eq!(note.title, "Grocery List");
        assert_eq!(note.content.as_deref(), Some("milk"));
        assert!(note.is_pinned);
        assert_eq!(note.tags, vec!["home", "errands"]);
        assert_eq!(note.color.as_deref(), Some("#1A2B3C"));
        assert!(!note.synced);
        assert_eq!(note.created_at, now());
        assert_eq!(note.updated_at, now());
    }

    #[test]
    fn test_user_id_comes_from_identity() {
        let valid = validate_create(&json!({"title": "t", "user_id": "mallory"})).unwrap();
        let fields = to_store(&valid, &UserId::new("alice"), now());
        assert_eq!(fields[field::USER_ID], FieldValue::from("alice"));
    }

    #[test]
    fn test_absent_optionals_are_omitted_and_defaulted() {
        let valid = validate_create(&json!({"title": "t"})).unwrap();
        let fields = to_store(&valid, &UserId::new("u"), now());
        assert!(!fields.contains_key(field::CONTENT));
        assert!(!fields.contains_key(field::COLOR));

        let mut sparse = Fields::new();
        sparse.insert(field::USER_ID.into(), "u".into());
        sparse.insert(field::TITLE.into(), "legacy".into());
        sparse.insert(field::CREATED_AT.into(), now().into());
        let note = from_store(&StoredDocument {
            id: "old".into(),
            fields: sparse,
        })
        .unwrap();

        assert!(note.tags.is_empty());
        assert!(!note.is_pinned);
        assert!(note.synced);
        assert_eq!(note.content, None);
        assert_eq!(note.color, None);
        assert_eq!(note.updated_at, note.created_at);
    }

    #[test]
    fn test_missing_required_field_is_corrupt() {
        let mut fields = Fields::new();
        fields.insert(field::TITLE.into(), "t".into());
        fields.insert(field::CREATED_AT.into(), now().into());
        let err = from_store(&StoredDocument {
            id: "x".into(),
            fields,
        })
        .unwrap_err();
        assert!(matches!(err, StoreError::CorruptDocument { .. }));
        assert!(err.to_string().contains("user_id"));
    }

    #[test]
    fn test_wrong_type_is_corrupt() {
        let valid = validate_create(&json!({"title": "t"})).unwrap();
        let mut fields = to_store(&valid, &UserId::new("u"), now());
        fields.insert(field::TAGS.into(), "not-an-array".into());
        let err = from_store(&StoredDocument {
            id: "x".into(),
            fields,
        })
        .unwrap_err();
        assert!(err.to_string().contains("tags"));
    }

    #[test]
    fn test_note_to_fields_keeps_timestamps() {
        let valid = validate_create(&json!({"title": "t"})).unwrap();
        let doc = StoredDocument {
            id: "n".into(),
            fields: to_store(&valid, &UserId::new("u"), now()),
        };
        let mut note = from_store(&doc).unwrap();
        note.updated_at = now() + chrono::Duration::seconds(5);

        let fields = note_to_fields(&note);
        assert_eq!(fields[field::CREATED_AT], FieldValue::from(now()));
        assert_eq!(
            fields[field::UPDATED_AT],
            FieldValue::from(now() + chrono::Duration::seconds(5))
        );
    }
}
