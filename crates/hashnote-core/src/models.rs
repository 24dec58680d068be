//! Data models for hashnote
//!
//! Defines the core records: Notebook, Note, and Tag. Back-references
//! between records are plain keys resolved through the store on demand,
//! never owning pointers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::key::{Key, Kind};
use crate::order::NoteOrder;

/// A per-user notebook: the aggregate root owning a set of notes and the
/// tags derived from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notebook {
    /// Identity of the owning user
    pub id: String,
    /// Display name
    pub name: String,
    /// Keys of every tag in this notebook, sorted by tag name
    #[serde(default)]
    pub tag_keys: Vec<Key>,
    /// Keys of every note in this notebook
    #[serde(default)]
    pub note_keys: Vec<Key>,
    /// Subset of `note_keys` whose notes currently have zero tags
    #[serde(default)]
    pub untagged_note_keys: Vec<Key>,
    /// Preferred note sort orders per tag group
    #[serde(default)]
    pub note_order: NoteOrder,

    // Materialized collections, cached for one logical request and
    // dropped after any mutation. Never persisted.
    #[serde(skip)]
    pub(crate) cached_tags: Option<Vec<Tag>>,
    #[serde(skip)]
    pub(crate) cached_notes: Option<Vec<Note>>,
    #[serde(skip)]
    pub(crate) cached_untagged: Option<Vec<Note>>,
}

impl Notebook {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            tag_keys: Vec::new(),
            note_keys: Vec::new(),
            untagged_note_keys: Vec::new(),
            note_order: NoteOrder::default(),
            cached_tags: None,
            cached_notes: None,
            cached_untagged: None,
        }
    }

    /// The store key of this notebook
    pub fn key(&self) -> Key {
        Key::named(Kind::Notebook, &self.id)
    }
}

/// A free-text note; its body is the source of truth for tag membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Store key, assigned on first persistence and stable thereafter.
    /// Not part of the stored record.
    #[serde(skip)]
    pub id: Option<Key>,
    /// Free text; hashtags inside it drive tag membership
    pub body: String,
    /// When this note was created
    pub created: DateTime<Utc>,
    /// When this note was last updated
    pub last_modified: DateTime<Utc>,
    /// Keys of the tags currently matching this note's body
    #[serde(default)]
    pub tag_keys: Vec<Key>,
    /// Weak back-reference to the owning notebook
    pub notebook_key: Option<Key>,
}

impl Note {
    /// Create an unsaved note with the given body
    pub fn new(body: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            body: body.into(),
            created: now,
            last_modified: now,
            tag_keys: Vec::new(),
            notebook_key: None,
        }
    }

    /// Create a note addressed by an existing key (for updates)
    pub fn with_id(id: Key, body: impl Into<String>) -> Self {
        let mut note = Self::new(body);
        note.id = Some(id);
        note
    }
}

/// A tag: a name extracted from note text, shared by every note whose
/// current body contains it. Created implicitly with its first referencing
/// note and destroyed with its last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Store key. Not part of the stored record.
    #[serde(skip)]
    pub id: Option<Key>,
    /// Unique within one notebook, case-sensitive
    pub name: String,
    /// Keys of every note whose body currently contains this tag
    #[serde(default)]
    pub note_keys: Vec<Key>,
    /// Weak back-reference to the owning notebook
    pub notebook_key: Key,
}

impl Tag {
    /// Create a new tag for its first referencing note
    pub(crate) fn new(name: impl Into<String>, notebook_key: Key, note_key: Key) -> Self {
        Self {
            id: None,
            name: name.into(),
            note_keys: vec![note_key],
            notebook_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_new() {
        let note = Note::new("hello #world");
        assert!(note.id.is_none());
        assert_eq!(note.body, "hello #world");
        assert!(note.tag_keys.is_empty());
        assert_eq!(note.created, note.last_modified);
    }

    #[test]
    fn test_note_with_id() {
        let key = Key::fresh(Kind::Note);
        let note = Note::with_id(key.clone(), "body");
        assert_eq!(note.id, Some(key));
    }

    #[test]
    fn test_note_id_is_not_serialized() {
        let note = Note::with_id(Key::fresh(Kind::Note), "body");
        let json = serde_json::to_string(&note).unwrap();
        let loaded: Note = serde_json::from_str(&json).unwrap();
        assert!(loaded.id.is_none());
        assert_eq!(loaded.body, note.body);
    }

    #[test]
    fn test_notebook_key() {
        let notebook = Notebook::new("user-1");
        assert_eq!(notebook.key(), Key::named(Kind::Notebook, "user-1"));
        assert_eq!(notebook.name, "user-1");
    }

    #[test]
    fn test_notebook_caches_are_not_serialized() {
        let mut notebook = Notebook::new("user-1");
        notebook.cached_tags = Some(Vec::new());
        let json = serde_json::to_string(&notebook).unwrap();
        let loaded: Notebook = serde_json::from_str(&json).unwrap();
        assert!(loaded.cached_tags.is_none());
    }

    #[test]
    fn test_tag_new() {
        let notebook_key = Key::named(Kind::Notebook, "user-1");
        let note_key = Key::fresh(Kind::Note);
        let tag = Tag::new("rust", notebook_key.clone(), note_key.clone());
        assert_eq!(tag.name, "rust");
        assert_eq!(tag.note_keys, vec![note_key]);
        assert_eq!(tag.notebook_key, notebook_key);
    }
}
