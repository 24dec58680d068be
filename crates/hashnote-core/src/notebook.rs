//! Notebook consistency engine and query layer
//!
//! Keeps the bidirectional many-to-many index between notes and the tags
//! extracted from their bodies correct through every mutation. Tags are
//! created implicitly the first time their name appears in a note body
//! and deleted the moment their last referencing note stops containing
//! them.
//!
//! Every mutation (`put`, `delete`, `delete_all`) runs inside exactly one
//! store transaction. The engine works on a scratch copy of the notebook
//! record inside the transaction and adopts it only after commit, so a
//! failed transaction leaves the in-memory notebook untouched. Two
//! concurrent mutations against the same notebook race at the store's
//! transaction boundary; the loser surfaces `Error::Conflict` and retry
//! is the caller's business.
//!
//! Materialized collections (`tags`, `notes`, `untagged_notes`) are cached
//! on the instance for the duration of one logical request and dropped
//! after any mutation.

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::hashtag::extract_tag_names;
use crate::key::{Key, Kind};
use crate::keyset::{add_key, contains_key, index_of_key, remove_key, union_keys};
use crate::models::{Note, Notebook, Tag};
use crate::order::{NoteOrder, SortOrder};
use crate::store::{Store, StoreTx};

impl Notebook {
    /// Look up the notebook for the given identity, creating it on first
    /// use. There is no shared notebook instance; every caller resolves
    /// its own by explicit id.
    pub fn open(store: &mut Store, id: &str) -> Result<Notebook> {
        if id.is_empty() {
            return Err(Error::InvalidInput("empty notebook id".to_string()));
        }
        let key = Key::named(Kind::Notebook, id);
        match store.get::<Notebook>(&key)? {
            Some(notebook) => Ok(notebook),
            None => {
                debug!(notebook = id, "creating notebook");
                let notebook = Notebook::new(id);
                store.put(&notebook.key(), &notebook)?;
                Ok(notebook)
            }
        }
    }

    // ==================== Query layer ====================

    /// All tags in this notebook, sorted by name
    pub fn tags(&mut self, store: &mut Store) -> Result<Vec<Tag>> {
        if self.cached_tags.is_none() {
            let mut tags: Vec<Tag> = store.get_multi(&self.tag_keys)?;
            for (tag, key) in tags.iter_mut().zip(&self.tag_keys) {
                tag.id = Some(key.clone());
            }
            self.cached_tags = Some(tags);
        }
        Ok(self.cached_tags.clone().unwrap_or_default())
    }

    /// All notes in this notebook, including untagged notes
    pub fn notes(&mut self, store: &mut Store) -> Result<Vec<Note>> {
        if self.cached_notes.is_none() {
            let mut notes: Vec<Note> = store.get_multi(&self.note_keys)?;
            for (note, key) in notes.iter_mut().zip(&self.note_keys) {
                note.id = Some(key.clone());
            }
            self.cached_notes = Some(notes);
        }
        Ok(self.cached_notes.clone().unwrap_or_default())
    }

    /// All notes whose extracted tag set is currently empty
    pub fn untagged_notes(&mut self, store: &mut Store) -> Result<Vec<Note>> {
        if self.cached_untagged.is_none() {
            let mut notes: Vec<Note> = store.get_multi(&self.untagged_note_keys)?;
            for (note, key) in notes.iter_mut().zip(&self.untagged_note_keys) {
                note.id = Some(key.clone());
            }
            self.cached_untagged = Some(notes);
        }
        Ok(self.cached_untagged.clone().unwrap_or_default())
    }

    /// A single note by its wire-encoded id
    pub fn note(&mut self, store: &mut Store, id: &str) -> Result<Note> {
        let key = Key::decode(id)?;
        if !contains_key(&self.note_keys, &key) {
            return Err(Error::NotFound(format!("note {id}")));
        }
        let mut note: Note = store
            .get(&key)?
            .ok_or_else(|| Error::NotFound(format!("note {id}")))?;
        note.id = Some(key);
        Ok(note)
    }

    /// Resolve tags by name with a merge-walk over the sorted tag list.
    ///
    /// A name that does not resolve aborts with `Error::MissingTag`, which
    /// still carries the tags matched up to that point.
    pub fn tags_from(&mut self, store: &mut Store, names: &[String]) -> Result<Vec<Tag>> {
        let all = self.tags(store)?;
        let mut sorted: Vec<&str> = names.iter().map(String::as_str).collect();
        sorted.sort_unstable();

        let mut matched = Vec::with_capacity(sorted.len());
        let mut i = 0;
        for name in sorted {
            while i < all.len() && all[i].name.as_str() < name {
                i += 1;
            }
            if i < all.len() && all[i].name == name {
                matched.push(all[i].clone());
            } else {
                debug!(tag = name, "missing tag");
                return Err(Error::MissingTag {
                    name: name.to_string(),
                    matched,
                });
            }
        }
        Ok(matched)
    }

    /// The tags of one note in this notebook, resolved by key identity
    pub fn tags_of(&mut self, store: &mut Store, note: &Note) -> Result<Vec<Tag>> {
        let all = self.tags(store)?;
        let mut tags = Vec::with_capacity(note.tag_keys.len());
        for key in &note.tag_keys {
            match index_of_key(&self.tag_keys, key) {
                Some(i) => tags.push(all[i].clone()),
                None => {
                    return Err(Error::NotFound(format!(
                        "notebook missing tag {}",
                        key.encode()
                    )))
                }
            }
        }
        Ok(tags)
    }

    /// All tags that share at least one note with the given tags.
    ///
    /// The input tags are always part of the output. An empty input yields
    /// an empty output.
    pub fn related_tags(&mut self, store: &mut Store, tags: &[Tag]) -> Result<Vec<Tag>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }
        let mut related_note_keys: Vec<Key> = Vec::new();
        for tag in tags {
            related_note_keys = union_keys(&related_note_keys, &tag.note_keys);
        }
        let all = self.tags(store)?;
        Ok(all
            .into_iter()
            .filter(|tag| {
                tag.note_keys
                    .iter()
                    .any(|key| contains_key(&related_note_keys, key))
            })
            .collect())
    }

    /// The union of all notes referred to by the given tags
    pub fn related_notes(&mut self, store: &mut Store, tags: &[Tag]) -> Result<Vec<Note>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }
        let mut note_keys: Vec<Key> = Vec::new();
        for tag in tags {
            note_keys = union_keys(&note_keys, &tag.note_keys);
        }
        let mut notes: Vec<Note> = store.get_multi(&note_keys)?;
        for (note, key) in notes.iter_mut().zip(&note_keys) {
            note.id = Some(key.clone());
        }
        Ok(notes)
    }

    /// The preferred sort order for the notes of a set of tags.
    ///
    /// Accepting the answer counts toward future preference, so the
    /// updated weights are persisted.
    pub fn preferred_order(&mut self, store: &mut Store, tags: &[Tag]) -> Result<SortOrder> {
        let order = self.note_order.get(tags);
        store.put(&self.key(), self)?;
        Ok(order)
    }

    /// Record an explicit sort-order choice for the notes of a set of tags
    pub fn set_preferred_order(
        &mut self,
        store: &mut Store,
        tags: &[Tag],
        order: SortOrder,
    ) -> Result<()> {
        self.note_order.set(tags, order);
        store.put(&self.key(), self)?;
        Ok(())
    }

    // ==================== Consistency engine ====================

    /// Create or update a note and sort out all tag relationships.
    ///
    /// A note without an id, or with an id this notebook does not own, is
    /// created; otherwise the existing note is updated in place.
    pub fn put(&mut self, store: &mut Store, note: Note) -> Result<Note> {
        let owned = note
            .id
            .as_ref()
            .map(|key| contains_key(&self.note_keys, key))
            .unwrap_or(false);
        if owned {
            self.update_note(store, note)
        } else {
            self.add_note(store, note)
        }
    }

    /// Delete a note, remove it from every tag that refers to it, and
    /// delete tags left without notes. Returns whether a note was actually
    /// found and removed; a nonexistent note is not an error.
    pub fn delete(&mut self, store: &mut Store, id: &str) -> Result<bool> {
        let note_key = Key::decode(id)?;
        if !contains_key(&self.note_keys, &note_key) {
            return Ok(false);
        }

        let snapshot = self.scratch();
        let (notebook, found) = store.run_in_transaction(move |tx| {
            let mut nb = snapshot;
            let Some(note) = tx.get::<Note>(&note_key)? else {
                // Stale index entry; drop the dangling keys
                warn!(key = %note_key, "note key without record");
                remove_key(&mut nb.note_keys, &note_key);
                remove_key(&mut nb.untagged_note_keys, &note_key);
                tx.put(&nb.key(), &nb)?;
                return Ok::<_, Error>((nb, false));
            };

            debug!(key = %note_key, "deleting note");
            let mut tombstone = Note::new("");
            sync_tags(&mut nb, tx, &note.tag_keys, &mut tombstone, &note_key)?;

            tx.delete(&note_key)?;
            remove_key(&mut nb.note_keys, &note_key);
            remove_key(&mut nb.untagged_note_keys, &note_key);
            tx.put(&nb.key(), &nb)?;
            Ok((nb, true))
        })?;

        self.adopt(notebook);
        Ok(found)
    }

    /// Delete every note and tag in this notebook in one atomic bulk
    /// operation, resetting all key lists.
    pub fn delete_all(&mut self, store: &mut Store) -> Result<()> {
        let snapshot = self.scratch();
        let notebook = store.run_in_transaction(move |tx| {
            let mut nb = snapshot;
            tx.delete_multi(&nb.note_keys)?;
            tx.delete_multi(&nb.tag_keys)?;
            nb.note_keys.clear();
            nb.tag_keys.clear();
            nb.untagged_note_keys.clear();
            nb.note_order = NoteOrder::default();
            tx.put(&nb.key(), &nb)?;
            Ok::<_, Error>(nb)
        })?;

        self.adopt(notebook);
        Ok(())
    }

    /// Create path: mint a fresh key, persist a body-only record, then
    /// attach tags and update the notebook.
    fn add_note(&mut self, store: &mut Store, mut note: Note) -> Result<Note> {
        let snapshot = self.scratch();
        let supplied_id = note.id.take();

        let (notebook, note) = store.run_in_transaction(move |tx| {
            let mut nb = snapshot;
            let mut note = note;

            let note_key = new_note_key(tx, supplied_id)?;

            note.created = Utc::now();
            note.last_modified = note.created;
            note.notebook_key = Some(nb.key());
            note.tag_keys = Vec::new();

            // Body-only record first, so tag records can reference a
            // persisted key
            tx.put(&note_key, &note)?;

            sync_tags(&mut nb, tx, &[], &mut note, &note_key)?;

            tx.put(&note_key, &note)?;
            note.id = Some(note_key.clone());

            add_key(&mut nb.note_keys, note_key.clone());
            if note.tag_keys.is_empty() {
                add_key(&mut nb.untagged_note_keys, note_key);
            }
            tx.put(&nb.key(), &nb)?;
            Ok::<_, Error>((nb, note))
        })?;

        self.adopt(notebook);
        Ok(note)
    }

    /// Update path: diff tags against the stored note, preserve `created`,
    /// and apply exactly one of the four untagged transitions.
    fn update_note(&mut self, store: &mut Store, note: Note) -> Result<Note> {
        let snapshot = self.scratch();

        let (notebook, note) = store.run_in_transaction(move |tx| {
            let mut nb = snapshot;
            let mut note = note;
            let note_key = match note.id.clone() {
                Some(key) => key,
                None => return Err(Error::InvalidInput("note has no id".to_string())),
            };
            let old: Note = tx
                .get(&note_key)?
                .ok_or_else(|| Error::NotFound(format!("note {}", note_key.encode())))?;

            sync_tags(&mut nb, tx, &old.tag_keys, &mut note, &note_key)?;

            note.created = old.created;
            note.last_modified = Utc::now();
            note.notebook_key = old.notebook_key.clone();
            tx.put(&note_key, &note)?;

            let had_tags = !old.tag_keys.is_empty();
            let has_tags = !note.tag_keys.is_empty();
            match (had_tags, has_tags) {
                (true, true) | (false, false) => {}
                (false, true) => {
                    remove_key(&mut nb.untagged_note_keys, &note_key);
                }
                (true, false) => {
                    add_key(&mut nb.untagged_note_keys, note_key.clone());
                }
            }
            tx.put(&nb.key(), &nb)?;
            Ok::<_, Error>((nb, note))
        })?;

        self.adopt(notebook);
        Ok(note)
    }

    /// Clone of the persisted fields only, with empty caches
    fn scratch(&self) -> Notebook {
        Notebook {
            id: self.id.clone(),
            name: self.name.clone(),
            tag_keys: self.tag_keys.clone(),
            note_keys: self.note_keys.clone(),
            untagged_note_keys: self.untagged_note_keys.clone(),
            note_order: self.note_order.clone(),
            cached_tags: None,
            cached_notes: None,
            cached_untagged: None,
        }
    }

    /// Replace this instance with the committed state and drop every
    /// materialized collection
    fn adopt(&mut self, notebook: Notebook) {
        *self = notebook;
        self.cached_tags = None;
        self.cached_notes = None;
        self.cached_untagged = None;
    }
}

/// Returns a fresh, collision-free note key. A caller-supplied key is
/// honored only if it does not already resolve to an existing record
/// (e.g. a note in another notebook).
fn new_note_key(tx: &StoreTx<'_>, supplied: Option<Key>) -> Result<Key> {
    if let Some(key) = supplied {
        if key.kind() == Kind::Note && !tx.contains(&key)? {
            return Ok(key);
        }
    }
    Ok(Key::fresh(Kind::Note))
}

/// Apply the tag difference between `old_tag_keys` and the hashtags in
/// `note.body`: remove the note from lost tags, delete tags left with no
/// notes, resolve or create gained tags, and rewrite both `note.tag_keys`
/// and the notebook's name-sorted `tag_keys`.
fn sync_tags(
    nb: &mut Notebook,
    tx: &mut StoreTx<'_>,
    old_tag_keys: &[Key],
    note: &mut Note,
    note_key: &Key,
) -> Result<()> {
    let names = dedup_names(extract_tag_names(&note.body));
    let mut all = load_tag_pairs(tx, &nb.tag_keys)?;

    // Lost tags: referenced by the old note but no longer named
    let mut deleted: Vec<Key> = Vec::new();
    let mut to_put: Vec<(Key, Tag)> = Vec::new();
    for key in old_tag_keys {
        let idx = all.iter().position(|(k, _)| k == key).ok_or_else(|| {
            Error::NotFound(format!("notebook missing tag {}", key.encode()))
        })?;
        if names.iter().any(|name| *name == all[idx].1.name) {
            continue;
        }
        let (k, tag) = &mut all[idx];
        remove_key(&mut tag.note_keys, note_key);
        if tag.note_keys.is_empty() {
            debug!(tag = %tag.name, "deleting orphan tag");
            deleted.push(k.clone());
        } else {
            to_put.push((k.clone(), tag.clone()));
        }
    }

    // Gained tags: resolve existing names, create records for new ones
    let mut created: Vec<(Key, Tag)> = Vec::new();
    let mut note_tag_keys: Vec<Key> = Vec::new();
    for name in &names {
        match all.iter_mut().find(|(_, tag)| &tag.name == name) {
            Some((key, tag)) => {
                if !contains_key(&tag.note_keys, note_key) {
                    add_key(&mut tag.note_keys, note_key.clone());
                    to_put.push((key.clone(), tag.clone()));
                }
                add_key(&mut note_tag_keys, key.clone());
            }
            None => {
                debug!(tag = %name, "creating tag");
                let key = Key::fresh(Kind::Tag);
                let tag = Tag::new(name.clone(), nb.key(), note_key.clone());
                to_put.push((key.clone(), tag.clone()));
                created.push((key.clone(), tag));
                note_tag_keys.push(key);
            }
        }
    }

    if !to_put.is_empty() {
        tx.put_multi(&to_put)?;
    }
    if !deleted.is_empty() {
        tx.delete_multi(&deleted)?;
        // Deleted tags invalidate any sort-order preference mentioning them
        let deleted_tags: Vec<Tag> = all
            .iter()
            .filter(|(key, _)| contains_key(&deleted, key))
            .map(|(_, tag)| tag.clone())
            .collect();
        nb.note_order.cleanup(&deleted_tags);
    }

    note.tag_keys = note_tag_keys;
    rebuild_tag_keys(nb, &all, &deleted, &created);
    Ok(())
}

/// Rewrite the notebook's tag keys from the surviving and newly created
/// tags, sorted by tag name.
fn rebuild_tag_keys(
    nb: &mut Notebook,
    all: &[(Key, Tag)],
    deleted: &[Key],
    created: &[(Key, Tag)],
) {
    let mut pairs: Vec<(&str, &Key)> = all
        .iter()
        .filter(|(key, _)| !contains_key(deleted, key))
        .map(|(key, tag)| (tag.name.as_str(), key))
        .collect();
    for (key, tag) in created {
        pairs.push((tag.name.as_str(), key));
    }
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    nb.tag_keys = pairs.into_iter().map(|(_, key)| key.clone()).collect();
}

fn load_tag_pairs(tx: &StoreTx<'_>, keys: &[Key]) -> Result<Vec<(Key, Tag)>> {
    let tags: Vec<Tag> = tx.get_multi(keys)?;
    Ok(keys.iter().cloned().zip(tags).collect())
}

fn dedup_names(names: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}
