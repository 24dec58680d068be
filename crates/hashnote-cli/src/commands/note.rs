//! Note command handlers
//!
//! Notes are the only records the user edits directly. Tag membership is
//! recomputed from the body on every save.

use anyhow::{bail, Context, Result};

use hashnote_core::{Note, Notebook, SortOrder, Store};

use crate::editor::{confirm, edit_text};
use crate::output::Output;
use crate::resolve_tags;

/// Create a new note
pub fn add(
    store: &mut Store,
    notebook: &mut Notebook,
    body: Option<String>,
    output: &Output,
) -> Result<()> {
    let body = match body {
        Some(b) => b,
        None => {
            let edited = edit_text("").context("Failed to edit note")?;
            edited.trim().to_string()
        }
    };

    if body.is_empty() {
        bail!("Note body cannot be empty");
    }

    let note = notebook.put(store, Note::new(body))?;
    let id = note.id.as_ref().map(|key| key.encode()).unwrap_or_default();

    if output.is_quiet() {
        println!("{}", id);
    } else {
        output.success(&format!("Added note {}", id));
    }
    Ok(())
}

/// List notes, optionally filtered to those carrying the given tags
pub fn list(
    store: &mut Store,
    notebook: &mut Notebook,
    tag_names: Vec<String>,
    order: Option<SortOrder>,
    output: &Output,
) -> Result<()> {
    let tags = resolve_tags(store, notebook, &tag_names, output)?;

    let mut notes = if tags.is_empty() {
        notebook.notes(store)?
    } else {
        notebook.related_notes(store, &tags)?
    };

    // An explicit --order is remembered for this tag group; otherwise the
    // preferred order from past choices is used
    let order = match order {
        Some(order) => {
            notebook.set_preferred_order(store, &tags, order)?;
            order
        }
        None => notebook.preferred_order(store, &tags)?,
    };

    sort_notes(&mut notes, order);
    output.print_notes(&notes);
    Ok(())
}

/// Show a single note in full
pub fn show(store: &mut Store, notebook: &mut Notebook, id: String, output: &Output) -> Result<()> {
    let note = notebook.note(store, &id)?;
    output.print_note(&note);
    Ok(())
}

/// Edit a note's body in $EDITOR
pub fn edit(store: &mut Store, notebook: &mut Notebook, id: String, output: &Output) -> Result<()> {
    let mut note = notebook.note(store, &id)?;

    let edited = edit_text(&note.body).context("Failed to edit note")?;
    let body = edited.trim().to_string();
    if body.is_empty() {
        bail!("Note body cannot be empty. Use `hashnote note rm` to delete a note.");
    }

    note.body = body;
    notebook.put(store, note)?;

    output.success(&format!("Updated note {}", id));
    Ok(())
}

/// Delete a note; its orphaned tags disappear with it
pub fn delete(
    store: &mut Store,
    notebook: &mut Notebook,
    id: String,
    output: &Output,
) -> Result<()> {
    if output.should_prompt() {
        let note = notebook.note(store, &id)?;
        println!("Delete note: {}", note.body.lines().next().unwrap_or(""));
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    if notebook.delete(store, &id)? {
        output.success(&format!("Deleted note {}", id));
    } else {
        output.message(&format!("Note not found: {}", id));
    }
    Ok(())
}

/// List the notes that currently have no tags
pub fn untagged(store: &mut Store, notebook: &mut Notebook, output: &Output) -> Result<()> {
    let notes = notebook.untagged_notes(store)?;
    output.print_notes(&notes);
    Ok(())
}

/// Delete every note and tag in the notebook
pub fn clear(store: &mut Store, notebook: &mut Notebook, output: &Output) -> Result<()> {
    let count = notebook.note_keys.len();

    if output.should_prompt() {
        println!(
            "This deletes all {} note(s) and every tag in notebook '{}'.",
            count, notebook.id
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    notebook.delete_all(store)?;
    output.success(&format!("Deleted {} note(s)", count));
    Ok(())
}

/// Sort notes in place by the given order
fn sort_notes(notes: &mut [Note], order: SortOrder) {
    match order {
        SortOrder::AlphaAscending => notes.sort_by(|a, b| a.body.cmp(&b.body)),
        SortOrder::AlphaDescending => notes.sort_by(|a, b| b.body.cmp(&a.body)),
        SortOrder::LastModified => notes.sort_by(|a, b| b.last_modified.cmp(&a.last_modified)),
        SortOrder::FirstModified => notes.sort_by(|a, b| a.last_modified.cmp(&b.last_modified)),
        SortOrder::LastCreated => notes.sort_by(|a, b| b.created.cmp(&a.created)),
        SortOrder::FirstCreated => notes.sort_by(|a, b| a.created.cmp(&b.created)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn notes() -> Vec<Note> {
        let mut older = Note::new("bravo");
        older.created = Utc::now() - Duration::hours(2);
        older.last_modified = older.created;
        vec![older, Note::new("alpha")]
    }

    #[test]
    fn test_sort_alpha() {
        let mut notes = notes();
        sort_notes(&mut notes, SortOrder::AlphaAscending);
        assert_eq!(notes[0].body, "alpha");

        sort_notes(&mut notes, SortOrder::AlphaDescending);
        assert_eq!(notes[0].body, "bravo");
    }

    #[test]
    fn test_sort_by_age() {
        let mut notes = notes();
        sort_notes(&mut notes, SortOrder::FirstCreated);
        assert_eq!(notes[0].body, "bravo");

        sort_notes(&mut notes, SortOrder::LastCreated);
        assert_eq!(notes[0].body, "alpha");

        sort_notes(&mut notes, SortOrder::LastModified);
        assert_eq!(notes[0].body, "alpha");
    }
}
