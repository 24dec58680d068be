//! Tag command handlers
//!
//! Tags are never created or deleted directly; they exist exactly as long
//! as some note body mentions them. These commands only query.

use anyhow::Result;

use hashnote_core::{Notebook, Store};

use crate::output::Output;
use crate::resolve_tags;

/// List every tag in the notebook with its note count
pub fn list(store: &mut Store, notebook: &mut Notebook, output: &Output) -> Result<()> {
    let tags = notebook.tags(store)?;
    output.print_tags(&tags);
    Ok(())
}

/// List the tags sharing at least one note with the named tags
pub fn related(
    store: &mut Store,
    notebook: &mut Notebook,
    names: Vec<String>,
    output: &Output,
) -> Result<()> {
    let tags = resolve_tags(store, notebook, &names, output)?;
    let related = notebook.related_tags(store, &tags)?;
    output.print_tags(&related);
    Ok(())
}

/// List every note carrying any of the named tags
pub fn notes(
    store: &mut Store,
    notebook: &mut Notebook,
    names: Vec<String>,
    output: &Output,
) -> Result<()> {
    let tags = resolve_tags(store, notebook, &names, output)?;
    let notes = notebook.related_notes(store, &tags)?;
    output.print_notes(&notes);
    Ok(())
}
