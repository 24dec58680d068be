//! Hashnote CLI
//!
//! Command-line interface for hashnote - notes organized by the hashtags
//! written inside them.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hashnote_core::{Config, Error, Notebook, SortOrder, Store, Tag};

mod commands;
mod editor;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "hashnote")]
#[command(about = "Hashnote - notes organized by the hashtags inside them")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Operate on a notebook other than the configured one
    #[arg(long, global = true)]
    notebook: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage notes
    Note {
        #[command(subcommand)]
        command: NoteCommands,
    },
    /// List all tags
    Tags,
    /// Query tag relationships
    Tag {
        #[command(subcommand)]
        command: TagCommands,
    },
    /// List notes without any tags
    Untagged,
    /// Delete every note and tag in the notebook
    Clear,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Show notebook status
    Status,
}

#[derive(Subcommand)]
enum NoteCommands {
    /// Create a new note (opens editor if no body given)
    #[command(alias = "create")]
    Add {
        /// Note body; hashtags inside it become tags
        body: Option<String>,
    },
    /// List notes
    #[command(alias = "ls")]
    List {
        /// Only notes carrying any of these tags
        #[arg(short, long)]
        tag: Vec<String>,
        /// Sort order: aa, ad, lm, fm, lc, fc
        #[arg(short, long)]
        order: Option<SortOrderArg>,
    },
    /// Show a note in full
    Show {
        /// Note ID
        id: String,
    },
    /// Edit a note's body
    Edit {
        /// Note ID
        id: String,
    },
    /// Delete a note
    #[command(alias = "rm")]
    Delete {
        /// Note ID
        id: String,
    },
}

#[derive(Subcommand)]
enum TagCommands {
    /// List tags sharing a note with the given tags
    Related {
        /// Tag names
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// List notes carrying any of the given tags
    Notes {
        /// Tag names
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, notebook)
        key: String,
        /// Configuration value
        value: String,
    },
}

/// Thin clap wrapper around the core sort order codes
#[derive(Clone, Copy)]
struct SortOrderArg(SortOrder);

impl std::str::FromStr for SortOrderArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<SortOrder>()
            .map(SortOrderArg)
            .map_err(|e| e.to_string())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    init_logging();

    // Config commands don't need the store
    if let Commands::Config { command } = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(&output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, &output)
            }
        };
    }

    let mut config = Config::load()?;
    if let Some(notebook) = cli.notebook {
        config.notebook = notebook;
    }

    let mut store = Store::open(&config)?;
    let mut notebook = Notebook::open(&mut store, &config.notebook)?;
    tracing::debug!(notebook = %notebook.id, "notebook opened");

    match cli.command {
        Commands::Note { command } => {
            handle_note_command(command, &mut store, &mut notebook, &output)
        }
        Commands::Tags => commands::tag::list(&mut store, &mut notebook, &output),
        Commands::Tag { command } => {
            handle_tag_command(command, &mut store, &mut notebook, &output)
        }
        Commands::Untagged => commands::note::untagged(&mut store, &mut notebook, &output),
        Commands::Clear => commands::note::clear(&mut store, &mut notebook, &output),
        Commands::Status => commands::status::show(&config, &notebook, &output),
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

fn handle_note_command(
    command: NoteCommands,
    store: &mut Store,
    notebook: &mut Notebook,
    output: &Output,
) -> Result<()> {
    match command {
        NoteCommands::Add { body } => commands::note::add(store, notebook, body, output),
        NoteCommands::List { tag, order } => {
            commands::note::list(store, notebook, tag, order.map(|o| o.0), output)
        }
        NoteCommands::Show { id } => commands::note::show(store, notebook, id, output),
        NoteCommands::Edit { id } => commands::note::edit(store, notebook, id, output),
        NoteCommands::Delete { id } => commands::note::delete(store, notebook, id, output),
    }
}

fn handle_tag_command(
    command: TagCommands,
    store: &mut Store,
    notebook: &mut Notebook,
    output: &Output,
) -> Result<()> {
    match command {
        TagCommands::Related { names } => {
            commands::tag::related(store, notebook, names, output)
        }
        TagCommands::Notes { names } => commands::tag::notes(store, notebook, names, output),
    }
}

/// Resolve tag names, warning about (and skipping) names that don't
/// exist. A miss only drops that one name; the remaining names are
/// re-resolved until everything is either matched or reported.
pub(crate) fn resolve_tags(
    store: &mut Store,
    notebook: &mut Notebook,
    names: &[String],
    output: &Output,
) -> Result<Vec<Tag>> {
    let mut remaining: Vec<String> = names.to_vec();
    let mut resolved: Vec<Tag> = Vec::new();

    while !remaining.is_empty() {
        match notebook.tags_from(store, &remaining) {
            Ok(mut tags) => {
                resolved.append(&mut tags);
                break;
            }
            Err(Error::MissingTag { name, mut matched }) => {
                if !output.is_quiet() {
                    eprintln!("⚠ Unknown tag: #{}", name);
                }
                resolved.append(&mut matched);
                remaining
                    .retain(|n| *n != name && !resolved.iter().any(|tag| tag.name == *n));
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(resolved)
}

/// Log to stderr, filtered by HASHNOTE_LOG (defaults to warnings only)
fn init_logging() {
    let filter =
        EnvFilter::try_from_env("HASHNOTE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashnote_core::Note;

    #[test]
    fn test_resolve_tags_skips_unknown_and_keeps_later_names() {
        let mut store = Store::open_in_memory().unwrap();
        let mut nb = Notebook::open(&mut store, "tester").unwrap();
        nb.put(&mut store, Note::new("#a #c")).unwrap();

        let output = Output::new(OutputFormat::Quiet);
        // "b" is unknown and sorts between the two known names
        let names = vec!["b".to_string(), "c".to_string(), "a".to_string()];
        let tags = resolve_tags(&mut store, &mut nb, &names, &output).unwrap();

        let mut resolved: Vec<&str> = tags.iter().map(|tag| tag.name.as_str()).collect();
        resolved.sort_unstable();
        assert_eq!(resolved, vec!["a", "c"]);
    }

    #[test]
    fn test_resolve_tags_all_unknown_is_empty() {
        let mut store = Store::open_in_memory().unwrap();
        let mut nb = Notebook::open(&mut store, "tester").unwrap();
        nb.put(&mut store, Note::new("#a")).unwrap();

        let output = Output::new(OutputFormat::Quiet);
        let names = vec!["x".to_string(), "y".to_string()];
        let tags = resolve_tags(&mut store, &mut nb, &names, &output).unwrap();
        assert!(tags.is_empty());
    }
}
