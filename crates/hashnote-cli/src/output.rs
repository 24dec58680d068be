//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use hashnote_core::{Note, Tag};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print a single note in full
    pub fn print_note(&self, note: &Note) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", note_id(note));
                println!("Created:  {}", note.created.format("%Y-%m-%d %H:%M"));
                println!("Modified: {}", note.last_modified.format("%Y-%m-%d %H:%M"));
                println!();
                println!("{}", note.body);
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&note_json(note)).unwrap());
            }
            OutputFormat::Quiet => {
                println!("{}", note_id(note));
            }
        }
    }

    /// Print a list of notes, one summary line each
    pub fn print_notes(&self, notes: &[Note]) {
        match self.format {
            OutputFormat::Human => {
                if notes.is_empty() {
                    println!("No notes found.");
                    return;
                }
                for note in notes {
                    println!(
                        "{} | {} | {}",
                        note_id(note),
                        note.last_modified.format("%Y-%m-%d %H:%M"),
                        truncate_line(&note.body, 60)
                    );
                }
                println!("\n{} note(s)", notes.len());
            }
            OutputFormat::Json => {
                let json: Vec<_> = notes.iter().map(note_json).collect();
                println!("{}", serde_json::to_string_pretty(&json).unwrap());
            }
            OutputFormat::Quiet => {
                for note in notes {
                    println!("{}", note_id(note));
                }
            }
        }
    }

    /// Print a list of tags with their note counts
    pub fn print_tags(&self, tags: &[Tag]) {
        match self.format {
            OutputFormat::Human => {
                if tags.is_empty() {
                    println!("No tags found.");
                    return;
                }
                for tag in tags {
                    println!("#{} ({})", tag.name, tag.note_keys.len());
                }
                println!("\n{} tag(s)", tags.len());
            }
            OutputFormat::Json => {
                let json: Vec<_> = tags
                    .iter()
                    .map(|tag| {
                        serde_json::json!({
                            "name": tag.name,
                            "notes": tag.note_keys.len(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&json).unwrap());
            }
            OutputFormat::Quiet => {
                for tag in tags {
                    println!("{}", tag.name);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// The wire id of a note, or a placeholder for an unsaved one
fn note_id(note: &Note) -> String {
    note.id
        .as_ref()
        .map(|key| key.encode())
        .unwrap_or_else(|| "(unsaved)".to_string())
}

fn note_json(note: &Note) -> serde_json::Value {
    serde_json::json!({
        "id": note.id.as_ref().map(|key| key.encode()),
        "body": note.body,
        "created": note.created.to_rfc3339(),
        "last_modified": note.last_modified.to_rfc3339(),
    })
}

/// Truncate a string to at most `max_len` characters, adding "..." if
/// truncated. Counts characters, not bytes, so multibyte text never
/// splits mid-character.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let prefix: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", prefix)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}
