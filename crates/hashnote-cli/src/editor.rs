//! $EDITOR integration
//!
//! Note bodies are written in the user's editor via a scratch markdown
//! file; hashtags typed into the body become tags on save.

use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::Command;

/// Editors tried when neither $EDITOR nor $VISUAL is set
const FALLBACK_EDITORS: &[&str] = &["nano", "vim", "vi"];

/// Open a note body in the user's editor and return the edited text
pub fn edit_text(initial: &str) -> Result<String> {
    let editor = find_editor()?;
    let path = scratch_path();

    fs::write(&path, initial)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    let status = Command::new(&editor)
        .arg(&path)
        .status()
        .with_context(|| format!("Failed to run editor: {editor}"))?;

    let body = if status.success() {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))
    } else {
        Err(anyhow::anyhow!("Editor '{editor}' exited with an error"))
    };

    let _ = fs::remove_file(&path);
    body
}

/// Scratch file for one editing session, named after this process so
/// concurrent invocations don't collide
fn scratch_path() -> PathBuf {
    env::temp_dir().join(format!("hashnote-{}.md", std::process::id()))
}

fn find_editor() -> Result<String> {
    for var in ["EDITOR", "VISUAL"] {
        if let Ok(editor) = env::var(var) {
            if !editor.is_empty() {
                return Ok(editor);
            }
        }
    }

    for editor in FALLBACK_EDITORS {
        if installed(editor) {
            return Ok((*editor).to_string());
        }
    }

    bail!("No editor found. Set $EDITOR, e.g. `export EDITOR=nano`.")
}

fn installed(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Ask the user to confirm a destructive action. Without a TTY on stdin
/// the answer is always no.
pub fn confirm(prompt: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        return Ok(false);
    }

    print!("{prompt} [y/N] ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_path_is_markdown_in_tmp() {
        let path = scratch_path();
        assert!(path.starts_with(env::temp_dir()));
        assert_eq!(path.extension().unwrap(), "md");
    }

    #[test]
    fn test_installed_rejects_missing_command() {
        assert!(!installed("definitely_not_a_real_command_12345"));
    }
}
