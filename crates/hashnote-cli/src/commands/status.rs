//! Status command handler

use anyhow::Result;

use hashnote_core::{Config, Notebook};

use crate::output::{Output, OutputFormat};

/// Show notebook and storage status
pub fn show(config: &Config, notebook: &Notebook, output: &Output) -> Result<()> {
    let db_path = config.sqlite_path();
    let db_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "notebook": notebook.id,
                    "storage": {
                        "path": db_path,
                        "size": db_size,
                    },
                    "counts": {
                        "notes": notebook.note_keys.len(),
                        "tags": notebook.tag_keys.len(),
                        "untagged": notebook.untagged_note_keys.len(),
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", notebook.id);
        }
        OutputFormat::Human => {
            println!("Hashnote Status");
            println!("===============");
            println!();
            println!("Notebook: {}", notebook.id);
            println!();
            println!("Storage:");
            println!("  Location: {}", db_path.display());
            println!("  Size:     {}", human_size(db_size));
            println!();
            println!("Contents:");
            println!("  Notes:    {}", notebook.note_keys.len());
            println!("  Tags:     {}", notebook.tag_keys.len());
            println!("  Untagged: {}", notebook.untagged_note_keys.len());
        }
    }

    Ok(())
}

fn human_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(3 * 1024 * 1024), "3.0 MB");
    }
}
