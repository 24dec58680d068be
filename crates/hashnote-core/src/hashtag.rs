//! Hashtag extraction
//!
//! Derives tag names from free note text. A hashtag is a `#` (or the
//! fullwidth `＃`) at the start of the text or after whitespace, followed
//! by letters, digits, underscores, or hyphens.
//!
//! The scan is a pure function of the text and may return the same name
//! more than once; callers deduplicate.

use std::sync::LazyLock;

use regex::Regex;

static HASHTAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)[#＃]([\p{L}\p{N}_-]+)").expect("hashtag regex")
});

/// Extract raw tag names from a note body, in order of appearance.
pub fn extract_tag_names(body: &str) -> Vec<String> {
    HASHTAG
        .captures_iter(body)
        .map(|caps| caps[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_tags_in_order() {
        assert_eq!(extract_tag_names("hello #a #b"), vec!["a", "b"]);
    }

    #[test]
    fn test_no_tags() {
        assert!(extract_tag_names("no tags here").is_empty());
        assert!(extract_tag_names("").is_empty());
    }

    #[test]
    fn test_tag_at_start_of_text() {
        assert_eq!(extract_tag_names("#first word"), vec!["first"]);
    }

    #[test]
    fn test_mid_word_hash_is_not_a_tag() {
        assert!(extract_tag_names("a#b c2#d").is_empty());
    }

    #[test]
    fn test_punctuation_ends_a_tag() {
        assert_eq!(extract_tag_names("see #rust, and #cli."), vec!["rust", "cli"]);
    }

    #[test]
    fn test_fullwidth_hash() {
        assert_eq!(extract_tag_names("tagged ＃日本語"), vec!["日本語"]);
    }

    #[test]
    fn test_duplicates_are_preserved() {
        assert_eq!(extract_tag_names("#a then #a again"), vec!["a", "a"]);
    }

    #[test]
    fn test_underscores_and_hyphens() {
        assert_eq!(
            extract_tag_names("#snake_case #kebab-case"),
            vec!["snake_case", "kebab-case"]
        );
    }

    #[test]
    fn test_bare_hash_is_ignored() {
        assert!(extract_tag_names("just a # sign").is_empty());
    }

    #[test]
    fn test_case_is_preserved() {
        assert_eq!(extract_tag_names("#Rust #rust"), vec!["Rust", "rust"]);
    }
}
