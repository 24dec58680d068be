//! Ordered key-set helpers
//!
//! Key lists on notebook, note, and tag records behave as ordered sets:
//! no duplicates, insertion order preserved unless a caller sorts them.
//! Every higher layer leans on these, so they live in one place.

use crate::key::Key;

/// Returns the position of `key` in `keys`, if present.
pub fn index_of_key(keys: &[Key], key: &Key) -> Option<usize> {
    keys.iter().position(|k| k == key)
}

pub fn contains_key(keys: &[Key], key: &Key) -> bool {
    index_of_key(keys, key).is_some()
}

/// Appends `key` unless it is already present.
pub fn add_key(keys: &mut Vec<Key>, key: Key) {
    if !contains_key(keys, &key) {
        keys.push(key);
    }
}

/// Removes `key` if present. Returns whether anything was removed.
pub fn remove_key(keys: &mut Vec<Key>, key: &Key) -> bool {
    match index_of_key(keys, key) {
        Some(i) => {
            keys.remove(i);
            true
        }
        None => false,
    }
}

/// Set union of two key lists, first-seen order preserved.
pub fn union_keys(a: &[Key], b: &[Key]) -> Vec<Key> {
    let mut union = a.to_vec();
    for key in b {
        add_key(&mut union, key.clone());
    }
    union
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Kind;

    fn keys(n: usize) -> Vec<Key> {
        (0..n).map(|i| Key::named(Kind::Note, format!("{i}"))).collect()
    }

    #[test]
    fn test_add_key_skips_duplicates() {
        let mut set = keys(2);
        add_key(&mut set, Key::named(Kind::Note, "1"));
        assert_eq!(set.len(), 2);

        add_key(&mut set, Key::named(Kind::Note, "9"));
        assert_eq!(set.len(), 3);
        assert_eq!(set[2].id(), "9");
    }

    #[test]
    fn test_remove_key() {
        let mut set = keys(3);
        assert!(remove_key(&mut set, &Key::named(Kind::Note, "1")));
        assert_eq!(set.len(), 2);
        assert!(!contains_key(&set, &Key::named(Kind::Note, "1")));

        assert!(!remove_key(&mut set, &Key::named(Kind::Note, "1")));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut set = keys(4);
        remove_key(&mut set, &Key::named(Kind::Note, "1"));
        let ids: Vec<&str> = set.iter().map(|k| k.id()).collect();
        assert_eq!(ids, vec!["0", "2", "3"]);
    }

    #[test]
    fn test_union_keys() {
        let a = keys(3);
        let b = vec![
            Key::named(Kind::Note, "2"),
            Key::named(Kind::Note, "4"),
        ];
        let union = union_keys(&a, &b);
        let ids: Vec<&str> = union.iter().map(|k| k.id()).collect();
        assert_eq!(ids, vec!["0", "1", "2", "4"]);
    }

    #[test]
    fn test_union_with_empty() {
        let a = keys(2);
        assert_eq!(union_keys(&a, &[]), a);
        assert_eq!(union_keys(&[], &a), a);
    }

    #[test]
    fn test_kind_distinguishes_keys() {
        let mut set = vec![Key::named(Kind::Note, "x")];
        add_key(&mut set, Key::named(Kind::Tag, "x"));
        assert_eq!(set.len(), 2);
    }
}
