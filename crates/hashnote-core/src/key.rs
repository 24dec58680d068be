//! Typed record keys
//!
//! Every persisted record is addressed by a `Key`: a record kind plus an
//! opaque identifier. Notebook keys carry the owning user's id directly;
//! note and tag keys are minted as random UUIDs on first persistence.
//!
//! Keys cross the process boundary (CLI arguments, JSON output) as
//! bs58check strings, so callers never see or depend on the storage
//! layout.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while decoding a wire-encoded key
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("invalid key encoding: {0}")]
    Encoding(String),

    #[error("unknown key kind: {0}")]
    UnknownKind(String),

    #[error("malformed key: {0}")]
    Malformed(String),
}

/// The kind of record a key addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Notebook,
    Note,
    Tag,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Notebook => "notebook",
            Kind::Note => "note",
            Kind::Tag => "tag",
        }
    }

    fn parse(s: &str) -> Result<Self, KeyError> {
        match s {
            "notebook" => Ok(Kind::Notebook),
            "note" => Ok(Kind::Note),
            "tag" => Ok(Kind::Tag),
            other => Err(KeyError::UnknownKind(other.to_string())),
        }
    }
}

/// A typed record key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Key {
    kind: Kind,
    id: String,
}

impl Key {
    /// Mint a fresh, collision-free key for the given kind
    pub fn fresh(kind: Kind) -> Self {
        Self {
            kind,
            id: Uuid::new_v4().simple().to_string(),
        }
    }

    /// Create a key with a caller-supplied identifier (e.g. a user id)
    pub fn named(kind: Kind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The flat string this key occupies in the record store
    pub fn storage_key(&self) -> String {
        format!("{}/{}", self.kind.as_str(), self.id)
    }

    /// Encode this key as an opaque string for use over the wire
    pub fn encode(&self) -> String {
        bs58::encode(self.storage_key().as_bytes())
            .with_check()
            .into_string()
    }

    /// Decode a wire-encoded key
    pub fn decode(encoded: &str) -> Result<Self, KeyError> {
        let bytes = bs58::decode(encoded)
            .with_check(None)
            .into_vec()
            .map_err(|e| KeyError::Encoding(e.to_string()))?;
        let raw =
            String::from_utf8(bytes).map_err(|e| KeyError::Malformed(e.to_string()))?;
        let (kind, id) = raw
            .split_once('/')
            .ok_or_else(|| KeyError::Malformed(raw.clone()))?;
        if id.is_empty() {
            return Err(KeyError::Malformed(raw.clone()));
        }
        Ok(Self {
            kind: Kind::parse(kind)?,
            id: id.to_string(),
        })
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.storage_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_keys_are_unique() {
        let a = Key::fresh(Kind::Note);
        let b = Key::fresh(Kind::Note);
        assert_ne!(a, b);
        assert_eq!(a.kind(), Kind::Note);
    }

    #[test]
    fn test_named_key() {
        let key = Key::named(Kind::Notebook, "user-123");
        assert_eq!(key.id(), "user-123");
        assert_eq!(key.storage_key(), "notebook/user-123");
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let key = Key::fresh(Kind::Tag);
        let encoded = key.encode();
        let decoded = Key::decode(&encoded).unwrap();
        assert_eq!(key, decoded);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(Key::decode("not-a-key!!!").is_err());
        assert!(Key::decode("").is_err());
    }

    #[test]
    fn test_decode_rejects_corrupted_check() {
        let mut encoded = Key::fresh(Kind::Note).encode();
        // Flip the last character to break the checksum
        let last = encoded.pop().unwrap();
        encoded.push(if last == '1' { '2' } else { '1' });
        assert!(Key::decode(&encoded).is_err());
    }

    #[test]
    fn test_display_matches_storage_key() {
        let key = Key::named(Kind::Tag, "abc");
        assert_eq!(format!("{}", key), "tag/abc");
    }
}
