//! Hashnote Core Library
//!
//! This crate provides the core functionality for hashnote, a personal
//! note-taking tool where tags are derived automatically from hashtag
//! markers inside note bodies.
//!
//! # Architecture
//!
//! The heart of the crate is the notebook consistency engine: it keeps a
//! bidirectional many-to-many index between notes and the tags extracted
//! from their bodies always correct, creates and destroys tag records as
//! membership changes, and performs every mutation inside a single store
//! transaction.
//!
//! # Quick Start
//!
//! ```text
//! let mut store = Store::open(&config)?;
//! let mut notebook = Notebook::open(&mut store, &config.notebook)?;
//!
//! // Save a note; tags #a and #b come into existence with it
//! let note = notebook.put(&mut store, Note::new("hello #a #b"))?;
//!
//! // Query derived views
//! let tags = notebook.tags(&mut store)?;
//! ```
//!
//! # Modules
//!
//! - `notebook`: consistency engine and query layer (main entry point)
//! - `models`: Notebook, Note, and Tag records
//! - `store`: transactional record store with a best-effort cache
//! - `hashtag`: tag extraction from note text
//! - `key` / `keyset`: typed keys and ordered key-set helpers
//! - `order`: frecency-based note sort-order preferences
//! - `config`: application configuration

pub mod config;
pub mod error;
pub mod hashtag;
pub mod key;
pub mod keyset;
pub mod models;
pub mod notebook;
pub mod order;
pub mod storage;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use hashtag::extract_tag_names;
pub use key::{Key, KeyError, Kind};
pub use models::{Note, Notebook, Tag};
pub use order::{NoteOrder, SortOrder};
pub use storage::{StorageError, StorageResult};
pub use store::{Store, StoreTx};
