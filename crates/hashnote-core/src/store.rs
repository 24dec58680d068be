//! Record store
//!
//! A key/value store over SQLite with a best-effort in-memory cache in
//! front of it. Records are serde-serialized JSON blobs addressed by
//! [`Key`].
//!
//! ## Transactions
//!
//! `run_in_transaction` gives all-or-nothing visibility across every key
//! touched inside the closure. The transaction handle logs each key it
//! attempts to write; on commit the cache is updated from that log, on
//! any failure exactly those keys are evicted so no stale entry can
//! outlive a rolled-back write.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = Store::open(&config)?;
//! store.put(&key, &record)?;
//!
//! store.run_in_transaction(|tx| {
//!     let note: Option<Note> = tx.get(&key)?;
//!     tx.put(&key, &updated)?;
//!     Ok::<_, StorageError>(())
//! })?;
//! ```

use std::collections::HashMap;

use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::key::Key;
use crate::storage::error::{classify_db_error, StorageError, StorageResult};
use crate::storage::schema::{init_schema, needs_init};

/// Cache-fronted record store
pub struct Store {
    conn: Connection,
    /// Best-effort cache of serialized records by storage key
    cache: HashMap<String, Vec<u8>>,
}

impl Store {
    /// Open or create the store at the configured location
    pub fn open(config: &Config) -> StorageResult<Self> {
        let path = config.sqlite_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path).map_err(classify_db_error)?;
        Self::init(conn)
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory().map_err(classify_db_error)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> StorageResult<Self> {
        if needs_init(&conn) {
            init_schema(&conn).map_err(classify_db_error)?;
        }
        Ok(Self {
            conn,
            cache: HashMap::new(),
        })
    }

    /// Get a record, reading through the cache
    pub fn get<T: DeserializeOwned>(&mut self, key: &Key) -> StorageResult<Option<T>> {
        let sk = key.storage_key();
        if let Some(bytes) = self.cache.get(&sk) {
            return Ok(Some(decode_record(&sk, bytes)?));
        }
        match select_value(&self.conn, &sk)? {
            Some(bytes) => {
                let record = decode_record(&sk, &bytes)?;
                self.cache.insert(sk, bytes);
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Get several records; every key must resolve
    pub fn get_multi<T: DeserializeOwned>(&mut self, keys: &[Key]) -> StorageResult<Vec<T>> {
        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            match self.get(key)? {
                Some(record) => records.push(record),
                None => {
                    return Err(StorageError::NotFound {
                        key: key.storage_key(),
                    })
                }
            }
        }
        Ok(records)
    }

    /// Check whether a record exists without decoding it
    pub fn contains(&self, key: &Key) -> StorageResult<bool> {
        let sk = key.storage_key();
        if self.cache.contains_key(&sk) {
            return Ok(true);
        }
        Ok(select_value(&self.conn, &sk)?.is_some())
    }

    /// Write a record and update the cache
    pub fn put<T: Serialize>(&mut self, key: &Key, record: &T) -> StorageResult<()> {
        let sk = key.storage_key();
        let bytes = encode_record(&sk, record)?;
        upsert_value(&self.conn, &sk, &bytes)?;
        self.cache.insert(sk, bytes);
        Ok(())
    }

    /// Write several records
    pub fn put_multi<T: Serialize>(&mut self, entries: &[(Key, T)]) -> StorageResult<()> {
        for (key, record) in entries {
            self.put(key, record)?;
        }
        Ok(())
    }

    /// Delete a record and drop it from the cache
    pub fn delete(&mut self, key: &Key) -> StorageResult<()> {
        let sk = key.storage_key();
        delete_value(&self.conn, &sk)?;
        self.cache.remove(&sk);
        Ok(())
    }

    /// Delete several records
    pub fn delete_multi(&mut self, keys: &[Key]) -> StorageResult<()> {
        for key in keys {
            self.delete(key)?;
        }
        Ok(())
    }

    /// Run `f` inside a single transaction with all-or-nothing visibility.
    ///
    /// On commit the cache is refreshed from the transaction's write log;
    /// on any failure (closure error or commit error) the touched cache
    /// entries are evicted instead.
    pub fn run_in_transaction<T, E>(
        &mut self,
        f: impl FnOnce(&mut StoreTx<'_>) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StorageError>,
    {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| E::from(classify_db_error(e)))?;
        let mut stx = StoreTx {
            tx,
            writes: Vec::new(),
        };

        match f(&mut stx) {
            Ok(out) => {
                let StoreTx { tx, writes } = stx;
                match tx.commit() {
                    Ok(()) => {
                        for (sk, value) in writes {
                            match value {
                                Some(bytes) => {
                                    self.cache.insert(sk, bytes);
                                }
                                None => {
                                    self.cache.remove(&sk);
                                }
                            }
                        }
                        Ok(out)
                    }
                    Err(err) => {
                        warn!("transaction commit failed: {err}");
                        evict_written(&mut self.cache, &writes);
                        Err(E::from(classify_db_error(err)))
                    }
                }
            }
            Err(err) => {
                let StoreTx { tx, writes } = stx;
                // Dropping the transaction rolls it back
                drop(tx);
                evict_written(&mut self.cache, &writes);
                Err(err)
            }
        }
    }
}

fn evict_written(cache: &mut HashMap<String, Vec<u8>>, writes: &[(String, Option<Vec<u8>>)]) {
    for (sk, _) in writes {
        if cache.remove(sk).is_some() {
            debug!(key = %sk, "evicted cache entry after failed transaction");
        }
    }
}

/// Handle for operations inside one transaction
pub struct StoreTx<'conn> {
    tx: Transaction<'conn>,
    /// Keys this transaction attempted to write: `Some` bytes for puts,
    /// `None` for deletes
    writes: Vec<(String, Option<Vec<u8>>)>,
}

impl StoreTx<'_> {
    /// Get a record within the transaction's view
    pub fn get<T: DeserializeOwned>(&self, key: &Key) -> StorageResult<Option<T>> {
        let sk = key.storage_key();
        match select_value(&self.tx, &sk)? {
            Some(bytes) => Ok(Some(decode_record(&sk, &bytes)?)),
            None => Ok(None),
        }
    }

    /// Get several records; every key must resolve
    pub fn get_multi<T: DeserializeOwned>(&self, keys: &[Key]) -> StorageResult<Vec<T>> {
        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            match self.get(key)? {
                Some(record) => records.push(record),
                None => {
                    return Err(StorageError::NotFound {
                        key: key.storage_key(),
                    })
                }
            }
        }
        Ok(records)
    }

    /// Check whether a record exists
    pub fn contains(&self, key: &Key) -> StorageResult<bool> {
        Ok(select_value(&self.tx, &key.storage_key())?.is_some())
    }

    /// Write a record
    pub fn put<T: Serialize>(&mut self, key: &Key, record: &T) -> StorageResult<()> {
        let sk = key.storage_key();
        let bytes = encode_record(&sk, record)?;
        self.writes.push((sk.clone(), Some(bytes.clone())));
        upsert_value(&self.tx, &sk, &bytes)
    }

    /// Write several records
    pub fn put_multi<T: Serialize>(&mut self, entries: &[(Key, T)]) -> StorageResult<()> {
        for (key, record) in entries {
            self.put(key, record)?;
        }
        Ok(())
    }

    /// Delete a record
    pub fn delete(&mut self, key: &Key) -> StorageResult<()> {
        let sk = key.storage_key();
        self.writes.push((sk.clone(), None));
        delete_value(&self.tx, &sk)
    }

    /// Delete several records
    pub fn delete_multi(&mut self, keys: &[Key]) -> StorageResult<()> {
        for key in keys {
            self.delete(key)?;
        }
        Ok(())
    }
}

fn encode_record<T: Serialize>(key: &str, record: &T) -> StorageResult<Vec<u8>> {
    serde_json::to_vec(record).map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })
}

fn decode_record<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> StorageResult<T> {
    serde_json::from_slice(bytes).map_err(|source| StorageError::Decode {
        key: key.to_string(),
        source,
    })
}

fn select_value(conn: &Connection, key: &str) -> StorageResult<Option<Vec<u8>>> {
    conn.query_row("SELECT value FROM records WHERE key = ?1", [key], |row| {
        row.get(0)
    })
    .optional()
    .map_err(classify_db_error)
}

fn upsert_value(conn: &Connection, key: &str, value: &[u8]) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO records (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )
    .map_err(classify_db_error)?;
    Ok(())
}

fn delete_value(conn: &Connection, key: &str) -> StorageResult<()> {
    conn.execute("DELETE FROM records WHERE key = ?1", [key])
        .map_err(classify_db_error)?;
    Ok(())
}
