//! Key-value table abstraction for ledger persistence.
//!
//! The ledger keeps its state in a handful of independent tables (listings, sold
//! tickets, organizers, sequence counters). Each table is an ordered, durable map
//! from string keys to opaque byte values supporting:
//!
//! - point lookups
//! - insert / overwrite
//! - delete (returning the removed value)
//! - full enumeration in key order
//!
//! # Implementations
//!
//! - `PostgresTable` (in `ticket-ledger-postgres`): production storage
//! - `InMemoryTable` (in `ticket-ledger-testing`): fast, deterministic testing
//!
//! # Dyn Compatibility
//!
//! [`Table`] returns `Pin<Box<dyn Future>>` instead of using `async fn` so it can be
//! shared as `Arc<dyn Table>` between the components that own each table.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Boxed future returned by [`Table`] operations.
pub type TableFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TableError>> + Send + 'a>>;

/// Errors raised by the storage substrate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// The backing store failed (connection lost, query rejected, injected fault).
    #[error("Storage error: {0}")]
    Storage(String),

    /// A stored value could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A table name contains characters that are not allowed.
    #[error("Invalid table name: {0}")]
    InvalidName(String),
}

impl From<serde_json::Error> for TableError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// Ordered key-value table.
///
/// Implementations must be `Send + Sync`; the ledger shares them across request
/// handlers behind an `Arc`.
pub trait Table: Send + Sync {
    /// Name of the table, used in logs and error messages.
    fn name(&self) -> &str;

    /// Look up the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Storage`] if the backing store fails.
    fn get(&self, key: &str) -> TableFuture<'_, Option<Vec<u8>>>;

    /// Insert `value` under `key`, overwriting any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Storage`] if the backing store fails.
    fn insert(&self, key: &str, value: Vec<u8>) -> TableFuture<'_, ()>;

    /// Remove the value stored under `key`, returning it if it existed.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Storage`] if the backing store fails.
    fn remove(&self, key: &str) -> TableFuture<'_, Option<Vec<u8>>>;

    /// Enumerate every entry, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Storage`] if the backing store fails.
    fn entries(&self) -> TableFuture<'_, Vec<(String, Vec<u8>)>>;
}

/// Check that a table name is safe to splice into SQL and log lines.
///
/// Names must be non-empty and consist of lowercase ASCII letters, digits and
/// underscores, starting with a letter.
///
/// # Errors
///
/// Returns [`TableError::InvalidName`] for anything else.
pub fn validate_table_name(name: &str) -> Result<(), TableError> {
    let mut chars = name.chars();
    let valid_start = chars.next().is_some_and(|c| c.is_ascii_lowercase());
    let valid_rest = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if valid_start && valid_rest {
        Ok(())
    } else {
        Err(TableError::InvalidName(name.to_string()))
    }
}

/// A [`Table`] whose values are JSON-encoded `V`s.
///
/// This is what the ledger components hold: it keeps (de)serialization in one
/// place and hands out typed records.
pub struct TypedTable<V> {
    table: Arc<dyn Table>,
    _value: PhantomData<fn() -> V>,
}

impl<V> Clone for TypedTable<V> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
            _value: PhantomData,
        }
    }
}

impl<V> std::fmt::Debug for TypedTable<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedTable")
            .field("table", &self.table.name())
            .finish()
    }
}

impl<V> TypedTable<V>
where
    V: Serialize + DeserializeOwned,
{
    /// Wrap a raw table.
    #[must_use]
    pub fn new(table: Arc<dyn Table>) -> Self {
        Self {
            table,
            _value: PhantomData,
        }
    }

    /// Name of the underlying table.
    #[must_use]
    pub fn name(&self) -> &str {
        self.table.name()
    }

    /// Load and decode the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`] if the lookup fails or the stored bytes do not decode.
    pub async fn get(&self, key: &str) -> Result<Option<V>, TableError> {
        match self.table.get(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Encode and store `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`] if encoding or the write fails.
    pub async fn put(&self, key: &str, value: &V) -> Result<(), TableError> {
        let bytes = serde_json::to_vec(value)?;
        self.table.insert(key, bytes).await
    }

    /// Remove the value under `key`, returning the decoded value if present.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`] if the delete fails or the removed bytes do not decode.
    pub async fn remove(&self, key: &str) -> Result<Option<V>, TableError> {
        match self.table.remove(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Decode every entry, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`] if enumeration fails or any value does not decode.
    pub async fn entries(&self) -> Result<Vec<(String, V)>, TableError> {
        self.table
            .entries()
            .await?
            .into_iter()
            .map(|(key, bytes)| Ok((key, serde_json::from_slice(&bytes)?)))
            .collect()
    }

    /// Decode every value, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`] if enumeration fails or any value does not decode.
    pub async fn values(&self) -> Result<Vec<V>, TableError> {
        Ok(self
            .entries()
            .await?
            .into_iter()
            .map(|(_, value)| value)
            .collect())
    }
}
