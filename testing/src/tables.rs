//! In-memory table implementations for tests.
//!
//! - [`InMemoryTable`]: `BTreeMap`-backed [`Table`], ordered like the real store
//! - [`FlakyTable`]: wraps another table and fails writes on demand

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use ticket_ledger_core::table::{Table, TableError, TableFuture};

/// In-memory table for fast, deterministic testing.
///
/// Cloning shares the underlying map, so a test can keep a handle and inspect
/// what the ledger wrote.
///
/// # Example
///
/// ```
/// use ticket_ledger_testing::InMemoryTable;
/// use ticket_ledger_core::table::Table;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let table = InMemoryTable::new("ticket_listings");
/// table.insert("listing-1", b"{}".to_vec()).await?;
/// assert!(table.contains_key("listing-1"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryTable {
    name: String,
    rows: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl InMemoryTable {
    /// Create a new empty table
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Number of stored rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Check if the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if a key exists without decoding it
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// All keys, in order
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl Table for InMemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> TableFuture<'_, Option<Vec<u8>>> {
        let key = key.to_string();
        Box::pin(async move {
            Ok(self
                .rows
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&key)
                .cloned())
        })
    }

    fn insert(&self, key: &str, value: Vec<u8>) -> TableFuture<'_, ()> {
        let key = key.to_string();
        Box::pin(async move {
            self.rows
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(key, value);
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> TableFuture<'_, Option<Vec<u8>>> {
        let key = key.to_string();
        Box::pin(async move {
            Ok(self
                .rows
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&key))
        })
    }

    fn entries(&self) -> TableFuture<'_, Vec<(String, Vec<u8>)>> {
        Box::pin(async move {
            Ok(self
                .rows
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect())
        })
    }
}

/// Table wrapper that fails writes on demand.
///
/// Reads always pass through. Used to check that a failed write leaves no
/// partial effect behind.
///
/// # Example
///
/// ```
/// use ticket_ledger_testing::{FlakyTable, InMemoryTable};
/// use ticket_ledger_core::table::Table;
///
/// # async fn example() {
/// let table = FlakyTable::new(InMemoryTable::new("sold_tickets"));
/// table.fail_inserts(true);
/// assert!(table.insert("k", vec![]).await.is_err());
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct FlakyTable<T> {
    inner: T,
    fail_inserts: Arc<AtomicBool>,
    fail_removes: Arc<AtomicBool>,
}

impl<T: Table> FlakyTable<T> {
    /// Wrap `inner`; all operations succeed until a failure switch is flipped
    #[must_use]
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            fail_inserts: Arc::new(AtomicBool::new(false)),
            fail_removes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every subsequent insert fail (or succeed again)
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent remove fail (or succeed again)
    pub fn fail_removes(&self, fail: bool) {
        self.fail_removes.store(fail, Ordering::SeqCst);
    }

    /// The wrapped table
    #[must_use]
    pub const fn inner(&self) -> &T {
        &self.inner
    }

    fn injected(&self, operation: &str) -> TableError {
        tracing::debug!(table = self.inner.name(), operation, "Injected storage fault");
        TableError::Storage(format!("injected {operation} failure on {}", self.inner.name()))
    }
}

impl<T: Table> Table for FlakyTable<T> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn get(&self, key: &str) -> TableFuture<'_, Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn insert(&self, key: &str, value: Vec<u8>) -> TableFuture<'_, ()> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            let error = self.injected("insert");
            return Box::pin(async move { Err(error) });
        }
        self.inner.insert(key, value)
    }

    fn remove(&self, key: &str) -> TableFuture<'_, Option<Vec<u8>>> {
        if self.fail_removes.load(Ordering::SeqCst) {
            let error = self.injected("remove");
            return Box::pin(async move { Err(error) });
        }
        self.inner.remove(key)
    }

    fn entries(&self) -> TableFuture<'_, Vec<(String, Vec<u8>)>> {
        self.inner.entries()
    }
}
