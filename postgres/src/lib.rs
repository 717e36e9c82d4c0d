//! `PostgreSQL` tables for the ticket ledger.
//!
//! This crate provides the durable implementation of the [`Table`] trait from
//! `ticket-ledger-core`. Every ledger table has the same shape:
//!
//! ```sql
//! CREATE TABLE ticket_listings (
//!     key TEXT COLLATE "C" PRIMARY KEY,
//!     data BYTEA NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
//! );
//! ```
//!
//! The schema is created by [`migrate`], which runs the SQL files in `migrations/`.
//!
//! # Example
//!
//! ```ignore
//! use ticket_ledger_postgres::{connect, migrate, PoolSettings, PostgresTable};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = connect("postgres://localhost/ledger", &PoolSettings::default()).await?;
//!     migrate(&pool).await?;
//!     let listings = PostgresTable::new(pool, "ticket_listings")?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::{Duration, Instant};
use ticket_ledger_core::table::{Table, TableError, TableFuture, validate_table_name};

/// Connection pool sizing for [`connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections in the pool
    pub min_connections: u32,
    /// How long to wait for a connection before giving up
    pub connect_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// Open a connection pool.
///
/// # Errors
///
/// Returns [`TableError::Storage`] if the database cannot be reached.
pub async fn connect(database_url: &str, settings: &PoolSettings) -> Result<PgPool, TableError> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(settings.connect_timeout)
        .connect(database_url)
        .await
        .map_err(|e| TableError::Storage(format!("Failed to connect: {e}")))
}

/// Create the ledger tables if they do not exist yet.
///
/// # Errors
///
/// Returns [`TableError::Storage`] if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<(), TableError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| TableError::Storage(format!("Migration failed: {e}")))?;
    tracing::info!("Ledger migrations applied");
    Ok(())
}

/// PostgreSQL-backed [`Table`].
///
/// One instance per logical table; instances can share a pool.
#[derive(Clone, Debug)]
pub struct PostgresTable {
    pool: PgPool,
    table_name: String,
}

impl PostgresTable {
    /// Create a table handle using an existing connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidName`] if `table_name` is not a plain
    /// lowercase identifier (the name is spliced into SQL).
    pub fn new(pool: PgPool, table_name: impl Into<String>) -> Result<Self, TableError> {
        let table_name = table_name.into();
        validate_table_name(&table_name)?;
        Ok(Self { pool, table_name })
    }

    /// Get the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn record_query(&self, operation: &'static str, started: Instant, ok: bool) {
        metrics::histogram!(
            "ledger_storage_query_duration_seconds",
            "table" => self.table_name.clone(),
            "operation" => operation
        )
        .record(started.elapsed().as_secs_f64());
        if !ok {
            metrics::counter!(
                "ledger_storage_errors_total",
                "table" => self.table_name.clone(),
                "operation" => operation
            )
            .increment(1);
        }
    }

    fn storage_error(&self, operation: &str, error: &sqlx::Error) -> TableError {
        tracing::error!(table = %self.table_name, operation, error = %error, "Storage query failed");
        TableError::Storage(format!("Failed to {operation} in {}: {error}", self.table_name))
    }
}

impl Table for PostgresTable {
    fn name(&self) -> &str {
        &self.table_name
    }

    fn get(&self, key: &str) -> TableFuture<'_, Option<Vec<u8>>> {
        let key = key.to_string();
        Box::pin(async move {
            let started = Instant::now();
            let query = format!("SELECT data FROM {} WHERE key = $1", self.table_name);

            let result: Result<Option<(Vec<u8>,)>, sqlx::Error> = sqlx::query_as(&query)
                .bind(key)
                .fetch_optional(&self.pool)
                .await;
            self.record_query("get", started, result.is_ok());

            result
                .map(|row| row.map(|(data,)| data))
                .map_err(|e| self.storage_error("get", &e))
        })
    }

    fn insert(&self, key: &str, value: Vec<u8>) -> TableFuture<'_, ()> {
        let key = key.to_string();
        Box::pin(async move {
            let started = Instant::now();
            let query = format!(
                "INSERT INTO {} (key, data, updated_at)
                 VALUES ($1, $2, now())
                 ON CONFLICT (key) DO UPDATE
                 SET data = EXCLUDED.data, updated_at = now()",
                self.table_name
            );

            let result = sqlx::query(&query)
                .bind(key)
                .bind(value)
                .execute(&self.pool)
                .await;
            self.record_query("insert", started, result.is_ok());

            result
                .map(|_| ())
                .map_err(|e| self.storage_error("insert", &e))
        })
    }

    fn remove(&self, key: &str) -> TableFuture<'_, Option<Vec<u8>>> {
        let key = key.to_string();
        Box::pin(async move {
            let started = Instant::now();
            let query = format!("DELETE FROM {} WHERE key = $1 RETURNING data", self.table_name);

            let result: Result<Option<(Vec<u8>,)>, sqlx::Error> = sqlx::query_as(&query)
                .bind(key)
                .fetch_optional(&self.pool)
                .await;
            self.record_query("remove", started, result.is_ok());

            result
                .map(|row| row.map(|(data,)| data))
                .map_err(|e| self.storage_error("remove", &e))
        })
    }

    fn entries(&self) -> TableFuture<'_, Vec<(String, Vec<u8>)>> {
        Box::pin(async move {
            let started = Instant::now();
            let query = format!("SELECT key, data FROM {} ORDER BY key", self.table_name);

            let result: Result<Vec<(String, Vec<u8>)>, sqlx::Error> =
                sqlx::query_as(&query).fetch_all(&self.pool).await;
            self.record_query("entries", started, result.is_ok());

            result.map_err(|e| self.storage_error("enumerate", &e))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_unsafe_table_names() {
        let pool = PgPool::connect_lazy("postgres://localhost/unused").unwrap();
        assert!(PostgresTable::new(pool.clone(), "ticket_listings").is_ok());
        assert!(matches!(
            PostgresTable::new(pool, "listings; DROP TABLE x"),
            Err(TableError::InvalidName(_))
        ));
    }

    #[test]
    fn default_pool_settings() {
        let settings = PoolSettings::default();
        assert_eq!(settings.max_connections, 10);
        assert_eq!(settings.min_connections, 2);
        assert_eq!(settings.connect_timeout, Duration::from_secs(30));
    }
}
