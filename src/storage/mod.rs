//! Storage implementations.
//!
//! - `sql`: SQLite and PostgreSQL order stores sharing one implementation
//! - `mock`: in-memory store for tests
//! - `seed`: demo accounts and catalog

use std::sync::Arc;

use tracing::info;

use crate::config::{OrdersConfig, StorageConfig, StorageType};
use crate::error::{OrderError, Result};
use crate::interfaces::{CatalogWriter, OrderStore};
use crate::utils::order_number::RandomOrderNumbers;

pub mod mock;
pub mod schema;
pub mod seed;
pub mod sql;

pub use sql::{SqlDatabase, SqlOrderStore};

#[cfg(feature = "sqlite")]
pub use sql::sqlite::SqliteOrderStore;

#[cfg(feature = "postgres")]
pub use sql::postgres::PostgresOrderStore;

/// SQLite path that keeps the database in memory.
pub const SQLITE_MEMORY: &str = ":memory:";

/// Open a SQLite pool and apply migrations.
///
/// An in-memory database lives only as long as its connection, so it gets a
/// single connection that is never recycled.
#[cfg(feature = "sqlite")]
pub async fn open_sqlite(path: &str) -> Result<sqlx::SqlitePool> {
    use std::str::FromStr;
    use std::time::Duration;

    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

    let pool = if path == SQLITE_MEMORY {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        if let Some(parent) = std::path::Path::new(path).parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| OrderError::Persistence(format!("{}: {}", parent.display(), e)))?;
        }
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true);
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?
    };

    sqlx::migrate!("./migrations/sqlite").run(&pool).await?;
    Ok(pool)
}

/// Connect to PostgreSQL with backoff and apply migrations.
#[cfg(feature = "postgres")]
pub async fn open_postgres(uri: &str, max_connections: u32) -> Result<sqlx::PgPool> {
    use std::time::Duration;

    use backon::Retryable;
    use sqlx::postgres::PgPoolOptions;
    use tracing::warn;

    use crate::utils::retry::connection_backoff;

    let pool = (|| async {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(uri)
            .await
    })
    .retry(connection_backoff())
    .notify(|err: &sqlx::Error, dur: Duration| {
        warn!(error = %err, delay = ?dur, "Database connection failed, retrying");
    })
    .await?;

    sqlx::migrate!("./migrations/postgres").run(&pool).await?;
    Ok(pool)
}

async fn finish_store<S>(store: S, config: &StorageConfig) -> Result<Arc<dyn OrderStore>>
where
    S: OrderStore + CatalogWriter + 'static,
{
    if config.seed_demo {
        seed::seed_demo(&store).await?;
    }
    Ok(Arc::new(store))
}

/// Initialize storage based on configuration.
pub async fn init_storage(
    config: &StorageConfig,
    orders: &OrdersConfig,
) -> Result<Arc<dyn OrderStore>> {
    let numbers = Arc::new(RandomOrderNumbers);

    match config.storage_type {
        #[cfg(feature = "sqlite")]
        StorageType::Sqlite => {
            info!(storage = %config.storage_type, path = %config.sqlite.path, "Opening storage");
            let pool = open_sqlite(&config.sqlite.path).await?;
            let store = SqliteOrderStore::new(pool)
                .with_order_numbers(numbers, orders.order_number_attempts);
            finish_store(store, config).await
        }
        #[cfg(feature = "postgres")]
        StorageType::Postgres => {
            info!(storage = %config.storage_type, "Opening storage");
            let pool =
                open_postgres(&config.postgres.uri, config.postgres.max_connections).await?;
            let store = PostgresOrderStore::new(pool)
                .with_order_numbers(numbers, orders.order_number_attempts);
            finish_store(store, config).await
        }
        #[allow(unreachable_patterns)]
        other => {
            tracing::error!(storage = %other, "Storage type requested but its feature is not enabled");
            Err(OrderError::Persistence(format!(
                "storage type {} is not enabled in this build",
                other
            )))
        }
    }
}
