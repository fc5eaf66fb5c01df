//! Database connection and pool management for the billing service.
//!
//! Provides SeaORM pool initialization with retry, a health check, and the
//! server-side clock used for all persisted timestamps. Client wall-clock
//! time is never trusted for balance snapshots or revocations.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr,
    Statement,
};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::AppConfig;

/// Errors that can occur during database setup.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {source}")]
    ConnectionFailed {
        #[from]
        source: sea_orm::DbErr,
    },
    #[error("Invalid database configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Initializes a database connection pool with the given configuration.
///
/// Retries transient connection failures with exponential backoff before
/// giving up.
pub async fn init_pool(cfg: &AppConfig) -> Result<DatabaseConnection> {
    if cfg.database_url.is_empty() {
        return Err(DatabaseError::InvalidConfiguration {
            message: "Database URL cannot be empty".to_string(),
        }
        .into());
    }

    let mut opt = ConnectOptions::new(&cfg.database_url);
    opt.max_connections(cfg.db_max_connections)
        .acquire_timeout(Duration::from_millis(cfg.db_acquire_timeout_ms))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let max_retries = 5;
    let mut retry_delay = Duration::from_millis(100);

    for attempt in 1..=max_retries {
        match Database::connect(opt.clone()).await {
            Ok(conn) => {
                tracing::info!(attempt, "Connected to database");
                return Ok(conn);
            }
            Err(e) => {
                if attempt == max_retries {
                    tracing::error!(
                        attempt,
                        error = %e,
                        "Giving up on database connection"
                    );
                    return Err(DatabaseError::ConnectionFailed { source: e }.into());
                }

                tracing::warn!(
                    attempt,
                    error = %e,
                    retry_in = ?retry_delay,
                    "Database connection attempt failed"
                );

                sleep(retry_delay).await;
                retry_delay *= 2;
            }
        }
    }

    unreachable!("connection loop either returns a pool or an error")
}

/// Health check for the database connection.
pub async fn health_check(db: &DatabaseConnection) -> Result<()> {
    let stmt = Statement::from_string(db.get_database_backend(), "SELECT 1".to_string());

    db.query_one(stmt)
        .await
        .context("Database health check failed")?;

    Ok(())
}

/// Reads the store's clock.
///
/// This is the single source of truth for persisted timestamps. Callers that
/// need one instant across several statements (the balance engine) read it
/// once and thread the value through. Works on a transaction as well as on
/// the pool.
pub async fn server_time<C: ConnectionTrait>(conn: &C) -> Result<DateTime<Utc>, DbErr> {
    let backend = conn.get_database_backend();

    // SQLite has no timestamptz type; format an UTC instant explicitly so the
    // value parses the same way on every backend.
    let sql = if backend == DatabaseBackend::Sqlite {
        "SELECT STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now') AS server_time"
    } else {
        "SELECT NOW() AS server_time"
    };

    let row = conn
        .query_one(Statement::from_string(backend, sql.to_string()))
        .await?
        .ok_or_else(|| DbErr::Custom("server time query returned no rows".to_string()))?;

    if backend == DatabaseBackend::Sqlite {
        let raw: String = row.try_get("", "server_time")?;
        raw.parse::<DateTime<Utc>>()
            .map_err(|e| DbErr::Custom(format!("unparseable server time '{raw}': {e}")))
    } else {
        let ts: sea_orm::prelude::DateTimeWithTimeZone = row.try_get("", "server_time")?;
        Ok(ts.with_timezone(&Utc))
    }
}
