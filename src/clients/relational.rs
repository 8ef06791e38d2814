//! Relational client for the `access_logs` table.
//!
//! There is no pool: every service call opens its own connection with
//! [`RelationalClient::connect`], uses it, and hands it back through
//! [`RelationalConnection::finish`], which closes it on success and drops it
//! on failure.

use crate::{
    config::RdsConfig,
    models::access_log::{AccessAction, AccessLogEntry, UnknownAction},
};
use chrono::{DateTime, Utc};
use sqlx::{
    Connection, PgConnection, SqliteConnection,
    postgres::PgConnectOptions,
    sqlite::SqliteConnectOptions,
};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RelationalError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    UnknownAction(#[from] UnknownAction),
}

pub type RelationalResult<T> = Result<T, RelationalError>;

type AccessLogRow = (i64, String, String, DateTime<Utc>);

/// Knows how to open a connection; holds no connection itself.
#[derive(Clone, Debug)]
pub enum RelationalClient {
    Postgres(PgConnectOptions),
    Sqlite(SqliteConnectOptions),
}

impl RelationalClient {
    pub fn postgres(cfg: &RdsConfig) -> Self {
        RelationalClient::Postgres(
            PgConnectOptions::new()
                .host(&cfg.host)
                .port(cfg.port)
                .database(&cfg.database)
                .username(&cfg.user)
                .password(&cfg.password),
        )
    }

    pub fn sqlite(path: impl AsRef<Path>) -> Self {
        RelationalClient::Sqlite(
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true),
        )
    }

    /// Open a fresh connection for the duration of one call.
    pub async fn connect(&self) -> RelationalResult<RelationalConnection> {
        let conn = match self {
            RelationalClient::Postgres(opts) => {
                RelationalConnection::Postgres(PgConnection::connect_with(opts).await?)
            }
            RelationalClient::Sqlite(opts) => {
                RelationalConnection::Sqlite(SqliteConnection::connect_with(opts).await?)
            }
        };
        debug!("opened relational connection");
        Ok(conn)
    }
}

/// One open connection, scoped to a single service call.
pub enum RelationalConnection {
    Postgres(PgConnection),
    Sqlite(SqliteConnection),
}

impl RelationalConnection {
    /// Append one audit row.
    pub async fn insert_access_log(
        &mut self,
        product_id: &str,
        action: AccessAction,
        timestamp: DateTime<Utc>,
    ) -> RelationalResult<()> {
        match self {
            RelationalConnection::Postgres(conn) => {
                sqlx::query(
                    "INSERT INTO access_logs (product_id, action, timestamp) VALUES ($1, $2, $3)",
                )
                .bind(product_id)
                .bind(action.as_str())
                .bind(timestamp)
                .execute(&mut *conn)
                .await?;
            }
            RelationalConnection::Sqlite(conn) => {
                sqlx::query(
                    "INSERT INTO access_logs (product_id, action, timestamp) VALUES (?, ?, ?)",
                )
                .bind(product_id)
                .bind(action.as_str())
                .bind(timestamp)
                .execute(&mut *conn)
                .await?;
            }
        }
        Ok(())
    }

    /// The `limit` newest rows, newest first.
    pub async fn recent_access_logs(&mut self, limit: i64) -> RelationalResult<Vec<AccessLogEntry>> {
        let rows: Vec<AccessLogRow> = match self {
            RelationalConnection::Postgres(conn) => {
                sqlx::query_as(
                    "SELECT id, product_id, action, timestamp FROM access_logs
                     ORDER BY timestamp DESC, id DESC LIMIT $1",
                )
                .bind(limit)
                .fetch_all(&mut *conn)
                .await?
            }
            RelationalConnection::Sqlite(conn) => {
                sqlx::query_as(
                    "SELECT id, product_id, action, timestamp FROM access_logs
                     ORDER BY timestamp DESC, id DESC LIMIT ?",
                )
                .bind(limit)
                .fetch_all(&mut *conn)
                .await?
            }
        };

        rows.into_iter()
            .map(|(id, product_id, action, timestamp)| -> RelationalResult<_> {
                Ok(AccessLogEntry {
                    id,
                    product_id,
                    action: action.parse()?,
                    timestamp,
                })
            })
            .collect()
    }

    /// Release the connection, passing `result` through.
    ///
    /// On success the connection is closed gracefully and a close failure is
    /// reported; on failure it is dropped and the original error returned.
    pub async fn finish<T>(self, result: RelationalResult<T>) -> RelationalResult<T> {
        match result {
            Ok(value) => {
                self.close().await?;
                Ok(value)
            }
            Err(err) => {
                drop(self);
                Err(err)
            }
        }
    }

    async fn close(self) -> RelationalResult<()> {
        match self {
            RelationalConnection::Postgres(conn) => conn.close().await?,
            RelationalConnection::Sqlite(conn) => conn.close().await?,
        }
        debug!("closed relational connection");
        Ok(())
    }
}
