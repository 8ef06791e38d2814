//! Wires store clients into an [`AppState`] for the configured backend.

use crate::{
    clients::{
        document_store::{DynamoDocumentStore, SqliteDocumentStore},
        object_store::{LocalObjectStore, S3ObjectStore},
        relational::RelationalClient,
    },
    config::{AppConfig, Backend},
    services::{
        AppState, access_log_service::AccessLogService, product_service::ProductService,
    },
};
use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::fs;

const LOCAL_SCHEMA: &str = include_str!("../schema/sqlite.sql");

/// Build the application state for `cfg.backend`.
pub async fn build(cfg: &AppConfig) -> Result<AppState> {
    match cfg.backend {
        Backend::Aws => aws(cfg).await,
        Backend::Local => local(&cfg.data_dir, &cfg.s3_bucket).await,
    }
}

/// DynamoDB + S3 + PostgreSQL, credentials from the ambient AWS chain.
pub async fn aws(cfg: &AppConfig) -> Result<AppState> {
    let rds = cfg
        .rds
        .as_ref()
        .context("RDS settings are required for the aws backend")?;

    let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    tracing::info!(region = ?sdk_config.region(), "loaded aws configuration");

    let documents = Arc::new(DynamoDocumentStore::new(aws_sdk_dynamodb::Client::new(
        &sdk_config,
    )));
    let objects = Arc::new(S3ObjectStore::new(aws_sdk_s3::Client::new(&sdk_config)));
    let relational = RelationalClient::postgres(rds);

    Ok(AppState {
        products: ProductService::new(documents, objects, relational.clone(), &cfg.s3_bucket),
        access_logs: AccessLogService::new(relational),
    })
}

/// SQLite + filesystem under `data_dir`.
pub async fn local(data_dir: &Path, bucket: &str) -> Result<AppState> {
    let pool = open_local_pool(data_dir).await?;

    let documents = Arc::new(SqliteDocumentStore::new(pool));
    let objects = Arc::new(LocalObjectStore::new(data_dir.join("objects")));
    let relational = RelationalClient::sqlite(local_db_path(data_dir));

    Ok(AppState {
        products: ProductService::new(documents, objects, relational.clone(), bucket),
        access_logs: AccessLogService::new(relational),
    })
}

pub fn local_db_path(data_dir: &Path) -> PathBuf {
    data_dir.join("local.db")
}

/// Open the local SQLite database, creating it and its tables if needed.
pub async fn open_local_pool(data_dir: &Path) -> Result<Arc<SqlitePool>> {
    if !data_dir.exists() {
        fs::create_dir_all(data_dir)
            .await
            .with_context(|| format!("creating data directory {}", data_dir.display()))?;
        tracing::info!("Created data directory at {}", data_dir.display());
    }

    let db_path = local_db_path(data_dir);
    tracing::debug!("Opening local SQLite database at {}", db_path.display());

    let options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true);
    let pool = Arc::new(
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| format!("opening {}", db_path.display()))?,
    );

    apply_local_schema(&pool).await?;
    Ok(pool)
}

async fn apply_local_schema(db: &SqlitePool) -> Result<()> {
    let statements = LOCAL_SCHEMA
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    tracing::debug!("Applying {} local schema statements", statements.len());

    for stmt in statements {
        sqlx::query(stmt)
            .execute(db)
            .await
            .with_context(|| format!("applying local schema statement: {}", stmt))?;
    }

    Ok(())
}
