//! Key-addressed document tables.
//!
//! One `DocumentStore` serves every logical table; callers name the table
//! explicitly through [`Table`]. Items are JSON objects keyed by their `"id"`
//! string attribute.

use async_trait::async_trait;
use aws_sdk_dynamodb::{primitives::Blob, types::AttributeValue};
use base64::{Engine as _, engine::general_purpose};
use serde_json::{Map, Number, Value};
use sqlx::SqlitePool;
use std::{collections::HashMap, fmt, sync::Arc};
use thiserror::Error;
use tracing::debug;

/// A stored item.
pub type Document = Map<String, Value>;

/// Name of the key attribute shared by every table.
pub const KEY_ATTRIBUTE: &str = "id";

/// Logical document tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Table {
    Products,
    AccessLogs,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Products => "Products",
            Table::AccessLogs => "AccessLogs",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum DocumentStoreError {
    #[error("item for table `{0}` has no string `id` attribute")]
    MissingKey(Table),
    #[error("dynamodb request on table `{table}` failed: {source}")]
    DynamoDb {
        table: Table,
        #[source]
        source: Box<aws_sdk_dynamodb::Error>,
    },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("stored item is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the item whose `id` equals `key`, if any.
    async fn get_item(&self, table: Table, key: &str) -> DocumentStoreResult<Option<Document>>;

    /// Insert or replace `item`, keyed by its `id` attribute.
    async fn put_item(&self, table: Table, item: Document) -> DocumentStoreResult<()>;
}

fn item_key(table: Table, item: &Document) -> DocumentStoreResult<String> {
    item.get(KEY_ATTRIBUTE)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(DocumentStoreError::MissingKey(table))
}

/// DynamoDB backed document store.
#[derive(Clone)]
pub struct DynamoDocumentStore {
    client: aws_sdk_dynamodb::Client,
}

impl DynamoDocumentStore {
    pub fn new(client: aws_sdk_dynamodb::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DocumentStore for DynamoDocumentStore {
    async fn get_item(&self, table: Table, key: &str) -> DocumentStoreResult<Option<Document>> {
        let output = self
            .client
            .get_item()
            .table_name(table.name())
            .key(KEY_ATTRIBUTE, AttributeValue::S(key.to_string()))
            .send()
            .await
            .map_err(|err| DocumentStoreError::DynamoDb {
                table,
                source: Box::new(err.into()),
            })?;

        // DynamoDB answers a miss with an absent (never empty) item.
        Ok(output
            .item()
            .filter(|item| !item.is_empty())
            .map(attributes_to_document))
    }

    async fn put_item(&self, table: Table, item: Document) -> DocumentStoreResult<()> {
        item_key(table, &item)?;
        let attributes = document_to_attributes(item);

        self.client
            .put_item()
            .table_name(table.name())
            .set_item(Some(attributes))
            .send()
            .await
            .map_err(|err| DocumentStoreError::DynamoDb {
                table,
                source: Box::new(err.into()),
            })?;
        Ok(())
    }
}

fn document_to_attributes(doc: Document) -> HashMap<String, AttributeValue> {
    doc.into_iter()
        .map(|(name, value)| (name, json_to_attribute(value)))
        .collect()
}

fn attributes_to_document(attributes: &HashMap<String, AttributeValue>) -> Document {
    attributes
        .iter()
        .map(|(name, value)| (name.clone(), attribute_to_json(value)))
        .collect()
}

fn json_to_attribute(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s),
        Value::Array(items) => AttributeValue::L(items.into_iter().map(json_to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(document_to_attributes(map)),
    }
}

fn attribute_to_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => number_to_json(n),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(items) => Value::Array(items.iter().map(attribute_to_json).collect()),
        AttributeValue::M(map) => Value::Object(attributes_to_document(map)),
        AttributeValue::Ss(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
        AttributeValue::Ns(items) => Value::Array(items.iter().map(|n| number_to_json(n)).collect()),
        AttributeValue::B(blob) => blob_to_json(blob),
        AttributeValue::Bs(blobs) => Value::Array(blobs.iter().map(blob_to_json).collect()),
        _ => Value::Null,
    }
}

/// DynamoDB numbers are decimal strings; keep the string if serde_json can't hold it.
fn number_to_json(n: &str) -> Value {
    n.parse::<Number>()
        .map(Value::Number)
        .unwrap_or_else(|_| Value::String(n.to_string()))
}

fn blob_to_json(blob: &Blob) -> Value {
    Value::String(general_purpose::STANDARD.encode(blob.as_ref()))
}

/// SQLite backed document store used by the local backend.
///
/// Every table shares one `documents` relation keyed by `(table_name, id)`.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    db: Arc<SqlitePool>,
}

impl SqliteDocumentStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get_item(&self, table: Table, key: &str) -> DocumentStoreResult<Option<Document>> {
        let body: Option<String> =
            sqlx::query_scalar("SELECT body FROM documents WHERE table_name = ? AND id = ?")
                .bind(table.name())
                .bind(key)
                .fetch_optional(&*self.db)
                .await?;

        match body {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    async fn put_item(&self, table: Table, item: Document) -> DocumentStoreResult<()> {
        let key = item_key(table, &item)?;
        let body = serde_json::to_string(&item)?;

        sqlx::query(
            "INSERT INTO documents (table_name, id, body) VALUES (?, ?, ?)
             ON CONFLICT(table_name, id) DO UPDATE SET body = excluded.body",
        )
        .bind(table.name())
        .bind(&key)
        .bind(&body)
        .execute(&*self.db)
        .await?;

        debug!(%table, key = %key, "stored document");
        Ok(())
    }
}
