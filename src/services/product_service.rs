//! ProductService — creates and fetches products.
//!
//! Creation touches three stores in sequence (blob upload, document write,
//! access-log insert). Nothing spans them: a failure part-way leaves the
//! earlier writes in place.

use super::{ServiceError, ServiceResult};
use crate::{
    clients::{
        document_store::{Document, DocumentStore, Table},
        object_store::{ObjectStore, public_url},
        relational::RelationalClient,
    },
    models::{
        access_log::AccessAction,
        product::{NewProduct, Product},
    },
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ProductService {
    documents: Arc<dyn DocumentStore>,
    objects: Arc<dyn ObjectStore>,
    relational: RelationalClient,
    bucket: String,
}

impl ProductService {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        objects: Arc<dyn ObjectStore>,
        relational: RelationalClient,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            documents,
            objects,
            relational,
            bucket: bucket.into(),
        }
    }

    /// Store a new product and return it.
    pub async fn create(&self, payload: NewProduct) -> ServiceResult<Product> {
        let id = Uuid::new_v4().to_string();
        let image_key = payload.image_key(&id);

        self.objects
            .upload(payload.image, &self.bucket, &image_key)
            .await?;

        let product = Product {
            image_url: public_url(&self.bucket, &image_key),
            id,
            name: payload.name,
            description: payload.description,
        };

        self.documents
            .put_item(Table::Products, product.clone().into_document())
            .await?;

        self.record_access(&product.id).await?;

        info!(product_id = %product.id, key = %image_key, "created product");
        Ok(product)
    }

    /// Fetch a product by its numeric route id.
    ///
    /// Products are keyed by UUID strings, so the id is looked up as its
    /// decimal string and never matches a product created by [`create`].
    /// A hit is still audited as `CREATE`.
    ///
    /// [`create`]: ProductService::create
    pub async fn get(&self, product_id: i64) -> ServiceResult<Document> {
        let key = product_id.to_string();

        let item = match self.documents.get_item(Table::Products, &key).await? {
            Some(item) if !item.is_empty() => item,
            _ => {
                warn!(product_id, "product not found");
                return Err(ServiceError::ProductNotFound);
            }
        };

        self.record_access(&key).await?;
        Ok(item)
    }

    async fn record_access(&self, product_id: &str) -> ServiceResult<()> {
        let mut conn = self.relational.connect().await?;
        let result = conn
            .insert_access_log(product_id, AccessAction::Create, Utc::now())
            .await;
        conn.finish(result).await?;
        Ok(())
    }
}
