//! Request-level orchestration over the store clients.

pub mod access_log_service;
pub mod product_service;

use crate::clients::{
    document_store::DocumentStoreError, object_store::ObjectStoreError,
    relational::RelationalError,
};
use access_log_service::AccessLogService;
use product_service::ProductService;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Missing fields")]
    MissingFields,
    #[error("Product not found")]
    ProductNotFound,
    #[error("No logs found")]
    NoLogsFound,
    #[error(transparent)]
    Documents(#[from] DocumentStoreError),
    #[error(transparent)]
    Objects(#[from] ObjectStoreError),
    #[error(transparent)]
    Relational(#[from] RelationalError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub products: ProductService,
    pub access_logs: AccessLogService,
}
