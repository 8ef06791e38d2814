//! HTTP handlers for product creation and lookup.

use crate::{
    errors::AppError,
    models::product::NewProduct,
    services::{AppState, ServiceError},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Value, json};
use tracing::info;

/// `POST /products` — create a product from `{name, image, description}`.
pub async fn create_product(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let fields = body
        .as_object()
        .map(|o| o.keys().cloned().collect::<Vec<_>>());
    let image_len = body.get("image").and_then(|v| v.as_str()).map(str::len);
    info!(?fields, image_len, "received product payload");

    let payload = NewProduct::from_json(&body).ok_or(ServiceError::MissingFields)?;
    state.products.create(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Product created successfully" })),
    ))
}

/// `GET /products/{id}` — return the stored item as-is.
///
/// Only unsigned integer ids route here; any other segment is a plain 404.
pub async fn get_product(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let product_id = parse_route_id(&raw_id).ok_or_else(|| AppError::not_found("Not Found"))?;

    info!(product_id, "getting product");
    let item = state.products.get(product_id).await?;
    Ok(Json(item))
}

/// Digits only, so signs and whitespace never reach the lookup.
fn parse_route_id(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}
