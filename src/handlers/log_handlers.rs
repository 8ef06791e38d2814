use crate::{errors::AppError, services::AppState};
use axum::{Json, extract::State, response::IntoResponse};
use tracing::info;

/// `GET /logs` — up to 50 access-log rows, newest first.
pub async fn list_logs(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    info!("getting access logs");
    let logs = state.access_logs.list().await?;
    Ok(Json(logs))
}
