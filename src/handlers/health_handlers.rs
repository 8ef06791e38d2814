//! Liveness handler.
//!
//! - GET / -> fixed JSON greeting, no I/O

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;

/// `GET /`
///
/// Always returns 200 OK, whatever the state of the backing stores.
pub async fn index() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(AliveResponse {
            text: "I'm Alive....",
        }),
    )
}

#[derive(Serialize)]
struct AliveResponse {
    text: &'static str,
}
