/*
 * Responsibility
 * - GET /ping (疎通用)
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn ping() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"message": "pong"})))
}
