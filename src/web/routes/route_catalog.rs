// HTTP route handlers.
// Each API area gets its own handler file.

#[path = "admin.rs"]
pub mod admin;

#[path = "memories.rs"]
pub mod memories;

#[path = "moderation.rs"]
pub mod moderation;

#[path = "photos.rs"]
pub mod photos;

#[path = "review.rs"]
pub mod review;

use axum::Json;
use serde_json::{json, Value};

/// `GET /health` - liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
