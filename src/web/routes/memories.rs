// Public endpoints: submit a memory, list approved memories.

use crate::core::moderation::{MemoryItem, MemorySubmission, Photo, Slug};
use crate::web::error::ApiError;
use crate::web::state::AppState;
use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde_json::{json, Value};

/// `POST /api/memories/:slug` with multipart fields `name`, `relationship`,
/// `memory` and an optional `photo` file.
pub async fn submit_memory(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let slug = Slug::parse(&slug)?;
    let mut submission = MemorySubmission::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "name" => submission.name = Some(field.text().await?),
            "relationship" => submission.relationship = Some(field.text().await?),
            "memory" => submission.memory = field.text().await?,
            "photo" => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await?;
                submission.photo = Some(Photo {
                    bytes: bytes.to_vec(),
                    content_type,
                });
            }
            _ => {}
        }
    }

    let id = state.moderation.submit(&slug, submission).await?;

    Ok(Json(json!({
        "success": true,
        "id": id,
        "message": "Thank you. Your memory will appear once it has been reviewed.",
    })))
}

/// `GET /api/memories/:slug` - approved memories, oldest approval first.
pub async fn list_memories(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<MemoryItem>>, ApiError> {
    let slug = Slug::parse(&slug)?;
    Ok(Json(state.moderation.list_approved(&slug).await?))
}
