use crate::core::moderation::is_valid_photo_key;
use crate::web::error::ApiError;
use crate::web::state::AppState;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

/// `GET /api/photo/:key` - raw photo bytes with their stored content type.
pub async fn get_photo(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    if !is_valid_photo_key(&key) {
        return Err(ApiError::not_found("Photo not found"));
    }

    let photo = state
        .moderation
        .photo(&key)
        .await?
        .ok_or_else(|| ApiError::not_found("Photo not found"))?;

    // Keys are never reused, so the bytes behind one never change.
    // The photo is inert content: no sniffing, no scripts, no subresources.
    Ok((
        [
            (header::CONTENT_TYPE, photo.content_type),
            (
                header::CACHE_CONTROL,
                "public, max-age=31536000, immutable".to_string(),
            ),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
            (
                header::CONTENT_SECURITY_POLICY,
                "default-src 'none'; sandbox".to_string(),
            ),
        ],
        photo.bytes,
    )
        .into_response())
}
