use crate::core::moderation::{AdminProvisioning, Slug};
use crate::web::error::ApiError;
use crate::web::state::AppState;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};

/// Header carrying the operator master key.
pub const MASTER_KEY_HEADER: &str = "x-master-key";

/// `POST /api/admin/:slug` - issue a new admin token for a memorial.
///
/// The JSON body (`{"email": ..., "name": ...}`) is optional.
pub async fn provision_admin(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let slug = Slug::parse(&slug)?;
    let master_key = headers
        .get(MASTER_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let contact = if body.iter().all(u8::is_ascii_whitespace) {
        AdminProvisioning::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|_| ApiError::bad_request("Request body must be JSON with optional email and name"))?
    };

    let token = state
        .moderation
        .provision_admin(&slug, contact, master_key)
        .await?;
    let review_url = format!("{}?token={}", state.moderation.review_url(&slug), token);

    Ok(Json(json!({
        "success": true,
        "slug": slug,
        "token": token,
        "reviewUrl": review_url,
    })))
}
