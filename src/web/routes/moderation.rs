// Reviewer endpoints, all gated by the memorial's admin token in `?token=`.

use crate::core::moderation::{MemoryItem, Slug};
use crate::web::error::ApiError;
use crate::web::state::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    #[serde(default)]
    pub token: Option<String>,
}

impl TokenQuery {
    pub fn token(&self) -> &str {
        self.token.as_deref().unwrap_or_default()
    }
}

/// `GET /api/pending/:slug?token=`
pub async fn list_pending(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<Vec<MemoryItem>>, ApiError> {
    let slug = Slug::parse(&slug)?;
    Ok(Json(state.moderation.list_pending(&slug, query.token()).await?))
}

/// `POST /api/approve/:slug/:id?token=`
pub async fn approve(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, String)>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<Value>, ApiError> {
    let slug = Slug::parse(&slug)?;
    let remaining = state.moderation.approve(&slug, &id, query.token()).await?;
    Ok(Json(json!({ "success": true, "remaining": remaining })))
}

/// `POST /api/reject/:slug/:id?token=`
pub async fn reject(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, String)>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<Value>, ApiError> {
    let slug = Slug::parse(&slug)?;
    let remaining = state.moderation.reject(&slug, &id, query.token()).await?;
    Ok(Json(json!({ "success": true, "remaining": remaining })))
}
