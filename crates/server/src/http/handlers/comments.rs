use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::{Comment, SiteId};

use crate::state::AppState;

/// Approved comments of a post, served from the listing cache when present.
pub async fn list_comments(
    State(state): State<AppState>,
    Path((site_id_str, slug)): Path<(String, String)>,
) -> Result<Json<Vec<Comment>>, (StatusCode, String)> {
    let site_id =
        SiteId::new(site_id_str).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    if let Some(cached) = state.cache.get(&site_id, &slug).await {
        return Ok(Json(cached.as_ref().clone()));
    }
    let generation = state.cache.generation(&site_id, &slug).await;

    let comments = state
        .db
        .list_post_comments(site_id.as_str(), &slug)
        .await
        .map_err(|e| {
            tracing::error!("Error looking up comments for {}/{}: {:?}", site_id, slug, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error looking up comments".to_string(),
            )
        })?;

    if !state.cache.put(site_id, slug, generation, comments.clone()).await {
        tracing::debug!("Listing invalidated during lookup, not cached");
    }
    Ok(Json(comments))
}
