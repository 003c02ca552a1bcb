use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use domain::{IngestEvent, SiteId};
use futures::stream::Stream;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use crate::state::AppState;

/// Tells readers of a post when its listing has to be refetched.
pub async fn sse_handler(
    State(state): State<AppState>,
    Path((site_id_str, slug)): Path<(String, String)>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, (StatusCode, String)> {
    let site = SiteId::new(site_id_str).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let rx = state.tx_ingest.subscribe();
    tracing::info!("SSE Connected: site={} slug={}", site, slug);
    let stream = BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok(IngestEvent::CommentInvalidated {
            site_id,
            post_slug,
            comment_id,
        }) => {
            if site_id == site && post_slug == slug {
                Some(
                    Event::default()
                        .event("invalidate_comment")
                        .json_data(serde_json::json!({ "id": comment_id }))
                        .map_err(|e| {
                            tracing::error!("SSE serialization error: {}", e);
                            axum::Error::new(e)
                        }),
                )
            } else {
                None
            }
        }
        Ok(IngestEvent::PostInvalidated { site_id, post_slug }) => {
            if site_id == site && post_slug == slug {
                Some(Ok(Event::default().event("invalidate_post").data(post_slug)))
            } else {
                None
            }
        }
        Err(_lagged) => {
            tracing::warn!("SSE Client lagged for {}/{}", site, slug);
            None
        }
    });
    let keep_alive = KeepAlive::new().interval(std::time::Duration::from_secs(15));
    Ok(Sse::new(stream).keep_alive(keep_alive))
}
