use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use domain::{CommentFilter, FilterOption, SpamFilter, StatusFilter};
use serde::Serialize;

use crate::moderation::{ManagementView, UpdateForm};
use crate::state::AppState;

type AdminError = (StatusCode, String);

fn authorize(headers: &HeaderMap, admin_token: &str) -> Result<(), AdminError> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Missing Authorization header".into(),
        ))?;
    let expected_token = format!("Bearer {}", admin_token);
    if auth_header != expected_token {
        return Err((StatusCode::FORBIDDEN, "Invalid Admin Token".into()));
    }
    Ok(())
}

fn view_response(outcome: Result<ManagementView, ManagementView>) -> Response {
    match outcome {
        Ok(view) => Json(view).into_response(),
        Err(view) => (StatusCode::INTERNAL_SERVER_ERROR, Json(view)).into_response(),
    }
}

pub async fn list_comments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(filter): Query<CommentFilter>,
) -> Result<Json<ManagementView>, AdminError> {
    authorize(&headers, &state.admin_token)?;
    Ok(Json(state.moderation.list(filter).await))
}

pub async fn query_comments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(filter): Json<CommentFilter>,
) -> Result<Json<ManagementView>, AdminError> {
    authorize(&headers, &state.admin_token)?;
    Ok(Json(state.moderation.query(filter).await))
}

pub async fn bulk_delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(filter): Json<CommentFilter>,
) -> Result<Response, AdminError> {
    authorize(&headers, &state.admin_token)?;
    Ok(view_response(state.moderation.bulk_delete(filter).await))
}

pub async fn update_comments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<UpdateForm>,
) -> Result<Response, AdminError> {
    authorize(&headers, &state.admin_token)?;
    Ok(view_response(state.moderation.update(form).await))
}

#[derive(Serialize)]
pub struct FilterOptions {
    pub status: Vec<FilterOption>,
    pub spam: Vec<FilterOption>,
}

pub async fn filter_options(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<FilterOptions>, AdminError> {
    authorize(&headers, &state.admin_token)?;
    Ok(Json(FilterOptions {
        status: StatusFilter::options(),
        spam: SpamFilter::options(),
    }))
}
