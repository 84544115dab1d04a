use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::auth::Authenticated;
use super::posts::BodyRequest;
use super::validation::{parse_id, validate_page_params};
use super::{ApiError, ApiResponse, AppState, MessageResponse, PageParams};
use crate::models::content::{CommentDto, CommentPage};

/// `GET /api/posts/{id}/comments`
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    auth: Authenticated,
    Path(post_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<ApiResponse<CommentPage>>, ApiError> {
    let post_id = parse_id("Post", &post_id)?;
    let content = &state.config().content;
    let (page, limit) = validate_page_params(
        &params,
        content.default_comment_page_size,
        content.max_page_size,
    )?;

    let comments = state
        .comment_service()
        .list_for_post(auth.actor(), post_id, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(comments)))
}

/// `POST /api/posts/{id}/comments`
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    auth: Authenticated,
    Path(post_id): Path<String>,
    Json(payload): Json<BodyRequest>,
) -> Result<Json<ApiResponse<CommentDto>>, ApiError> {
    let post_id = parse_id("Post", &post_id)?;
    let comment = state
        .comment_service()
        .create(auth.actor(), post_id, &payload.body)
        .await?;
    Ok(Json(ApiResponse::success(comment)))
}

/// `PUT /api/comments/{id}`
pub async fn edit_comment(
    State(state): State<Arc<AppState>>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(payload): Json<BodyRequest>,
) -> Result<Json<ApiResponse<CommentDto>>, ApiError> {
    let id = parse_id("Comment", &id)?;
    let comment = state
        .comment_service()
        .edit(auth.actor(), id, &payload.body)
        .await?;
    Ok(Json(ApiResponse::success(comment)))
}

/// `DELETE /api/comments/{id}`
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = parse_id("Comment", &id)?;
    state.comment_service().delete(auth.actor(), id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Comment deleted",
    ))))
}

/// `POST /api/comments/{id}/restore`
pub async fn restore_comment(
    State(state): State<Arc<AppState>>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<CommentDto>>, ApiError> {
    let id = parse_id("Comment", &id)?;
    let comment = state.comment_service().restore(auth.actor(), id).await?;
    Ok(Json(ApiResponse::success(comment)))
}
