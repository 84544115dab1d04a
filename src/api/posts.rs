use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::Authenticated;
use super::validation::{normalize_search, parse_id, validate_page_params};
use super::{ApiError, ApiResponse, AppState, MessageResponse, PageParams};
use crate::models::Paginated;
use crate::models::content::{PostDto, PostQuery};

#[derive(Deserialize)]
pub struct ListPostsQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Deserialize)]
pub struct BodyRequest {
    #[serde(default)]
    pub body: String,
}

/// `GET /api/posts`
///
/// Newest-first page of posts visible to the caller.
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    auth: Authenticated,
    Query(params): Query<ListPostsQuery>,
) -> Result<Json<ApiResponse<Paginated<PostDto>>>, ApiError> {
    let content = &state.config().content;
    let (page, limit) = validate_page_params(
        &PageParams {
            page: params.page,
            limit: params.limit,
        },
        content.default_post_page_size,
        content.max_page_size,
    )?;

    let user_id = params
        .user_id
        .as_deref()
        .map(|raw| {
            uuid::Uuid::parse_str(raw.trim())
                .map_err(|_| ApiError::validation(format!("Invalid user_id: {raw}")))
        })
        .transpose()?;

    let query = PostQuery {
        page,
        limit,
        search: normalize_search(params.search.as_deref()),
        user_id,
    };

    let posts = state.post_service().list(auth.actor(), query).await?;
    Ok(Json(ApiResponse::success(posts)))
}

/// `POST /api/posts`
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    auth: Authenticated,
    Json(payload): Json<BodyRequest>,
) -> Result<Json<ApiResponse<PostDto>>, ApiError> {
    let post = state
        .post_service()
        .create(auth.actor(), &payload.body)
        .await?;
    Ok(Json(ApiResponse::success(post)))
}

/// `GET /api/posts/{id}`
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PostDto>>, ApiError> {
    let id = parse_id("Post", &id)?;
    let post = state.post_service().get(auth.actor(), id).await?;
    Ok(Json(ApiResponse::success(post)))
}

/// `PUT /api/posts/{id}`
///
/// Owners edit their own posts; admins may edit any active post, which marks
/// it as edited by an admin.
pub async fn edit_post(
    State(state): State<Arc<AppState>>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(payload): Json<BodyRequest>,
) -> Result<Json<ApiResponse<PostDto>>, ApiError> {
    let id = parse_id("Post", &id)?;
    let post = state
        .post_service()
        .edit(auth.actor(), id, &payload.body)
        .await?;
    Ok(Json(ApiResponse::success(post)))
}

/// `DELETE /api/posts/{id}`
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = parse_id("Post", &id)?;
    state.post_service().delete(auth.actor(), id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new("Post deleted"))))
}

/// `POST /api/posts/{id}/restore`
pub async fn restore_post(
    State(state): State<Arc<AppState>>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PostDto>>, ApiError> {
    let id = parse_id("Post", &id)?;
    let post = state.post_service().restore(auth.actor(), id).await?;
    Ok(Json(ApiResponse::success(post)))
}
