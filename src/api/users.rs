use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::{AdminUser, Authenticated};
use super::validation::{normalize_search, parse_id, validate_page};
use super::{ApiError, ApiResponse, AppState};
use crate::entities::users::Role;
use crate::models::Paginated;
use crate::models::user::UserProfile;
use crate::services::UpdateProfileRequest;

#[derive(Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<u64>,
    pub search: Option<String>,
}

#[derive(Deserialize)]
pub struct GrantRoleRequest {
    pub role: Role,
}

/// `GET /api/users`
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _auth: Authenticated,
    Query(params): Query<ListUsersQuery>,
) -> Result<Json<ApiResponse<Paginated<UserProfile>>>, ApiError> {
    let page = validate_page(params.page)?;
    let search = normalize_search(params.search.as_deref());

    let users = state
        .user_service()
        .list_users(page, search.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(users)))
}

/// `GET /api/users/me`
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let user = state.user_service().get_profile(identity.user.id).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// `PUT /api/users/me`
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    auth: Authenticated,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let user = state
        .user_service()
        .update_profile(auth.actor(), payload)
        .await?;
    Ok(Json(ApiResponse::success(user)))
}

/// `GET /api/users/{id}`
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    _auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let id = parse_id("User", &id)?;
    let user = state.user_service().get_profile(id).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// `PUT /api/users/{id}/role`
///
/// Admin-only. The sole HTTP path by which a role changes.
pub async fn grant_role(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(payload): Json<GrantRoleRequest>,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let id = parse_id("User", &id)?;
    let user = state
        .user_service()
        .grant_role(admin.actor(), id, payload.role)
        .await?;
    Ok(Json(ApiResponse::success(user)))
}
