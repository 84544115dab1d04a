use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::user::UserSummary;
use crate::entities::{comments, posts, posts::ContentState};

#[derive(Debug, Clone, Serialize)]
pub struct PostDto {
    pub id: Uuid,
    pub body: String,
    pub author: Option<UserSummary>,
    pub edited_by: Option<Uuid>,
    pub editor: Option<UserSummary>,
    pub is_edited_by_admin: bool,
    pub state: ContentState,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostDto {
    #[must_use]
    pub fn from_model(
        model: posts::Model,
        author: Option<UserSummary>,
        editor: Option<UserSummary>,
    ) -> Self {
        Self {
            id: model.id,
            body: model.body,
            author,
            edited_by: model.edited_by,
            editor,
            is_edited_by_admin: model.is_edited_by_admin,
            is_deleted: model.state == ContentState::Deleted,
            state: model.state,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentDto {
    pub id: Uuid,
    pub post_id: Uuid,
    pub body: String,
    pub author: Option<UserSummary>,
    pub edited_by: Option<Uuid>,
    pub editor: Option<UserSummary>,
    pub is_edited_by_admin: bool,
    pub state: ContentState,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommentDto {
    #[must_use]
    pub fn from_model(
        model: comments::Model,
        author: Option<UserSummary>,
        editor: Option<UserSummary>,
    ) -> Self {
        Self {
            id: model.id,
            post_id: model.post_id,
            body: model.body,
            author,
            edited_by: model.edited_by,
            editor,
            is_edited_by_admin: model.is_edited_by_admin,
            is_deleted: model.state == ContentState::Deleted,
            state: model.state,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Comment listing, paginated with `has_more` rather than page counts.
#[derive(Debug, Clone, Serialize)]
pub struct CommentPage {
    pub items: Vec<CommentDto>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub has_more: bool,
}

/// Query for the post listing.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    pub page: u64,
    pub limit: u64,
    pub search: Option<String>,
    pub user_id: Option<Uuid>,
}
