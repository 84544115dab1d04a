//! Domain service for user profiles and the user directory.

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::entities::users::Role;
use crate::models::user::{Actor, UserProfile};
use crate::models::{FieldError, Paginated};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("Forbidden")]
    Forbidden,

    #[error("Validation failed: {}", crate::models::describe_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<Vec<FieldError>> for UserError {
    fn from(fields: Vec<FieldError>) -> Self {
        Self::Validation(fields)
    }
}

/// Partial profile update. Absent fields are left as they are.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub image_url: Option<String>,
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn get_profile(&self, id: Uuid) -> Result<UserProfile, UserError>;

    async fn update_profile(
        &self,
        actor: Actor,
        request: UpdateProfileRequest,
    ) -> Result<UserProfile, UserError>;

    /// Directory page ordered by display name, optionally filtered by a
    /// substring of the name or username.
    async fn list_users(
        &self,
        page: u64,
        search: Option<&str>,
    ) -> Result<Paginated<UserProfile>, UserError>;

    /// Changes another user's role.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Forbidden`] unless `actor` is an admin.
    async fn grant_role(
        &self,
        actor: Actor,
        user_id: Uuid,
        role: Role,
    ) -> Result<UserProfile, UserError>;
}
