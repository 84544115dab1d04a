//! Domain service for authentication and session management.
//!
//! Handles login, registration, token resolution, and the session lifecycle.

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::entities::users::Role;
use crate::models::FieldError;
use crate::models::session::{AuthResult, ClientMeta, Identity, RefreshResult, SessionSummary};

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Username is already taken")]
    UsernameTaken,

    #[error("Validation failed: {}", crate::models::describe_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("Session not found")]
    SessionNotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<Vec<FieldError>> for AuthError {
    fn from(fields: Vec<FieldError>) -> Self {
        Self::Validation(fields)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub name: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and opens a new session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown username and for
    /// a wrong password alike.
    async fn login(
        &self,
        username: &str,
        password: &str,
        meta: ClientMeta,
    ) -> Result<AuthResult, AuthError>;

    /// Creates an account and opens its first session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] with one entry per offending field, or
    /// [`AuthError::UsernameTaken`].
    async fn register(
        &self,
        request: RegisterRequest,
        meta: ClientMeta,
    ) -> Result<AuthResult, AuthError>;

    /// Resolves a bearer token to the session and its user. Never fails:
    /// malformed, unknown, expired, and deactivated tokens all yield `None`.
    async fn resolve_token(&self, token: &str) -> Option<Identity>;

    /// Slides the expiry of one of the caller's valid sessions.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SessionNotFound`] whether the session is absent,
    /// invalid, or owned by someone else.
    async fn refresh_session(
        &self,
        session_id: Uuid,
        caller_id: Uuid,
    ) -> Result<RefreshResult, AuthError>;

    /// Deactivates one session of the caller, or all of them. Returns the
    /// number of sessions deactivated; a mismatched id is a silent no-op.
    async fn logout(
        &self,
        session_id: Uuid,
        caller_id: Uuid,
        logout_all: bool,
    ) -> Result<u64, AuthError>;

    /// The caller's valid sessions, newest first.
    async fn list_sessions(&self, caller_id: Uuid) -> Result<Vec<SessionSummary>, AuthError>;

    async fn get_session(
        &self,
        session_id: Uuid,
        caller_id: Uuid,
    ) -> Result<SessionSummary, AuthError>;
}
