//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::db::repositories::session::{generate_session_token, is_well_formed_token};
use crate::db::repositories::user::{
    NewUser, dummy_hash, hash_password_blocking, verify_against_dummy, verify_password,
};
use crate::db::Store;
use crate::entities::users::{self, Role};
use crate::models::session::{
    AuthResult, ClientMeta, Identity, RefreshResult, SessionGrant, SessionInfo, SessionSummary,
};
use crate::models::user::UserProfile;
use crate::services::auth_service::{AuthError, AuthService, RegisterRequest};
use crate::services::validation::{self, FieldErrors};

pub struct SeaOrmAuthService {
    store: Store,
    config: Arc<Config>,
    dummy_hash: OnceCell<String>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(store: Store, config: Arc<Config>) -> Self {
        Self {
            store,
            config,
            dummy_hash: OnceCell::new(),
        }
    }

    /// Spends one verification on unknown usernames, hashed with the configured params.
    async fn equalize_unknown_user(&self, password: &str) -> Result<(), AuthError> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| dummy_hash(&self.config.security))
            .await?;
        verify_against_dummy(hash, password).await;
        Ok(())
    }

    async fn open_session(
        &self,
        user: users::Model,
        meta: &ClientMeta,
    ) -> Result<AuthResult, AuthError> {
        let token = generate_session_token();
        let expires_at = Utc::now() + self.config.sessions.ttl();

        let session = self
            .store
            .session_repo()
            .create(user.id, &token, expires_at, meta)
            .await?;

        metrics::counter!("sessions_created_total").increment(1);

        Ok(AuthResult {
            user: UserProfile::from(user),
            session: SessionGrant::from(session),
        })
    }

    fn validate_registration(&self, request: &RegisterRequest) -> Result<Role, AuthError> {
        let mut errors = FieldErrors::new();
        validation::check_username(&mut errors, &request.username);
        validation::check_name(&mut errors, &request.name);
        validation::check_password(&mut errors, &request.password, &request.confirm_password);

        let role = request.role.unwrap_or_default();
        if role == Role::Admin && !self.config.security.allow_admin_self_registration {
            errors.push("role", "Admin accounts cannot be self-registered");
        }

        errors.finish()?;
        Ok(role)
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(
        &self,
        username: &str,
        password: &str,
        meta: ClientMeta,
    ) -> Result<AuthResult, AuthError> {
        let user = self.store.user_repo().get_by_username(username).await?;

        let Some(user) = user else {
            self.equalize_unknown_user(password).await?;
            metrics::counter!("auth_logins_total", "outcome" => "failure").increment(1);
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(&user.password_hash, password).await? {
            metrics::counter!("auth_logins_total", "outcome" => "failure").increment(1);
            return Err(AuthError::InvalidCredentials);
        }

        let result = self.open_session(user, &meta).await?;
        metrics::counter!("auth_logins_total", "outcome" => "success").increment(1);
        info!(user_id = %result.user.id, "User logged in");

        Ok(result)
    }

    async fn register(
        &self,
        request: RegisterRequest,
        meta: ClientMeta,
    ) -> Result<AuthResult, AuthError> {
        let role = self.validate_registration(&request)?;

        let password_hash = hash_password_blocking(&request.password, &self.config.security).await?;

        let user = self
            .store
            .user_repo()
            .create(NewUser {
                username: request.username,
                name: request.name.trim().to_string(),
                password_hash,
                role,
            })
            .await?
            .ok_or(AuthError::UsernameTaken)?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        metrics::counter!("auth_registrations_total").increment(1);

        self.open_session(user, &meta).await
    }

    async fn resolve_token(&self, token: &str) -> Option<Identity> {
        if !is_well_formed_token(token) {
            debug!("Ignoring malformed session token");
            return None;
        }

        match self
            .store
            .session_repo()
            .find_valid_by_token(token, Utc::now())
            .await
        {
            Ok(Some((session, user))) => Some(Identity {
                session: SessionInfo::from(&session),
                user: UserProfile::from(user),
            }),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Session lookup failed");
                None
            }
        }
    }

    async fn refresh_session(
        &self,
        session_id: Uuid,
        caller_id: Uuid,
    ) -> Result<RefreshResult, AuthError> {
        let now = Utc::now();
        let new_expiry = now + self.config.sessions.ttl();

        let session = self
            .store
            .session_repo()
            .extend(session_id, caller_id, now, new_expiry)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        metrics::counter!("sessions_refreshed_total").increment(1);

        Ok(RefreshResult {
            session_id: session.id,
            expires_at: session.expires_at,
        })
    }

    async fn logout(
        &self,
        session_id: Uuid,
        caller_id: Uuid,
        logout_all: bool,
    ) -> Result<u64, AuthError> {
        let now = Utc::now();
        let repo = self.store.session_repo();

        let revoked = if logout_all {
            repo.deactivate_all(caller_id, now).await?
        } else {
            repo.deactivate(session_id, caller_id, now).await?
        };

        metrics::counter!("sessions_revoked_total").increment(revoked);
        info!(user_id = %caller_id, revoked, logout_all, "User logged out");

        Ok(revoked)
    }

    async fn list_sessions(&self, caller_id: Uuid) -> Result<Vec<SessionSummary>, AuthError> {
        let sessions = self
            .store
            .session_repo()
            .list_valid(caller_id, Utc::now())
            .await?;

        Ok(sessions.into_iter().map(SessionSummary::from).collect())
    }

    async fn get_session(
        &self,
        session_id: Uuid,
        caller_id: Uuid,
    ) -> Result<SessionSummary, AuthError> {
        self.store
            .session_repo()
            .find_valid(session_id, caller_id, Utc::now())
            .await?
            .map(SessionSummary::from)
            .ok_or(AuthError::SessionNotFound)
    }
}
