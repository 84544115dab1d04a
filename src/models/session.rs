use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::{Actor, UserProfile};
use crate::entities::sessions;

/// Caller-supplied metadata recorded on the session row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Returned once, at session creation. The only place a token is echoed.
#[derive(Debug, Clone, Serialize)]
pub struct SessionGrant {
    pub id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl From<sessions::Model> for SessionGrant {
    fn from(model: sessions::Model) -> Self {
        Self {
            id: model.id,
            token: model.token,
            expires_at: model.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResult {
    pub user: UserProfile,
    pub session: SessionGrant,
}

/// The session half of a resolved identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<&sessions::Model> for SessionInfo {
    fn from(model: &sessions::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            expires_at: model.expires_at,
            created_at: model.created_at,
        }
    }
}

/// A bearer token resolved to its user and session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user: UserProfile,
    pub session: SessionInfo,
}

impl Identity {
    #[must_use]
    pub fn actor(&self) -> Actor {
        Actor::from(&self.user)
    }
}

/// Session listing entry. Never carries the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<sessions::Model> for SessionSummary {
    fn from(model: sessions::Model) -> Self {
        Self {
            id: model.id,
            ip_address: model.ip_address,
            user_agent: model.user_agent,
            created_at: model.created_at,
            expires_at: model.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshResult {
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
}
