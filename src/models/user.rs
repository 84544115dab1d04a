use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::users::{self, Role};

/// Public columns of a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub role: Role,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for UserProfile {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            name: model.name,
            role: model.role,
            image_url: model.image_url,
            created_at: model.created_at,
        }
    }
}

/// Author/editor badge embedded in content responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub role: Role,
    pub image_url: Option<String>,
}

impl From<&users::Model> for UserSummary {
    fn from(model: &users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username.clone(),
            name: model.name.clone(),
            role: model.role,
            image_url: model.image_url.clone(),
        }
    }
}

/// The acting principal for authorization decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    #[must_use]
    pub const fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

impl From<&UserProfile> for Actor {
    fn from(user: &UserProfile) -> Self {
        Self::new(user.id, user.role)
    }
}
