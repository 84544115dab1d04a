use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::entities::{sessions, users};
use crate::models::session::ClientMeta;

/// Length of a hex-encoded session token (32 random bytes).
pub const TOKEN_LENGTH: usize = 64;

pub struct SessionRepository {
    conn: DatabaseConnection,
}

impl SessionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
        meta: &ClientMeta,
    ) -> Result<sessions::Model> {
        let now = Utc::now();

        let active = sessions::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            token: Set(token.to_string()),
            expires_at: Set(expires_at),
            ip_address: Set(meta.ip_address.clone()),
            user_agent: Set(meta.user_agent.clone()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert session")
    }

    /// Looks up a valid (active, unexpired) session by token, joined to its user.
    pub async fn find_valid_by_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<(sessions::Model, users::Model)>> {
        let row = sessions::Entity::find()
            .find_also_related(users::Entity)
            .filter(sessions::Column::Token.eq(token))
            .filter(sessions::Column::IsActive.eq(true))
            .filter(sessions::Column::ExpiresAt.gt(now))
            .one(&self.conn)
            .await
            .context("Failed to query session by token")?;

        Ok(row.and_then(|(session, user)| user.map(|user| (session, user))))
    }

    /// A valid session owned by `user_id`.
    pub async fn find_valid(
        &self,
        id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<sessions::Model>> {
        sessions::Entity::find_by_id(id)
            .filter(sessions::Column::UserId.eq(user_id))
            .filter(sessions::Column::IsActive.eq(true))
            .filter(sessions::Column::ExpiresAt.gt(now))
            .one(&self.conn)
            .await
            .context("Failed to query session")
    }

    /// Pushes the expiry of a valid session owned by `user_id` to `new_expiry`.
    /// Ownership and validity are part of the UPDATE predicate.
    pub async fn extend(
        &self,
        id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
        new_expiry: DateTime<Utc>,
    ) -> Result<Option<sessions::Model>> {
        let result = sessions::Entity::update_many()
            .col_expr(sessions::Column::ExpiresAt, Expr::value(new_expiry))
            .col_expr(sessions::Column::UpdatedAt, Expr::value(now))
            .filter(sessions::Column::Id.eq(id))
            .filter(sessions::Column::UserId.eq(user_id))
            .filter(sessions::Column::IsActive.eq(true))
            .filter(sessions::Column::ExpiresAt.gt(now))
            .exec(&self.conn)
            .await
            .context("Failed to extend session")?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        sessions::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to reload session")
    }

    /// Deactivates one session owned by `user_id`. Returns rows affected (0 or 1).
    pub async fn deactivate(&self, id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> Result<u64> {
        let result = sessions::Entity::update_many()
            .col_expr(sessions::Column::IsActive, Expr::value(false))
            .col_expr(sessions::Column::UpdatedAt, Expr::value(now))
            .filter(sessions::Column::Id.eq(id))
            .filter(sessions::Column::UserId.eq(user_id))
            .filter(sessions::Column::IsActive.eq(true))
            .exec(&self.conn)
            .await
            .context("Failed to deactivate session")?;

        Ok(result.rows_affected)
    }

    pub async fn deactivate_all(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<u64> {
        let result = sessions::Entity::update_many()
            .col_expr(sessions::Column::IsActive, Expr::value(false))
            .col_expr(sessions::Column::UpdatedAt, Expr::value(now))
            .filter(sessions::Column::UserId.eq(user_id))
            .filter(sessions::Column::IsActive.eq(true))
            .exec(&self.conn)
            .await
            .context("Failed to deactivate sessions")?;

        Ok(result.rows_affected)
    }

    /// Valid sessions of a user, newest first.
    pub async fn list_valid(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<sessions::Model>> {
        sessions::Entity::find()
            .filter(sessions::Column::UserId.eq(user_id))
            .filter(sessions::Column::IsActive.eq(true))
            .filter(sessions::Column::ExpiresAt.gt(now))
            .order_by_desc(sessions::Column::CreatedAt)
            .order_by_desc(sessions::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list sessions")
    }
}

/// Generate a random session token (64 character hex string)
#[must_use]
pub fn generate_session_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(TOKEN_LENGTH), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

/// Cheap shape check so garbage tokens never reach the database.
#[must_use]
pub fn is_well_formed_token(token: &str) -> bool {
    token.len() == TOKEN_LENGTH && token.bytes().all(|b| b.is_ascii_hexdigit())
}
