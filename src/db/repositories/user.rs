use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use tokio::task;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::entities::users::{self, Role};

/// Avatar assigned to new accounts.
pub const DEFAULT_IMAGE_URL: &str = "/user.svg";

/// Fields required to insert a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub password_hash: String,
    pub role: Role,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<users::Model>> {
        users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")
    }

    /// Get user by username (includes the password hash; callers must not leak it)
    pub async fn get_by_username(&self, username: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")
    }

    pub async fn get_by_ids(&self, ids: &[Uuid]) -> Result<Vec<users::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        users::Entity::find()
            .filter(users::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await
            .context("Failed to query users by IDs")
    }

    /// Inserts a user. Returns `None` when the username is already taken.
    pub async fn create(&self, new_user: NewUser) -> Result<Option<users::Model>> {
        let now = chrono::Utc::now();

        let active = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(new_user.username),
            name: Set(new_user.name),
            password_hash: Set(new_user.password_hash),
            role: Set(new_user.role),
            image_url: Set(Some(DEFAULT_IMAGE_URL.to_string())),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(Some(model)),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(None)
            }
            Err(err) => Err(err).context("Failed to insert user"),
        }
    }

    /// Updates display name and/or avatar. `None` leaves a field untouched.
    pub async fn update_profile(
        &self,
        id: Uuid,
        name: Option<String>,
        image_url: Option<String>,
    ) -> Result<Option<users::Model>> {
        let Some(user) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(image_url) = image_url {
            active.image_url = Set(Some(image_url));
        }
        active.updated_at = Set(chrono::Utc::now());

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update user profile")?;
        Ok(Some(updated))
    }

    pub async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<users::Model>> {
        let Some(user) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        active.role = Set(role);
        active.updated_at = Set(chrono::Utc::now());

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update user role")?;
        Ok(Some(updated))
    }

    /// Directory listing ordered by display name. Returns the page and the total match count.
    pub async fn list(
        &self,
        page: u64,
        page_size: u64,
        search: Option<&str>,
    ) -> Result<(Vec<users::Model>, u64)> {
        let mut query = users::Entity::find().order_by_asc(users::Column::Name);

        if let Some(search) = search {
            query = query.filter(
                Condition::any()
                    .add(users::Column::Name.contains(search))
                    .add(users::Column::Username.contains(search)),
            );
        }

        let paginator = query.paginate(&self.conn, page_size);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total))
    }

    pub async fn list_all(&self) -> Result<Vec<users::Model>> {
        users::Entity::find()
            .order_by_asc(users::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list users")
    }
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the crate's default params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None, // output length (use default)
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Hashes on the blocking pool; Argon2 is CPU-bound.
pub async fn hash_password_blocking(password: &str, config: &SecurityConfig) -> Result<String> {
    let password = password.to_string();
    let config = config.clone();
    task::spawn_blocking(move || hash_password(&password, Some(&config)))
        .await
        .context("Password hashing task panicked")?
}

/// Verifies a password against a stored PHC string on the blocking pool.
/// Parameters are read from the hash itself, so older hashes keep verifying.
pub async fn verify_password(password_hash: &str, password: &str) -> Result<bool> {
    let password_hash = password_hash.to_string();
    let password = password.to_string();

    task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&password_hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

        Ok::<bool, anyhow::Error>(
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok(),
        )
    })
    .await
    .context("Password verification task panicked")?
}

/// Hash used when the username is unknown. Built with the same parameters as
/// real accounts so both login failures cost one equivalent verification.
pub async fn dummy_hash(config: &SecurityConfig) -> Result<String> {
    hash_password_blocking("agora-timing-equalizer", config).await
}

/// Burns one verification against `dummy_hash`; the outcome is discarded.
pub async fn verify_against_dummy(dummy_hash: &str, password: &str) {
    let _ = verify_password(dummy_hash, password).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_params() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
            ..SecurityConfig::default()
        }
    }

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password_blocking("hunter22", &fast_params())
            .await
            .unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(&hash, "hunter22").await.unwrap());
        assert!(!verify_password(&hash, "hunter23").await.unwrap());
    }

    #[tokio::test]
    async fn test_hashes_are_salted() {
        let a = hash_password("same-password", Some(&fast_params())).unwrap();
        let b = hash_password("same-password", Some(&fast_params())).unwrap();
        assert_ne!(a, b);
    }

    /// The `m=..,t=..,p=..` segment of a PHC string.
    fn phc_params(hash: &str) -> String {
        PasswordHash::new(hash).unwrap().params.to_string()
    }

    #[tokio::test]
    async fn test_dummy_hash_uses_account_params() {
        for config in [fast_params(), SecurityConfig::default()] {
            let real = hash_password_blocking("hunter22", &config).await.unwrap();
            let dummy = dummy_hash(&config).await.unwrap();

            assert_eq!(phc_params(&dummy), phc_params(&real));
            assert_eq!(
                phc_params(&dummy),
                format!(
                    "m={},t={},p={}",
                    config.argon2_memory_cost_kib, config.argon2_time_cost, config.argon2_parallelism
                )
            );
        }

        let dummy = dummy_hash(&fast_params()).await.unwrap();
        verify_against_dummy(&dummy, "anything").await;
    }

    #[tokio::test]
    async fn test_malformed_hash_is_an_error() {
        assert!(verify_password("not-a-phc-string", "x").await.is_err());
    }
}
