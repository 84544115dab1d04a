//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::db::Store;
use crate::entities::users::Role;
use crate::models::Paginated;
use crate::models::user::{Actor, UserProfile};
use crate::services::user_service::{UpdateProfileRequest, UserError, UserService};
use crate::services::validation::{self, FieldErrors};

pub struct SeaOrmUserService {
    store: Store,
    config: Arc<Config>,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, config: Arc<Config>) -> Self {
        Self { store, config }
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn get_profile(&self, id: Uuid) -> Result<UserProfile, UserError> {
        self.store
            .user_repo()
            .get_by_id(id)
            .await?
            .map(UserProfile::from)
            .ok_or(UserError::NotFound)
    }

    async fn update_profile(
        &self,
        actor: Actor,
        request: UpdateProfileRequest,
    ) -> Result<UserProfile, UserError> {
        let mut errors = FieldErrors::new();
        if let Some(name) = &request.name {
            validation::check_name(&mut errors, name);
        }
        if let Some(image_url) = &request.image_url {
            validation::check_image_url(&mut errors, image_url);
        }
        errors.finish()?;

        let name = request.name.map(|n| n.trim().to_string());
        let image_url = request.image_url.map(|u| u.trim().to_string());

        let user = self
            .store
            .user_repo()
            .update_profile(actor.id, name, image_url)
            .await?
            .ok_or(UserError::NotFound)?;

        Ok(UserProfile::from(user))
    }

    async fn list_users(
        &self,
        page: u64,
        search: Option<&str>,
    ) -> Result<Paginated<UserProfile>, UserError> {
        let limit = self.config.content.user_page_size;

        let (users, total) = self.store.user_repo().list(page, limit, search).await?;
        let items = users.into_iter().map(UserProfile::from).collect();

        Ok(Paginated::new(items, page, limit, total))
    }

    async fn grant_role(
        &self,
        actor: Actor,
        user_id: Uuid,
        role: Role,
    ) -> Result<UserProfile, UserError> {
        if !actor.is_admin() {
            return Err(UserError::Forbidden);
        }

        let user = self
            .store
            .user_repo()
            .set_role(user_id, role)
            .await?
            .ok_or(UserError::NotFound)?;

        info!(user_id = %user.id, role = %role, granted_by = %actor.id, "Role granted");

        Ok(UserProfile::from(user))
    }
}
