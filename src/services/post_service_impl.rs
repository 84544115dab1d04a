//! `SeaORM` implementation of the `PostService` trait.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::db::{PostWithAuthor, Store};
use crate::models::Paginated;
use crate::models::content::{PostDto, PostQuery};
use crate::models::user::{Actor, UserSummary};
use crate::services::moderation::{
    Action, ContentError, check_delete, check_edit, check_restore, explain_miss, record_action,
};
use crate::services::post_service::PostService;
use crate::services::validation;

pub struct SeaOrmPostService {
    store: Store,
    config: Arc<Config>,
}

impl SeaOrmPostService {
    #[must_use]
    pub const fn new(store: Store, config: Arc<Config>) -> Self {
        Self { store, config }
    }

    async fn to_dtos(&self, rows: Vec<PostWithAuthor>) -> Result<Vec<PostDto>, ContentError> {
        let editor_ids: Vec<Uuid> = rows.iter().filter_map(|(post, _)| post.edited_by).collect();
        let editors = self.store.user_summaries(&editor_ids).await?;

        Ok(rows
            .into_iter()
            .map(|(post, author)| {
                let editor = post.edited_by.and_then(|id| editors.get(&id).cloned());
                let author = author.as_ref().map(UserSummary::from);
                PostDto::from_model(post, author, editor)
            })
            .collect())
    }

    /// Loads a post as `actor` may see it.
    async fn load(&self, actor: Actor, id: Uuid) -> Result<PostDto, ContentError> {
        let row = self
            .store
            .post_repo()
            .get_visible(id, actor.is_admin())
            .await?
            .ok_or(ContentError::NotFound)?;

        self.to_dtos(vec![row])
            .await?
            .pop()
            .ok_or(ContentError::NotFound)
    }
}

#[async_trait]
impl PostService for SeaOrmPostService {
    async fn create(&self, actor: Actor, body: &str) -> Result<PostDto, ContentError> {
        let body = validation::body(body, self.config.content.post_max_length)?;

        let post = self.store.post_repo().create(actor.id, &body).await?;
        info!(post_id = %post.id, user_id = %actor.id, "Post created");
        metrics::counter!("posts_created_total").increment(1);

        self.load(actor, post.id).await
    }

    async fn get(&self, actor: Actor, id: Uuid) -> Result<PostDto, ContentError> {
        self.load(actor, id).await
    }

    async fn list(
        &self,
        actor: Actor,
        query: PostQuery,
    ) -> Result<Paginated<PostDto>, ContentError> {
        let (rows, total) = self
            .store
            .post_repo()
            .list(&query, actor.is_admin())
            .await?;

        let items = self.to_dtos(rows).await?;
        Ok(Paginated::new(items, query.page, query.limit, total))
    }

    async fn edit(&self, actor: Actor, id: Uuid, body: &str) -> Result<PostDto, ContentError> {
        let body = validation::body(body, self.config.content.post_max_length)?;
        let repo = self.store.post_repo();

        if repo.edit(id, actor, &body, Utc::now()).await? == 0 {
            let post = repo.get(id).await?.ok_or(ContentError::NotFound)?;
            return Err(explain_miss(check_edit(actor, post.user_id, post.state)));
        }

        record_action("post", Action::Edit, actor.is_admin());
        info!(post_id = %id, actor_id = %actor.id, role = %actor.role, "Post edited");

        self.load(actor, id).await
    }

    async fn delete(&self, actor: Actor, id: Uuid) -> Result<(), ContentError> {
        let repo = self.store.post_repo();

        if repo.soft_delete(id, actor, Utc::now()).await? == 0 {
            let post = repo.get(id).await?.ok_or(ContentError::NotFound)?;
            return Err(explain_miss(check_delete(actor, post.user_id, post.state)));
        }

        record_action("post", Action::Delete, actor.is_admin());
        info!(post_id = %id, actor_id = %actor.id, role = %actor.role, "Post deleted");

        Ok(())
    }

    async fn restore(&self, actor: Actor, id: Uuid) -> Result<PostDto, ContentError> {
        // Non-admins are rejected before touching the row; they cannot tell
        // whether the post exists.
        if !actor.is_admin() {
            return Err(ContentError::Forbidden);
        }

        let repo = self.store.post_repo();
        if repo.restore(id, Utc::now()).await? == 0 {
            let post = repo.get(id).await?.ok_or(ContentError::NotFound)?;
            return Err(explain_miss(check_restore(actor, post.state)));
        }

        record_action("post", Action::Restore, true);
        info!(post_id = %id, actor_id = %actor.id, "Post restored");

        self.load(actor, id).await
    }
}
