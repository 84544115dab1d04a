//! `SeaORM` implementation of the `CommentService` trait.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::db::{CommentWithAuthor, Store};
use crate::models::content::{CommentDto, CommentPage};
use crate::models::user::{Actor, UserSummary};
use crate::services::comment_service::CommentService;
use crate::services::moderation::{
    Action, ContentError, check_delete, check_edit, check_restore, explain_miss, record_action,
};
use crate::services::validation;

pub struct SeaOrmCommentService {
    store: Store,
    config: Arc<Config>,
}

impl SeaOrmCommentService {
    #[must_use]
    pub const fn new(store: Store, config: Arc<Config>) -> Self {
        Self { store, config }
    }

    async fn to_dtos(&self, rows: Vec<CommentWithAuthor>) -> Result<Vec<CommentDto>, ContentError> {
        let editor_ids: Vec<Uuid> = rows
            .iter()
            .filter_map(|(comment, _)| comment.edited_by)
            .collect();
        let editors = self.store.user_summaries(&editor_ids).await?;

        Ok(rows
            .into_iter()
            .map(|(comment, author)| {
                let editor = comment.edited_by.and_then(|id| editors.get(&id).cloned());
                let author = author.as_ref().map(UserSummary::from);
                CommentDto::from_model(comment, author, editor)
            })
            .collect())
    }

    async fn load(&self, actor: Actor, id: Uuid) -> Result<CommentDto, ContentError> {
        let row = self
            .store
            .comment_repo()
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
impl CommentService for SeaOrmCommentService {
    async fn create(
        &self,
        actor: Actor,
        post_id: Uuid,
        body: &str,
    ) -> Result<CommentDto, ContentError> {
        let body = validation::body(body, self.config.content.comment_max_length)?;

        // Deleted posts are closed to new comments, for admins too.
        self.store
            .post_repo()
            .get_visible(post_id, false)
            .await?
            .ok_or(ContentError::NotFound)?;

        let comment = self
            .store
            .comment_repo()
            .create(post_id, actor.id, &body)
            .await?;
        info!(comment_id = %comment.id, post_id = %post_id, user_id = %actor.id, "Comment created");
        metrics::counter!("comments_created_total").increment(1);

        self.load(actor, comment.id).await
    }

    async fn list_for_post(
        &self,
        actor: Actor,
        post_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<CommentPage, ContentError> {
        let include_deleted = actor.is_admin();

        self.store
            .post_repo()
            .get_visible(post_id, include_deleted)
            .await?
            .ok_or(ContentError::NotFound)?;

        let (rows, total) = self
            .store
            .comment_repo()
            .list_for_post(post_id, page, limit, include_deleted)
            .await?;

        Ok(CommentPage {
            items: self.to_dtos(rows).await?,
            page,
            limit,
            total,
            has_more: page.saturating_mul(limit) < total,
        })
    }

    async fn edit(&self, actor: Actor, id: Uuid, body: &str) -> Result<CommentDto, ContentError> {
        let body = validation::body(body, self.config.content.comment_max_length)?;
        let repo = self.store.comment_repo();

        if repo.edit(id, actor, &body, Utc::now()).await? == 0 {
            let comment = repo.get(id).await?.ok_or(ContentError::NotFound)?;
            return Err(explain_miss(check_edit(
                actor,
                comment.user_id,
                comment.state,
            )));
        }

        record_action("comment", Action::Edit, actor.is_admin());
        info!(comment_id = %id, actor_id = %actor.id, role = %actor.role, "Comment edited");

        self.load(actor, id).await
    }

    async fn delete(&self, actor: Actor, id: Uuid) -> Result<(), ContentError> {
        let repo = self.store.comment_repo();

        if repo.soft_delete(id, actor, Utc::now()).await? == 0 {
            let comment = repo.get(id).await?.ok_or(ContentError::NotFound)?;
            return Err(explain_miss(check_delete(
                actor,
                comment.user_id,
                comment.state,
            )));
        }

        record_action("comment", Action::Delete, actor.is_admin());
        info!(comment_id = %id, actor_id = %actor.id, role = %actor.role, "Comment deleted");

        Ok(())
    }

    async fn restore(&self, actor: Actor, id: Uuid) -> Result<CommentDto, ContentError> {
        if !actor.is_admin() {
            return Err(ContentError::Forbidden);
        }

        let repo = self.store.comment_repo();
        if repo.restore(id, Utc::now()).await? == 0 {
            let comment = repo.get(id).await?.ok_or(ContentError::NotFound)?;
            return Err(explain_miss(check_restore(actor, comment.state)));
        }

        record_action("comment", Action::Restore, true);
        info!(comment_id = %id, actor_id = %actor.id, "Comment restored");

        self.load(actor, id).await
    }
}
