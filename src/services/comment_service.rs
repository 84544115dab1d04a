//! Domain service for comments.

use uuid::Uuid;

use crate::models::content::{CommentDto, CommentPage};
use crate::models::user::Actor;
use crate::services::moderation::ContentError;

/// Domain service trait for comments. Same lifecycle as posts; comments can
/// only be added to, and listed under, posts the actor can see.
#[async_trait::async_trait]
pub trait CommentService: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ContentError::NotFound`] if the parent post is absent or deleted.
    async fn create(
        &self,
        actor: Actor,
        post_id: Uuid,
        body: &str,
    ) -> Result<CommentDto, ContentError>;

    async fn list_for_post(
        &self,
        actor: Actor,
        post_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<CommentPage, ContentError>;

    async fn edit(&self, actor: Actor, id: Uuid, body: &str) -> Result<CommentDto, ContentError>;

    async fn delete(&self, actor: Actor, id: Uuid) -> Result<(), ContentError>;

    async fn restore(&self, actor: Actor, id: Uuid) -> Result<CommentDto, ContentError>;
}
