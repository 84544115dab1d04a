//! Domain service for posts.

use uuid::Uuid;

use crate::models::Paginated;
use crate::models::content::{PostDto, PostQuery};
use crate::models::user::Actor;
use crate::services::moderation::ContentError;

/// Domain service trait for posts.
///
/// Every read is filtered by the actor's visibility: deleted posts only
/// exist for admins.
#[async_trait::async_trait]
pub trait PostService: Send + Sync {
    async fn create(&self, actor: Actor, body: &str) -> Result<PostDto, ContentError>;

    async fn get(&self, actor: Actor, id: Uuid) -> Result<PostDto, ContentError>;

    async fn list(&self, actor: Actor, query: PostQuery)
    -> Result<Paginated<PostDto>, ContentError>;

    /// Replaces the body and stamps attribution.
    ///
    /// # Errors
    ///
    /// [`ContentError::Forbidden`] for a non-owner non-admin,
    /// [`ContentError::AlreadyDeleted`] for an admin on a deleted post,
    /// [`ContentError::NotFound`] when the post is absent or hidden.
    async fn edit(&self, actor: Actor, id: Uuid, body: &str) -> Result<PostDto, ContentError>;

    /// Soft-deletes a post. The body is retained.
    async fn delete(&self, actor: Actor, id: Uuid) -> Result<(), ContentError>;

    /// Admin-only: brings a deleted post back.
    async fn restore(&self, actor: Actor, id: Uuid) -> Result<PostDto, ContentError>;
}
