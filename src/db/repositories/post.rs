use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
    sea_query::{Expr, SimpleExpr},
};
use uuid::Uuid;

use crate::entities::posts::{self, ContentState};
use crate::entities::users;
use crate::models::content::PostQuery;
use crate::models::user::Actor;

pub type PostWithAuthor = (posts::Model, Option<users::Model>);

pub struct PostRepository {
    conn: DatabaseConnection,
}

impl PostRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, user_id: Uuid, body: &str) -> Result<posts::Model> {
        let now = Utc::now();

        let active = posts::ActiveModel {
            id: Set(Uuid::new_v4()),
            body: Set(body.to_string()),
            user_id: Set(user_id),
            edited_by: Set(None),
            is_edited_by_admin: Set(false),
            state: Set(ContentState::Active),
            created_at: Set(now),
            updated_at: Set(now),
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert post")
    }

    /// Raw row lookup regardless of state. Used to classify failed mutations.
    pub async fn get(&self, id: Uuid) -> Result<Option<posts::Model>> {
        posts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query post")
    }

    /// Post with author, hidden when deleted unless `include_deleted`.
    pub async fn get_visible(
        &self,
        id: Uuid,
        include_deleted: bool,
    ) -> Result<Option<PostWithAuthor>> {
        let mut query = posts::Entity::find_by_id(id).find_also_related(users::Entity);

        if !include_deleted {
            query = query.filter(posts::Column::State.eq(ContentState::Active));
        }

        query
            .one(&self.conn)
            .await
            .context("Failed to query post with author")
    }

    /// Newest-first page of posts. The visibility predicate applies to both
    /// the page and the total, so counts never reveal deleted posts.
    pub async fn list(
        &self,
        query: &PostQuery,
        include_deleted: bool,
    ) -> Result<(Vec<PostWithAuthor>, u64)> {
        let mut select = posts::Entity::find()
            .find_also_related(users::Entity)
            .order_by_desc(posts::Column::CreatedAt)
            .order_by_desc(posts::Column::Id);

        if !include_deleted {
            select = select.filter(posts::Column::State.eq(ContentState::Active));
        }

        if let Some(search) = query.search.as_deref() {
            select = select.filter(
                Condition::any()
                    .add(posts::Column::Body.contains(search))
                    .add(users::Column::Username.contains(search)),
            );
        }

        if let Some(user_id) = query.user_id {
            select = select.filter(posts::Column::UserId.eq(user_id));
        }

        let paginator = select.paginate(&self.conn, query.limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(query.page.saturating_sub(1)).await?;

        Ok((items, total))
    }

    /// Single conditional UPDATE: the row must be active and, for non-admins,
    /// owned by the actor. Attribution is computed from the row being updated.
    pub async fn edit(
        &self,
        id: Uuid,
        actor: Actor,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let mut update = posts::Entity::update_many()
            .col_expr(posts::Column::Body, Expr::value(body))
            .col_expr(posts::Column::EditedBy, Expr::value(actor.id))
            .col_expr(posts::Column::IsEditedByAdmin, edited_on_behalf(actor))
            .col_expr(posts::Column::UpdatedAt, Expr::value(now))
            .filter(posts::Column::Id.eq(id))
            .filter(posts::Column::State.eq(ContentState::Active));

        if !actor.is_admin() {
            update = update.filter(posts::Column::UserId.eq(actor.id));
        }

        let result = update
            .exec(&self.conn)
            .await
            .context("Failed to update post")?;
        Ok(result.rows_affected)
    }

    pub async fn soft_delete(&self, id: Uuid, actor: Actor, now: DateTime<Utc>) -> Result<u64> {
        let mut update = posts::Entity::update_many()
            .col_expr(posts::Column::State, Expr::value(ContentState::Deleted))
            .col_expr(posts::Column::UpdatedAt, Expr::value(now))
            .filter(posts::Column::Id.eq(id))
            .filter(posts::Column::State.eq(ContentState::Active));

        if !actor.is_admin() {
            update = update.filter(posts::Column::UserId.eq(actor.id));
        }

        let result = update
            .exec(&self.conn)
            .await
            .context("Failed to delete post")?;
        Ok(result.rows_affected)
    }

    /// Caller must already be authorized; only the state precondition is encoded here.
    pub async fn restore(&self, id: Uuid, now: DateTime<Utc>) -> Result<u64> {
        let result = posts::Entity::update_many()
            .col_expr(posts::Column::State, Expr::value(ContentState::Active))
            .col_expr(posts::Column::UpdatedAt, Expr::value(now))
            .filter(posts::Column::Id.eq(id))
            .filter(posts::Column::State.eq(ContentState::Deleted))
            .exec(&self.conn)
            .await
            .context("Failed to restore post")?;
        Ok(result.rows_affected)
    }
}

/// `is_edited_by_admin` value for an edit by `actor`: true only when an admin
/// touches a row owned by someone else.
fn edited_on_behalf(actor: Actor) -> SimpleExpr {
    if actor.is_admin() {
        Expr::col(posts::Column::UserId).ne(actor.id)
    } else {
        Expr::value(false)
    }
}
