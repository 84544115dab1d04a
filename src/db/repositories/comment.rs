use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
    sea_query::{Expr, SimpleExpr},
};
use uuid::Uuid;

use crate::entities::comments::{self, ContentState};
use crate::entities::users;
use crate::models::user::Actor;

pub type CommentWithAuthor = (comments::Model, Option<users::Model>);

pub struct CommentRepository {
    conn: DatabaseConnection,
}

impl CommentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, post_id: Uuid, user_id: Uuid, body: &str) -> Result<comments::Model> {
        let now = Utc::now();

        let active = comments::ActiveModel {
            id: Set(Uuid::new_v4()),
            body: Set(body.to_string()),
            post_id: Set(post_id),
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
            .context("Failed to insert comment")
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<comments::Model>> {
        comments::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query comment")
    }

    pub async fn get_visible(
        &self,
        id: Uuid,
        include_deleted: bool,
    ) -> Result<Option<CommentWithAuthor>> {
        let mut query = comments::Entity::find_by_id(id).find_also_related(users::Entity);

        if !include_deleted {
            query = query.filter(comments::Column::State.eq(ContentState::Active));
        }

        query
            .one(&self.conn)
            .await
            .context("Failed to query comment with author")
    }

    /// Comments of a post, newest first. Returns the page and the visible total.
    pub async fn list_for_post(
        &self,
        post_id: Uuid,
        page: u64,
        limit: u64,
        include_deleted: bool,
    ) -> Result<(Vec<CommentWithAuthor>, u64)> {
        let mut select = comments::Entity::find()
            .find_also_related(users::Entity)
            .filter(comments::Column::PostId.eq(post_id))
            .order_by_desc(comments::Column::CreatedAt)
            .order_by_desc(comments::Column::Id);

        if !include_deleted {
            select = select.filter(comments::Column::State.eq(ContentState::Active));
        }

        let paginator = select.paginate(&self.conn, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total))
    }

    pub async fn edit(
        &self,
        id: Uuid,
        actor: Actor,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let mut update = comments::Entity::update_many()
            .col_expr(comments::Column::Body, Expr::value(body))
            .col_expr(comments::Column::EditedBy, Expr::value(actor.id))
            .col_expr(comments::Column::IsEditedByAdmin, edited_on_behalf(actor))
            .col_expr(comments::Column::UpdatedAt, Expr::value(now))
            .filter(comments::Column::Id.eq(id))
            .filter(comments::Column::State.eq(ContentState::Active));

        if !actor.is_admin() {
            update = update.filter(comments::Column::UserId.eq(actor.id));
        }

        let result = update
            .exec(&self.conn)
            .await
            .context("Failed to update comment")?;
        Ok(result.rows_affected)
    }

    pub async fn soft_delete(&self, id: Uuid, actor: Actor, now: DateTime<Utc>) -> Result<u64> {
        let mut update = comments::Entity::update_many()
            .col_expr(comments::Column::State, Expr::value(ContentState::Deleted))
            .col_expr(comments::Column::UpdatedAt, Expr::value(now))
            .filter(comments::Column::Id.eq(id))
            .filter(comments::Column::State.eq(ContentState::Active));

        if !actor.is_admin() {
            update = update.filter(comments::Column::UserId.eq(actor.id));
        }

        let result = update
            .exec(&self.conn)
            .await
            .context("Failed to delete comment")?;
        Ok(result.rows_affected)
    }

    pub async fn restore(&self, id: Uuid, now: DateTime<Utc>) -> Result<u64> {
        let result = comments::Entity::update_many()
            .col_expr(comments::Column::State, Expr::value(ContentState::Active))
            .col_expr(comments::Column::UpdatedAt, Expr::value(now))
            .filter(comments::Column::Id.eq(id))
            .filter(comments::Column::State.eq(ContentState::Deleted))
            .exec(&self.conn)
            .await
            .context("Failed to restore comment")?;
        Ok(result.rows_affected)
    }
}

fn edited_on_behalf(actor: Actor) -> SimpleExpr {
    if actor.is_admin() {
        Expr::col(comments::Column::UserId).ne(actor.id)
    } else {
        Expr::value(false)
    }
}
