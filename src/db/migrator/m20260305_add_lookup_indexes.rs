use crate::entities::{comments, posts, prelude::*, sessions};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Session listing and logout-all filter by owner
        manager
            .create_index(
                Index::create()
                    .name("idx_sessions_user_id")
                    .table(Sessions)
                    .col(sessions::Column::UserId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_posts_created_at")
                    .table(Posts)
                    .col(posts::Column::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_posts_user_id")
                    .table(Posts)
                    .col(posts::Column::UserId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comments_post_id")
                    .table(Comments)
                    .col(comments::Column::PostId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_comments_post_id").table(Comments).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_posts_user_id").table(Posts).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_posts_created_at").table(Posts).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_sessions_user_id").table(Sessions).to_owned())
            .await
    }
}
