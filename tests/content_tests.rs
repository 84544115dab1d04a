use agora::config::Config;
use agora::db::Store;
use agora::entities::posts::ContentState;
use agora::entities::users::Role;
use agora::models::content::PostQuery;
use agora::models::session::ClientMeta;
use agora::models::user::Actor;
use agora::services::{ContentError, RegisterRequest, UserError};
use agora::state::SharedState;
use uuid::Uuid;

async fn spawn_state() -> SharedState {
    let mut config = Config::default();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let db_path = std::env::temp_dir().join(format!("agora-content-{}.db", Uuid::new_v4()));
    let store = Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("Failed to open store");
    SharedState::with_store(config, store)
}

async fn user(state: &SharedState, username: &str) -> Actor {
    let auth = state
        .auth_service
        .register(
            RegisterRequest {
                username: username.to_string(),
                name: username.to_uppercase(),
                password: "secret1".to_string(),
                confirm_password: "secret1".to_string(),
                role: None,
            },
            ClientMeta::default(),
        )
        .await
        .expect("registration failed");
    Actor::new(auth.user.id, Role::User)
}

async fn admin(state: &SharedState, username: &str) -> Actor {
    let actor = user(state, username).await;
    state
        .store
        .user_repo()
        .set_role(actor.id, Role::Admin)
        .await
        .unwrap()
        .expect("user exists");
    Actor::new(actor.id, Role::Admin)
}

fn first_page() -> PostQuery {
    PostQuery {
        page: 1,
        limit: 10,
        ..PostQuery::default()
    }
}

#[tokio::test]
async fn test_admin_moderation_walkthrough() {
    let state = spawn_state().await;
    let author = user(&state, "author").await;
    let moderator = admin(&state, "moderator").await;
    let posts = &state.post_service;

    let post = posts.create(author, "  Hello world  ").await.unwrap();
    assert_eq!(post.body, "Hello world");
    assert_eq!(post.author.as_ref().map(|a| a.id), Some(author.id));
    assert!(!post.is_edited_by_admin);
    assert!(post.edited_by.is_none());

    let edited = posts.edit(moderator, post.id, "Hello [edited]").await.unwrap();
    assert_eq!(edited.body, "Hello [edited]");
    assert_eq!(edited.edited_by, Some(moderator.id));
    assert!(edited.is_edited_by_admin);
    assert_eq!(edited.editor.as_ref().map(|e| e.id), Some(moderator.id));

    posts.delete(moderator, post.id).await.unwrap();

    let hidden = posts.get(author, post.id).await.unwrap_err();
    assert!(matches!(hidden, ContentError::NotFound));

    let listed = posts.list(author, first_page()).await.unwrap();
    assert_eq!(listed.total, 0);
    assert!(listed.items.is_empty());

    let seen = posts.get(moderator, post.id).await.unwrap();
    assert!(seen.is_deleted);
    assert_eq!(seen.state, ContentState::Deleted);

    let restored = posts.restore(moderator, post.id).await.unwrap();
    assert!(!restored.is_deleted);
    assert_eq!(restored.body, "Hello [edited]");

    let visible = posts.get(author, post.id).await.unwrap();
    assert_eq!(visible.id, post.id);
}

#[tokio::test]
async fn test_edit_attribution() {
    let state = spawn_state().await;
    let owner = user(&state, "owner").await;
    let moderator = admin(&state, "mod").await;
    let posts = &state.post_service;

    let post = posts.create(owner, "first").await.unwrap();

    let by_owner = posts.edit(owner, post.id, "second").await.unwrap();
    assert_eq!(by_owner.edited_by, Some(owner.id));
    assert!(!by_owner.is_edited_by_admin);

    let by_admin = posts.edit(moderator, post.id, "third").await.unwrap();
    assert!(by_admin.is_edited_by_admin);

    // A later owner edit clears the admin flag.
    let by_owner_again = posts.edit(owner, post.id, "fourth").await.unwrap();
    assert_eq!(by_owner_again.edited_by, Some(owner.id));
    assert!(!by_owner_again.is_edited_by_admin);

    let own_post = posts.create(moderator, "admin's own").await.unwrap();
    let self_edit = posts.edit(moderator, own_post.id, "still mine").await.unwrap();
    assert_eq!(self_edit.edited_by, Some(moderator.id));
    assert!(!self_edit.is_edited_by_admin);
}

#[tokio::test]
async fn test_stranger_cannot_touch_foreign_items() {
    let state = spawn_state().await;
    let owner = user(&state, "owner").await;
    let stranger = user(&state, "stranger").await;
    let posts = &state.post_service;
    let comments = &state.comment_service;

    let post = posts.create(owner, "mine").await.unwrap();
    let comment = comments.create(owner, post.id, "also mine").await.unwrap();

    assert!(matches!(
        posts.edit(stranger, post.id, "hijacked").await.unwrap_err(),
        ContentError::Forbidden
    ));
    assert!(matches!(
        posts.delete(stranger, post.id).await.unwrap_err(),
        ContentError::Forbidden
    ));
    assert!(matches!(
        comments.edit(stranger, comment.id, "hijacked").await.unwrap_err(),
        ContentError::Forbidden
    ));
    assert!(matches!(
        comments.delete(stranger, comment.id).await.unwrap_err(),
        ContentError::Forbidden
    ));

    let unchanged = posts.get(stranger, post.id).await.unwrap();
    assert_eq!(unchanged.body, "mine");
    assert!(unchanged.edited_by.is_none());
    assert!(!unchanged.is_deleted);

    let page = comments.list_for_post(stranger, post.id, 1, 20).await.unwrap();
    assert_eq!(page.items[0].body, "also mine");
}

#[tokio::test]
async fn test_restore_rules() {
    let state = spawn_state().await;
    let owner = user(&state, "owner").await;
    let moderator = admin(&state, "mod").await;
    let posts = &state.post_service;

    let post = posts.create(owner, "short-lived").await.unwrap();

    // Restoring an active item is a conflict for admins.
    assert!(matches!(
        posts.restore(moderator, post.id).await.unwrap_err(),
        ContentError::NotDeleted
    ));

    posts.delete(owner, post.id).await.unwrap();

    // Owners cannot undo their own deletion.
    assert!(matches!(
        posts.restore(owner, post.id).await.unwrap_err(),
        ContentError::Forbidden
    ));

    // Deleted items are frozen.
    assert!(matches!(
        posts.edit(moderator, post.id, "zombie").await.unwrap_err(),
        ContentError::AlreadyDeleted
    ));
    assert!(matches!(
        posts.edit(owner, post.id, "zombie").await.unwrap_err(),
        ContentError::NotFound
    ));
    assert!(matches!(
        posts.delete(moderator, post.id).await.unwrap_err(),
        ContentError::AlreadyDeleted
    ));

    assert!(matches!(
        posts.restore(moderator, Uuid::new_v4()).await.unwrap_err(),
        ContentError::NotFound
    ));

    posts.restore(moderator, post.id).await.unwrap();
    let edited = posts.edit(owner, post.id, "back again").await.unwrap();
    assert_eq!(edited.body, "back again");
}

#[tokio::test]
async fn test_deleted_posts_are_hidden_from_lists() {
    let state = spawn_state().await;
    let alice = user(&state, "alice").await;
    let bob = user(&state, "bob").await;
    let moderator = admin(&state, "mod").await;
    let posts = &state.post_service;

    let first = posts.create(alice, "alpha rust").await.unwrap();
    let second = posts.create(bob, "beta go").await.unwrap();
    let third = posts.create(alice, "gamma rust").await.unwrap();
    posts.delete(alice, first.id).await.unwrap();

    let visible = posts.list(bob, first_page()).await.unwrap();
    assert_eq!(visible.total, 2);
    let ids: Vec<Uuid> = visible.items.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![third.id, second.id], "newest first");

    let everything = posts.list(moderator, first_page()).await.unwrap();
    assert_eq!(everything.total, 3);
    assert!(
        everything
            .items
            .iter()
            .any(|p| p.id == first.id && p.is_deleted)
    );

    let searched = posts
        .list(
            bob,
            PostQuery {
                search: Some("rust".to_string()),
                ..first_page()
            },
        )
        .await
        .unwrap();
    assert_eq!(searched.total, 1);
    assert_eq!(searched.items[0].id, third.id);

    let by_author = posts
        .list(
            moderator,
            PostQuery {
                search: Some("bob".to_string()),
                ..first_page()
            },
        )
        .await
        .unwrap();
    assert!(by_author.items.iter().any(|p| p.id == second.id));

    let by_user = posts
        .list(
            moderator,
            PostQuery {
                user_id: Some(alice.id),
                ..first_page()
            },
        )
        .await
        .unwrap();
    assert_eq!(by_user.total, 2);

    let paged = posts
        .list(
            bob,
            PostQuery {
                page: 2,
                limit: 1,
                ..PostQuery::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(paged.total, 2);
    assert_eq!(paged.total_pages, 2);
    assert_eq!(paged.items[0].id, second.id);
}

#[tokio::test]
async fn test_body_validation() {
    let state = spawn_state().await;
    let author = user(&state, "author").await;

    let err = state.post_service.create(author, "   ").await.unwrap_err();
    let ContentError::Validation(fields) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(fields[0].field, "body");

    let too_long = "x".repeat(state.config.content.post_max_length + 1);
    assert!(matches!(
        state.post_service.create(author, &too_long).await.unwrap_err(),
        ContentError::Validation(_)
    ));

    let post = state.post_service.create(author, "ok").await.unwrap();
    let long_comment = "y".repeat(state.config.content.comment_max_length + 1);
    assert!(matches!(
        state
            .comment_service
            .create(author, post.id, &long_comment)
            .await
            .unwrap_err(),
        ContentError::Validation(_)
    ));
}

#[tokio::test]
async fn test_comments_follow_their_post() {
    let state = spawn_state().await;
    let author = user(&state, "author").await;
    let reader = user(&state, "reader").await;
    let moderator = admin(&state, "mod").await;
    let posts = &state.post_service;
    let comments = &state.comment_service;

    let post = posts.create(author, "discuss").await.unwrap();
    for i in 0..3 {
        comments
            .create(reader, post.id, &format!("comment {i}"))
            .await
            .unwrap();
    }

    let page = comments.list_for_post(reader, post.id, 1, 2).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);
    assert!(page.has_more);

    let last = comments.list_for_post(reader, post.id, 2, 2).await.unwrap();
    assert_eq!(last.items.len(), 1);
    assert!(!last.has_more);

    let victim = page.items[0].id;
    let moderated = comments.edit(moderator, victim, "[removed]").await.unwrap();
    assert!(moderated.is_edited_by_admin);
    comments.delete(moderator, victim).await.unwrap();

    let after = comments.list_for_post(reader, post.id, 1, 10).await.unwrap();
    assert_eq!(after.total, 2);
    assert!(after.items.iter().all(|c| c.id != victim));

    let restored = comments.restore(moderator, victim).await.unwrap();
    assert!(!restored.is_deleted);
    assert!(matches!(
        comments.restore(reader, victim).await.unwrap_err(),
        ContentError::Forbidden
    ));

    posts.delete(author, post.id).await.unwrap();

    assert!(matches!(
        comments.create(reader, post.id, "too late").await.unwrap_err(),
        ContentError::NotFound
    ));
    assert!(matches!(
        comments.create(moderator, post.id, "too late").await.unwrap_err(),
        ContentError::NotFound
    ));
    assert!(matches!(
        comments.list_for_post(reader, post.id, 1, 10).await.unwrap_err(),
        ContentError::NotFound
    ));
    assert!(comments.list_for_post(moderator, post.id, 1, 10).await.is_ok());
}

#[tokio::test]
async fn test_profiles_and_roles() {
    let state = spawn_state().await;
    let alice = user(&state, "alice").await;
    let bob = user(&state, "bob").await;
    let moderator = admin(&state, "mod").await;
    let users = &state.user_service;

    let updated = users
        .update_profile(
            alice,
            agora::services::UpdateProfileRequest {
                name: Some("Alice Liddell".to_string()),
                image_url: Some("https://example.com/a.png".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Alice Liddell");
    assert_eq!(updated.image_url.as_deref(), Some("https://example.com/a.png"));

    let invalid = users
        .update_profile(
            alice,
            agora::services::UpdateProfileRequest {
                name: None,
                image_url: Some("javascript:alert(1)".to_string()),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(invalid, UserError::Validation(_)));

    assert!(matches!(
        users.grant_role(bob, alice.id, Role::Admin).await.unwrap_err(),
        UserError::Forbidden
    ));

    let promoted = users
        .grant_role(moderator, bob.id, Role::Admin)
        .await
        .unwrap();
    assert_eq!(promoted.role, Role::Admin);

    assert!(matches!(
        users.get_profile(Uuid::new_v4()).await.unwrap_err(),
        UserError::NotFound
    ));

    let directory = users.list_users(1, Some("alice")).await.unwrap();
    assert_eq!(directory.total, 1);
    assert_eq!(directory.items[0].id, alice.id);
}
