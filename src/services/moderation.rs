//! Authorization and attribution rules for posts and comments.
//!
//! These functions are pure: they decide whether an actor may act on an item
//! in a given state. Repositories encode the same rules as `UPDATE ... WHERE`
//! predicates; the functions here classify a mutation that matched no rows.

use thiserror::Error;
use uuid::Uuid;

use crate::entities::posts::ContentState;
use crate::models::FieldError;
use crate::models::user::Actor;

/// Attribution stamped on an item by a successful edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribution {
    pub edited_by: Uuid,
    pub is_edited_by_admin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ModerationError {
    /// The item exists but the actor may not see it.
    #[error("Not found")]
    Hidden,

    #[error("Forbidden")]
    Forbidden,

    #[error("Item is already deleted")]
    AlreadyDeleted,

    #[error("Item is not deleted")]
    NotDeleted,
}

/// `Ok(true)` when the actor is acting on someone else's item as an admin.
fn check_mutable(
    actor: Actor,
    owner_id: Uuid,
    state: ContentState,
) -> Result<bool, ModerationError> {
    match state {
        ContentState::Deleted if actor.is_admin() => Err(ModerationError::AlreadyDeleted),
        ContentState::Deleted => Err(ModerationError::Hidden),
        ContentState::Active if actor.id == owner_id => Ok(false),
        ContentState::Active if actor.is_admin() => Ok(true),
        ContentState::Active => Err(ModerationError::Forbidden),
    }
}

/// Owner or admin may edit an active item. An admin editing their own item is
/// a plain self-edit.
pub fn check_edit(
    actor: Actor,
    owner_id: Uuid,
    state: ContentState,
) -> Result<Attribution, ModerationError> {
    let on_behalf = check_mutable(actor, owner_id, state)?;
    Ok(Attribution {
        edited_by: actor.id,
        is_edited_by_admin: on_behalf,
    })
}

pub fn check_delete(
    actor: Actor,
    owner_id: Uuid,
    state: ContentState,
) -> Result<(), ModerationError> {
    check_mutable(actor, owner_id, state).map(|_| ())
}

/// Restore is admin-only, and only from `Deleted`.
pub const fn check_restore(actor: Actor, state: ContentState) -> Result<(), ModerationError> {
    if !actor.is_admin() {
        return Err(ModerationError::Forbidden);
    }

    match state {
        ContentState::Deleted => Ok(()),
        ContentState::Active => Err(ModerationError::NotDeleted),
    }
}

/// Errors shared by the post and comment services.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Not found")]
    NotFound,

    #[error("Forbidden")]
    Forbidden,

    #[error("Item is already deleted")]
    AlreadyDeleted,

    #[error("Item is not deleted")]
    NotDeleted,

    #[error("Item was modified concurrently")]
    Conflict,

    #[error("Validation failed: {}", crate::models::describe_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ModerationError> for ContentError {
    fn from(err: ModerationError) -> Self {
        match err {
            ModerationError::Hidden => Self::NotFound,
            ModerationError::Forbidden => Self::Forbidden,
            ModerationError::AlreadyDeleted => Self::AlreadyDeleted,
            ModerationError::NotDeleted => Self::NotDeleted,
        }
    }
}

impl From<Vec<FieldError>> for ContentError {
    fn from(fields: Vec<FieldError>) -> Self {
        Self::Validation(fields)
    }
}

impl From<sea_orm::DbErr> for ContentError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ContentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Explains why a conditional update matched no rows, given the outcome of
/// re-running the rule against the re-read row. A rule that now passes means
/// the row changed between the update and the re-read.
#[must_use]
pub fn explain_miss<T>(recheck: Result<T, ModerationError>) -> ContentError {
    match recheck {
        Ok(_) => ContentError::Conflict,
        Err(err) => err.into(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Edit,
    Delete,
    Restore,
}

impl Action {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Restore => "restore",
        }
    }
}

pub(crate) fn record_action(kind: &'static str, action: Action, by_admin: bool) {
    metrics::counter!(
        "moderation_actions_total",
        "kind" => kind,
        "action" => action.as_str(),
        "by_admin" => if by_admin { "true" } else { "false" }
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::users::Role;

    fn user(id: Uuid) -> Actor {
        Actor::new(id, Role::User)
    }

    fn admin(id: Uuid) -> Actor {
        Actor::new(id, Role::Admin)
    }

    #[test]
    fn test_owner_edit_is_not_admin_attributed() {
        let owner = Uuid::new_v4();
        let attribution = check_edit(user(owner), owner, ContentState::Active).unwrap();
        assert_eq!(attribution.edited_by, owner);
        assert!(!attribution.is_edited_by_admin);
    }

    #[test]
    fn test_admin_on_foreign_item_is_admin_attributed() {
        let owner = Uuid::new_v4();
        let moderator = Uuid::new_v4();
        let attribution = check_edit(admin(moderator), owner, ContentState::Active).unwrap();
        assert_eq!(attribution.edited_by, moderator);
        assert!(attribution.is_edited_by_admin);
    }

    #[test]
    fn test_admin_on_own_item_is_plain_edit() {
        let id = Uuid::new_v4();
        let attribution = check_edit(admin(id), id, ContentState::Active).unwrap();
        assert!(!attribution.is_edited_by_admin);
    }

    #[test]
    fn test_stranger_is_forbidden() {
        let owner = Uuid::new_v4();
        let stranger = user(Uuid::new_v4());
        assert_eq!(
            check_edit(stranger, owner, ContentState::Active),
            Err(ModerationError::Forbidden)
        );
        assert_eq!(
            check_delete(stranger, owner, ContentState::Active),
            Err(ModerationError::Forbidden)
        );
    }

    #[test]
    fn test_deleted_items() {
        let owner = Uuid::new_v4();

        // Even the owner no longer sees a deleted item.
        assert_eq!(
            check_edit(user(owner), owner, ContentState::Deleted),
            Err(ModerationError::Hidden)
        );
        assert_eq!(
            check_delete(admin(Uuid::new_v4()), owner, ContentState::Deleted),
            Err(ModerationError::AlreadyDeleted)
        );
    }

    #[test]
    fn test_restore_rules() {
        let id = Uuid::new_v4();
        assert_eq!(
            check_restore(user(id), ContentState::Deleted),
            Err(ModerationError::Forbidden)
        );
        assert_eq!(
            check_restore(admin(id), ContentState::Active),
            Err(ModerationError::NotDeleted)
        );
        assert!(check_restore(admin(id), ContentState::Deleted).is_ok());
    }

    #[test]
    fn test_explain_miss() {
        assert!(matches!(explain_miss(Ok(())), ContentError::Conflict));
        assert!(matches!(
            explain_miss::<()>(Err(ModerationError::Hidden)),
            ContentError::NotFound
        ));
        assert!(matches!(
            explain_miss::<()>(Err(ModerationError::NotDeleted)),
            ContentError::NotDeleted
        ));
    }
}
