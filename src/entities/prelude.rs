pub use super::comments::Entity as Comments;
pub use super::posts::Entity as Posts;
pub use super::sessions::Entity as Sessions;
pub use super::users::Entity as Users;
