pub mod moderation;
pub mod validation;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, RegisterRequest};
pub use auth_service_impl::SeaOrmAuthService;

pub mod post_service;
pub mod post_service_impl;
pub use post_service::PostService;
pub use post_service_impl::SeaOrmPostService;

pub mod comment_service;
pub mod comment_service_impl;
pub use comment_service::CommentService;
pub use comment_service_impl::SeaOrmCommentService;

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{UpdateProfileRequest, UserError, UserService};
pub use user_service_impl::SeaOrmUserService;

pub use moderation::ContentError;
