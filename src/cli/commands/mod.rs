mod grant_role;
mod users;

pub use grant_role::cmd_grant_role;
pub use users::cmd_list_users;
