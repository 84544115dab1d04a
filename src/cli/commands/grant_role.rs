//! Grant role command handler

use crate::config::Config;
use crate::db::Store;
use crate::entities::users::Role;

pub async fn cmd_grant_role(config: &Config, username: &str, role: Role) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let repo = store.user_repo();

    let Some(user) = repo.get_by_username(username).await? else {
        anyhow::bail!("No user named '{username}'");
    };

    if user.role == role {
        println!("{} already has role '{}'", user.username, role);
        return Ok(());
    }

    let updated = repo
        .set_role(user.id, role)
        .await?
        .ok_or_else(|| anyhow::anyhow!("User '{username}' disappeared while updating"))?;

    tracing::info!(user_id = %updated.id, role = %role, "Role granted from CLI");
    println!(
        "{} ({}) is now '{}' (was '{}')",
        updated.username, updated.id, updated.role, user.role
    );

    Ok(())
}
