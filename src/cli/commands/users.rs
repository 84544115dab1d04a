//! List users command handler

use crate::config::Config;
use crate::db::Store;

pub async fn cmd_list_users(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let users = store.user_repo().list_all().await?;

    if users.is_empty() {
        println!("No users registered.");
        println!();
        println!("Register through POST /api/auth/register, then promote with:");
        println!("  agora grant-role <username> admin");
        return Ok(());
    }

    println!("Users ({} total)", users.len());
    println!("{:-<70}", "");

    for user in users {
        println!(
            "{:<6} {:<24} {}",
            user.role.as_str(),
            user.username,
            user.name
        );
        println!(
            "       ID: {} | Joined: {}",
            user.id,
            user.created_at.format("%Y-%m-%d")
        );
    }

    Ok(())
}
