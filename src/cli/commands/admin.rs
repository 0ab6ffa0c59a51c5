//! Create-admin command handler

use crate::api::validation::{validate_password, validate_username};
use crate::config::Config;
use crate::db::Store;
use crate::services::{SeaOrmUserService, UserService};

pub async fn cmd_create_admin(config: &Config, username: &str, password: &str) -> anyhow::Result<()> {
    validate_username(username).map_err(|e| anyhow::anyhow!("{e}"))?;
    validate_password(password).map_err(|e| anyhow::anyhow!("{e}"))?;

    let store = Store::new(&config.general.database_path).await?;
    let service = SeaOrmUserService::new(store, config.security.clone());

    let user = service.ensure_admin(username, password).await?;

    println!("Admin account ready");
    println!("  ID: {} | Username: {}", user.id, user.username);

    Ok(())
}
