//! Bootstrap of the server administrator account.

use anyhow::Context;

use crate::{
    config::Config,
    db::Store,
    models::user::{Role, User},
    repositories::{cache, user as user_repo},
    utils::{password::hash_password, time::unix_now, token::user_id_for_email},
};

/// Makes sure the administrator from `config` exists. The admin's id is
/// remembered in the `cache` bucket; nothing is written once it is set.
/// Returns the admin's user id.
pub async fn ensure_admin(store: &Store, config: &Config) -> anyhow::Result<String> {
    if let Some(admin_id) = cache::get_admin_id(store).await? {
        tracing::debug!(admin_id = %admin_id, "Administrator already provisioned");
        return Ok(admin_id);
    }

    let admin_id = user_id_for_email(&config.admin_email);
    if user_repo::get_user(store, &admin_id).await?.is_none() {
        let now = unix_now();
        let password = hash_password(&config.admin_password).context("hash admin password")?;
        let admin = User {
            uuid: admin_id.clone(),
            first_name: config.server_name.clone(),
            last_name: Role::Admin.to_string(),
            password,
            email: config.admin_email.trim().to_lowercase(),
            role: Role::Admin,
            last_login: 0,
            last_modified: now,
            created_on: now,
            deleted: false,
            invite: "-".to_string(),
        };
        user_repo::put_user(store, &admin).await?;
        tracing::info!(email = %admin.email, "Created administrator account");
    }

    cache::set_admin_id(store, &admin_id).await?;
    Ok(admin_id)
}
