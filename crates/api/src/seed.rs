//! Startup seeding of the admin account.

use persona_core::roles::ROLE_ADMIN;
use persona_db::models::user::CreateUser;
use persona_db::repositories::UserRepo;
use sqlx::PgPool;

use crate::auth::password::hash_password;
use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};

/// Create the configured admin account if a password is set and the
/// username is free. Returns whether an account was created.
///
/// An existing account is never touched, so changing `ADMIN_PASSWORD`
/// later has no effect on it.
pub async fn seed_admin(pool: &PgPool, config: &ServerConfig) -> AppResult<bool> {
    let Some(password) = config.admin_password.as_deref() else {
        return Ok(false);
    };

    if UserRepo::find_by_username(pool, &config.admin_username)
        .await?
        .is_some()
    {
        tracing::debug!(username = %config.admin_username, "Admin account already present");
        return Ok(false);
    }

    let password_hash = hash_password(password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;
    let user = UserRepo::create(
        pool,
        &CreateUser {
            username: config.admin_username.clone(),
            password_hash,
            role: ROLE_ADMIN.to_string(),
        },
    )
    .await?;

    tracing::info!(user_id = user.id, username = %user.username, "Seeded admin account");
    Ok(true)
}
