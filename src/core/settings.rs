//! Admin settings and sessions.
//!
//! The audit code (the chat passphrase) lives on the admin record and is read
//! from the database every time it is needed. Sessions are database rows with
//! an expiry; nothing is cached in process.

use crate::{
    config::Rules,
    entities::{AdminSession, AdminUser, admin_session, admin_user},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};

/// Settings shown on the admin settings page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminSettings {
    /// Admin login
    pub username: String,
    /// Current chat passphrase
    pub audit_code: String,
}

/// Settings change. The password is only replaced when one is given.
#[derive(Debug, Clone, Deserialize)]
pub struct SettingsUpdate {
    /// New chat passphrase
    pub audit_code: String,
    /// New password, unchanged when absent or empty
    #[serde(default)]
    pub password: Option<String>,
}

async fn primary_admin(db: &DatabaseConnection) -> Result<Option<admin_user::Model>> {
    AdminUser::find()
        .order_by_asc(admin_user::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// The passphrase that unlocks staff access from chat. Falls back to the
/// configured default when no admin record exists or it cannot be read.
pub async fn current_audit_code(db: &DatabaseConnection, rules: &Rules) -> String {
    match primary_admin(db).await {
        Ok(Some(admin)) if !admin.audit_code.trim().is_empty() => admin.audit_code.trim().to_string(),
        Ok(_) => rules.default_audit_code.clone(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read audit code, using default");
            rules.default_audit_code.clone()
        }
    }
}

/// Reads the settings of `username`, with the default audit code when the
/// record is missing.
pub async fn get_settings(db: &DatabaseConnection, rules: &Rules, username: &str) -> Result<AdminSettings> {
    let admin = AdminUser::find()
        .filter(admin_user::Column::Username.eq(username))
        .one(db)
        .await?;
    Ok(AdminSettings {
        username: username.to_string(),
        audit_code: admin.map_or_else(|| rules.default_audit_code.clone(), |a| a.audit_code),
    })
}

/// Updates the audit code and optionally the password of `username`.
pub async fn update_settings(
    db: &DatabaseConnection,
    username: &str,
    update: SettingsUpdate,
) -> Result<AdminSettings> {
    let audit_code = update.audit_code.trim().to_string();
    if audit_code.is_empty() {
        return Err(Error::validation("audit code is required"));
    }

    let admin = AdminUser::find()
        .filter(admin_user::Column::Username.eq(username))
        .one(db)
        .await?
        .ok_or(Error::Unauthorized)?;

    let mut active: admin_user::ActiveModel = admin.into();
    active.audit_code = Set(audit_code);
    if let Some(password) = update.password.filter(|p| !p.is_empty()) {
        active.password = Set(password);
    }
    let saved = active.update(db).await?;

    tracing::info!(admin = username, "Updated admin settings");
    Ok(AdminSettings {
        username: saved.username,
        audit_code: saved.audit_code,
    })
}

/// Checks credentials and opens a session valid for the configured TTL.
/// Expired sessions are purged on the way.
pub async fn login(
    db: &DatabaseConnection,
    rules: &Rules,
    username: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<admin_session::Model> {
    let admin = AdminUser::find()
        .filter(admin_user::Column::Username.eq(username))
        .one(db)
        .await?;
    let Some(admin) = admin.filter(|a| a.password == password) else {
        tracing::warn!(username, "Rejected admin login");
        return Err(Error::Unauthorized);
    };

    AdminSession::delete_many()
        .filter(admin_session::Column::ExpiresAt.lte(now))
        .exec(db)
        .await?;

    let session = admin_session::ActiveModel {
        token: Set(uuid::Uuid::new_v4().simple().to_string()),
        username: Set(admin.username),
        expires_at: Set(now + Duration::hours(rules.session_ttl_hours)),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(admin = %session.username, "Admin logged in");
    Ok(session)
}

/// Resolves a session token to its admin username.
pub async fn validate_session(db: &DatabaseConnection, token: &str, now: DateTime<Utc>) -> Result<String> {
    AdminSession::find()
        .filter(admin_session::Column::Token.eq(token))
        .filter(admin_session::Column::ExpiresAt.gt(now))
        .one(db)
        .await?
        .map(|s| s.username)
        .ok_or(Error::Unauthorized)
}

/// Ends a session. Unknown tokens are ignored.
pub async fn logout(db: &DatabaseConnection, token: &str) -> Result<()> {
    AdminSession::delete_many()
        .filter(admin_session::Column::Token.eq(token))
        .exec(db)
        .await?;
    Ok(())
}
