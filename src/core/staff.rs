//! Staff business logic - registration, status checks and wallet updates.
//!
//! Staff are keyed by their external chat identity. A staff member whose
//! `is_active` flag is false is banned and cannot submit prices.

use crate::{
    entities::{Chain, Payout, PriceLog, SearchLog, Staff, payout, price_log, search_log, staff},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Result of looking up a chat identity from the submission UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StaffStatus {
    /// Known and allowed to submit
    Success {
        /// Display name
        name: String,
        /// Access level
        level: i32,
        /// Home chain, if any
        chain_id: Option<i64>,
        /// Unsettled incentive balance
        wallet: i64,
    },
    /// Known but suspended
    Banned {
        /// Display name
        name: String,
    },
    /// Not registered
    Unregistered,
}

/// Fields required to register a staff member.
#[derive(Debug, Clone, Deserialize)]
pub struct NewStaff {
    /// External chat identity
    pub id: String,
    /// Display name
    pub name: String,
    /// Access level
    #[serde(default = "default_level")]
    pub level: i32,
    /// Home chain
    pub chain_id: Option<i64>,
}

/// Editable staff fields. `new_id` may differ from the current id.
#[derive(Debug, Clone, Deserialize)]
pub struct StaffUpdate {
    /// Id after the update; may equal the current one
    pub new_id: String,
    /// Display name
    pub name: String,
    /// Access level
    pub level: i32,
    /// Home chain
    pub chain_id: Option<i64>,
    /// `false` bans the staff member
    pub is_active: bool,
}

/// A staff member with submission counters, as listed in the admin UI.
#[derive(Debug, Clone, Serialize)]
pub struct StaffSummary {
    /// The staff row
    #[serde(flatten)]
    pub staff: staff::Model,
    /// Name of the home chain, if any
    pub chain_name: Option<String>,
    /// All submissions ever made
    pub total_logs: u64,
    /// Submissions still active
    pub valid_logs: u64,
    /// Active submissions not yet settled
    pub unpaid_logs: u64,
}

const fn default_level() -> i32 {
    1
}

/// Finds a staff member by chat identity.
pub async fn get_staff<C>(db: &C, staff_id: &str) -> Result<Option<staff::Model>>
where
    C: ConnectionTrait,
{
    Staff::find_by_id(staff_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Reports whether a chat identity may use the submission UI.
pub async fn check_staff(db: &DatabaseConnection, staff_id: &str) -> Result<StaffStatus> {
    if staff_id.trim().is_empty() {
        return Err(Error::validation("staff id is required"));
    }

    let status = match get_staff(db, staff_id).await? {
        Some(s) if !s.is_active => StaffStatus::Banned { name: s.name },
        Some(s) => StaffStatus::Success {
            name: s.name,
            level: s.level,
            chain_id: s.chain_id,
            wallet: s.wallet,
        },
        None => StaffStatus::Unregistered,
    };
    Ok(status)
}

/// Registers a new staff member with an empty wallet.
pub async fn create_staff(db: &DatabaseConnection, new_staff: NewStaff) -> Result<staff::Model> {
    let id = new_staff.id.trim().to_string();
    if id.is_empty() || new_staff.name.trim().is_empty() {
        return Err(Error::validation("staff id and name are required"));
    }
    if get_staff(db, &id).await?.is_some() {
        return Err(Error::StaffIdTaken { staff_id: id });
    }

    let model = staff::ActiveModel {
        id: Set(id),
        name: Set(new_staff.name.trim().to_string()),
        chain_id: Set(new_staff.chain_id),
        wallet: Set(0),
        level: Set(new_staff.level),
        is_active: Set(true),
    };
    model.insert(db).await.map_err(Into::into)
}

/// Updates a staff member. When the id changes, the new id must be free and
/// the change is carried over to price logs, search logs and payouts in the
/// same transaction.
pub async fn update_staff(
    db: &DatabaseConnection,
    original_id: &str,
    update: StaffUpdate,
) -> Result<staff::Model> {
    let new_id = update.new_id.trim().to_string();
    if new_id.is_empty() || update.name.trim().is_empty() {
        return Err(Error::validation("staff id and name are required"));
    }

    let txn = db.begin().await?;

    let existing = get_staff(&txn, original_id)
        .await?
        .ok_or_else(|| Error::StaffNotFound {
            staff_id: original_id.to_string(),
        })?;

    if new_id != existing.id {
        if get_staff(&txn, &new_id).await?.is_some() {
            return Err(Error::StaffIdTaken { staff_id: new_id });
        }

        Staff::update_many()
            .col_expr(staff::Column::Id, Expr::value(new_id.clone()))
            .filter(staff::Column::Id.eq(original_id))
            .exec(&txn)
            .await?;
        PriceLog::update_many()
            .col_expr(price_log::Column::StaffId, Expr::value(new_id.clone()))
            .filter(price_log::Column::StaffId.eq(original_id))
            .exec(&txn)
            .await?;
        SearchLog::update_many()
            .col_expr(search_log::Column::UserId, Expr::value(new_id.clone()))
            .filter(search_log::Column::UserId.eq(original_id))
            .exec(&txn)
            .await?;
        Payout::update_many()
            .col_expr(payout::Column::StaffId, Expr::value(new_id.clone()))
            .filter(payout::Column::StaffId.eq(original_id))
            .exec(&txn)
            .await?;
        tracing::info!(from = original_id, to = %new_id, "Renamed staff id");
    }

    let current = get_staff(&txn, &new_id)
        .await?
        .ok_or_else(|| Error::StaffNotFound {
            staff_id: new_id.clone(),
        })?;
    let mut active: staff::ActiveModel = current.into();
    active.name = Set(update.name.trim().to_string());
    active.level = Set(update.level);
    active.chain_id = Set(update.chain_id);
    active.is_active = Set(update.is_active);
    let updated = active.update(&txn).await?;

    txn.commit().await?;
    Ok(updated)
}

/// Removes a staff member. Their price logs are kept.
pub async fn delete_staff(db: &DatabaseConnection, staff_id: &str) -> Result<()> {
    let result = Staff::delete_by_id(staff_id.to_string()).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::StaffNotFound {
            staff_id: staff_id.to_string(),
        });
    }
    Ok(())
}

/// Lists all staff ordered by id, with per-staff submission counters.
pub async fn list_staff(db: &DatabaseConnection) -> Result<Vec<StaffSummary>> {
    let members = Staff::find()
        .order_by_asc(staff::Column::Id)
        .all(db)
        .await?;
    let chain_names: HashMap<i64, String> = Chain::find()
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    let mut summaries = Vec::with_capacity(members.len());
    for member in members {
        let by_staff = || PriceLog::find().filter(price_log::Column::StaffId.eq(member.id.as_str()));
        let total_logs = by_staff().count(db).await?;
        let valid_logs = by_staff()
            .filter(price_log::Column::IsValid.eq(true))
            .count(db)
            .await?;
        let unpaid_logs = by_staff()
            .filter(price_log::Column::IsValid.eq(true))
            .filter(price_log::Column::PayoutStatus.eq(crate::core::submission::PayoutStatus::Unpaid.as_str()))
            .count(db)
            .await?;

        summaries.push(StaffSummary {
            chain_name: member.chain_id.and_then(|id| chain_names.get(&id).cloned()),
            staff: member,
            total_logs,
            valid_logs,
            unpaid_logs,
        });
    }
    Ok(summaries)
}

/// Atomically adds `delta` to a staff wallet:
/// `UPDATE staff SET wallet = wallet + delta WHERE id = ?`
pub async fn credit_wallet<C>(db: &C, staff_id: &str, delta: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    Staff::update_many()
        .col_expr(
            staff::Column::Wallet,
            Expr::col(staff::Column::Wallet).add(delta),
        )
        .filter(staff::Column::Id.eq(staff_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Atomically takes `amount` back from a staff wallet, only when the wallet
/// holds at least that much. Returns whether the wallet changed.
pub async fn reverse_credit<C>(db: &C, staff_id: &str, amount: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = Staff::update_many()
        .col_expr(
            staff::Column::Wallet,
            Expr::col(staff::Column::Wallet).sub(amount),
        )
        .filter(staff::Column::Id.eq(staff_id))
        .filter(staff::Column::Wallet.gte(amount))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}
