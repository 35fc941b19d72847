//! Price log entity - Append-only history of every price submission.
//!
//! Rows are never deleted. `is_valid` marks whether the row is the active
//! observation for its (staff, product, chain, day); `payout_status` holds
//! one of `"unpaid"`, `"paid"` or `"void"` (see `core::submission::PayoutStatus`).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Price log database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "price_logs")]
pub struct Model {
    /// Unique identifier for the log row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Chat identity of the submitting staff member
    pub staff_id: String,
    /// Product observed
    pub product_id: i64,
    /// Chain where the price was observed
    pub chain_id: i64,
    /// Submitted final price
    pub new_price: f64,
    /// Submitted base price
    pub base_price: f64,
    /// Promotion kind code
    pub promo_kind: i32,
    /// Promotion quantity parameter
    pub promo_qty: i32,
    /// Promotion value parameter
    pub promo_value: f64,
    /// Derived promotion label
    pub promo_label: String,
    /// Submission time (UTC)
    pub log_time: DateTimeUtc,
    /// Active (true) or voided (false)
    pub is_valid: bool,
    /// Incentive settlement state
    pub payout_status: String,
}

/// Logs reference staff, products and chains by id only
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
