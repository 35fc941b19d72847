//! Price entity - The current price snapshot for one (product, chain) pair.
//!
//! Exactly one row exists per pair (enforced by the `idx_prices_product_chain`
//! unique index). Every accepted submission overwrites it; history lives in
//! `price_logs`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Price snapshot database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "prices")]
pub struct Model {
    /// Unique identifier for the snapshot row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Product this price belongs to
    pub product_id: i64,
    /// Chain selling the product at this price
    pub chain_id: i64,
    /// Final shelf price after promotion
    pub price: f64,
    /// Pre-promotion price
    pub base_price: f64,
    /// Promotion kind code (see `core::promotion::PromotionKind`)
    pub promo_kind: i32,
    /// Promotion quantity parameter
    pub promo_qty: i32,
    /// Promotion value parameter
    pub promo_value: f64,
    /// Human-readable promotion label, empty when none
    pub promo_label: String,
    /// When the snapshot was last written
    pub updated_at: DateTimeUtc,
    /// Staff id of the last submitter
    pub updated_by: String,
}

/// Snapshots reference products and chains by id only
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
