//! Payout entity - One row per incentive settlement.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payout database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payouts")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Staff member who was paid
    pub staff_id: String,
    /// Wallet balance settled by this payout
    pub amount: i64,
    /// Admin who performed the settlement
    pub admin_username: String,
    /// When the payout happened
    pub payout_time: DateTimeUtc,
}

/// `Payout` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
