//! Staff entity - Field staff who submit prices and earn incentive bonuses.
//!
//! The primary key is the external chat identity, so it is a string and not
//! auto-incremented.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Staff database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "staff")]
pub struct Model {
    /// External chat identity
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Display name
    pub name: String,
    /// Home chain, if the staff member is assigned to one
    pub chain_id: Option<i64>,
    /// Unsettled incentive balance
    pub wallet: i64,
    /// Access level (1 = regular staff, higher = supervisors)
    pub level: i32,
    /// `false` means the staff member is banned
    pub is_active: bool,
}

/// `Staff` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
