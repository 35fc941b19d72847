//! Search log entity - Analytics trail of consumer keyword searches.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Search log database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "search_logs")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Raw keyword as typed
    pub keyword: String,
    /// Caller identity, empty when anonymous
    pub user_id: String,
    /// Caller latitude, if shared
    pub lat: Option<f64>,
    /// Caller longitude, if shared
    pub lng: Option<f64>,
    /// When the search happened (UTC)
    pub log_time: DateTimeUtc,
}

/// `SearchLog` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
