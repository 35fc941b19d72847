//! Chain entity - A retail brand treated as a single price-setting entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Chain database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chains")]
pub struct Model {
    /// Unique identifier for the chain
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Brand name shown to consumers
    pub name: String,
    /// Optional logo image
    pub logo_url: Option<String>,
    /// Inactive chains are excluded from search results
    pub is_active: bool,
}

/// Chains have no declared relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
