//! Product option entity - Admin-curated picklist values for product fields.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product option database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_options")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key)]
    pub id: i64,
    /// One of `"category"`, `"spec"`, `"material"`, `"unit"`
    pub kind: String,
    /// Option value
    pub name: String,
}

/// `ProductOption` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
