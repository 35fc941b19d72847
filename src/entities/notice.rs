//! Notice entity - Short announcements shown in the consumer lobby.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Notice database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notices")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Notice text
    pub content: String,
    /// Hidden when `false`
    pub is_active: bool,
    /// When it was posted
    pub created_at: DateTimeUtc,
}

/// `Notice` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
