//! Event entity - Promotional banners shown in the consumer lobby.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Event database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "events")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Banner title
    pub title: String,
    /// Banner image
    pub image_url: Option<String>,
    /// Link opened from the banner
    pub link_url: Option<String>,
    /// Ascending display order
    pub sort_order: i32,
    /// Hidden when `false`
    pub is_active: bool,
}

/// `Event` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
