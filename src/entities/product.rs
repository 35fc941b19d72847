//! Product entity - A catalogue item whose price is tracked across chains.
//!
//! `capacity` and `unit` drive the per-unit comparison score used by search.
//! Products are never referenced by foreign key, so deleting one leaves its
//! price history intact.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Whole Milk")
    pub name: String,
    /// Shelf category used for lobby browsing and store-shelf ordering
    pub category: String,
    /// Free-text specification (e.g., "6 pack")
    pub spec: String,
    /// Packaging material (e.g., "can", "bottle")
    pub material: String,
    /// Declared content amount; zero when unknown
    pub capacity: f64,
    /// Unit of `capacity` (e.g., "ml", "g", "count")
    pub unit: String,
    /// Extra search terms separated by spaces
    pub keywords: String,
    /// Higher priority sorts earlier before scoring
    pub priority: i32,
    /// Optional product image
    pub image_url: Option<String>,
    /// Inactive products are hidden from search and the staff form
    pub is_active: bool,
    /// When the product was created
    pub created_at: DateTimeUtc,
}

/// Products have no declared relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
