//! Admin session entity - Opaque bearer tokens issued at admin login.

use sea_orm::entity::prelude::*;

/// Admin session database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "admin_sessions")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Random token handed to the client
    #[sea_orm(unique)]
    pub token: String,
    /// Admin the token belongs to
    pub username: String,
    /// Token is rejected after this instant
    pub expires_at: DateTimeUtc,
}

/// `AdminSession` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
