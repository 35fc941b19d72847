//! Shared test utilities for Price King.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

#![allow(clippy::unwrap_used)]

use crate::{
    config::Rules,
    core::{
        catalog::{self, ChainInput, ProductInput},
        staff::{self, NewStaff},
        submission::{self, PriceSubmission, SubmissionReceipt},
    },
    entities,
    errors::Result,
};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Asia::Taipei;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A small catalog most reconciler, search and audit tests start from.
pub struct CatalogFixture {
    /// In-memory database holding the fixture
    pub db: DatabaseConnection,
    /// "PX Mart"
    pub chain_a: entities::ChainModel,
    /// "Carrefour"
    pub chain_b: entities::ChainModel,
    /// "Fresh Milk", Dairy, 1000 ml
    pub product: entities::ProductModel,
}

/// Builds a [`CatalogFixture`] with two chains, one product and two staff
/// members: `U1` ("Alice") and `U2` ("Bob"), neither assigned to a chain.
pub async fn setup_catalog() -> Result<CatalogFixture> {
    let db = setup_test_db().await?;
    let chain_a = create_test_chain(&db, "PX Mart").await?;
    let chain_b = create_test_chain(&db, "Carrefour").await?;
    let product = create_test_product(&db, "Fresh Milk", "Dairy", 1000.0, "ml").await?;
    create_test_staff(&db, "U1", "Alice").await?;
    create_test_staff(&db, "U2", "Bob").await?;

    Ok(CatalogFixture {
        db,
        chain_a,
        chain_b,
        product,
    })
}

/// Creates an active chain without a logo.
pub async fn create_test_chain(db: &DatabaseConnection, name: &str) -> Result<entities::ChainModel> {
    catalog::create_chain(
        db,
        ChainInput {
            name: name.to_string(),
            logo_url: None,
        },
    )
    .await
}

/// Creates an active product.
///
/// # Defaults
/// * spec, material, keywords: empty
/// * priority: 0
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    category: &str,
    capacity: f64,
    unit: &str,
) -> Result<entities::ProductModel> {
    catalog::create_product(
        db,
        ProductInput {
            name: name.to_string(),
            category: category.to_string(),
            capacity: Some(capacity),
            unit: unit.to_string(),
            ..Default::default()
        },
    )
    .await
}

/// Sets a product's priority directly.
pub async fn set_priority(
    db: &DatabaseConnection,
    product: entities::ProductModel,
    priority: i32,
) -> Result<entities::ProductModel> {
    let mut active: entities::product::ActiveModel = product.into();
    active.priority = Set(priority);
    Ok(active.update(db).await?)
}

/// Registers a level 1 staff member with no home chain.
pub async fn create_test_staff(
    db: &DatabaseConnection,
    id: &str,
    name: &str,
) -> Result<entities::StaffModel> {
    staff::create_staff(
        db,
        NewStaff {
            id: id.to_string(),
            name: name.to_string(),
            level: 1,
            chain_id: None,
        },
    )
    .await
}

/// Suspends a staff member.
pub async fn ban_staff(db: &DatabaseConnection, id: &str) -> Result<()> {
    let member = staff::get_staff(db, id).await?.unwrap();
    let mut active: entities::staff::ActiveModel = member.into();
    active.is_active = Set(false);
    active.update(db).await?;
    Ok(())
}

/// Submits a plain price (no promotion) for the fixture product at chain A.
pub async fn submit_test_price(
    db: &DatabaseConnection,
    fixture: &CatalogFixture,
    staff_id: &str,
    price: f64,
    now: DateTime<Utc>,
) -> Result<SubmissionReceipt> {
    submit_price_for(db, staff_id, fixture.product.id, fixture.chain_a.id, price, now).await
}

/// Submits a plain price (no promotion) for any product and chain.
pub async fn submit_price_for(
    db: &DatabaseConnection,
    staff_id: &str,
    product_id: i64,
    chain_id: i64,
    price: f64,
    now: DateTime<Utc>,
) -> Result<SubmissionReceipt> {
    submission::submit_price_at(
        db,
        &Rules::default(),
        PriceSubmission {
            staff_id: staff_id.to_string(),
            product_id,
            chain_id,
            price,
            base_price: price,
            promo_kind: 1,
            promo_qty: 1,
            promo_value: 0.0,
        },
        now,
    )
    .await
}

/// A wall-clock time in Asia/Taipei, as UTC.
pub fn taipei(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
        .and_local_timezone(Taipei)
        .unwrap()
        .with_timezone(&Utc)
}

/// 2024-05-01 09:00 Taipei
pub fn morning() -> DateTime<Utc> {
    taipei(2024, 5, 1, 9, 0)
}

/// 2024-05-01 15:00 Taipei, same local day as [`morning`]
pub fn afternoon() -> DateTime<Utc> {
    taipei(2024, 5, 1, 15, 0)
}
