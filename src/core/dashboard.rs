//! Admin dashboard figures and the cross-chain price matrix.

use crate::{
    config::Rules,
    core::{
        audit::{DuplicateGroup, duplicate_groups},
        time::{local_date, local_day_start},
    },
    entities::{Chain, Price, Product, SearchLog, Staff, chain, product, search_log, staff},
    errors::Result,
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{PaginatorTrait, QueryOrder, QuerySelect, prelude::*};
use serde::Serialize;
use std::collections::HashMap;

/// Headline numbers for the admin landing page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardMetrics {
    /// Searches since local midnight
    pub today_searches: u64,
    /// Active products
    pub product_count: u64,
    /// Active chains
    pub chain_count: u64,
    /// Active staff
    pub staff_count: u64,
    /// Distinct searching users over the last day
    pub active_users_1d: u64,
    /// Distinct searching users over 7 days
    pub active_users_7d: u64,
    /// Distinct searching users over 30 days
    pub active_users_30d: u64,
    /// Today's same-day duplicate groups
    pub duplicates: Vec<DuplicateGroup>,
    /// Latest searches, newest first
    pub recent_searches: Vec<search_log::Model>,
}

/// One chain's price in a matrix row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixCell {
    /// Chain offering the price
    pub chain_id: i64,
    /// Snapshot price
    pub price: f64,
    /// Cheapest chain for the product
    pub is_min: bool,
    /// Most expensive chain for the product
    pub is_max: bool,
}

/// A product priced at two or more chains.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixRow {
    /// Product id
    pub product_id: i64,
    /// Product name
    pub product_name: String,
    /// Product category
    pub category: String,
    /// One cell per pricing chain
    pub cells: Vec<MatrixCell>,
    /// Lowest price
    pub min: f64,
    /// Highest price
    pub max: f64,
    /// max / min
    pub spread: f64,
    /// Spread exceeds the configured outlier ratio
    pub is_outlier: bool,
}

/// Cross-chain price comparison for every product priced at two or more chains.
#[derive(Debug, Clone, Serialize)]
pub struct PriceMatrix {
    /// Column headers
    pub chains: Vec<chain::Model>,
    /// One row per compared product
    pub rows: Vec<MatrixRow>,
}

/// Unwraps a metric read, logging and defaulting on failure.
fn or_default<T: Default>(metric: &str, result: std::result::Result<T, DbErr>) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(metric, error = %e, "Dashboard metric unavailable");
        T::default()
    })
}

async fn distinct_users_since(db: &DatabaseConnection, since: DateTime<Utc>) -> std::result::Result<u64, DbErr> {
    let users: Vec<String> = SearchLog::find()
        .select_only()
        .column(search_log::Column::UserId)
        .distinct()
        .filter(search_log::Column::LogTime.gte(since))
        .filter(search_log::Column::UserId.ne(""))
        .into_tuple()
        .all(db)
        .await?;
    Ok(users.len() as u64)
}

/// Collects dashboard metrics at `now`. Never fails: each figure falls back
/// to its default when its query does.
pub async fn metrics(db: &DatabaseConnection, rules: &Rules, now: DateTime<Utc>) -> DashboardMetrics {
    let today_start = local_day_start(rules.timezone, now);

    let today_searches = or_default(
        "today_searches",
        SearchLog::find()
            .filter(search_log::Column::LogTime.gte(today_start))
            .count(db)
            .await,
    );
    let product_count = or_default(
        "product_count",
        Product::find()
            .filter(product::Column::IsActive.eq(true))
            .count(db)
            .await,
    );
    let chain_count = or_default(
        "chain_count",
        Chain::find()
            .filter(chain::Column::IsActive.eq(true))
            .count(db)
            .await,
    );
    let staff_count = or_default(
        "staff_count",
        Staff::find()
            .filter(staff::Column::IsActive.eq(true))
            .count(db)
            .await,
    );

    let active_users_1d = or_default("active_users_1d", distinct_users_since(db, now - Duration::days(1)).await);
    let active_users_7d = or_default("active_users_7d", distinct_users_since(db, now - Duration::days(7)).await);
    let active_users_30d = or_default("active_users_30d", distinct_users_since(db, now - Duration::days(30)).await);

    let duplicates = duplicate_groups(db, rules.timezone, local_date(rules.timezone, now))
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(metric = "duplicates", error = %e, "Dashboard metric unavailable");
            Vec::new()
        });

    let recent_searches = or_default(
        "recent_searches",
        SearchLog::find()
            .order_by_desc(search_log::Column::LogTime)
            .order_by_desc(search_log::Column::Id)
            .limit(10)
            .all(db)
            .await,
    );

    DashboardMetrics {
        today_searches,
        product_count,
        chain_count,
        staff_count,
        active_users_1d,
        active_users_7d,
        active_users_30d,
        duplicates,
        recent_searches,
    }
}

/// Cross-chain price comparison for every active product listed at two or
/// more active chains.
pub async fn price_matrix(db: &DatabaseConnection, rules: &Rules) -> Result<PriceMatrix> {
    let chains = Chain::find()
        .filter(chain::Column::IsActive.eq(true))
        .order_by_asc(chain::Column::Id)
        .all(db)
        .await?;
    let products = Product::find()
        .filter(product::Column::IsActive.eq(true))
        .order_by_asc(product::Column::Category)
        .order_by_asc(product::Column::Name)
        .order_by_asc(product::Column::Id)
        .all(db)
        .await?;

    let chain_order: HashMap<i64, usize> = chains.iter().enumerate().map(|(i, c)| (c.id, i)).collect();
    let mut by_product: HashMap<i64, Vec<(i64, f64)>> = HashMap::new();
    for snapshot in Price::find()
        .filter(crate::entities::PriceColumn::Price.gt(0.0))
        .all(db)
        .await?
    {
        if chain_order.contains_key(&snapshot.chain_id) {
            by_product
                .entry(snapshot.product_id)
                .or_default()
                .push((snapshot.chain_id, snapshot.price));
        }
    }

    let rows = products
        .into_iter()
        .filter_map(|p| {
            let mut prices = by_product.remove(&p.id)?;
            if prices.len() < 2 {
                return None;
            }
            prices.sort_by_key(|(chain_id, _)| chain_order.get(chain_id).copied());

            let min = prices.iter().map(|&(_, price)| price).fold(f64::INFINITY, f64::min);
            let max = prices.iter().map(|&(_, price)| price).fold(f64::NEG_INFINITY, f64::max);
            let spread = max / min;

            #[allow(clippy::float_cmp)]
            let cells = prices
                .into_iter()
                .map(|(chain_id, price)| MatrixCell {
                    chain_id,
                    price,
                    is_min: price == min,
                    is_max: price == max,
                })
                .collect();

            Some(MatrixRow {
                product_id: p.id,
                product_name: p.name,
                category: p.category,
                cells,
                min,
                max,
                spread,
                is_outlier: spread > rules.outlier_ratio,
            })
        })
        .collect();

    Ok(PriceMatrix { chains, rows })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{
        core::{audit::toggle_log, catalog, search::record_search},
        test_utils::*,
    };

    #[tokio::test]
    async fn test_metrics_counts() -> Result<()> {
        let fixture = setup_catalog().await?;
        let db = &fixture.db;
        ban_staff(db, "U2").await?;
        catalog::toggle_chain(db, fixture.chain_b.id).await?;

        record_search(db, "milk", "C1", None, None, morning() - Duration::days(3)).await?;
        record_search(db, "milk", "C2", None, None, morning()).await?;
        record_search(db, "eggs", "C2", None, None, afternoon()).await?;
        record_search(db, "tea", "", None, None, afternoon()).await?;

        let m = metrics(db, &Rules::default(), afternoon()).await;
        assert_eq!(m.today_searches, 3);
        assert_eq!(m.product_count, 1);
        assert_eq!(m.chain_count, 1);
        assert_eq!(m.staff_count, 1);
        assert_eq!(m.active_users_1d, 1);
        assert_eq!(m.active_users_7d, 2);
        assert_eq!(m.active_users_30d, 2);
        assert_eq!(m.recent_searches.len(), 4);
        assert_eq!(m.recent_searches[0].keyword, "tea");
        assert!(m.duplicates.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_metrics_include_todays_duplicates() -> Result<()> {
        let fixture = setup_catalog().await?;
        let db = &fixture.db;
        let first = submit_test_price(db, &fixture, "U1", 100.0, morning()).await?;
        submit_test_price(db, &fixture, "U1", 95.0, afternoon()).await?;
        toggle_log(db, &Rules::default(), first.log.id).await?;

        let m = metrics(db, &Rules::default(), afternoon()).await;
        assert_eq!(m.duplicates.len(), 1);
        assert_eq!(m.duplicates[0].count, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_price_matrix_flags_outliers() -> Result<()> {
        let fixture = setup_catalog().await?;
        let db = &fixture.db;
        let butter = create_test_product(db, "Butter", "Dairy", 200.0, "g").await?;
        let lonely = create_test_product(db, "Cheese", "Dairy", 200.0, "g").await?;
        let id = fixture.product.id;

        submit_price_for(db, "U1", id, fixture.chain_a.id, 100.0, morning()).await?;
        submit_price_for(db, "U1", id, fixture.chain_b.id, 160.0, morning()).await?;
        submit_price_for(db, "U1", butter.id, fixture.chain_a.id, 80.0, morning()).await?;
        submit_price_for(db, "U1", butter.id, fixture.chain_b.id, 90.0, morning()).await?;
        submit_price_for(db, "U1", lonely.id, fixture.chain_a.id, 120.0, morning()).await?;

        let matrix = price_matrix(db, &Rules::default()).await?;
        assert_eq!(matrix.chains.len(), 2);
        assert_eq!(matrix.rows.len(), 2);

        let milk = matrix.rows.iter().find(|r| r.product_id == id).unwrap();
        assert_eq!(milk.spread, 1.6);
        assert!(milk.is_outlier);
        assert!(milk.cells[0].is_min);
        assert!(milk.cells[1].is_max);

        let butter_row = matrix.rows.iter().find(|r| r.product_id == butter.id).unwrap();
        assert!(!butter_row.is_outlier);
        Ok(())
    }

    #[tokio::test]
    async fn test_price_matrix_ignores_inactive_chains() -> Result<()> {
        let fixture = setup_catalog().await?;
        let db = &fixture.db;
        let id = fixture.product.id;
        submit_price_for(db, "U1", id, fixture.chain_a.id, 100.0, morning()).await?;
        submit_price_for(db, "U1", id, fixture.chain_b.id, 300.0, morning()).await?;
        catalog::toggle_chain(db, fixture.chain_b.id).await?;

        let matrix = price_matrix(db, &Rules::default()).await?;
        assert!(matrix.rows.is_empty());
        Ok(())
    }
}
