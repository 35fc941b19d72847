//! Price submission reconciler - the write path for staff price reports.
//!
//! A submission updates the (product, chain) price snapshot, appends a price
//! log row and decides whether the staff member earns the daily bonus. Only
//! the first submission of a (staff, product, chain) triple per local
//! calendar day is payable; later ones void the earlier rows and are recorded
//! as corrections. All writes happen in one database transaction.

use crate::{
    config::Rules,
    core::{promotion::promotion_label, staff, time::local_day_start},
    entities::{Chain, Price, PriceLog, Product, price, price_log},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Incentive settlement state of a price log row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    /// Earned and credited to the wallet, not yet settled
    Unpaid,
    /// Settled by a payout
    Paid,
    /// Never earned (a same-day correction) or reversed by an admin
    Void,
}

impl PayoutStatus {
    /// Value stored in `price_logs.payout_status`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
            Self::Void => "void",
        }
    }

    /// Parses a stored value. Anything unrecognised reads as `Void`.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "unpaid" => Self::Unpaid,
            "paid" => Self::Paid,
            _ => Self::Void,
        }
    }
}

/// A price observation reported by a staff member.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PriceSubmission {
    /// Chat identity of the submitter
    pub staff_id: String,
    /// Product observed
    pub product_id: i64,
    /// Chain the product was observed at
    pub chain_id: i64,
    /// Final shelf price
    pub price: f64,
    /// Pre-promotion price
    pub base_price: f64,
    /// Promotion kind code
    pub promo_kind: i32,
    /// Promotion quantity parameter
    pub promo_qty: i32,
    /// Promotion value parameter
    pub promo_value: f64,
}

/// Outcome of an accepted submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    /// Derived promotion label
    pub label: String,
    /// Wallet credit granted by this submission (0 for corrections)
    pub bonus: i64,
    /// Number of earlier same-day rows voided
    pub voided: usize,
    /// The appended log row
    pub log: price_log::Model,
}

/// Data needed to render the staff submission form.
#[derive(Debug, Clone, Serialize)]
pub struct StaffForm {
    /// Active chains
    pub chains: Vec<crate::entities::ChainModel>,
    /// Active products by category and name
    pub products: Vec<crate::entities::ProductModel>,
    /// Current snapshot keyed by `"{chain_id}-{product_id}"`
    pub price_map: HashMap<String, SnapshotEntry>,
}

/// Snapshot values pre-filled in the submission form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotEntry {
    /// Final shelf price
    pub price: f64,
    /// Pre-promotion price
    pub base_price: f64,
    /// Promotion label
    pub label: String,
}

/// Fills in a missing price from the other one.
///
/// A non-positive (or non-finite) base price takes the final price; then a
/// non-positive final price takes the base price.
#[must_use]
pub fn normalize_prices(price: f64, base_price: f64) -> (f64, f64) {
    let price = if price.is_finite() { price } else { 0.0 };
    let base_price = if base_price.is_finite() && base_price > 0.0 {
        base_price
    } else {
        price
    };
    let price = if price > 0.0 { price } else { base_price };
    (price, base_price)
}

/// Accepts a price submission at the current time.
pub async fn submit_price(
    db: &DatabaseConnection,
    rules: &Rules,
    submission: PriceSubmission,
) -> Result<SubmissionReceipt> {
    submit_price_at(db, rules, submission, Utc::now()).await
}

/// Accepts a price submission as if it happened at `now`.
///
/// # Errors
/// - `Validation` when the staff, product or chain id is missing
/// - `StaffNotFound` / `StaffBanned` when the submitter may not submit
/// - `ProductNotFound` / `ChainNotFound` for unknown ids
/// - `Database` when any write fails; nothing is persisted in that case
pub async fn submit_price_at(
    db: &DatabaseConnection,
    rules: &Rules,
    submission: PriceSubmission,
    now: DateTime<Utc>,
) -> Result<SubmissionReceipt> {
    let staff_id = submission.staff_id.trim().to_string();
    if staff_id.is_empty() || submission.product_id <= 0 || submission.chain_id <= 0 {
        return Err(Error::validation("staff, product and chain are required"));
    }

    let member = staff::get_staff(db, &staff_id)
        .await?
        .ok_or_else(|| Error::StaffNotFound {
            staff_id: staff_id.clone(),
        })?;
    if !member.is_active {
        return Err(Error::StaffBanned { staff_id });
    }
    Product::find_by_id(submission.product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound {
            id: submission.product_id,
        })?;
    Chain::find_by_id(submission.chain_id)
        .one(db)
        .await?
        .ok_or(Error::ChainNotFound {
            id: submission.chain_id,
        })?;

    let (final_price, base_price) = normalize_prices(submission.price, submission.base_price);
    let promo_qty = submission.promo_qty.max(1);
    let promo_value = if submission.promo_value.is_finite() {
        submission.promo_value
    } else {
        0.0
    };
    let label = promotion_label(submission.promo_kind, promo_qty, promo_value);
    let day_start = local_day_start(rules.timezone, now);

    let txn = db.begin().await?;

    let earlier: Vec<i64> = PriceLog::find()
        .filter(price_log::Column::StaffId.eq(staff_id.as_str()))
        .filter(price_log::Column::ProductId.eq(submission.product_id))
        .filter(price_log::Column::ChainId.eq(submission.chain_id))
        .filter(price_log::Column::IsValid.eq(true))
        .filter(price_log::Column::LogTime.gte(day_start))
        .all(&txn)
        .await?
        .into_iter()
        .map(|log| log.id)
        .collect();

    let payable = earlier.is_empty();
    if !payable {
        PriceLog::update_many()
            .col_expr(price_log::Column::IsValid, Expr::value(false))
            .filter(price_log::Column::Id.is_in(earlier.clone()))
            .exec(&txn)
            .await?;
    }

    let snapshot = price::ActiveModel {
        product_id: Set(submission.product_id),
        chain_id: Set(submission.chain_id),
        price: Set(final_price),
        base_price: Set(base_price),
        promo_kind: Set(submission.promo_kind),
        promo_qty: Set(promo_qty),
        promo_value: Set(promo_value),
        promo_label: Set(label.clone()),
        updated_at: Set(now),
        updated_by: Set(staff_id.clone()),
        ..Default::default()
    };
    upsert_snapshot(&txn, submission.product_id, submission.chain_id, snapshot).await?;

    let payout_status = if payable {
        PayoutStatus::Unpaid
    } else {
        PayoutStatus::Void
    };
    let log = price_log::ActiveModel {
        staff_id: Set(staff_id.clone()),
        product_id: Set(submission.product_id),
        chain_id: Set(submission.chain_id),
        new_price: Set(final_price),
        base_price: Set(base_price),
        promo_kind: Set(submission.promo_kind),
        promo_qty: Set(promo_qty),
        promo_value: Set(promo_value),
        promo_label: Set(label.clone()),
        log_time: Set(now),
        is_valid: Set(true),
        payout_status: Set(payout_status.as_str().to_string()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let bonus = if payable { rules.bonus_amount } else { 0 };
    if bonus > 0 {
        staff::credit_wallet(&txn, &staff_id, bonus).await?;
    }

    txn.commit().await?;

    tracing::info!(
        staff = %staff_id,
        product = submission.product_id,
        chain = submission.chain_id,
        price = final_price,
        bonus,
        voided = earlier.len(),
        "Accepted price submission"
    );

    Ok(SubmissionReceipt {
        label,
        bonus,
        voided: earlier.len(),
        log,
    })
}

/// Writes the snapshot for its (product, chain): updates the existing row or
/// inserts a new one.
async fn upsert_snapshot<C>(
    db: &C,
    product_id: i64,
    chain_id: i64,
    snapshot: price::ActiveModel,
) -> Result<price::Model>
where
    C: ConnectionTrait,
{
    let existing = Price::find()
        .filter(price::Column::ProductId.eq(product_id))
        .filter(price::Column::ChainId.eq(chain_id))
        .one(db)
        .await?;

    let saved = match existing {
        Some(row) => {
            let mut active = snapshot;
            active.id = Set(row.id);
            active.update(db).await?
        }
        None => snapshot.insert(db).await?,
    };
    Ok(saved)
}

/// Loads active chains, active products and the current snapshot for the
/// staff submission form.
pub async fn staff_form(db: &DatabaseConnection) -> Result<StaffForm> {
    let chains = Chain::find()
        .filter(crate::entities::ChainColumn::IsActive.eq(true))
        .order_by_asc(crate::entities::ChainColumn::Id)
        .all(db)
        .await?;
    let products = Product::find()
        .filter(crate::entities::ProductColumn::IsActive.eq(true))
        .order_by_asc(crate::entities::ProductColumn::Category)
        .order_by_asc(crate::entities::ProductColumn::Name)
        .order_by_asc(crate::entities::ProductColumn::Id)
        .all(db)
        .await?;
    let price_map = Price::find()
        .all(db)
        .await?
        .into_iter()
        .map(|p| {
            (
                format!("{}-{}", p.chain_id, p.product_id),
                SnapshotEntry {
                    price: p.price,
                    base_price: p.base_price,
                    label: p.promo_label,
                },
            )
        })
        .collect();

    Ok(StaffForm {
        chains,
        products,
        price_map,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use chrono::Duration;

    async fn logs_for(db: &DatabaseConnection, staff_id: &str) -> Vec<price_log::Model> {
        PriceLog::find()
            .filter(price_log::Column::StaffId.eq(staff_id))
            .order_by_asc(price_log::Column::Id)
            .all(db)
            .await
            .unwrap()
    }

    #[test]
    fn test_normalize_prices() {
        assert_eq!(normalize_prices(100.0, 0.0), (100.0, 100.0));
        assert_eq!(normalize_prices(0.0, 120.0), (120.0, 120.0));
        assert_eq!(normalize_prices(90.0, 120.0), (90.0, 120.0));
        assert_eq!(normalize_prices(-5.0, 0.0), (-5.0, -5.0));
        assert_eq!(normalize_prices(f64::NAN, 80.0), (80.0, 80.0));
    }

    #[tokio::test]
    async fn test_missing_identifiers_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let rules = Rules::default();

        let result = submit_price_at(
            &db,
            &rules,
            PriceSubmission {
                staff_id: String::new(),
                product_id: 1,
                chain_id: 1,
                price: 10.0,
                ..Default::default()
            },
            morning(),
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = submit_price_at(
            &db,
            &rules,
            PriceSubmission {
                staff_id: "U1".to_string(),
                product_id: 0,
                chain_id: 1,
                price: 10.0,
                ..Default::default()
            },
            morning(),
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_and_banned_staff_rejected() -> Result<()> {
        let fixture = setup_catalog().await?;
        let db = &fixture.db;

        let result = submit_test_price(db, &fixture, "nobody", 10.0, morning()).await;
        assert!(matches!(result, Err(Error::StaffNotFound { .. })));

        ban_staff(db, "U2").await?;
        let result = submit_test_price(db, &fixture, "U2", 10.0, morning()).await;
        assert!(matches!(result, Err(Error::StaffBanned { .. })));

        // Nothing was written
        assert!(Price::find().one(db).await?.is_none());
        assert!(PriceLog::find().one(db).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_product_rejected() -> Result<()> {
        let fixture = setup_catalog().await?;
        let result = submit_price_at(
            &fixture.db,
            &Rules::default(),
            PriceSubmission {
                staff_id: "U1".to_string(),
                product_id: 9999,
                chain_id: fixture.chain_a.id,
                price: 10.0,
                ..Default::default()
            },
            morning(),
        )
        .await;
        assert!(matches!(result, Err(Error::ProductNotFound { id: 9999 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_first_submission_of_day_is_payable() -> Result<()> {
        let fixture = setup_catalog().await?;
        let db = &fixture.db;

        let receipt = submit_test_price(db, &fixture, "U1", 100.0, morning()).await?;
        assert_eq!(receipt.bonus, 5);
        assert_eq!(receipt.voided, 0);
        assert!(receipt.log.is_valid);
        assert_eq!(receipt.log.payout_status, "unpaid");

        let alice = staff::get_staff(db, "U1").await?.unwrap();
        assert_eq!(alice.wallet, 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_same_day_resubmission_voids_and_corrects() -> Result<()> {
        let fixture = setup_catalog().await?;
        let db = &fixture.db;

        submit_test_price(db, &fixture, "U1", 100.0, morning()).await?;
        let second = submit_test_price(db, &fixture, "U1", 95.0, afternoon()).await?;

        assert_eq!(second.bonus, 0);
        assert_eq!(second.voided, 1);
        assert_eq!(second.log.payout_status, "void");

        let logs = logs_for(db, "U1").await;
        assert_eq!(logs.len(), 2);
        assert!(!logs[0].is_valid);
        assert!(logs[1].is_valid);

        let alice = staff::get_staff(db, "U1").await?.unwrap();
        assert_eq!(alice.wallet, 5);

        let snapshot = Price::find().one(db).await?.unwrap();
        assert_eq!(snapshot.price, 95.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_only_latest_of_many_stays_active() -> Result<()> {
        let fixture = setup_catalog().await?;
        let db = &fixture.db;

        for (i, price) in [100.0, 98.0, 97.0, 96.0].into_iter().enumerate() {
            let at = morning() + Duration::minutes(i64::try_from(i).unwrap() * 30);
            submit_test_price(db, &fixture, "U1", price, at).await?;
        }

        let logs = logs_for(db, "U1").await;
        let active: Vec<_> = logs.iter().filter(|l| l.is_valid).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].new_price, 96.0);
        assert_eq!(staff::get_staff(db, "U1").await?.unwrap().wallet, 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_next_local_day_pays_again() -> Result<()> {
        let fixture = setup_catalog().await?;
        let db = &fixture.db;

        submit_test_price(db, &fixture, "U1", 100.0, morning()).await?;
        let next_day = submit_test_price(db, &fixture, "U1", 99.0, morning() + Duration::days(1)).await?;

        assert_eq!(next_day.bonus, 5);
        assert_eq!(next_day.voided, 0);
        assert_eq!(staff::get_staff(db, "U1").await?.unwrap().wallet, 10);
        Ok(())
    }

    #[tokio::test]
    async fn test_day_boundary_uses_local_zone() -> Result<()> {
        let fixture = setup_catalog().await?;
        let db = &fixture.db;

        // 23:30 and 00:30 local are different days even though both are the same UTC date
        let late = taipei(2024, 5, 1, 23, 30);
        let after_midnight = taipei(2024, 5, 2, 0, 30);
        submit_test_price(db, &fixture, "U1", 100.0, late).await?;
        let receipt = submit_test_price(db, &fixture, "U1", 100.0, after_midnight).await?;

        assert_eq!(receipt.bonus, 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_other_staff_does_not_void_but_overwrites_snapshot() -> Result<()> {
        let fixture = setup_catalog().await?;
        let db = &fixture.db;

        submit_test_price(db, &fixture, "U1", 100.0, morning()).await?;
        let bob = submit_test_price(db, &fixture, "U2", 90.0, afternoon()).await?;

        assert_eq!(bob.bonus, 5);
        assert!(logs_for(db, "U1").await[0].is_valid);

        let snapshots = Price::find().all(db).await?;
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].price, 90.0);
        assert_eq!(snapshots[0].updated_by, "U2");
        Ok(())
    }

    #[tokio::test]
    async fn test_promotion_and_price_normalization_persisted() -> Result<()> {
        let fixture = setup_catalog().await?;
        let db = &fixture.db;

        let receipt = submit_price_at(
            db,
            &Rules::default(),
            PriceSubmission {
                staff_id: "U1".to_string(),
                product_id: fixture.product.id,
                chain_id: fixture.chain_a.id,
                price: 0.0,
                base_price: 120.0,
                promo_kind: 2,
                promo_qty: 0,
                promo_value: 199.0,
            },
            morning(),
        )
        .await?;

        assert_eq!(receipt.label, "1件$199");
        assert_eq!(receipt.log.new_price, 120.0);
        assert_eq!(receipt.log.base_price, 120.0);
        assert_eq!(receipt.log.promo_qty, 1);

        let snapshot = Price::find().one(db).await?.unwrap();
        assert_eq!(snapshot.promo_label, "1件$199");
        assert_eq!(snapshot.price, 120.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_staff_form_lists_snapshot() -> Result<()> {
        let fixture = setup_catalog().await?;
        let db = &fixture.db;
        submit_test_price(db, &fixture, "U1", 100.0, morning()).await?;

        let form = staff_form(db).await?;
        assert_eq!(form.chains.len(), 2);
        assert_eq!(form.products.len(), 1);
        let key = format!("{}-{}", fixture.chain_a.id, fixture.product.id);
        assert_eq!(form.price_map[&key].price, 100.0);
        Ok(())
    }

    #[test]
    fn test_payout_status_parse() {
        assert_eq!(PayoutStatus::parse("unpaid"), PayoutStatus::Unpaid);
        assert_eq!(PayoutStatus::parse("paid"), PayoutStatus::Paid);
        assert_eq!(PayoutStatus::parse("void"), PayoutStatus::Void);
        assert_eq!(PayoutStatus::parse(""), PayoutStatus::Void);
    }
}
