//! Audit views over the price log - duplicate detection, the daily audit
//! trail, per-pair history - and the two admin write actions on logs:
//! toggling validity and settling a staff wallet.

use crate::{
    config::Rules,
    core::{
        staff,
        submission::PayoutStatus,
        time::{format_local, local_day_bounds},
    },
    entities::{Chain, Payout, PriceLog, Product, Staff, payout, price_log},
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maximum number of duplicate groups reported.
const DUPLICATE_LIMIT: usize = 10;
/// Rows shown in a (chain, product) history.
const HISTORY_LIMIT: u64 = 20;

/// Several active submissions of one (staff, product, chain) on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// Submitter
    pub staff_id: String,
    /// Submitter name
    pub staff_name: Option<String>,
    /// Product id
    pub product_id: i64,
    /// Product name
    pub product_name: Option<String>,
    /// Chain id
    pub chain_id: i64,
    /// Chain name
    pub chain_name: Option<String>,
    /// Active rows in the group
    pub count: u64,
}

/// Which logs the audit trail covers.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditFilter {
    /// Local calendar date
    pub date: NaiveDate,
    /// Only logs for this chain
    #[serde(default)]
    pub chain_id: Option<i64>,
    /// Only logs by this staff member
    #[serde(default)]
    pub staff_id: Option<String>,
}

/// A log row next to the observation that preceded it for the same
/// (chain, product).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    /// The log row itself
    #[serde(flatten)]
    pub log: price_log::Model,
    /// Submitter name
    pub staff_name: Option<String>,
    /// Chain name
    pub chain_name: Option<String>,
    /// Product name
    pub product_name: Option<String>,
    /// Product spec
    pub product_spec: Option<String>,
    /// Product material
    pub product_material: Option<String>,
    /// Local `HH:MM`
    pub local_time: String,
    /// No earlier observation exists for the pair
    pub is_first: bool,
    /// Price of the preceding observation
    pub previous_price: Option<f64>,
    /// Minutes since the preceding observation
    pub gap_minutes: Option<i64>,
    /// Days since the preceding observation, one decimal
    pub gap_days: Option<f64>,
    /// Change against the previous price, one decimal; 0 without a usable previous price
    pub diff_percent: f64,
}

/// One row of a (chain, product) price history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    /// Log id
    pub id: i64,
    /// Local `YYYY/MM/DD`
    pub date: String,
    /// Local `HH:MM`
    pub time: String,
    /// Submitter name, if still registered
    pub staff_name: Option<String>,
    /// Submitted price
    pub price: f64,
    /// Derived promotion label
    pub promo_label: String,
    /// Change against the next older row, only when the price moved
    pub diff_percent: Option<f64>,
    /// `false` once voided
    pub is_valid: bool,
    /// `unpaid`, `paid` or `void`
    pub payout_status: String,
}

/// Result of flipping a log's validity.
#[derive(Debug, Clone, Serialize)]
pub struct ToggleOutcome {
    /// The log after the flip
    pub log: price_log::Model,
    /// Bonus taken back from the wallet by this toggle
    pub reversed: i64,
}

/// Result of settling a staff wallet.
#[derive(Debug, Clone, Serialize)]
pub struct PayoutReceipt {
    /// The recorded settlement
    pub payout: payout::Model,
    /// Log rows moved from unpaid to paid
    pub logs_settled: u64,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Display names for staff, products and chains.
struct Names {
    staff: HashMap<String, String>,
    products: HashMap<i64, crate::entities::ProductModel>,
    chains: HashMap<i64, String>,
}

impl Names {
    async fn load(db: &DatabaseConnection) -> Result<Self> {
        let staff = Staff::find()
            .all(db)
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();
        let products = Product::find()
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        let chains = Chain::find()
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();
        Ok(Self {
            staff,
            products,
            chains,
        })
    }

    fn staff(&self, id: &str) -> Option<String> {
        self.staff.get(id).cloned()
    }

    fn product(&self, id: i64) -> Option<&crate::entities::ProductModel> {
        self.products.get(&id)
    }

    fn chain(&self, id: i64) -> Option<String> {
        self.chains.get(&id).cloned()
    }
}

/// Groups of two or more active logs for the same (staff, product, chain)
/// on local date `date`, largest first, at most ten.
pub async fn duplicate_groups(
    db: &DatabaseConnection,
    tz: Tz,
    date: NaiveDate,
) -> Result<Vec<DuplicateGroup>> {
    let (start, end) = local_day_bounds(tz, date);

    let rows: Vec<(String, i64, i64, i64)> = PriceLog::find()
        .select_only()
        .column(price_log::Column::StaffId)
        .column(price_log::Column::ProductId)
        .column(price_log::Column::ChainId)
        .column_as(Expr::col(price_log::Column::Id).count(), "cnt")
        .filter(price_log::Column::IsValid.eq(true))
        .filter(price_log::Column::LogTime.gte(start))
        .filter(price_log::Column::LogTime.lt(end))
        .group_by(price_log::Column::StaffId)
        .group_by(price_log::Column::ProductId)
        .group_by(price_log::Column::ChainId)
        .into_tuple()
        .all(db)
        .await?;

    let mut groups: Vec<(String, i64, i64, u64)> = rows
        .into_iter()
        .filter_map(|(staff_id, product_id, chain_id, count)| {
            let count = u64::try_from(count).ok()?;
            (count >= 2).then_some((staff_id, product_id, chain_id, count))
        })
        .collect();
    groups.sort_by(|a, b| b.3.cmp(&a.3).then_with(|| (&a.0, a.1, a.2).cmp(&(&b.0, b.1, b.2))));
    groups.truncate(DUPLICATE_LIMIT);

    if groups.is_empty() {
        return Ok(Vec::new());
    }

    let names = Names::load(db).await?;
    Ok(groups
        .into_iter()
        .map(|(staff_id, product_id, chain_id, count)| DuplicateGroup {
            staff_name: names.staff(&staff_id),
            product_name: names.product(product_id).map(|p| p.name.clone()),
            chain_name: names.chain(chain_id),
            staff_id,
            product_id,
            chain_id,
            count,
        })
        .collect())
}

/// Every log on the filter's local date, newest first, each paired with the
/// preceding observation (any validity) for the same (chain, product).
pub async fn audit_trail(db: &DatabaseConnection, tz: Tz, filter: &AuditFilter) -> Result<Vec<AuditEntry>> {
    let (start, end) = local_day_bounds(tz, filter.date);

    let mut select = PriceLog::find()
        .filter(price_log::Column::LogTime.gte(start))
        .filter(price_log::Column::LogTime.lt(end));
    if let Some(chain_id) = filter.chain_id {
        select = select.filter(price_log::Column::ChainId.eq(chain_id));
    }
    if let Some(staff_id) = filter.staff_id.as_deref().filter(|s| !s.is_empty()) {
        select = select.filter(price_log::Column::StaffId.eq(staff_id));
    }
    let logs = select
        .order_by_desc(price_log::Column::LogTime)
        .order_by_desc(price_log::Column::Id)
        .all(db)
        .await?;

    let names = Names::load(db).await?;
    let mut entries = Vec::with_capacity(logs.len());

    for log in logs {
        let previous = PriceLog::find()
            .filter(price_log::Column::ChainId.eq(log.chain_id))
            .filter(price_log::Column::ProductId.eq(log.product_id))
            .filter(price_log::Column::LogTime.lt(log.log_time))
            .order_by_desc(price_log::Column::LogTime)
            .order_by_desc(price_log::Column::Id)
            .one(db)
            .await?;

        let (gap_minutes, gap_days, diff_percent) = match &previous {
            Some(prev) => {
                let seconds = (log.log_time - prev.log_time).num_seconds();
                #[allow(clippy::cast_precision_loss)]
                let gap_days = round1(seconds as f64 / 86_400.0);
                let diff = if prev.new_price > 0.0 {
                    round1((log.new_price - prev.new_price) / prev.new_price * 100.0)
                } else {
                    0.0
                };
                (Some(seconds / 60), Some(gap_days), diff)
            }
            None => (None, None, 0.0),
        };

        let product = names.product(log.product_id);
        entries.push(AuditEntry {
            staff_name: names.staff(&log.staff_id),
            chain_name: names.chain(log.chain_id),
            product_name: product.map(|p| p.name.clone()),
            product_spec: product.map(|p| p.spec.clone()),
            product_material: product.map(|p| p.material.clone()),
            local_time: format_local(tz, log.log_time, "%H:%M"),
            is_first: previous.is_none(),
            previous_price: previous.map(|p| p.new_price),
            gap_minutes,
            gap_days,
            diff_percent,
            log,
        });
    }
    Ok(entries)
}

/// The last twenty logs for one (chain, product), newest first, any validity.
pub async fn price_history(
    db: &DatabaseConnection,
    tz: Tz,
    chain_id: i64,
    product_id: i64,
) -> Result<Vec<HistoryEntry>> {
    let rows = PriceLog::find()
        .filter(price_log::Column::ChainId.eq(chain_id))
        .filter(price_log::Column::ProductId.eq(product_id))
        .order_by_desc(price_log::Column::LogTime)
        .order_by_desc(price_log::Column::Id)
        .limit(HISTORY_LIMIT)
        .all(db)
        .await?;
    let staff_names: HashMap<String, String> = Staff::find()
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();

    let history = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            #[allow(clippy::float_cmp)]
            let diff_percent = rows.get(i + 1).and_then(|older| {
                (older.new_price > 0.0 && row.new_price != older.new_price)
                    .then(|| round1((row.new_price - older.new_price) / older.new_price * 100.0))
            });
            HistoryEntry {
                id: row.id,
                date: format_local(tz, row.log_time, "%Y/%m/%d"),
                time: format_local(tz, row.log_time, "%H:%M"),
                staff_name: staff_names.get(&row.staff_id).cloned(),
                price: row.new_price,
                promo_label: row.promo_label.clone(),
                diff_percent,
                is_valid: row.is_valid,
                payout_status: row.payout_status.clone(),
            }
        })
        .collect();
    Ok(history)
}

/// Flips a log between active and voided.
///
/// Voiding an unpaid row takes the bonus back from the wallet (never below
/// zero) and marks it void. Voiding a paid row leaves payout state and wallet
/// alone. Reviving turns a void row into unpaid without crediting. The price
/// snapshot is never touched.
pub async fn toggle_log(db: &DatabaseConnection, rules: &Rules, log_id: i64) -> Result<ToggleOutcome> {
    let txn = db.begin().await?;

    let log = PriceLog::find_by_id(log_id)
        .one(&txn)
        .await?
        .ok_or(Error::LogNotFound { id: log_id })?;
    let status = PayoutStatus::parse(&log.payout_status);
    let staff_id = log.staff_id.clone();
    let was_valid = log.is_valid;

    let mut reversed = 0;
    let mut active: price_log::ActiveModel = log.into();

    if was_valid {
        active.is_valid = Set(false);
        if status == PayoutStatus::Unpaid {
            if staff::reverse_credit(&txn, &staff_id, rules.bonus_amount).await? {
                reversed = rules.bonus_amount;
            }
            active.payout_status = Set(PayoutStatus::Void.as_str().to_string());
        }
    } else {
        active.is_valid = Set(true);
        if status == PayoutStatus::Void {
            active.payout_status = Set(PayoutStatus::Unpaid.as_str().to_string());
        }
    }

    let updated = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        log = log_id,
        staff = %staff_id,
        valid = updated.is_valid,
        payout_status = %updated.payout_status,
        reversed,
        "Toggled price log"
    );
    Ok(ToggleOutcome {
        log: updated,
        reversed,
    })
}

/// Settles a staff member: every active unpaid log becomes paid, the wallet
/// is zeroed and a payout row records the amount.
pub async fn payout_staff(
    db: &DatabaseConnection,
    staff_id: &str,
    admin_username: &str,
    now: DateTime<Utc>,
) -> Result<PayoutReceipt> {
    let txn = db.begin().await?;

    let member = staff::get_staff(&txn, staff_id)
        .await?
        .ok_or_else(|| Error::StaffNotFound {
            staff_id: staff_id.to_string(),
        })?;

    let settled = PriceLog::update_many()
        .col_expr(
            price_log::Column::PayoutStatus,
            Expr::value(PayoutStatus::Paid.as_str()),
        )
        .filter(price_log::Column::StaffId.eq(staff_id))
        .filter(price_log::Column::IsValid.eq(true))
        .filter(price_log::Column::PayoutStatus.eq(PayoutStatus::Unpaid.as_str()))
        .exec(&txn)
        .await?;

    let mut wallet: crate::entities::staff::ActiveModel = member.clone().into();
    wallet.wallet = Set(0);
    wallet.update(&txn).await?;

    let record = payout::ActiveModel {
        staff_id: Set(member.id.clone()),
        amount: Set(member.wallet),
        admin_username: Set(admin_username.to_string()),
        payout_time: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(
        staff = %member.id,
        amount = member.wallet,
        logs = settled.rows_affected,
        admin = admin_username,
        "Settled staff wallet"
    );
    Ok(PayoutReceipt {
        payout: record,
        logs_settled: settled.rows_affected,
    })
}

/// Payout records, newest first, optionally for one staff member.
pub async fn list_payouts(db: &DatabaseConnection, staff_id: Option<&str>) -> Result<Vec<payout::Model>> {
    let mut select = Payout::find();
    if let Some(staff_id) = staff_id {
        select = select.filter(payout::Column::StaffId.eq(staff_id));
    }
    select
        .order_by_desc(payout::Column::PayoutTime)
        .order_by_desc(payout::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
