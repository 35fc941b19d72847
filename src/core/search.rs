//! Consumer search and ranking.
//!
//! Every active product with at least one listed price becomes a
//! [`RankedProduct`] carrying one [`Offer`] per chain. Offers are scored by
//! price per unit of capacity; the cheapest score across chains is the
//! product's *champion* score and drives the default ordering. In store-shelf
//! mode the score restricted to the target chain is used instead.

use crate::{
    config::Rules,
    core::{
        lobby::{LobbyData, load_lobby},
        time::format_local,
    },
    entities::{Chain, Price, PriceLog, Product, chain, price_log, product, search_log},
    errors::Result,
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*, sea_query::Expr};
use serde::{Deserialize, Deserializer, Serialize};
use std::{cmp::Ordering, collections::HashMap, str::FromStr};

/// How results are browsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Cheapest per-unit price across all chains first
    #[default]
    Default,
    /// One chain's shelf, grouped by category
    StoreShelf,
}

impl FromStr for SearchMode {
    type Err = ();

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "default" => Ok(Self::Default),
            "store_shelf" => Ok(Self::StoreShelf),
            _ => Err(()),
        }
    }
}

/// Reads an optional query value. Blank or unparseable input reads as `None`.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok()))
}

/// Consumer search parameters. All optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    /// Space-separated search terms
    #[serde(default)]
    pub keyword: Option<String>,
    /// Browsing mode; absent means a general search
    #[serde(default, deserialize_with = "lenient")]
    pub mode: Option<SearchMode>,
    /// Chain the consumer is browsing or standing in
    #[serde(default, deserialize_with = "lenient")]
    pub chain_id: Option<i64>,
    /// Category browsed on a store shelf
    #[serde(default)]
    pub category: Option<String>,
    /// Product forced to the top of the results
    #[serde(default, deserialize_with = "lenient")]
    pub pin_id: Option<i64>,
    /// Caller latitude
    #[serde(default, deserialize_with = "lenient")]
    pub lat: Option<f64>,
    /// Caller longitude
    #[serde(default, deserialize_with = "lenient")]
    pub lng: Option<f64>,
    /// Caller's chat identity, if known
    #[serde(default)]
    pub user_id: Option<String>,
}

impl SearchQuery {
    fn keyword(&self) -> &str {
        self.keyword.as_deref().map_or("", str::trim)
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }

    /// Target chain, only when browsing a store shelf.
    fn shelf_chain(&self) -> Option<i64> {
        match self.mode {
            Some(SearchMode::StoreShelf) => self.chain_id,
            _ => None,
        }
    }
}

/// One chain's current price for a product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Offer {
    /// Chain id
    pub chain_id: i64,
    /// Chain name
    pub chain_name: String,
    /// Chain logo
    pub chain_logo: Option<String>,
    /// Final shelf price
    pub price: f64,
    /// Pre-promotion price
    pub base_price: f64,
    /// Promotion label, empty without a promotion
    pub promo_label: String,
    /// Comparison price for display, e.g. `"$4.5/100ml"`
    pub display: String,
    /// Local `MM/DD` of the last update
    pub updated: String,
    /// Offer belongs to the requested chain
    pub is_target: bool,
    /// Price is at or below the recent historical minimum
    pub is_history_low: bool,
}

/// A product with its offers and comparison scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedProduct {
    /// The product row
    #[serde(flatten)]
    pub product: product::Model,
    /// Offers, cheapest first
    pub offers: Vec<Offer>,
    /// Lowest score across all chains
    pub champion_score: Option<f64>,
    /// Display string of the champion offer
    pub champion_display: String,
    /// Lowest score at the target chain
    pub local_score: Option<f64>,
}

/// Search results, or the lobby when nothing was asked for.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    /// Trimmed keyword as searched
    pub keyword: String,
    /// Mode as requested
    pub mode: Option<SearchMode>,
    /// Lobby metadata, only when nothing was asked for
    pub lobby: Option<LobbyData>,
    /// Ranked results
    pub products: Vec<RankedProduct>,
    /// Chain being browsed in store-shelf mode
    pub target_chain: Option<chain::Model>,
}

/// Per-unit comparison score. Raw price when capacity is unknown.
#[must_use]
pub fn comparison_score(price: f64, capacity: f64) -> f64 {
    if capacity > 0.0 { price / capacity } else { price }
}

/// Display string for a comparison score: per 100 units for units in
/// `per_hundred_units`, per unit otherwise, empty when capacity is unknown.
#[must_use]
pub fn score_display(price: f64, capacity: f64, unit: &str, per_hundred_units: &[String]) -> String {
    if capacity <= 0.0 || price <= 0.0 {
        return String::new();
    }
    let unit = unit.trim();
    let per_hundred = per_hundred_units
        .iter()
        .any(|u| u.eq_ignore_ascii_case(unit));
    if per_hundred {
        format!("${:.1}/100{unit}", price / capacity * 100.0)
    } else {
        format!("${:.1}/{unit}", price / capacity)
    }
}

/// Whether every whitespace-separated token of `keyword` occurs in `haystack`,
/// ignoring case.
#[must_use]
pub fn matches_keyword(keyword: &str, haystack: &str) -> bool {
    let haystack = haystack.to_lowercase();
    keyword
        .to_lowercase()
        .split_whitespace()
        .all(|token| haystack.contains(token))
}

/// Writes a search log row.
pub async fn record_search(
    db: &DatabaseConnection,
    keyword: &str,
    user_id: &str,
    lat: Option<f64>,
    lng: Option<f64>,
    now: DateTime<Utc>,
) -> Result<search_log::Model> {
    let model = search_log::ActiveModel {
        keyword: Set(keyword.to_string()),
        user_id: Set(user_id.to_string()),
        lat: Set(lat),
        lng: Set(lng),
        log_time: Set(now),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Runs a consumer search at `now`.
///
/// With no keyword and no mode the lobby is returned instead of products.
pub async fn search(
    db: &DatabaseConnection,
    rules: &Rules,
    query: &SearchQuery,
    now: DateTime<Utc>,
) -> Result<SearchResponse> {
    let keyword = query.keyword().to_string();

    if !keyword.is_empty() {
        let user_id = query.user_id.as_deref().unwrap_or_default();
        if let Err(e) = record_search(db, &keyword, user_id, query.lat, query.lng, now).await {
            tracing::warn!(error = %e, keyword = %keyword, "Failed to record search");
        }
    }

    if keyword.is_empty() && query.mode.is_none() {
        return Ok(SearchResponse {
            keyword,
            mode: None,
            lobby: Some(load_lobby(db).await),
            products: Vec::new(),
            target_chain: None,
        });
    }

    let shelf_chain = query.shelf_chain();
    let candidates = load_candidates(db, query.category(), shelf_chain.is_some()).await?;
    let history_low = load_history_low(db, rules.history_low_days, now).await;
    let chains: HashMap<i64, chain::Model> = Chain::find()
        .filter(chain::Column::IsActive.eq(true))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let mut products: Vec<RankedProduct> = candidates
        .into_iter()
        .map(|product| RankedProduct {
            product,
            offers: Vec::new(),
            champion_score: None,
            champion_display: String::new(),
            local_score: None,
        })
        .collect();
    let index: HashMap<i64, usize> = products
        .iter()
        .enumerate()
        .map(|(i, p)| (p.product.id, i))
        .collect();

    let snapshots = Price::find()
        .filter(crate::entities::PriceColumn::Price.gt(0.0))
        .order_by_asc(crate::entities::PriceColumn::Price)
        .all(db)
        .await?;

    for snapshot in snapshots {
        let (Some(&i), Some(chain)) = (index.get(&snapshot.product_id), chains.get(&snapshot.chain_id))
        else {
            continue;
        };
        let entry = &mut products[i];
        let capacity = entry.product.capacity;
        let score = comparison_score(snapshot.price, capacity);
        let display = score_display(snapshot.price, capacity, &entry.product.unit, &rules.per_hundred_units);
        let is_target = query.chain_id == Some(chain.id);

        if entry.champion_score.is_none_or(|best| score < best) {
            entry.champion_score = Some(score);
            entry.champion_display.clone_from(&display);
        }
        if is_target && entry.local_score.is_none_or(|best| score < best) {
            entry.local_score = Some(score);
        }

        // No accepted log in the window: the listed price is the lowest seen
        let is_history_low = history_low
            .get(&snapshot.product_id)
            .is_none_or(|&low| snapshot.price <= low);

        entry.offers.push(Offer {
            chain_id: chain.id,
            chain_name: chain.name.clone(),
            chain_logo: chain.logo_url.clone(),
            price: snapshot.price,
            base_price: snapshot.base_price,
            promo_label: snapshot.promo_label,
            display,
            updated: format_local(rules.timezone, snapshot.updated_at, "%m/%d"),
            is_target,
            is_history_low,
        });
    }

    if !keyword.is_empty() {
        products.retain(|p| matches_keyword(&keyword, &searchable_text(p)));
    }

    let products = rank(products, shelf_chain.is_some(), query.pin_id);

    let target_chain = match shelf_chain {
        Some(id) => Chain::find_by_id(id).one(db).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, chain = id, "Failed to load target chain");
            None
        }),
        None => None,
    };

    tracing::debug!(keyword = %keyword, results = products.len(), "Search completed");

    Ok(SearchResponse {
        keyword,
        mode: query.mode,
        lobby: None,
        products,
        target_chain,
    })
}

/// Active products in pre-ranking order. The category narrows a store
/// shelf only; a general search spans every category.
async fn load_candidates(
    db: &DatabaseConnection,
    category: Option<&str>,
    store_shelf: bool,
) -> Result<Vec<product::Model>> {
    let select = Product::find().filter(product::Column::IsActive.eq(true));
    let select = if store_shelf {
        let select = match category {
            Some(category) => select.filter(product::Column::Category.eq(category)),
            None => select,
        };
        select
            .order_by_asc(product::Column::Category)
            .order_by_desc(product::Column::Priority)
    } else {
        select
            .order_by_desc(product::Column::Priority)
            .order_by_asc(product::Column::Category)
    };
    select
        .order_by_asc(product::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lowest active logged price per product within the look-back window.
/// Degrades to an empty map when the read fails.
async fn load_history_low(
    db: &DatabaseConnection,
    days: i64,
    now: DateTime<Utc>,
) -> HashMap<i64, f64> {
    let since = now - Duration::days(days);
    PriceLog::find()
        .select_only()
        .column(price_log::Column::ProductId)
        .column_as(Expr::col(price_log::Column::NewPrice).min(), "min_price")
        .filter(price_log::Column::IsValid.eq(true))
        .filter(price_log::Column::LogTime.gte(since))
        .group_by(price_log::Column::ProductId)
        .into_tuple::<(i64, f64)>()
        .all(db)
        .await
        .map(|rows| rows.into_iter().collect())
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load historical lows");
            HashMap::new()
        })
}

fn searchable_text(p: &RankedProduct) -> String {
    let selling_at: Vec<&str> = p.offers.iter().map(|o| o.chain_name.as_str()).collect();
    format!(
        "{} {} {} {} {}",
        p.product.name,
        p.product.material,
        p.product.category,
        p.product.keywords,
        selling_at.join(" ")
    )
}

fn cmp_score(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Filters and orders products for display. Stable: equal keys keep their
/// candidate order, so ranking the same input twice gives the same output.
fn rank(mut products: Vec<RankedProduct>, store_shelf: bool, pin_id: Option<i64>) -> Vec<RankedProduct> {
    let unpinned = |p: &RankedProduct| pin_id != Some(p.product.id);

    if store_shelf {
        products.retain(|p| p.offers.iter().any(|o| o.is_target));
        products.sort_by(|a, b| {
            unpinned(a)
                .cmp(&unpinned(b))
                .then_with(|| a.product.category.cmp(&b.product.category))
                .then_with(|| cmp_score(a.local_score, b.local_score))
        });
    } else {
        products.retain(|p| !p.offers.is_empty());
        products.sort_by(|a, b| {
            unpinned(a)
                .cmp(&unpinned(b))
                .then_with(|| cmp_score(a.champion_score, b.champion_score))
        });
    }

    for p in &mut products {
        p.offers.sort_by(|a, b| a.price.total_cmp(&b.price));
    }
    products
}
