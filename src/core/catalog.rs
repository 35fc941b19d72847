//! Catalog administration - products, chains and the option lists that feed
//! the product form.

use crate::{
    entities::{Chain, Price, Product, ProductOption, chain, price, product, product_option},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Editable product fields, used for both create and edit.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductInput {
    /// Display name
    pub name: String,
    /// Category option value
    #[serde(default)]
    pub category: String,
    /// Spec option value
    #[serde(default)]
    pub spec: String,
    /// Material option value
    #[serde(default)]
    pub material: String,
    /// Blank or unparseable capacity is stored as 0
    #[serde(default)]
    pub capacity: Option<f64>,
    /// Unit option value, e.g. `ml`
    #[serde(default)]
    pub unit: String,
    /// Free-text search terms
    #[serde(default)]
    pub keywords: String,
    /// Product photo
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ProductInput {
    fn capacity(&self) -> f64 {
        self.capacity.filter(|c| c.is_finite()).unwrap_or(0.0)
    }
}

/// Editable chain fields.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainInput {
    /// Display name
    pub name: String,
    /// Logo image
    #[serde(default)]
    pub logo_url: Option<String>,
}

/// The product attribute a [`product_option::Model`] supplies values for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    /// Supplies `product.category`
    Category,
    /// Supplies `product.spec`
    Spec,
    /// Supplies `product.material`
    Material,
    /// Supplies `product.unit`
    Unit,
}

impl OptionKind {
    /// All kinds, in display order.
    pub const ALL: [Self; 4] = [Self::Category, Self::Spec, Self::Material, Self::Unit];

    /// Value stored in `product_options.kind`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Spec => "spec",
            Self::Material => "material",
            Self::Unit => "unit",
        }
    }

    /// Parses a stored kind.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == value)
    }

    /// Product column holding values of this kind.
    #[must_use]
    pub const fn product_column(self) -> product::Column {
        match self {
            Self::Category => product::Column::Category,
            Self::Spec => product::Column::Spec,
            Self::Material => product::Column::Material,
            Self::Unit => product::Column::Unit,
        }
    }
}

/// Option lists keyed by kind.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OptionLists {
    /// Category values
    pub category: Vec<product_option::Model>,
    /// Spec values
    pub spec: Vec<product_option::Model>,
    /// Material values
    pub material: Vec<product_option::Model>,
    /// Unit values
    pub unit: Vec<product_option::Model>,
}

/// A product that has not been priced recently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaleProduct {
    /// Product id
    pub id: i64,
    /// Product name
    pub name: String,
    /// Product category
    pub category: String,
    /// Latest snapshot update across chains; `None` when never priced
    pub last_update: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// Lists every product, newest first.
pub async fn list_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .order_by_desc(product::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Adds an active product with priority 0.
pub async fn create_product(db: &DatabaseConnection, input: ProductInput) -> Result<product::Model> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("product name is required"));
    }

    let capacity = input.capacity();
    let model = product::ActiveModel {
        name: Set(name),
        category: Set(input.category.trim().to_string()),
        spec: Set(input.spec.trim().to_string()),
        material: Set(input.material.trim().to_string()),
        capacity: Set(capacity),
        unit: Set(input.unit.trim().to_string()),
        keywords: Set(input.keywords.trim().to_string()),
        priority: Set(0),
        image_url: Set(input.image_url),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let created = model.insert(db).await?;
    tracing::info!(id = created.id, name = %created.name, "Created product");
    Ok(created)
}

/// Replaces the editable fields of a product.
pub async fn update_product(
    db: &DatabaseConnection,
    id: i64,
    input: ProductInput,
) -> Result<product::Model> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("product name is required"));
    }

    let existing = Product::find_by_id(id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id })?;

    let capacity = input.capacity();
    let mut active: product::ActiveModel = existing.into();
    active.name = Set(name);
    active.category = Set(input.category.trim().to_string());
    active.spec = Set(input.spec.trim().to_string());
    active.material = Set(input.material.trim().to_string());
    active.capacity = Set(capacity);
    active.unit = Set(input.unit.trim().to_string());
    active.keywords = Set(input.keywords.trim().to_string());
    if input.image_url.is_some() {
        active.image_url = Set(input.image_url);
    }
    active.update(db).await.map_err(Into::into)
}

/// Deletes a product. Snapshot rows for it are removed; price logs are kept.
pub async fn delete_product(db: &DatabaseConnection, id: i64) -> Result<()> {
    let result = Product::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::ProductNotFound { id });
    }
    Price::delete_many()
        .filter(price::Column::ProductId.eq(id))
        .exec(db)
        .await?;
    Ok(())
}

/// Flips a product between listed and unlisted.
pub async fn toggle_product(db: &DatabaseConnection, id: i64) -> Result<product::Model> {
    let existing = Product::find_by_id(id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id })?;
    let is_active = existing.is_active;
    let mut active: product::ActiveModel = existing.into();
    active.is_active = Set(!is_active);
    active.update(db).await.map_err(Into::into)
}

// ---------------------------------------------------------------------------
// Chains
// ---------------------------------------------------------------------------

/// Lists every chain by id.
pub async fn list_chains(db: &DatabaseConnection) -> Result<Vec<chain::Model>> {
    Chain::find()
        .order_by_asc(chain::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Adds an active chain.
pub async fn create_chain(db: &DatabaseConnection, input: ChainInput) -> Result<chain::Model> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("chain name is required"));
    }
    let model = chain::ActiveModel {
        name: Set(name),
        logo_url: Set(input.logo_url.filter(|u| !u.trim().is_empty())),
        is_active: Set(true),
        ..Default::default()
    };
    let created = model.insert(db).await?;
    tracing::info!(id = created.id, name = %created.name, "Created chain");
    Ok(created)
}

/// Renames a chain and replaces its logo.
pub async fn update_chain(db: &DatabaseConnection, id: i64, input: ChainInput) -> Result<chain::Model> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("chain name is required"));
    }
    let existing = Chain::find_by_id(id)
        .one(db)
        .await?
        .ok_or(Error::ChainNotFound { id })?;
    let mut active: chain::ActiveModel = existing.into();
    active.name = Set(name);
    active.logo_url = Set(input.logo_url.filter(|u| !u.trim().is_empty()));
    active.update(db).await.map_err(Into::into)
}

/// Flips a chain between active and inactive. Inactive chains drop out of
/// search and the staff form.
pub async fn toggle_chain(db: &DatabaseConnection, id: i64) -> Result<chain::Model> {
    let existing = Chain::find_by_id(id)
        .one(db)
        .await?
        .ok_or(Error::ChainNotFound { id })?;
    let is_active = existing.is_active;
    let mut active: chain::ActiveModel = existing.into();
    active.is_active = Set(!is_active);
    active.update(db).await.map_err(Into::into)
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Loads all options grouped by kind, each list ordered by name.
pub async fn list_options(db: &DatabaseConnection) -> Result<OptionLists> {
    let rows = ProductOption::find()
        .order_by_asc(product_option::Column::Kind)
        .order_by_asc(product_option::Column::Name)
        .all(db)
        .await?;

    let mut lists = OptionLists::default();
    for row in rows {
        match OptionKind::parse(&row.kind) {
            Some(OptionKind::Category) => lists.category.push(row),
            Some(OptionKind::Spec) => lists.spec.push(row),
            Some(OptionKind::Material) => lists.material.push(row),
            Some(OptionKind::Unit) => lists.unit.push(row),
            None => tracing::warn!(kind = %row.kind, id = row.id, "Skipping option of unknown kind"),
        }
    }
    Ok(lists)
}

/// Adds a value to one of the option lists.
pub async fn add_option(
    db: &DatabaseConnection,
    kind: OptionKind,
    name: &str,
) -> Result<product_option::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("option name is required"));
    }
    let model = product_option::ActiveModel {
        kind: Set(kind.as_str().to_string()),
        name: Set(name.to_string()),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Removes an option unless a product still uses its value.
pub async fn delete_option(db: &DatabaseConnection, id: i64) -> Result<()> {
    let Some(option) = ProductOption::find_by_id(id).one(db).await? else {
        return Err(Error::validation(format!("option {id} does not exist")));
    };

    if let Some(kind) = OptionKind::parse(&option.kind) {
        let count = Product::find()
            .filter(kind.product_column().eq(option.name.as_str()))
            .count(db)
            .await?;
        if count > 0 {
            return Err(Error::OptionInUse {
                name: option.name,
                count,
            });
        }
    }

    ProductOption::delete_by_id(id).exec(db).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Products whose most recent snapshot update is older than `stale_after_days`
/// before `now`, or that were never priced. Oldest first, never-priced last.
pub async fn stale_products(
    db: &DatabaseConnection,
    stale_after_days: i64,
    now: DateTime<Utc>,
) -> Result<Vec<StaleProduct>> {
    let cutoff = now - Duration::days(stale_after_days);

    let mut latest: HashMap<i64, DateTime<Utc>> = HashMap::new();
    for snapshot in Price::find().all(db).await? {
        latest
            .entry(snapshot.product_id)
            .and_modify(|t| *t = (*t).max(snapshot.updated_at))
            .or_insert(snapshot.updated_at);
    }

    let mut stale: Vec<StaleProduct> = Product::find()
        .order_by_asc(product::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|p| {
            let last_update = latest.get(&p.id).copied();
            match last_update {
                Some(t) if t >= cutoff => None,
                _ => Some(StaleProduct {
                    id: p.id,
                    name: p.name,
                    category: p.category,
                    last_update,
                }),
            }
        })
        .collect();

    stale.sort_by_key(|p| (p.last_update.is_none(), p.last_update));
    Ok(stale)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    fn milk() -> ProductInput {
        ProductInput {
            name: "Oat Milk".to_string(),
            category: "Dairy".to_string(),
            unit: "ml".to_string(),
            capacity: Some(946.0),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_product_defaults() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_product(
            &db,
            ProductInput {
                capacity: None,
                ..milk()
            },
        )
        .await?;

        assert_eq!(product.capacity, 0.0);
        assert_eq!(product.priority, 0);
        assert!(product.is_active);

        let blank = create_product(
            &db,
            ProductInput {
                name: "  ".to_string(),
                ..milk()
            },
        )
        .await;
        assert!(matches!(blank, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_products_newest_first() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_product(&db, milk()).await?;
        let second = create_product(
            &db,
            ProductInput {
                name: "Soy Milk".to_string(),
                ..milk()
            },
        )
        .await?;

        let ids: Vec<i64> = list_products(&db).await?.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_toggle_and_delete_product() -> Result<()> {
        let fixture = setup_catalog().await?;
        let db = &fixture.db;
        submit_test_price(db, &fixture, "U1", 100.0, morning()).await?;

        let updated = update_product(
            db,
            fixture.product.id,
            ProductInput {
                name: "Fresh Milk 2L".to_string(),
                capacity: Some(2000.0),
                unit: "ml".to_string(),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(updated.name, "Fresh Milk 2L");
        assert_eq!(updated.capacity, 2000.0);

        let toggled = toggle_product(db, fixture.product.id).await?;
        assert!(!toggled.is_active);
        assert!(toggle_product(db, fixture.product.id).await?.is_active);

        delete_product(db, fixture.product.id).await?;
        assert!(Price::find().one(db).await?.is_none());
        assert_eq!(
            crate::entities::PriceLog::find().count(db).await?,
            1,
            "history survives product deletion"
        );
        assert!(matches!(
            delete_product(db, fixture.product.id).await,
            Err(Error::ProductNotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_chain_crud() -> Result<()> {
        let db = setup_test_db().await?;
        let chain = create_chain(
            &db,
            ChainInput {
                name: "Costco".to_string(),
                logo_url: Some(String::new()),
            },
        )
        .await?;
        assert!(chain.is_active);
        assert_eq!(chain.logo_url, None);

        let renamed = update_chain(
            &db,
            chain.id,
            ChainInput {
                name: "Costco TW".to_string(),
                logo_url: Some("https://example.com/c.png".to_string()),
            },
        )
        .await?;
        assert_eq!(renamed.name, "Costco TW");

        assert!(!toggle_chain(&db, chain.id).await?.is_active);
        assert!(matches!(
            toggle_chain(&db, 999).await,
            Err(Error::ChainNotFound { id: 999 })
        ));
        assert_eq!(list_chains(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_option_delete_refused_while_in_use() -> Result<()> {
        let db = setup_test_db().await?;
        let dairy = add_option(&db, OptionKind::Category, "Dairy").await?;
        let snacks = add_option(&db, OptionKind::Category, "Snacks").await?;
        add_option(&db, OptionKind::Unit, "ml").await?;
        create_product(&db, milk()).await?;

        let result = delete_option(&db, dairy.id).await;
        assert!(matches!(
            result,
            Err(Error::OptionInUse { count: 1, .. })
        ));

        delete_option(&db, snacks.id).await?;
        let lists = list_options(&db).await?;
        assert_eq!(lists.category.len(), 1);
        assert_eq!(lists.unit.len(), 1);
        assert!(lists.spec.is_empty());
        Ok(())
    }

    #[test]
    fn test_option_kind_columns() {
        assert_eq!(OptionKind::parse("material"), Some(OptionKind::Material));
        assert_eq!(OptionKind::parse("brand"), None);
        assert!(matches!(
            OptionKind::Unit.product_column(),
            product::Column::Unit
        ));
    }

    #[tokio::test]
    async fn test_stale_products() -> Result<()> {
        let fixture = setup_catalog().await?;
        let db = &fixture.db;
        let never_priced = create_test_product(db, "Butter", "Dairy", 200.0, "g").await?;
        submit_test_price(db, &fixture, "U1", 100.0, morning()).await?;

        let soon = stale_products(db, 30, morning() + Duration::days(10)).await?;
        assert_eq!(soon.len(), 1);
        assert_eq!(soon[0].id, never_priced.id);

        let later = stale_products(db, 30, morning() + Duration::days(31)).await?;
        assert_eq!(later.len(), 2);
        assert_eq!(later[0].id, fixture.product.id);
        assert_eq!(later[1].last_update, None);
        Ok(())
    }
}
