//! Promotion kinds and their display labels.
//!
//! Staff pick a promotion kind in the submission form and fill in a quantity
//! and a value. The pair is turned into a short label shown next to the price
//! (e.g., `"2件$99"` for "two for $99").

use serde::{Deserialize, Serialize};

/// Closed set of promotion mechanics understood by the label builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionKind {
    /// Regular price, no promotion
    None,
    /// `qty` units for a fixed total price
    BundlePrice,
    /// `qty` units at a percentage of the list price
    BundlePercent,
    /// Buy `qty`, get `value` free
    BuyGet,
    /// The `qty`-th unit costs a fixed price
    NthUnitPrice,
    /// The `qty`-th unit at a percentage of the list price
    NthUnitPercent,
}

impl PromotionKind {
    /// Maps the numeric code sent by the submission form. Unknown codes map to `None`.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::None),
            2 => Some(Self::BundlePrice),
            3 => Some(Self::BundlePercent),
            4 => Some(Self::BuyGet),
            5 => Some(Self::NthUnitPrice),
            6 => Some(Self::NthUnitPercent),
            _ => None,
        }
    }

    /// Numeric code stored in the database.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::None => 1,
            Self::BundlePrice => 2,
            Self::BundlePercent => 3,
            Self::BuyGet => 4,
            Self::NthUnitPrice => 5,
            Self::NthUnitPercent => 6,
        }
    }
}

/// Builds the display label for a promotion code and its parameters.
///
/// Values are truncated to whole numbers. For `NthUnitPercent` a multiple of
/// ten is shown in tens (`80` becomes `8折`). Unknown codes and `None` give an
/// empty label.
#[must_use]
pub fn promotion_label(code: i32, qty: i32, value: f64) -> String {
    #[allow(clippy::cast_possible_truncation)]
    let whole = value.trunc() as i64;

    match PromotionKind::from_code(code) {
        Some(PromotionKind::BundlePrice) => format!("{qty}件${whole}"),
        Some(PromotionKind::BundlePercent) => format!("{qty}件{whole}折"),
        Some(PromotionKind::BuyGet) => format!("買{qty}送{whole}"),
        Some(PromotionKind::NthUnitPrice) => format!("第{qty}件${whole}"),
        Some(PromotionKind::NthUnitPercent) => {
            let shown = if whole % 10 == 0 { whole / 10 } else { whole };
            format!("第{qty}件{shown}折")
        }
        Some(PromotionKind::None) | None => String::new(),
    }
}
