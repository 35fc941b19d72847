//! Autocomplete handlers for Discord slash command parameters.

use crate::{bot::BotData, core::catalog, errors::Error};

/// Discord autocomplete limit
const MAX_CHOICES: usize = 25;

/// Case-insensitive substring filter, sorted and capped at the Discord limit.
#[must_use]
pub fn filter_choices(names: impl IntoIterator<Item = String>, partial: &str) -> Vec<String> {
    let partial_lower = partial.to_lowercase();
    let mut matching: Vec<String> = names
        .into_iter()
        .filter(|name| name.to_lowercase().contains(&partial_lower))
        .collect();
    matching.sort();
    matching.dedup();
    matching.truncate(MAX_CHOICES);
    matching
}

/// Suggests active chain names.
pub async fn autocomplete_chain_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let Ok(chains) = catalog::list_chains(&ctx.data().database).await else {
        return Vec::new();
    };
    filter_choices(
        chains.into_iter().filter(|c| c.is_active).map(|c| c.name),
        partial,
    )
}

/// Suggests categories from the admin-managed option list.
pub async fn autocomplete_category(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let Ok(options) = catalog::list_options(&ctx.data().database).await else {
        return Vec::new();
    };
    filter_choices(options.category.into_iter().map(|o| o.name), partial)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_choices() {
        let names = ["Carrefour", "PX Mart", "Costco", "carrefour"].map(String::from);
        assert_eq!(
            filter_choices(names.clone(), "CAR"),
            vec!["Carrefour".to_string(), "carrefour".to_string()]
        );
        assert_eq!(filter_choices(names, "").len(), 4);

        let many = (0..40).map(|i| format!("Chain {i:02}"));
        assert_eq!(filter_choices(many, "chain").len(), MAX_CHOICES);
    }
}
