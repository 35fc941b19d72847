//! Price commands - `/ask`, `/search` and `/shelf`.
//!
//! Replies stay short: a handful of cheapest offers plus a link to the full
//! comparison in the web UI.

use crate::core::search::SearchResponse;
use std::fmt::Write;

/// Products listed in a chat reply before deferring to the web UI.
pub const REPLY_LIMIT: usize = 5;

/// Summarizes ranked products, one line each with the cheapest offer.
#[must_use]
pub fn format_results(response: &SearchResponse, limit: usize) -> String {
    if response.products.is_empty() {
        return "No matching products yet.".to_string();
    }

    let mut out = String::new();
    for ranked in response.products.iter().take(limit) {
        let _ = write!(out, "• **{}**", ranked.product.name);
        match ranked.offers.first() {
            Some(offer) => {
                let _ = write!(out, " - {} ${}", offer.chain_name, offer.price);
                if !offer.display.is_empty() {
                    let _ = write!(out, " ({})", offer.display);
                }
                if !offer.promo_label.is_empty() {
                    let _ = write!(out, " [{}]", offer.promo_label);
                }
                if offer.is_history_low {
                    out.push_str(" 📉");
                }
            }
            None => out.push_str(" - no prices yet"),
        }
        out.push('\n');
    }

    let more = response.products.len().saturating_sub(limit);
    if more > 0 {
        let _ = writeln!(out, "…and {more} more");
    }
    out
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::{REPLY_LIMIT, format_results};
    use crate::{
        bot::{BotData, handlers::autocomplete},
        core::{
            catalog,
            front_door::{self, Route},
            search::{self, SearchMode, SearchQuery},
        },
        errors::{Error, Result},
    };
    use chrono::Utc;

    /// Sends a message to the price assistant.
    ///
    /// The staff passphrase unlocks the submission form, `教學` shows a
    /// tutorial, anything else is searched.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ask(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product name, passphrase or 教學"]
        #[rest]
        message: String,
    ) -> Result<()> {
        let data = ctx.data();
        let user_id = ctx.author().id.to_string();
        let route = front_door::route_inbound(&data.database, &data.config.rules, &message).await;
        if route == Route::StaffAccess {
            tracing::info!(user_id = %user_id, "Staff passphrase accepted");
        }

        let reply = front_door::reply_text(&route, &data.config.server.public_base_url, &user_id)?;
        // The passphrase reply carries the staff link, keep it private
        let ephemeral = matches!(route, Route::StaffAccess | Route::PassphrasePrompt);
        ctx.send(poise::CreateReply::default().content(reply).ephemeral(ephemeral))
            .await?;
        Ok(())
    }

    /// Lists the cheapest offers for products matching a keyword.
    #[poise::command(slash_command, prefix_command)]
    pub async fn search(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product name, brand or keyword"]
        #[rest]
        keyword: String,
    ) -> Result<()> {
        let data = ctx.data();
        let user_id = ctx.author().id.to_string();
        let query = SearchQuery {
            keyword: Some(keyword.clone()),
            user_id: Some(user_id.clone()),
            ..SearchQuery::default()
        };
        let response = search::search(&data.database, &data.config.rules, &query, Utc::now()).await?;
        let link = front_door::search_link(&data.config.server.public_base_url, keyword.trim(), &user_id)?;

        ctx.say(format!(
            "🔍 **{}**\n{}\n{link}",
            response.keyword,
            format_results(&response, REPLY_LIMIT)
        ))
        .await?;
        Ok(())
    }

    /// Browses one chain's shelf, optionally within a category.
    #[poise::command(slash_command, prefix_command)]
    pub async fn shelf(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Supermarket chain"]
        #[autocomplete = "autocomplete::autocomplete_chain_name"]
        chain: String,
        #[description = "Category to browse"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: Option<String>,
    ) -> Result<()> {
        let data = ctx.data();
        let chains = catalog::list_chains(&data.database).await?;
        let wanted = chain.trim().to_lowercase();
        let Some(target) = chains
            .into_iter()
            .find(|c| c.is_active && c.name.to_lowercase() == wanted)
        else {
            ctx.say(format!("❌ Unknown chain '{chain}'.")).await?;
            return Ok(());
        };

        let query = SearchQuery {
            mode: Some(SearchMode::StoreShelf),
            chain_id: Some(target.id),
            category,
            ..SearchQuery::default()
        };
        let response = search::search(&data.database, &data.config.rules, &query, Utc::now()).await?;

        ctx.say(format!(
            "🏬 **{}**\n{}",
            target.name,
            format_results(&response, REPLY_LIMIT)
        ))
        .await?;
        Ok(())
    }
}

pub use inner::*;
