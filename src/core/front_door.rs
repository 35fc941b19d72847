//! Chat front door - decides what an inbound chat message asks for and
//! builds the links the reply points to.

use crate::{config::Rules, core::settings::current_audit_code, errors::Result};
use sea_orm::DatabaseConnection;
use url::Url;

/// Words that ask for the staff passphrase prompt.
pub const PROMPT_WORDS: [&str; 3] = ["查", "盤點", "系統"];
/// Word that asks for usage help.
pub const TUTORIAL_WORD: &str = "教學";

/// Where an inbound message leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// The message is the audit code: hand out the staff submission link
    StaffAccess,
    /// Ask the sender for the passphrase
    PassphrasePrompt,
    /// Usage help
    Tutorial,
    /// Anything else is a product search
    Search(String),
}

/// Routes trimmed message text against the current audit code.
#[must_use]
pub fn route_message(text: &str, audit_code: &str) -> Route {
    let text = text.trim();
    if !audit_code.is_empty() && text == audit_code.trim() {
        Route::StaffAccess
    } else if PROMPT_WORDS.contains(&text) {
        Route::PassphrasePrompt
    } else if text == TUTORIAL_WORD {
        Route::Tutorial
    } else {
        Route::Search(text.to_string())
    }
}

/// Routes a message, reading the audit code from the database first.
pub async fn route_inbound(db: &DatabaseConnection, rules: &Rules, text: &str) -> Route {
    let code = current_audit_code(db, rules).await;
    route_message(text, &code)
}

/// Link to the consumer search, pre-filled with `keyword` and the caller.
pub fn search_link(base_url: &str, keyword: &str, user_id: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)?.join("search")?;
    {
        let mut pairs = url.query_pairs_mut();
        if !keyword.is_empty() {
            pairs.append_pair("keyword", keyword);
        }
        pairs.append_pair("user_id", user_id);
    }
    Ok(url)
}

/// Link to the staff submission form for `user_id`.
pub fn staff_link(base_url: &str, user_id: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)?.join("api/staff/form")?;
    url.query_pairs_mut().append_pair("staff_id", user_id);
    Ok(url)
}

/// Plain-text reply for a route.
pub fn reply_text(route: &Route, base_url: &str, user_id: &str) -> Result<String> {
    let text = match route {
        Route::StaffAccess => format!(
            "🔐 Passphrase accepted.\nYour ID: {user_id}\nSend this ID to your manager to be registered.\nStaff form: {}",
            staff_link(base_url, user_id)?
        ),
        Route::PassphrasePrompt => "🔒 Please enter the staff passphrase.".to_string(),
        Route::Tutorial => "📝 How to use Price King\n\
             1. Type a product name to compare prices across chains.\n\
             2. Open the lobby to browse categories and chains.\n\
             3. Browse one chain's shelf with /shelf."
            .to_string(),
        Route::Search(keyword) if keyword.is_empty() => {
            format!("🛒 Price lobby: {}", search_link(base_url, "", user_id)?)
        }
        Route::Search(keyword) => format!(
            "🔍 Search: {keyword}\n{}",
            search_link(base_url, keyword, user_id)?
        ),
    };
    Ok(text)
}
