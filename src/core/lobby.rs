//! Consumer lobby - the landing content shown before any search, plus the
//! events, notices and feedback that feed it.

use crate::{
    entities::{Chain, Event, Feedback, Notice, Product, chain, event, feedback, notice, product},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};
use serde::{Deserialize, Serialize};

/// Landing content.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LobbyData {
    /// Distinct categories of active products, alphabetical
    pub categories: Vec<String>,
    /// Active chains by id
    pub chains: Vec<chain::Model>,
    /// Active events by sort order
    pub events: Vec<event::Model>,
    /// Active notices, newest first
    pub notices: Vec<notice::Model>,
}

/// Fields for a new lobby event.
#[derive(Debug, Clone, Deserialize)]
pub struct EventInput {
    /// Banner title
    pub title: String,
    /// Banner image
    #[serde(default)]
    pub image_url: Option<String>,
    /// Link opened from the banner
    #[serde(default)]
    pub link_url: Option<String>,
    /// Ascending display order
    #[serde(default)]
    pub sort_order: i32,
}

/// Loads the lobby. Each section that fails to load is logged and left empty.
pub async fn load_lobby(db: &DatabaseConnection) -> LobbyData {
    let categories = Product::find()
        .select_only()
        .column(product::Column::Category)
        .distinct()
        .filter(product::Column::IsActive.eq(true))
        .order_by_asc(product::Column::Category)
        .into_tuple::<String>()
        .all(db)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load lobby categories");
            Vec::new()
        });

    let chains = Chain::find()
        .filter(chain::Column::IsActive.eq(true))
        .order_by_asc(chain::Column::Id)
        .all(db)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load lobby chains");
            Vec::new()
        });

    let events = Event::find()
        .filter(event::Column::IsActive.eq(true))
        .order_by_asc(event::Column::SortOrder)
        .order_by_asc(event::Column::Id)
        .all(db)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load lobby events");
            Vec::new()
        });

    let notices = Notice::find()
        .filter(notice::Column::IsActive.eq(true))
        .order_by_desc(notice::Column::CreatedAt)
        .order_by_desc(notice::Column::Id)
        .all(db)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load lobby notices");
            Vec::new()
        });

    LobbyData {
        categories: categories.into_iter().filter(|c| !c.is_empty()).collect(),
        chains,
        events,
        notices,
    }
}

/// All events, active or not, by sort order.
pub async fn list_events(db: &DatabaseConnection) -> Result<Vec<event::Model>> {
    Event::find()
        .order_by_asc(event::Column::SortOrder)
        .order_by_asc(event::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Adds an active event.
pub async fn create_event(db: &DatabaseConnection, input: EventInput) -> Result<event::Model> {
    let title = input.title.trim().to_string();
    if title.is_empty() {
        return Err(Error::validation("event title is required"));
    }
    let model = event::ActiveModel {
        title: Set(title),
        image_url: Set(input.image_url),
        link_url: Set(input.link_url),
        sort_order: Set(input.sort_order),
        is_active: Set(true),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Flips an event between shown and hidden.
pub async fn toggle_event(db: &DatabaseConnection, id: i64) -> Result<event::Model> {
    let existing = Event::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::validation(format!("event {id} does not exist")))?;
    let is_active = existing.is_active;
    let mut active: event::ActiveModel = existing.into();
    active.is_active = Set(!is_active);
    active.update(db).await.map_err(Into::into)
}

/// All notices, newest first.
pub async fn list_notices(db: &DatabaseConnection) -> Result<Vec<notice::Model>> {
    Notice::find()
        .order_by_desc(notice::Column::CreatedAt)
        .order_by_desc(notice::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Posts an active notice dated `now`.
pub async fn create_notice(
    db: &DatabaseConnection,
    content: &str,
    now: DateTime<Utc>,
) -> Result<notice::Model> {
    let content = content.trim();
    if content.is_empty() {
        return Err(Error::validation("notice content is required"));
    }
    let model = notice::ActiveModel {
        content: Set(content.to_string()),
        is_active: Set(true),
        created_at: Set(now),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Flips a notice between shown and hidden.
pub async fn toggle_notice(db: &DatabaseConnection, id: i64) -> Result<notice::Model> {
    let existing = Notice::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::validation(format!("notice {id} does not exist")))?;
    let is_active = existing.is_active;
    let mut active: notice::ActiveModel = existing.into();
    active.is_active = Set(!is_active);
    active.update(db).await.map_err(Into::into)
}

/// Stores consumer feedback. Anonymous feedback is allowed.
pub async fn submit_feedback(
    db: &DatabaseConnection,
    user_id: &str,
    content: &str,
    now: DateTime<Utc>,
) -> Result<feedback::Model> {
    let content = content.trim();
    if content.is_empty() {
        return Err(Error::validation("feedback content is required"));
    }
    let model = feedback::ActiveModel {
        user_id: Set(user_id.trim().to_string()),
        content: Set(content.to_string()),
        created_at: Set(now),
        ..Default::default()
    };
    let saved = model.insert(db).await?;
    tracing::info!(id = saved.id, "Received feedback");
    Ok(saved)
}

/// Feedback, newest first.
pub async fn list_feedback(db: &DatabaseConnection) -> Result<Vec<feedback::Model>> {
    Feedback::find()
        .order_by_desc(feedback::Column::CreatedAt)
        .order_by_desc(feedback::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_lobby_lists_only_active_content() -> Result<()> {
        let fixture = setup_catalog().await?;
        let db = &fixture.db;
        create_test_product(db, "Chips", "Snacks", 150.0, "g").await?;
        let hidden = create_test_product(db, "Old Soda", "Drinks", 330.0, "ml").await?;
        crate::core::catalog::toggle_product(db, hidden.id).await?;
        crate::core::catalog::toggle_chain(db, fixture.chain_b.id).await?;

        let late = create_event(
            db,
            EventInput {
                title: "Autumn sale".to_string(),
                image_url: None,
                link_url: None,
                sort_order: 2,
            },
        )
        .await?;
        let early = create_event(
            db,
            EventInput {
                title: "Opening week".to_string(),
                image_url: None,
                link_url: None,
                sort_order: 1,
            },
        )
        .await?;
        let gone = create_event(
            db,
            EventInput {
                title: "Expired".to_string(),
                image_url: None,
                link_url: None,
                sort_order: 0,
            },
        )
        .await?;
        toggle_event(db, gone.id).await?;

        let older = create_notice(db, "Welcome", morning()).await?;
        let newer = create_notice(db, "New chain added", morning() + Duration::hours(1)).await?;

        let lobby = load_lobby(db).await;
        assert_eq!(lobby.categories, vec!["Dairy", "Snacks"]);
        assert_eq!(lobby.chains.len(), 1);
        assert_eq!(lobby.chains[0].id, fixture.chain_a.id);
        let event_ids: Vec<i64> = lobby.events.iter().map(|e| e.id).collect();
        assert_eq!(event_ids, vec![early.id, late.id]);
        let notice_ids: Vec<i64> = lobby.notices.iter().map(|n| n.id).collect();
        assert_eq!(notice_ids, vec![newer.id, older.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_feedback_requires_content() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(matches!(
            submit_feedback(&db, "U9", "   ", morning()).await,
            Err(Error::Validation { .. })
        ));

        submit_feedback(&db, "", "Prices at PX look wrong", morning()).await?;
        let all = list_feedback(&db).await?;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].user_id, "");
        Ok(())
    }

    #[tokio::test]
    async fn test_toggle_notice() -> Result<()> {
        let db = setup_test_db().await?;
        let notice = create_notice(&db, "Maintenance tonight", morning()).await?;
        assert!(!toggle_notice(&db, notice.id).await?.is_active);
        assert!(load_lobby(&db).await.notices.is_empty());
        assert_eq!(list_notices(&db).await?.len(), 1);
        Ok(())
    }
}
