//! Consumer and staff endpoints. No authentication: staff are identified by
//! their chat identity and checked against the staff table on every call.

use super::{AppState, success};
use crate::{
    core::{
        lobby, search,
        staff::check_staff,
        submission::{self, PriceSubmission},
    },
    errors::Result,
};
use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

/// Consumer and staff routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/search", get(search_products))
        .route("/api/lobby", get(lobby_content))
        .route("/api/feedback", post(submit_feedback))
        .route("/api/staff/check", post(staff_check))
        .route("/api/staff/form", get(staff_form))
        .route("/api/price/update", post(price_update))
}

async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<search::SearchQuery>,
) -> Result<Json<Value>> {
    let response = search::search(&state.db, &state.config.rules, &query, Utc::now()).await?;
    Ok(success(response))
}

async fn lobby_content(State(state): State<AppState>) -> Json<Value> {
    success(lobby::load_lobby(&state.db).await)
}

#[derive(Debug, Deserialize)]
struct FeedbackRequest {
    #[serde(default)]
    user_id: String,
    content: String,
}

async fn submit_feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<Value>> {
    let saved = lobby::submit_feedback(&state.db, &request.user_id, &request.content, Utc::now()).await?;
    Ok(success(saved))
}

#[derive(Debug, Deserialize)]
struct StaffCheckRequest {
    staff_id: String,
}

async fn staff_check(
    State(state): State<AppState>,
    Json(request): Json<StaffCheckRequest>,
) -> Result<Json<Value>> {
    Ok(success(check_staff(&state.db, &request.staff_id).await?))
}

async fn staff_form(State(state): State<AppState>) -> Result<Json<Value>> {
    Ok(success(submission::staff_form(&state.db).await?))
}

async fn price_update(
    State(state): State<AppState>,
    Json(request): Json<PriceSubmission>,
) -> Result<Json<Value>> {
    let receipt = submission::submit_price(&state.db, &state.config.rules, request).await?;
    Ok(success(receipt))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use crate::{errors::Result, test_utils::*, web::test_support::*};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_price_update_and_staff_check() -> Result<()> {
        let fixture = setup_catalog().await?;
        let submission = json!({
            "staff_id": "U1",
            "product_id": fixture.product.id,
            "chain_id": fixture.chain_a.id,
            "price": 89.0,
            "base_price": 99.0,
            "promo_kind": 3,
            "promo_qty": 2,
            "promo_value": 85.0,
        });

        let (status, body) = send(app(&fixture.db), "POST", "/api/price/update", None, Some(submission)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["label"], "2件85折");
        assert_eq!(body["data"]["bonus"], 5);

        let (status, body) = send(
            app(&fixture.db),
            "POST",
            "/api/staff/check",
            None,
            Some(json!({ "staff_id": "U1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "success");
        assert_eq!(body["data"]["wallet"], 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_price_update_rejections() -> Result<()> {
        let fixture = setup_catalog().await?;

        let (status, body) = send(
            app(&fixture.db),
            "POST",
            "/api/price/update",
            None,
            Some(json!({ "staff_id": "", "product_id": 1, "chain_id": 1, "price": 1.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");

        let (status, _) = send(
            app(&fixture.db),
            "POST",
            "/api/price/update",
            None,
            Some(json!({
                "staff_id": "stranger",
                "product_id": fixture.product.id,
                "chain_id": fixture.chain_a.id,
                "price": 10.0,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        Ok(())
    }

    #[tokio::test]
    async fn test_search_and_lobby() -> Result<()> {
        let fixture = setup_catalog().await?;
        submit_test_price(&fixture.db, &fixture, "U1", 45.0, morning()).await?;

        let (status, body) = send(app(&fixture.db), "GET", "/search?keyword=fresh%20milk", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let products = body["data"]["products"].as_array().unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0]["name"], "Fresh Milk");
        assert_eq!(products[0]["offers"][0]["display"], "$4.5/100ml");

        let (status, body) = send(app(&fixture.db), "GET", "/search", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["lobby"]["categories"].is_array());

        let (status, body) = send(app(&fixture.db), "GET", "/api/lobby", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["chains"].as_array().unwrap().len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_search_tolerates_blank_parameters() -> Result<()> {
        let fixture = setup_catalog().await?;
        submit_test_price(&fixture.db, &fixture, "U1", 45.0, morning()).await?;

        let uri = "/search?keyword=milk&mode=&chain_id=&category=&pin_id=&lat=&lng=&user_id=";
        let (status, body) = send(app(&fixture.db), "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert!(body["data"]["mode"].is_null());
        assert_eq!(body["data"]["products"].as_array().unwrap().len(), 1);

        let (status, body) = send(app(&fixture.db), "GET", "/search?keyword=milk&lat=north", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["products"].as_array().unwrap().len(), 1);

        let uri = format!("/search?mode=store_shelf&chain_id={}", fixture.chain_a.id);
        let (status, body) = send(app(&fixture.db), "GET", &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["mode"], "store_shelf");
        assert_eq!(body["data"]["target_chain"]["id"], fixture.chain_a.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_feedback_and_staff_form() -> Result<()> {
        let fixture = setup_catalog().await?;

        let (status, _) = send(
            app(&fixture.db),
            "POST",
            "/api/feedback",
            None,
            Some(json!({ "content": "Please add Costco" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(app(&fixture.db), "GET", "/api/staff/form", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["products"].as_array().unwrap().len(), 1);
        Ok(())
    }
}
