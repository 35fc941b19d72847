//! Admin endpoints. `/admin/login` hands out a bearer token; everything under
//! `/admin/api` goes through [`require_admin`].

use super::{AppState, success};
use crate::{
    core::{
        audit::{self, AuditFilter},
        catalog::{self, ChainInput, OptionKind, ProductInput},
        dashboard,
        lobby::{self, EventInput},
        settings::{self, SettingsUpdate},
        staff::{self, NewStaff, StaffUpdate},
        time::local_date,
    },
    errors::{Error, Result},
};
use axum::{
    Extension, Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

/// Username of the authenticated admin, attached by [`require_admin`].
#[derive(Debug, Clone)]
pub struct AdminIdentity(pub String);

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Rejects requests without a live session token.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = bearer_token(request.headers()).ok_or(Error::Unauthorized)?;
    let username = settings::validate_session(&state.db, token, Utc::now()).await?;
    request.extensions_mut().insert(AdminIdentity(username));
    Ok(next.run(request).await)
}

/// Login and logout, outside the bearer gate.
pub fn session_router() -> Router<AppState> {
    Router::new()
        .route("/admin/login", post(login))
        .route("/admin/logout", post(logout))
}

/// Routes mounted under `/admin/api`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(metrics))
        .route("/duplicates", get(duplicates))
        .route("/audit", get(audit_trail))
        .route("/history", get(history))
        .route("/logs/:id/toggle", post(toggle_log))
        .route("/staff", get(list_staff).post(create_staff))
        .route("/staff/:id", put(update_staff).delete(delete_staff))
        .route("/staff/:id/payout", post(payout_staff))
        .route("/payouts", get(list_payouts))
        .route("/settings", get(get_settings).put(update_settings))
        .route("/chains", get(list_chains).post(create_chain))
        .route("/chains/:id", put(update_chain))
        .route("/chains/:id/toggle", post(toggle_chain))
        .route("/options", get(list_options).post(add_option))
        .route("/options/:id", delete(delete_option))
        .route("/products", get(list_products).post(create_product))
        .route("/products/:id", put(update_product).delete(delete_product))
        .route("/products/:id/toggle", post(toggle_product))
        .route("/events", get(list_events).post(create_event))
        .route("/events/:id/toggle", post(toggle_event))
        .route("/notices", get(list_notices).post(create_notice))
        .route("/notices/:id/toggle", post(toggle_notice))
        .route("/feedback", get(list_feedback))
        .route("/matrix", get(price_matrix))
        .route("/stale", get(stale_products))
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<Value>> {
    let session = settings::login(
        &state.db,
        &state.config.rules,
        request.username.trim(),
        &request.password,
        Utc::now(),
    )
    .await?;
    Ok(success(json!({
        "token": session.token,
        "username": session.username,
        "expires_at": session.expires_at,
    })))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>> {
    if let Some(token) = bearer_token(&headers) {
        settings::logout(&state.db, token).await?;
    }
    Ok(success(Value::Null))
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct DateQuery {
    date: Option<NaiveDate>,
}

async fn metrics(State(state): State<AppState>) -> Json<Value> {
    success(dashboard::metrics(&state.db, &state.config.rules, Utc::now()).await)
}

async fn duplicates(State(state): State<AppState>, Query(query): Query<DateQuery>) -> Result<Json<Value>> {
    let tz = state.config.rules.timezone;
    let date = query.date.unwrap_or_else(|| local_date(tz, Utc::now()));
    Ok(success(audit::duplicate_groups(&state.db, tz, date).await?))
}

#[derive(Debug, Deserialize)]
struct AuditQuery {
    date: Option<NaiveDate>,
    chain_id: Option<i64>,
    staff_id: Option<String>,
}

async fn audit_trail(State(state): State<AppState>, Query(query): Query<AuditQuery>) -> Result<Json<Value>> {
    let tz = state.config.rules.timezone;
    let filter = AuditFilter {
        date: query.date.unwrap_or_else(|| local_date(tz, Utc::now())),
        chain_id: query.chain_id,
        staff_id: query.staff_id,
    };
    Ok(success(audit::audit_trail(&state.db, tz, &filter).await?))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    chain_id: Option<i64>,
    product_id: Option<i64>,
}

async fn history(State(state): State<AppState>, Query(query): Query<HistoryQuery>) -> Result<Json<Value>> {
    let (Some(chain_id), Some(product_id)) = (query.chain_id, query.product_id) else {
        return Err(Error::validation("chain_id and product_id are required"));
    };
    let rows = audit::price_history(&state.db, state.config.rules.timezone, chain_id, product_id).await?;
    Ok(success(rows))
}

async fn toggle_log(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Value>> {
    Ok(success(audit::toggle_log(&state.db, &state.config.rules, id).await?))
}

// ---------------------------------------------------------------------------
// Staff
// ---------------------------------------------------------------------------

async fn list_staff(State(state): State<AppState>) -> Result<Json<Value>> {
    Ok(success(staff::list_staff(&state.db).await?))
}

async fn create_staff(State(state): State<AppState>, Json(request): Json<NewStaff>) -> Result<Json<Value>> {
    Ok(success(staff::create_staff(&state.db, request).await?))
}

async fn update_staff(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<StaffUpdate>,
) -> Result<Json<Value>> {
    Ok(success(staff::update_staff(&state.db, &id, request).await?))
}

async fn delete_staff(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>> {
    staff::delete_staff(&state.db, &id).await?;
    Ok(success(Value::Null))
}

async fn payout_staff(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminIdentity>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    Ok(success(audit::payout_staff(&state.db, &id, &admin.0, Utc::now()).await?))
}

#[derive(Debug, Deserialize)]
struct PayoutQuery {
    staff_id: Option<String>,
}

async fn list_payouts(State(state): State<AppState>, Query(query): Query<PayoutQuery>) -> Result<Json<Value>> {
    Ok(success(audit::list_payouts(&state.db, query.staff_id.as_deref()).await?))
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

async fn get_settings(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminIdentity>,
) -> Result<Json<Value>> {
    Ok(success(settings::get_settings(&state.db, &state.config.rules, &admin.0).await?))
}

async fn update_settings(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminIdentity>,
    Json(request): Json<SettingsUpdate>,
) -> Result<Json<Value>> {
    Ok(success(settings::update_settings(&state.db, &admin.0, request).await?))
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

async fn list_chains(State(state): State<AppState>) -> Result<Json<Value>> {
    Ok(success(catalog::list_chains(&state.db).await?))
}

async fn create_chain(State(state): State<AppState>, Json(request): Json<ChainInput>) -> Result<Json<Value>> {
    Ok(success(catalog::create_chain(&state.db, request).await?))
}

async fn update_chain(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<ChainInput>,
) -> Result<Json<Value>> {
    Ok(success(catalog::update_chain(&state.db, id, request).await?))
}

async fn toggle_chain(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Value>> {
    Ok(success(catalog::toggle_chain(&state.db, id).await?))
}

async fn list_options(State(state): State<AppState>) -> Result<Json<Value>> {
    Ok(success(catalog::list_options(&state.db).await?))
}

#[derive(Debug, Deserialize)]
struct OptionRequest {
    kind: OptionKind,
    name: String,
}

async fn add_option(State(state): State<AppState>, Json(request): Json<OptionRequest>) -> Result<Json<Value>> {
    Ok(success(catalog::add_option(&state.db, request.kind, &request.name).await?))
}

async fn delete_option(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Value>> {
    catalog::delete_option(&state.db, id).await?;
    Ok(success(Value::Null))
}

async fn list_products(State(state): State<AppState>) -> Result<Json<Value>> {
    Ok(success(catalog::list_products(&state.db).await?))
}

async fn create_product(State(state): State<AppState>, Json(request): Json<ProductInput>) -> Result<Json<Value>> {
    Ok(success(catalog::create_product(&state.db, request).await?))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<ProductInput>,
) -> Result<Json<Value>> {
    Ok(success(catalog::update_product(&state.db, id, request).await?))
}

async fn delete_product(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Value>> {
    catalog::delete_product(&state.db, id).await?;
    Ok(success(Value::Null))
}

async fn toggle_product(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Value>> {
    Ok(success(catalog::toggle_product(&state.db, id).await?))
}

async fn price_matrix(State(state): State<AppState>) -> Result<Json<Value>> {
    Ok(success(dashboard::price_matrix(&state.db, &state.config.rules).await?))
}

async fn stale_products(State(state): State<AppState>) -> Result<Json<Value>> {
    let rules = &state.config.rules;
    Ok(success(
        catalog::stale_products(&state.db, rules.stale_after_days, Utc::now()).await?,
    ))
}

// ---------------------------------------------------------------------------
// Lobby content
// ---------------------------------------------------------------------------

async fn list_events(State(state): State<AppState>) -> Result<Json<Value>> {
    Ok(success(lobby::list_events(&state.db).await?))
}

async fn create_event(State(state): State<AppState>, Json(request): Json<EventInput>) -> Result<Json<Value>> {
    Ok(success(lobby::create_event(&state.db, request).await?))
}

async fn toggle_event(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Value>> {
    Ok(success(lobby::toggle_event(&state.db, id).await?))
}

async fn list_notices(State(state): State<AppState>) -> Result<Json<Value>> {
    Ok(success(lobby::list_notices(&state.db).await?))
}

#[derive(Debug, Deserialize)]
struct NoticeRequest {
    content: String,
}

async fn create_notice(State(state): State<AppState>, Json(request): Json<NoticeRequest>) -> Result<Json<Value>> {
    Ok(success(lobby::create_notice(&state.db, &request.content, Utc::now()).await?))
}

async fn toggle_notice(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Value>> {
    Ok(success(lobby::toggle_notice(&state.db, id).await?))
}

async fn list_feedback(State(state): State<AppState>) -> Result<Json<Value>> {
    Ok(success(lobby::list_feedback(&state.db).await?))
}
