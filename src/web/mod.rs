//! HTTP API - consumer search, staff submission and admin endpoints.
//!
//! All handlers answer JSON shaped `{"status": "success", "data": ...}` or
//! `{"status": "error", "msg": ...}`. Admin routes under `/admin/api` require
//! a bearer token from `/admin/login`.

pub mod admin;
pub mod error;
pub mod public;

use crate::config::AppConfig;
use axum::{Json, Router, extract::FromRef, middleware, routing::get};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Shared handler state. Cloned per request.
#[derive(Clone)]
pub struct AppState {
    /// Pooled database connection
    pub db: DatabaseConnection,
    /// Loaded configuration
    pub config: Arc<AppConfig>,
}

impl FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

/// Wraps a payload in the success envelope.
pub fn success<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({ "status": "success", "data": data }))
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    let admin_api = admin::router().route_layer(middleware::from_fn_with_state(
        state.clone(),
        admin::require_admin,
    ));

    Router::new()
        .merge(public::router())
        .merge(admin::session_router())
        .nest("/admin/api", admin_api)
        .route("/keep_alive", get(keep_alive))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn keep_alive() -> &'static str {
    "I am awake!"
}

#[cfg(test)]
pub(crate) mod test_support {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    pub fn app(db: &DatabaseConnection) -> Router {
        router(AppState {
            db: db.clone(),
            config: Arc::new(AppConfig::default()),
        })
    }

    /// Sends a request and returns the status with the parsed JSON body.
    pub async fn send(
        app: Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::test_support::*;
    use crate::{errors::Result, test_utils::*};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_keep_alive() -> Result<()> {
        let db = setup_test_db().await?;
        let (status, body) = send(app(&db), "GET", "/keep_alive", None, None).await;
        assert_eq!(status, StatusCode::OK);
        // Plain text, not JSON
        assert!(body.is_null());
        Ok(())
    }
}
