//! HTTP API - axum router, shared state and request handlers.
//!
//! Handlers are thin: they extract the caller and the JSON body, call the
//! matching `core` operation and serialize its result. Every error flows
//! through the `IntoResponse` impl in [`error`].

pub mod accounts;
pub mod auth;
pub mod contracts;
pub mod error;
pub mod extract;
pub mod messages;
pub mod payments;
pub mod properties;

use crate::{
    config::settings::Settings,
    core::payment::Receipting,
    media::MediaStore,
    notify::Mailer,
    receipt::ReceiptRenderer,
};
use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::warn;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
    /// Loaded settings
    pub settings: Arc<Settings>,
    /// Attachment store
    pub media: MediaStore,
    /// Notification transport
    pub mailer: Arc<dyn Mailer>,
    /// Receipt producer
    pub renderer: Arc<dyn ReceiptRenderer>,
}

impl AppState {
    /// Builds the state; the media store follows the media and server settings.
    pub fn new(
        db: DatabaseConnection,
        settings: Settings,
        mailer: Arc<dyn Mailer>,
        renderer: Arc<dyn ReceiptRenderer>,
    ) -> Self {
        let media = MediaStore::new(
            settings.media.root.clone(),
            &settings.server.public_base_url,
            &settings.media.url_prefix,
        );
        Self {
            db: Arc::new(db),
            settings: Arc::new(settings),
            media,
            mailer,
            renderer,
        }
    }

    /// Collaborators for payment validation.
    pub fn receipting(&self) -> Receipting<'_> {
        Receipting {
            media: &self.media,
            renderer: self.renderer.as_ref(),
            mailer: self.mailer.as_ref(),
            currency: &self.settings.receipt.currency,
        }
    }
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/token", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/token/refresh", post(auth::refresh))
        .route("/register-admin", post(accounts::register_admin))
        .route("/me", get(accounts::me))
        .route(
            "/tenants",
            get(accounts::list_tenants).post(accounts::create_tenant),
        )
        .route(
            "/tenants/{id}",
            get(accounts::get_tenant)
                .put(accounts::update_tenant)
                .delete(accounts::delete_tenant),
        )
        .route(
            "/properties",
            get(properties::list).post(properties::create),
        )
        .route(
            "/properties/{id}",
            get(properties::get)
                .put(properties::update)
                .delete(properties::delete),
        )
        .route("/contracts", get(contracts::list).post(contracts::create))
        .route(
            "/contracts/{id}",
            get(contracts::get)
                .put(contracts::update)
                .delete(contracts::delete),
        )
        .route("/payments", get(payments::list).post(payments::create))
        .route(
            "/payments/{id}",
            get(payments::get)
                .put(payments::update)
                .delete(payments::delete),
        )
        .route("/payments/{id}/validate", post(payments::validate))
        .route("/payments/{id}/notify", post(payments::notify))
        .route("/messages", get(messages::list).post(messages::create))
        .route(
            "/messages/{id}",
            get(messages::get)
                .put(messages::update)
                .delete(messages::delete),
        )
        .route("/messages/thread/{user_id}", get(messages::thread));

    let mut app = Router::new()
        .route("/health", get(health_check))
        .nest("/api", api);

    let prefix = state.settings.media.url_prefix.trim_matches('/');
    if state.settings.media.serve && !prefix.is_empty() {
        app = app.nest_service(&format!("/{prefix}"), ServeDir::new(state.media.root()));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let database = match state.db.ping().await {
        Ok(()) => "healthy",
        Err(e) => {
            warn!("Database health check failed: {e}");
            "unhealthy"
        }
    };
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "services": { "database": database },
    }))
}
