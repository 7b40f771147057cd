use axum::{
    http::{HeaderValue, StatusCode},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::RecommenderConfig,
    db::{Cache, Store},
    error::AppResult,
    middleware::{make_span_with_request_id, request_id_middleware},
    services::{
        activity::ActivityService,
        chat::ChatService,
        insights::InsightsService,
        providers::{self, CompletionProvider},
        recommendations::Recommender,
        tips::TipService,
        users::UserService,
    },
};

pub mod activity;
pub mod categories;
pub mod chat;
pub mod recommendations;
pub mod tips;
pub mod users;

/// Services shared by every handler
pub struct AppState {
    pub tips: TipService,
    pub users: UserService,
    pub activity: ActivityService,
    pub insights: InsightsService,
    pub recommender: Recommender,
    pub chat: ChatService,
}

impl AppState {
    /// Wires the OpenAI provider when `config` carries a key
    pub fn new(
        store: Arc<dyn Store>,
        cache: Option<Cache>,
        config: RecommenderConfig,
    ) -> AppResult<Self> {
        let provider = providers::from_config(&config)?;
        Ok(Self::with_provider(store, cache, config, provider))
    }

    /// Recommendations and chat share one completion provider
    pub fn with_provider(
        store: Arc<dyn Store>,
        cache: Option<Cache>,
        config: RecommenderConfig,
        provider: Option<Arc<dyn CompletionProvider>>,
    ) -> Self {
        let activity = ActivityService::new(store.clone());
        let chat = ChatService::new(provider.clone(), config.clone(), activity.clone());
        let recommender = Recommender::with_provider(config, store.clone(), provider);

        Self {
            tips: TipService::new(store.clone(), activity.clone()),
            users: UserService::new(store.clone(), activity.clone()),
            insights: InsightsService::new(store, cache),
            activity,
            recommender,
            chat,
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tips", get(tips::list).post(tips::create))
        .route(
            "/tips/:id",
            get(tips::get).put(tips::update).delete(tips::delete),
        )
        .route("/tips/:id/like", post(tips::like))
        .route("/tips/:id/share", post(tips::share))
        .route("/recommendations", get(recommendations::recommend))
        .route("/categories/:category/insights", get(categories::insights))
        .route("/activity", post(activity::track))
        .route("/chat", post(chat::chat))
        .route("/users", post(users::create))
        .route("/users/me", get(users::me))
}

/// Builds the CORS layer. A `*` entry allows any origin.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.iter().any(|origin| origin.trim() == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
