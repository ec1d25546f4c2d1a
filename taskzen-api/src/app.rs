/// Application state and router builder
///
/// Defines the shared application state and builds the axum router with all
/// routes and middleware. State is cloned per request; the pool and config
/// are cheap handles.
///
/// # Example
///
/// ```no_run
/// use taskzen_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskzen_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use uuid::Uuid;

use crate::{config::Config, error::ApiResult, middleware::auth::require_auth, routes};
use taskzen_shared::auth::jwt;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets the signing secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Issues a session-class token (register/login call sites)
    pub fn issue_session_token(&self, user_id: Uuid) -> ApiResult<String> {
        let claims = jwt::Claims::new(user_id, self.config.jwt.session_ttl());
        Ok(jwt::create_token(&claims, self.jwt_secret())?)
    }

    /// Issues a shorter-lived token (OAuth callback call sites)
    pub fn issue_oauth_token(&self, user_id: Uuid) -> ApiResult<String> {
        let claims = jwt::Claims::new(user_id, self.config.jwt.oauth_ttl());
        Ok(jwt::create_token(&claims, self.jwt_secret())?)
    }
}

/// Builds the complete axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                       # Liveness (public)
/// ├── /auth/
/// │   ├── POST /register            # Public
/// │   ├── POST /login               # Public
/// │   ├── GET  /google[/callback]   # Public (OAuth redirect flow)
/// │   ├── GET  /github[/callback]   # Public (OAuth redirect flow)
/// │   └── GET  /me                  # Bearer token required
/// └── /tasks/                       # Bearer token required throughout
///     ├── POST   /
///     ├── GET    /
///     ├── GET    /prioritize
///     ├── GET    /:id
///     ├── PUT    /:id
///     └── DELETE /:id
/// ```
///
/// Every route under the auth gate sees only the authenticated caller's
/// records; the gate attaches the resolved user before any handler runs.
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public auth surface: credential exchange and the OAuth redirect flow
    let auth_public = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/google", get(routes::oauth::google_authorize))
        .route("/google/callback", get(routes::oauth::google_callback))
        .route("/github", get(routes::oauth::github_authorize))
        .route("/github/callback", get(routes::oauth::github_callback));

    let auth_gated = Router::new()
        .route("/me", get(routes::auth::me))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let task_routes = Router::new()
        .route(
            "/",
            post(routes::tasks::create_task).get(routes::tasks::list_tasks),
        )
        .route("/prioritize", get(routes::tasks::prioritize_tasks))
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let cors = build_cors_layer(&state.config.api.cors_origins);

    Router::new()
        .merge(health_routes)
        .nest("/auth", auth_public.merge(auth_gated))
        .nest("/tasks", task_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Configures CORS from the origins list; a `*` entry means permissive
/// (development), anything else is an explicit allowlist with credentials
fn build_cors_layer(cors_origins: &[String]) -> CorsLayer {
    if cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
