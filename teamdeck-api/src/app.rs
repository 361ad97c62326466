/// Application state and router builder
///
/// Defines the shared application state and builds the Axum router with
/// all routes and middleware. The state owns the dependency-injected
/// services; everything is cheaply cloneable into handlers.
///
/// # Example
///
/// ```no_run
/// use teamdeck_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config)?;
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use teamdeck_shared::auth::{
    jwt,
    middleware::{extract_bearer, AuthContext},
    session::SessionService,
    tenant::TenantResolver,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Session service (register/login/refresh/logout)
    pub sessions: SessionService,

    /// Tenant resolver for organization-scoped requests
    pub tenants: TenantResolver,

    /// Redis client backing the auth rate limiter, when configured
    pub redis: Option<redis::Client>,
}

impl AppState {
    /// Creates application state from a pool and configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the Redis URL fails to parse
    pub fn new(db: PgPool, config: Config) -> anyhow::Result<Self> {
        let sessions = SessionService::new(db.clone(), config.token_settings());
        let tenants = TenantResolver::new(db.clone());

        let redis = match &config.redis.url {
            Some(url) => Some(redis::Client::open(url.as_str())?),
            None => None,
        };

        Ok(Self {
            db,
            config: Arc::new(config),
            sessions,
            tenants,
            redis,
        })
    }

    /// Gets the access-token secret for verification
    pub fn access_secret(&self) -> &str {
        &self.config.jwt.access_secret
    }
}

/// Builds the complete Axum router
///
/// # Route layout
///
/// ```text
/// /
/// ├── /health                        # public
/// └── /v1/
///     ├── /auth/
///     │   ├── POST /register         # rate limited
///     │   ├── POST /login            # rate limited
///     │   ├── POST /refresh          # rate limited
///     │   ├── POST /logout           # rate limited
///     │   └── GET  /me               # bearer auth
///     └── /orgs/                     # bearer auth
///         ├── POST /
///         ├── GET  /
///         ├── GET    /:org_id/members
///         ├── POST   /:org_id/members
///         ├── PATCH  /:org_id/members/:user_id
///         └── DELETE /:org_id/members/:user_id
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Credential endpoints: public, but behind the per-client rate limiter
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/logout", post(routes::auth::logout))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::rate_limit::auth_rate_limit_layer,
        ));

    let me_routes = Router::new()
        .route("/me", get(routes::auth::me))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let org_routes = Router::new()
        .route("/", post(routes::orgs::create_organization))
        .route("/", get(routes::orgs::list_organizations))
        .route("/:org_id/members", get(routes::orgs::list_members))
        .route("/:org_id/members", post(routes::orgs::add_member))
        .route(
            "/:org_id/members/:user_id",
            patch(routes::orgs::update_member_role),
        )
        .route(
            "/:org_id/members/:user_id",
            axum::routing::delete(routes::orgs::remove_member),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes.merge(me_routes))
        .nest("/orgs", org_routes);

    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Bearer-token authentication middleware
///
/// Validates the access token from the Authorization header and injects an
/// [`AuthContext`] into the request extensions. Rejects with 401 before any
/// business logic runs; an expired token is reported as `token_expired` so
/// clients know to refresh rather than re-login.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())?;

    let claims = jwt::verify_access_token(token, state.access_secret())?;

    let auth_context = AuthContext::from_claims(&claims);
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
