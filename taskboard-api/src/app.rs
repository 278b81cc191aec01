/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use taskboard_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let app = build_router(AppState::new(pool, config));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    mailer::{LogMailer, Mailer},
    middleware::security::SecurityHeadersLayer,
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskboard_shared::{
    auth::middleware::create_jwt_middleware, db::documents::PgDocumentStore, store::DocumentStore,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Largest accepted request body
///
/// A 1 MiB profile image grows by a third when base64 encoded.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (accounts, health)
    pub db: PgPool,

    /// Document storage
    pub documents: Arc<dyn DocumentStore>,

    /// Outgoing mail
    pub mailer: Arc<dyn Mailer>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates state backed by Postgres for documents and a logging mailer
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            documents: Arc::new(PgDocumentStore::new(db.clone())),
            mailer: Arc::new(LogMailer),
            db,
            config: Arc::new(config),
        }
    }

    /// Replaces the document store
    pub fn with_documents(mut self, documents: Arc<dyn DocumentStore>) -> Self {
        self.documents = documents;
        self
    }

    /// Replaces the mailer
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router
///
/// ```text
/// /
/// ├── GET /health
/// └── /v1/
///     ├── /auth/                                  (public)
///     │   ├── POST /register
///     │   ├── POST /login
///     │   ├── POST /provider
///     │   ├── POST /refresh
///     │   ├── POST /password-reset
///     │   └── POST /password-reset/confirm
///     └── /collections/:collection/documents      (Bearer token)
///         ├── POST   /            create
///         ├── GET    /?field=&value=  query
///         ├── GET    /:id         read
///         ├── PUT    /:id         write
///         ├── PATCH  /:id         merge
///         └── DELETE /:id         delete
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/provider", post(routes::auth::provider_sign_in))
        .route("/refresh", post(routes::auth::refresh))
        .route("/password-reset", post(routes::auth::request_password_reset))
        .route(
            "/password-reset/confirm",
            post(routes::auth::confirm_password_reset),
        );

    let document_routes = Router::new()
        .route(
            "/",
            post(routes::documents::create_document).get(routes::documents::query_documents),
        )
        .route(
            "/:id",
            get(routes::documents::read_document)
                .put(routes::documents::write_document)
                .patch(routes::documents::merge_document)
                .delete(routes::documents::delete_document),
        )
        .layer(middleware::from_fn(create_jwt_middleware(
            state.jwt_secret().to_string(),
        )));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/collections/:collection/documents", document_routes);

    let cors = build_cors(&state.config);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn build_cors(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
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
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
