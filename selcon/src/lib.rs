//! # selcon: course enrollment backend
//!
//! `selcon` is the server side of a course selection system. Students register, browse the course
//! catalogue, enroll in courses and drop them again. Teachers publish courses with a fixed number
//! of seats, read the roster of each course they own, and delete their courses.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer and
//! uses SQLite (through sqlx) for persistence. Migrations run on startup.
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) exposes JSON endpoints grouped by audience: authentication
//! (`/register`, `/login`, `/logout`, `/current-user`), the student surface under `/student/*` and
//! the teacher surface under `/teacher/*`.
//!
//! The **authentication layer** ([`auth`]) issues a signed session token in an HttpOnly cookie at
//! login and registration. Handlers state the role they serve in their signature
//! (`RequiresRole<role::Student>`), which turns a missing session into 401 and the wrong role into
//! 403. Course ownership is checked once the course has been loaded.
//!
//! The **database layer** ([`db`]) uses the repository pattern. `Users` and `Courses` are plain CRUD
//! stores; `Enrollments` is the ledger that enforces one seat per student per course and never
//! lets a course exceed its capacity, including under concurrent enrolls.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use selcon::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = selcon::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     selcon::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use std::{str::FromStr, time::Duration};

use axum::{
    Json, Router,
    http::{self, HeaderValue, Method},
    routing::{delete, get, post},
};
use bon::Builder;
pub use config::Config;
use config::{CorsOrigin, DatabaseConfig};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::openapi::ApiDoc;

pub use types::{CourseId, EnrollmentId, UserId};

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
}

/// Get the selcon database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Open the SQLite pool described by `database`.
///
/// WAL lets readers proceed while one writer holds the lock; the busy timeout makes concurrent
/// writers queue instead of failing immediately.
pub async fn connect_pool(database: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let connect_options = SqliteConnectOptions::from_str(&database.url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(database.busy_timeout);

    let settings = &database.pool;
    let secs = |s: u64| (s > 0).then(|| Duration::from_secs(s));

    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(secs(settings.idle_timeout_secs))
        .max_lifetime(secs(settings.max_lifetime_secs))
        .connect_with(connect_options)
        .await?;

    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.security.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            // Origins never carry a trailing slash, Url::as_str always adds one
            CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_credentials(config.auth.security.cors.allow_credentials);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router: every endpoint, the API docs, CORS and request tracing.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let auth_routes = Router::new()
        .route("/register", post(api::handlers::auth::register))
        .route("/login", post(api::handlers::auth::login))
        .route("/logout", post(api::handlers::auth::logout))
        .route("/current-user", get(api::handlers::auth::current_user));

    let student_routes = Router::new()
        .route("/courses", get(api::handlers::student::list_courses))
        .route("/my-courses", get(api::handlers::student::my_courses))
        .route("/enroll", post(api::handlers::student::enroll))
        .route("/drop", post(api::handlers::student::drop_course));

    let teacher_routes = Router::new()
        .route("/courses", get(api::handlers::teacher::list_courses))
        .route("/courses/create", post(api::handlers::teacher::create_course))
        .route("/courses/{id}", delete(api::handlers::teacher::delete_course))
        .route("/courses/{id}/students", get(api::handlers::teacher::course_students));

    let cors_layer = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(auth_routes)
        .nest("/student", student_routes)
        .nest("/teacher", teacher_routes)
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(cors_layer);

    // Add tracing layer
    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources.
///
/// 1. **Create**: [`Application::new`] opens the pool and runs migrations
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: when the shutdown future resolves, in-flight requests finish and the pool closes
pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Like [`Application::new`], reusing `pool` when one is given instead of opening `database.url`
    pub async fn new_with_pool(config: Config, pool: Option<SqlitePool>) -> anyhow::Result<Self> {
        debug!(bind = %config.bind_address(), "Starting selcon");

        let pool = match pool {
            Some(pool) => pool,
            None => {
                info!(url = %config.database.url, "Opening database");
                connect_pool(&config.database).await?
            }
        };
        migrator().run(&pool).await?;

        let app_state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(app_state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("selcon listening on http://{}, docs at http://{}/docs", bind_addr, bind_addr);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
