//! Server initialization and routing

use crate::api;
use crate::config::Config;
use crate::jwt::JwtManager;
use crate::middleware::{authenticate, pipeline, require_admin, require_non_admin, AuthState};
use crate::query::QueryEngine;
use crate::repository::{PostRepositoryImpl, ProjectRepositoryImpl, UserRepositoryImpl};
use crate::service::{
    AuthService, PostService, ProjectService, UserService, WebhookDispatcher, WebhookPublisher,
};
use crate::state::HasServices;
use anyhow::Result;
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use sqlx::{mysql::MySqlPoolOptions, MySqlPool};
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: MySqlPool,
    pub jwt_manager: JwtManager,
    pub auth_service: Arc<AuthService<UserRepositoryImpl>>,
    pub project_service: Arc<ProjectService<ProjectRepositoryImpl>>,
    pub post_service: Arc<PostService<PostRepositoryImpl, ProjectRepositoryImpl>>,
    pub user_service: Arc<UserService<UserRepositoryImpl>>,
}

impl AppState {
    /// Wire repositories and services over one pool.
    pub fn new(
        config: Config,
        db_pool: MySqlPool,
        webhook_publisher: Arc<dyn WebhookPublisher>,
    ) -> Self {
        let engine = QueryEngine::new(config.query_timeout());
        let jwt_manager = JwtManager::new(config.jwt.clone());

        let user_repo = Arc::new(UserRepositoryImpl::new(db_pool.clone(), engine));
        let project_repo = Arc::new(ProjectRepositoryImpl::new(db_pool.clone(), engine));
        let post_repo = Arc::new(PostRepositoryImpl::new(db_pool.clone(), engine));

        Self {
            config: Arc::new(config),
            db_pool,
            auth_service: Arc::new(AuthService::new(user_repo.clone(), jwt_manager.clone())),
            project_service: Arc::new(ProjectService::new(project_repo.clone())),
            post_service: Arc::new(PostService::new(post_repo, project_repo, webhook_publisher)),
            user_service: Arc::new(UserService::new(user_repo)),
            jwt_manager,
        }
    }
}

/// Implement HasServices trait for production AppState
impl HasServices for AppState {
    type UserRepo = UserRepositoryImpl;
    type ProjectRepo = ProjectRepositoryImpl;
    type PostRepo = PostRepositoryImpl;

    fn config(&self) -> &Config {
        &self.config
    }

    fn jwt_manager(&self) -> &JwtManager {
        &self.jwt_manager
    }

    fn auth_service(&self) -> &AuthService<Self::UserRepo> {
        &self.auth_service
    }

    fn project_service(&self) -> &ProjectService<Self::ProjectRepo> {
        &self.project_service
    }

    fn post_service(&self) -> &PostService<Self::PostRepo, Self::ProjectRepo> {
        &self.post_service
    }

    fn user_service(&self) -> &UserService<Self::UserRepo> {
        &self.user_service
    }

    async fn check_ready(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.db_pool).await.is_ok()
    }
}

/// Run the HTTP server until a shutdown signal arrives.
pub async fn run(config: Config) -> Result<()> {
    // Create database connection pool
    let db_pool = MySqlPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;

    info!("Connected to database");

    let (dispatcher, supervisor) = WebhookDispatcher::start(&config.webhook);
    let http_addr = config.http_addr();
    let shutdown_timeout = config.shutdown_timeout();

    let state = AppState::new(config, db_pool, Arc::new(dispatcher));
    let app = build_router(state);

    let listener = TcpListener::bind(&http_addr).await?;
    info!("HTTP server started on {}", http_addr);

    // Fires once the signal is received; starts the in-flight deadline.
    let draining = Arc::new(Notify::new());
    let server = axum::serve(listener, app)
        .with_graceful_shutdown({
            let draining = draining.clone();
            async move {
                shutdown_signal().await;
                draining.notify_one();
            }
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result?,
        _ = async {
            draining.notified().await;
            tokio::time::sleep(shutdown_timeout).await;
        } => {
            warn!(
                timeout_secs = shutdown_timeout.as_secs(),
                "In-flight requests did not finish before the shutdown deadline"
            );
        }
    }

    let abandoned = supervisor.shutdown().await;
    info!(abandoned, "Server shutdown complete");
    Ok(())
}

/// Build the HTTP router with every route and the global middleware.
///
/// Generic over [`HasServices`] so integration tests can serve the same routes
/// over in-memory repositories.
pub fn build_router<S: HasServices>(state: S) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let auth_state = AuthState::new(state.jwt_manager().clone());
    let telemetry = state.config().telemetry.clone();

    let public = Router::new()
        .route("/health", get(api::health::health))
        .route("/ready", get(api::health::ready::<S>))
        .route("/auth/register", post(api::auth::register::<S>))
        .route("/auth/login", post(api::auth::login::<S>))
        .route("/auth/forgot-password", post(api::auth::forgot_password::<S>));

    // Administrators manage users, not content.
    let authoring = Router::new()
        .route("/projects", post(api::project::create::<S>))
        .route("/projects/{id}", put(api::project::update::<S>))
        .route_layer(from_fn(require_non_admin));

    let admin = Router::new()
        .route("/admin/users", get(api::admin::list_users::<S>))
        .route_layer(from_fn(require_admin));

    // The auth gate is the last route_layer so it wraps the role gates.
    let protected = Router::new()
        .route("/projects", get(api::project::list::<S>))
        .route("/projects/check-slug", get(api::project::check_slug::<S>))
        .route(
            "/projects/{id}",
            get(api::project::get::<S>).delete(api::project::delete::<S>),
        )
        .route(
            "/posts",
            get(api::post::list::<S>).post(api::post::create::<S>),
        )
        .merge(authoring)
        .merge(admin)
        .route_layer(from_fn_with_state(auth_state, authenticate));

    let router = public.merge(protected).layer(cors).with_state(state);

    pipeline::apply(router, &telemetry)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}
