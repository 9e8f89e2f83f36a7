use axum::{
    http::Method,
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Router,
};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hrdesk_backend::config::Config;
use hrdesk_backend::db::connection::{create_pool, DbPool};
use hrdesk_backend::{handlers, middleware as auth_middleware, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hrdesk_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!(
        port = config.port,
        time_zone = %config.time_zone,
        leave_approval_levels = config.leave_approval_levels,
        overtime_approval_levels = config.overtime_approval_levels,
        correction_approval_levels = config.correction_approval_levels,
        "Loaded configuration from environment/.env"
    );

    let pool: DbPool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let port = config.port;
    let state = AppState::new(pool, config);

    // Employee routes (identity headers required)
    let user_routes = Router::new()
        .route("/api/requests", post(handlers::requests::create_request))
        .route(
            "/api/requests/me",
            get(handlers::requests::list_my_requests),
        )
        .route(
            "/api/requests/pending",
            get(handlers::requests::list_pending_approvals),
        )
        .route("/api/requests/{id}", get(handlers::requests::get_request))
        .route(
            "/api/requests/{id}/approval-rights",
            get(handlers::requests::get_approval_rights),
        )
        .route(
            "/api/requests/{id}/approve",
            post(handlers::requests::approve_request),
        )
        .route(
            "/api/requests/{id}/reject",
            post(handlers::requests::reject_request),
        )
        .route(
            "/api/delegations",
            post(handlers::delegations::create_delegation)
                .get(handlers::delegations::list_delegations),
        )
        .route(
            "/api/delegations/{id}",
            patch(handlers::delegations::update_delegation)
                .delete(handlers::delegations::cancel_delegation),
        )
        .route(
            "/api/notifications",
            get(handlers::notifications::list_my_notifications),
        )
        .route(
            "/api/notifications/{id}/read",
            post(handlers::notifications::mark_notification_read),
        )
        .route_layer(axum_middleware::from_fn(auth_middleware::auth));

    // Administrative routes (hr_admin role required)
    let admin_routes = Router::new()
        .route(
            "/api/admin/requests",
            get(handlers::requests::list_all_requests),
        )
        .route(
            "/api/admin/requests/{id}",
            delete(handlers::requests::cancel_approved_request),
        )
        .route_layer(axum_middleware::from_fn(auth_middleware::auth_admin));

    let app = Router::new()
        .merge(user_routes)
        .merge(admin_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([
                            Method::GET,
                            Method::POST,
                            Method::PATCH,
                            Method::DELETE,
                            Method::OPTIONS,
                        ])
                        .allow_headers(Any)
                        .max_age(std::time::Duration::from_secs(24 * 60 * 60)),
                ),
        )
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
