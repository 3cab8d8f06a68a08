//! Application startup and server initialization.
//!
//! Builds the auth service from the configuration, registers the configured
//! providers and serves the auth and avatar mounts next to a couple of demo routes.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use tokio::net::TcpListener;
use tracing::info;

use crate::avatar::MemoryStore;
use crate::config::ConfigV1;
use crate::middleware::auth;
use crate::models::User;
use crate::service::Service;

/// Build the service described by the configuration.
pub fn build_service(config: &ConfigV1) -> crate::error::Result<Service> {
    let mut opts = config.auth.to_opts();
    if config.avatar.enabled {
        opts.avatar_store = Some(Arc::new(MemoryStore::new()));
    }

    let service = Service::new(opts)?;
    for provider in &config.providers {
        service.add_provider(&provider.name, &provider.cid, &provider.csecret);
    }
    Ok(service)
}

/// Full application router: `/auth`, `/avatar`, `/open`, `/private` and `/health`.
pub fn create_router(service: &Service) -> Router {
    let (auth_handler, avatar_handler) = service.handlers();

    let private = Router::new()
        .route("/private", get(private_route))
        .route_layer(from_fn_with_state(service.middleware(), auth));

    Router::new()
        .nest_service("/auth", auth_handler)
        .nest_service("/avatar", avatar_handler)
        .route("/open", get(open_route))
        .route("/health", get(health_check))
        .merge(private)
}

/// Initializes and runs the application server.
///
/// # Errors
///
/// Returns an error if the service can't be built, the listener can't bind
/// to the configured address, or the server fails while running.
pub async fn run(config: Arc<ConfigV1>) -> Result<(), Box<dyn std::error::Error>> {
    let service = build_service(&config)?;
    let app = create_router(&service);

    info!(
        "Starting server on {} with providers {:?}",
        config.bind_address,
        service.providers()
    );

    let listener = TcpListener::bind(&config.bind_address).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn open_route() -> impl IntoResponse {
    "this is an open route, no token needed"
}

async fn private_route(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}

async fn health_check() -> impl IntoResponse {
    Response::new(Body::from("OK"))
}
