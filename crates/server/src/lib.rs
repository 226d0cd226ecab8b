//! Composition root of the world economy.
//!
//! Builds the repositories and services, freezes the dispatcher, subscribes
//! the audit log, and exposes health and Prometheus metrics over HTTP.

pub mod audit;
pub mod config;
pub mod error;
pub mod routes;
pub mod telemetry;

use std::time::Duration;

use axum::Router;
use axum::routing::get;
use dispatch::Dispatcher;
use domain::{Repositories, WorldServices};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{Config, LogFormat};
pub use error::ServerError;

/// The frozen dispatcher and the repositories behind it.
#[derive(Clone)]
pub struct World {
    pub dispatcher: Dispatcher,
    pub repositories: Repositories,
}

impl World {
    /// Wires the default services over `repositories`.
    pub fn build(repositories: Repositories) -> Result<Self, ServerError> {
        let services = WorldServices::new(&repositories);
        Self::with_services(&services, repositories)
    }

    /// Registers the given services and the audit log, then freezes the
    /// dispatcher.
    pub fn with_services(
        services: &WorldServices,
        repositories: Repositories,
    ) -> Result<Self, ServerError> {
        let mut builder = Dispatcher::builder();
        services.register(&mut builder)?;
        audit::register(&mut builder);

        Ok(Self {
            dispatcher: builder.build(),
            repositories,
        })
    }

    /// Waits for in-flight event handlers, then flushes every repository.
    ///
    /// Repositories are flushed even if the drain times out.
    pub async fn shutdown(&self, drain_timeout: Duration) -> Result<(), ServerError> {
        let drained = tokio::time::timeout(drain_timeout, self.dispatcher.drain()).await;
        self.repositories.flush().await?;

        if drained.is_err() {
            let in_flight = self.dispatcher.in_flight_publications();
            tracing::warn!(in_flight, ?drain_timeout, "event drain timed out");
            return Err(ServerError::DrainTimedOut { in_flight });
        }
        Ok(())
    }
}

/// Creates the Axum application router.
pub fn create_app(world: &World, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .with_state(world.dispatcher.clone())
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
