//! Web layer module
//!
//! This module provides the HTTP interface for the pipeline controller. It
//! follows the thin-handler approach: handlers parse the request, call the
//! [`PipelineService`] and map the result through [`responses`].
//!
//! # Routes
//!
//! - `POST /pipelines` create a pipeline
//! - `GET /pipelines` list pipelines
//! - `GET /pipelines/:name` pipeline summary
//! - `POST /pipelines/:name/execute` start an execution
//! - `GET /pipelines/:name/status` stage status map
//! - `GET /ws` WebSocket status push
//! - `GET /health` liveness

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{config::Config, services::PipelineService};

pub mod api;
pub mod responses;
pub mod websocket;

// Re-export commonly used types
pub use responses::{handle_error, handle_result, ApiResponse};

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: &Config, pipeline_service: PipelineService) -> Result<Self> {
        let app = Self::create_router(AppState { pipeline_service });
        let addr: SocketAddr = format!("{}:{}", config.web.host, config.web.port).parse()?;

        Ok(Self { app, addr })
    }

    /// Create the router with all routes and middleware
    pub fn create_router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(api::health_check))
            .route(
                "/pipelines",
                get(api::list_pipelines).post(api::create_pipeline),
            )
            .route("/pipelines/:name", get(api::get_pipeline))
            .route("/pipelines/:name/execute", post(api::execute_pipeline))
            .route("/pipelines/:name/status", get(api::get_pipeline_status))
            .route("/ws", get(websocket::status_websocket))
            // Middleware (applied in reverse order)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Start the web server and run until `shutdown` resolves
    pub async fn serve(self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }

    /// Get the host address
    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    /// Get the port number
    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline_service: PipelineService,
}
