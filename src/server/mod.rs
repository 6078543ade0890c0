//! Web server: one form page and the endpoint it posts to.
//!
//! | Route           | Purpose                                      |
//! |-----------------|----------------------------------------------|
//! | `GET /`         | empty form                                   |
//! | `POST /process` | multipart upload → extract → dispatch → view |
//! | `GET /health`   | liveness probe                               |
//!
//! The pipelines and the document loader are built once before the
//! listener opens and shared read-only by every request.

mod handlers;
mod routes;

pub use handlers::status_for;
pub use routes::create_router;

use crate::config::DeskConfig;
use crate::dispatch::Dispatcher;
use crate::error::PdfDeskError;
use crate::inference::Pipelines;
use crate::pipeline::extract::DocumentLoader;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub loader: Arc<dyn DocumentLoader>,
    pub config: Arc<DeskConfig>,
}

impl AppState {
    pub fn new(config: DeskConfig, pipelines: Pipelines, loader: Arc<dyn DocumentLoader>) -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher::new(pipelines, config.clone())),
            loader,
            config: Arc::new(config),
        }
    }
}

/// Bind `host:port` and serve until the process exits.
pub async fn serve(
    config: DeskConfig,
    pipelines: Pipelines,
    loader: Arc<dyn DocumentLoader>,
) -> Result<(), PdfDeskError> {
    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| PdfDeskError::InvalidConfig(format!("bad bind address: {e}")))?;

    let app = create_router(AppState::new(config, pipelines, loader));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| PdfDeskError::Internal(format!("Failed to bind {addr}: {e}")))?;
    info!("Starting server at http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| PdfDeskError::Internal(format!("Server error: {e}")))?;

    Ok(())
}
