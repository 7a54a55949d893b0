//! Router assembly and the serve loop.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use taskbeat_core::config::GatewayConfig;
use taskbeat_core::error::{Result, TaskBeatError};
use taskbeat_recurrence::CompletionHandler;
use taskbeat_reminder::{ReminderEngine, ReminderSweep};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::routes;

/// Shared handler state.
pub struct AppState {
    pub engine: Arc<ReminderEngine>,
    pub completion: Arc<CompletionHandler>,
    pub sweep: Arc<ReminderSweep>,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/events/task", post(routes::handle_task_event))
        .route("/check-reminders", post(routes::check_reminders))
        .route("/subscriptions", get(routes::subscriptions))
        .route("/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(config: &GatewayConfig, state: Arc<AppState>) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| TaskBeatError::config(format!("cannot bind {addr}: {e}")))?;
    tracing::info!(%addr, "Gateway listening");
    axum::serve(listener, build_router(state))
        .await
        .map_err(|e| TaskBeatError::Http(e.to_string()))?;
    Ok(())
}
