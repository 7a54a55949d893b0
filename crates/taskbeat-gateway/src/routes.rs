//! API route handlers for the gateway.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use taskbeat_core::error::{Result, TaskBeatError};
use taskbeat_core::event::{normalize, TaskAction, TaskEvent};

use crate::server::AppState;

/// Health check endpoint.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Subscription descriptor for the event-bus sidecar.
pub async fn subscriptions() -> Json<serde_json::Value> {
    Json(serde_json::json!([
        {
            "pubsubname": "task-pubsub",
            "topic": "task-events",
            "route": "/events/task"
        }
    ]))
}

/// Inbound lifecycle event endpoint.
///
/// Returns 200 on success and on drop-after-log errors (malformed
/// envelope, invalid recurrence rule — redelivery never fixes bad
/// data); 500 on transient failures so the transport redelivers.
pub async fn handle_task_event(
    State(state): State<Arc<AppState>>,
    Json(envelope): Json<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    let event = match normalize(&envelope) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Dropping malformed event: {e}");
            return success();
        }
    };
    tracing::info!(task_id = %event.task_id, action = ?event.action, "Received task event");

    match route_event(&state, &event).await {
        Ok(()) => success(),
        Err(e) if e.is_droppable() => {
            tracing::warn!(task_id = %event.task_id, "Dropping event: {e}");
            success()
        }
        Err(e) => {
            tracing::error!(task_id = %event.task_id, "Error handling task event: {e}");
            error(&e)
        }
    }
}

async fn route_event(state: &AppState, event: &TaskEvent) -> Result<()> {
    let now = Utc::now();
    match event.action {
        TaskAction::Created => {
            state
                .engine
                .schedule(&event.task, &event.user_id, now)
                .await?;
        }
        TaskAction::Updated => {
            if event.task.due_date.is_some() {
                state
                    .engine
                    .reschedule(&event.task, &event.user_id, now)
                    .await?;
            } else {
                // Due date removed — the reminder goes with it.
                state.engine.cancel(&event.task_id).await?;
            }
        }
        TaskAction::Completed => {
            state.engine.cancel(&event.task_id).await?;
            // A failed creation call is logged and acknowledged, not
            // retried: redelivery after a timeout could duplicate the
            // next task, and a missed recurrence is recoverable by
            // hand. Validation errors still propagate for the
            // drop-after-log path above.
            if let Err(e) = state.completion.handle(event).await {
                match e {
                    TaskBeatError::Delivery(_) => {
                        tracing::error!(
                            task_id = %event.task_id,
                            "Failed to create next occurrence, not retrying: {e}"
                        );
                    }
                    other => return Err(other),
                }
            }
        }
        TaskAction::Deleted => {
            state.engine.cancel(&event.task_id).await?;
        }
        TaskAction::Unknown => {
            tracing::debug!(task_id = %event.task_id, "Ignoring unknown event type");
        }
    }
    Ok(())
}

/// Reminder due-check trigger — the external twin of the internal
/// one-minute timer.
pub async fn check_reminders(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<serde_json::Value>) {
    tracing::info!("Reminder check triggered");
    match state.sweep.tick(Utc::now()).await {
        Ok(delivered) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "SUCCESS", "delivered": delivered })),
        ),
        Err(e) => {
            tracing::error!("Reminder check failed: {e}");
            error(&e)
        }
    }
}

fn success() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "SUCCESS" })),
    )
}

fn error(e: &TaskBeatError) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "status": "ERROR", "message": e.to_string() })),
    )
}
