//! Liveness and readiness probes.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::db::{Replay, SchemaStore};
use crate::state::AppState;

/// Liveness: the process is up. Never touches the database.
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Readiness: the database answers and every registered column exists.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let pool = state.pool();
    let missing = state
        .policy()
        .run("health.ready", Replay::Idempotent, move || async move {
            sqlx::query("SELECT 1").execute(pool).await?;
            SchemaStore::new(pool).verify().await
        })
        .await;

    match missing {
        Ok(missing) if missing.is_empty() => {
            (StatusCode::OK, Json(json!({ "status": "ready" })))
        }
        Ok(missing) => {
            tracing::warn!(?missing, "Readiness check failed: schema not evolved");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "schema_outdated", "missing_columns": missing })),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "database_unavailable" })),
            )
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;

    use crate::routes::tests::{send, test_app};

    #[tokio::test]
    async fn test_ready_reports_unreachable_database() {
        let (status, json) = send(test_app(true), "GET", "/health/ready", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["status"], "database_unavailable");
    }
}
