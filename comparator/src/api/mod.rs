mod apps;
mod compare;
mod cors;

use std::sync::Arc;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::error::CompositeError;
use crate::report::{ReportRow, ReportStore, StoreError};
use common::{ErrorCode, WELCOME_MESSAGE};

#[derive(Clone)]
pub(crate) struct AppState {
    report_store: Arc<ReportStore>,
}

impl AppState {
    pub fn new(report_store: ReportStore) -> Self {
        Self {
            report_store: Arc::new(report_store),
        }
    }

    /// Run one store operation on the blocking pool. Store faults are
    /// `internal`; any other failure of the task is reported as `other_fault`.
    async fn query<F>(
        &self,
        endpoint: &'static str,
        other_fault: ErrorCode,
        op: F,
    ) -> Result<Vec<ReportRow>, CompositeError>
    where
        F: FnOnce(&ReportStore) -> Result<Vec<ReportRow>, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.report_store);
        match tokio::task::spawn_blocking(move || op(&store)).await {
            Ok(Ok(rows)) => Ok(rows),
            Ok(Err(e)) => {
                error!(endpoint, error = %e, "Database error");
                Err(e.into())
            }
            Err(e) => {
                error!(endpoint, error = %e, "Query task failed");
                Err(CompositeError::new(other_fault, &format!("Error: {e}")))
            }
        }
    }
}

fn rows_response(
    endpoint: &'static str,
    result: Result<Vec<ReportRow>, CompositeError>,
) -> Response {
    match result {
        Ok(rows) => {
            debug!(endpoint, count = rows.len(), "Returning report rows");
            (StatusCode::OK, Json(rows)).into_response()
        }
        Err(ce) => ce.into_response(),
    }
}

fn rejected(endpoint: &'static str, ce: CompositeError) -> Response {
    warn!(endpoint, error = %ce, details = ?ce.errors, "Invalid request received");
    ce.into_response()
}

async fn root() -> &'static str {
    info!("Root endpoint accessed");
    WELCOME_MESSAGE
}

async fn not_found() -> CompositeError {
    CompositeError::new(ErrorCode::Enotfound, "Not found")
}

pub fn create_router(report_store: ReportStore, allowed_origins: &[String]) -> Router {
    let state = AppState::new(report_store);

    Router::new()
        .route("/", get(root))
        .merge(apps::router())
        .merge(compare::router())
        .fallback(not_found)
        .layer(cors::layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
