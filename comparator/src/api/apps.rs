use axum::{
    Router,
    extract::State,
    response::Response,
    routing::{get, post},
};
use tracing::{debug, info};

use super::{AppState, rejected, rows_response};
use crate::error::CompositeError;
use crate::extractors::ValidatedJson;
use crate::report::ReportStore;
use common::{ErrorCode, PackageQuery};

/// Name, package and version of every analyzed build
async fn app_details(State(state): State<AppState>) -> Response {
    info!("Accessing app-details endpoint");
    let result = state
        .query("app-details", ErrorCode::Einternal, ReportStore::list_apps)
        .await;
    rows_response("app-details", result)
}

/// Full reports of every stored version of one package
async fn accept_package_name(
    State(state): State<AppState>,
    body: Result<ValidatedJson<PackageQuery>, CompositeError>,
) -> Response {
    info!("Accessing accept-package-name endpoint");
    let query = match body {
        Ok(ValidatedJson(query)) => query,
        Err(ce) => return rejected("accept-package-name", ce),
    };

    debug!(package = %query.package, "package name received");
    let result = state
        .query("accept-package-name", ErrorCode::Ebadrequest, move |store| {
            store.package_report(&query)
        })
        .await;
    rows_response("accept-package-name", result)
}

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/app-details", get(app_details))
        .route("/accept-package-name", post(accept_package_name))
}
