use axum::{Router, extract::State, response::Response, routing::post};
use tracing::{debug, info};

use super::{AppState, rejected, rows_response};
use crate::error::CompositeError;
use crate::extractors::ValidatedJson;
use common::{ErrorCode, PackagePair, VersionPair};

/// Reports of two packages side by side
async fn compare_apps(
    State(state): State<AppState>,
    body: Result<ValidatedJson<PackagePair>, CompositeError>,
) -> Response {
    info!("Accessing compare-apps endpoint");
    let pair = match body {
        Ok(ValidatedJson(pair)) => pair,
        Err(ce) => return rejected("compare-apps", ce),
    };

    debug!(first = %pair.first, second = %pair.second, "comparing packages");
    let result = state
        .query("compare-apps", ErrorCode::Ebadrequest, move |store| store.compare_apps(&pair))
        .await;
    rows_response("compare-apps", result)
}

/// Reports of two specific builds, in request order
async fn compare_apps_versions(
    State(state): State<AppState>,
    body: Result<ValidatedJson<VersionPair>, CompositeError>,
) -> Response {
    info!("Accessing compare-apps-versions endpoint");
    let pair = match body {
        Ok(ValidatedJson(pair)) => pair,
        Err(ce) => return rejected("compare-apps-versions", ce),
    };

    debug!(first = %pair.first, second = %pair.second, "comparing builds");
    let result = state
        .query("compare-apps-versions", ErrorCode::Ebadrequest, move |store| {
            store.compare_versions(&pair)
        })
        .await;
    rows_response("compare-apps-versions", result)
}

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/compare-apps", post(compare_apps))
        .route("/compare-apps-versions", post(compare_apps_versions))
}
