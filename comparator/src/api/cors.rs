use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

/// CORS policy for the configured origins. A single `*` entry mirrors any
/// request origin; otherwise only the listed origins are allowed.
pub(super) fn layer(allowed_origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if matches!(allowed_origins, [only] if only == "*") {
        return base.allow_origin(AllowOrigin::mirror_request());
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| {
            if origin == "*" {
                warn!("Wildcard CORS origin must be the only entry; skipping");
                return None;
            }
            match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Invalid CORS origin in config; skipping");
                    None
                }
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(origins))
}
