//! CORS policy for browser clients.

use axum::http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use url::Url;

/// Builds a CORS layer that admits only the listed origins, mirrors the
/// requested method and headers, and allows credentials.
///
/// Returns `None` when no listed origin is valid; browsers then get no CORS
/// headers at all.
pub fn build_cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let mut allowed = Vec::new();
    for origin in origins {
        let normalized = normalize_origin(origin);
        match normalized
            .as_deref()
            .and_then(|value| HeaderValue::from_str(value).ok())
        {
            Some(value) => allowed.push(value),
            None => {
                tracing::warn!(%origin, ?normalized, "ignoring invalid CORS origin");
            }
        }
    }

    if allowed.is_empty() {
        return None;
    }

    // Wildcards are incompatible with credentials, so methods and headers are
    // echoed back from the preflight instead.
    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true),
    )
}

/// Reduces an origin string to `scheme://host[:port]`.
///
/// Browsers send the serialized origin, so paths and trailing slashes in the
/// configured value would never match.
pub fn normalize_origin(origin: &str) -> Option<String> {
    let trimmed = origin.trim();
    if trimmed.is_empty() || trimmed == "*" {
        return None;
    }

    let url = Url::parse(trimmed).ok()?;
    let origin = url.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}
