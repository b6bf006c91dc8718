//! Middleware assembly from configuration.
//!
//! The `middlewares.order` list drives what gets attached and in which
//! sequence; supported entries are `logger`, `cors` and `favicon`. Unknown
//! entries are skipped, mirroring the registrar's policy for unknown route
//! keys.

use axum::{
    Router,
    body::Body,
    http::{HeaderName, HeaderValue, Method, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer, ExposeHeaders};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use gonyx_config::{CorsConfig, FaviconConfig, MiddlewareConfig};

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Names accepted in `middlewares.order`.
pub const SUPPORTED_MIDDLEWARES: [&str; 3] = ["logger", "cors", "favicon"];

/// Attach the configured middleware stack to a materialized router.
pub fn apply(mut router: Router, cfg: &MiddlewareConfig) -> Router {
    for item in &cfg.order {
        match item.as_str() {
            "logger" => {
                router = router
                    .layer(
                        TraceLayer::new_for_http()
                            .make_span_with(|req: &Request<Body>| {
                                let req_id = req
                                    .extensions()
                                    .get::<HeaderValue>()
                                    .and_then(|v| v.to_str().ok())
                                    .unwrap_or("");
                                tracing::info_span!(
                                    "http.request",
                                    http.method = %req.method(),
                                    http.target = %req.uri(),
                                    request_id = %req_id,
                                )
                            })
                            .on_response(
                                |res: &Response, latency: std::time::Duration, _span: &tracing::Span| {
                                    tracing::info!(
                                        http.status = %res.status().as_u16(),
                                        elapsed_ms = %latency.as_millis(),
                                        "request handled"
                                    );
                                },
                            ),
                    )
                    .layer(axum::middleware::from_fn(request_id));
            }
            "cors" => {
                let cors = cfg.cors.clone().unwrap_or_default();
                router = router.layer(build_cors(&cors));
            }
            "favicon" => {
                let favicon = cfg.favicon.clone().unwrap_or_default();
                let url = favicon.url.clone();
                router = router.route(&url, get(move || serve_favicon(favicon.clone())));
            }
            other => {
                tracing::debug!(middleware = other, "unsupported middleware entry ignored");
            }
        }
    }
    router
}

/// Tags request and response with a generated `x-request-id` and makes the id
/// visible to the tracing span via request extensions.
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    let id = Uuid::new_v4().to_string();
    match HeaderValue::from_str(&id) {
        Ok(value) => {
            req.headers_mut().insert(REQUEST_ID, value.clone());
            req.extensions_mut().insert(value.clone());
            let mut res = next.run(req).await;
            res.headers_mut().insert(REQUEST_ID, value);
            res
        }
        Err(_) => next.run(req).await,
    }
}

/// Build a CORS layer from typed configuration.
pub fn build_cors(cfg: &CorsConfig) -> CorsLayer {
    let mut layer = CorsLayer::new();

    if cfg.allow_all_origins {
        layer = layer.allow_origin(Any);
        if cfg.allow_credentials {
            // The wildcard origin cannot be combined with credentials; the
            // origin wins and credentials are dropped.
            tracing::warn!("cors: allow_credentials ignored because allow_all_origins is set");
        }
    } else {
        if !cfg.allow_origins.is_empty() {
            let origins: Vec<HeaderValue> = cfg
                .allow_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            layer = layer.allow_origin(AllowOrigin::list(origins));
        }
        layer = layer.allow_credentials(cfg.allow_credentials);
    }

    if !cfg.allow_methods.is_empty() {
        let methods: Vec<Method> = cfg
            .allow_methods
            .iter()
            .filter_map(|m| m.parse().ok())
            .collect();
        layer = layer.allow_methods(AllowMethods::list(methods));
    }

    if !cfg.allow_headers.is_empty() {
        let headers: Vec<HeaderName> = cfg
            .allow_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();
        layer = layer.allow_headers(AllowHeaders::list(headers));
    }

    if !cfg.expose_headers.is_empty() {
        let headers: Vec<HeaderName> = cfg
            .expose_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();
        layer = layer.expose_headers(ExposeHeaders::list(headers));
    }

    if let Some(secs) = cfg.max_age_secs {
        layer = layer.max_age(std::time::Duration::from_secs(secs));
    }

    layer
}

/// Serves the configured icon file, or an empty 204 so browsers stop asking.
async fn serve_favicon(cfg: FaviconConfig) -> Response {
    let Some(file) = cfg.file else {
        return StatusCode::NO_CONTENT.into_response();
    };
    match tokio::fs::read(&file).await {
        Ok(bytes) => {
            let mut res = ([(header::CONTENT_TYPE, "image/x-icon")], bytes).into_response();
            if let Some(cache) = cfg
                .cache_control
                .as_deref()
                .and_then(|c| HeaderValue::from_str(c).ok())
            {
                res.headers_mut().insert(header::CACHE_CONTROL, cache);
            }
            res
        }
        Err(e) => {
            tracing::warn!(file = %file, error = %e, "favicon file unreadable");
            StatusCode::NO_CONTENT.into_response()
        }
    }
}
