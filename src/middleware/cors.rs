use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue, Method, StatusCode,
        header::{self, ORIGIN},
    },
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::handlers::error_response;

pub const ALLOWED_METHODS: [Method; 7] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
    Method::PATCH,
];

const ALLOWED_HEADERS: [HeaderName; 9] = [
    header::CONTENT_TYPE,
    header::CONTENT_LENGTH,
    header::ACCEPT_ENCODING,
    HeaderName::from_static("x-csrf-token"),
    header::AUTHORIZATION,
    header::ACCEPT,
    header::ORIGIN,
    header::CACHE_CONTROL,
    HeaderName::from_static("x-requested-with"),
];

/// The fixed set of origins allowed to call the API from a browser.
#[derive(Debug, Clone)]
pub struct AllowedOrigins(Arc<[HeaderValue]>);

impl AllowedOrigins {
    pub fn new(origins: Vec<HeaderValue>) -> Self {
        Self(origins.into())
    }

    pub fn contains(&self, origin: &HeaderValue) -> bool {
        self.0.iter().any(|o| o == origin)
    }

    /// CORS response policy: listed origins, all API methods, credentials allowed.
    pub fn layer(&self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(self.0.iter().cloned()))
            .allow_methods(ALLOWED_METHODS)
            .allow_headers(ALLOWED_HEADERS)
            .allow_credentials(true)
    }
}

/// Requests carrying an `Origin` outside the allow-list stop here with 403.
/// Requests without an `Origin` header are not cross-origin and pass through.
pub async fn reject_disallowed_origin(
    State(origins): State<AllowedOrigins>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(origin) = request.headers().get(ORIGIN)
        && !origins.contains(origin)
    {
        warn!(origin = ?origin, path = %request.uri().path(), "rejected disallowed origin");
        return error_response(
            StatusCode::FORBIDDEN,
            "ORIGIN_NOT_ALLOWED",
            "Cross-origin requests from this origin are not allowed.",
        );
    }
    next.run(request).await
}
