use axum::{
    Router,
    body::Body,
    http::{HeaderValue, StatusCode},
    middleware,
    routing::{get, post},
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    map_request_body::MapRequestBodyLayer,
    timeout::{RequestBodyTimeoutLayer, TimeoutBody, TimeoutLayer},
};

use crate::config::{Config, DEFAULT_CORS_ORIGINS};
use crate::db::UserGateway;
use crate::error::BootstrapError;
use crate::handlers::{not_found, users};
use crate::middleware::{
    AllowedOrigins, cross_origin_isolation, log_requests, reject_disallowed_origin,
};
use crate::service::UserService;

/// Transport-level knobs shared by every route.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub allowed_origins: AllowedOrigins,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    /// How long a connection may sit without traffic before it is closed.
    pub idle_timeout: Duration,
}

impl HttpSettings {
    pub fn from_config(cfg: &Config) -> Result<Self, BootstrapError> {
        let origins = cfg
            .cors_allowed_origins
            .iter()
            .map(|o| {
                HeaderValue::from_str(o).map_err(|_| BootstrapError::InvalidOrigin(o.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            allowed_origins: AllowedOrigins::new(origins),
            read_timeout: cfg.read_timeout(),
            write_timeout: cfg.write_timeout(),
            idle_timeout: cfg.idle_timeout(),
        })
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        let cfg = Config::default();
        Self {
            allowed_origins: AllowedOrigins::new(
                DEFAULT_CORS_ORIGINS.map(HeaderValue::from_static).to_vec(),
            ),
            read_timeout: cfg.read_timeout(),
            write_timeout: cfg.write_timeout(),
            idle_timeout: cfg.idle_timeout(),
        }
    }
}

/// Build the full application: route table plus the request pipeline.
///
/// Stages, outermost first:
/// 1. cross-origin isolation headers
/// 2. access log
/// 3. write timeout, then body read timeout
/// 4. origin allow-list enforcement
/// 5. CORS response headers and preflight answers
///
/// The first two wrap everything below, so they also run for 403, 404,
/// 405 and timeout responses.
pub fn tender_router<G: UserGateway + 'static>(
    service: UserService<G>,
    settings: &HttpSettings,
) -> Router {
    let pipeline = ServiceBuilder::new()
        .layer(middleware::from_fn(cross_origin_isolation))
        .layer(middleware::from_fn(log_requests))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            settings.write_timeout,
        ))
        .layer(RequestBodyTimeoutLayer::new(settings.read_timeout))
        .layer(MapRequestBodyLayer::new(Body::new::<TimeoutBody<Body>>))
        .layer(middleware::from_fn_with_state(
            settings.allowed_origins.clone(),
            reject_disallowed_origin,
        ))
        .layer(settings.allowed_origins.layer());

    Router::new()
        .route("/signup", post(users::sign_up::<G>))
        .route("/users", get(users::get_all_users::<G>))
        .fallback(not_found)
        .layer(pipeline)
        .with_state(service)
}
