use super::open_api;
use crate::{
    config::app_config,
    modules::vehicle::{self, repository::VehicleRepository},
};
use axum::{
    body::Body,
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use http::{header, StatusCode};
use jsonwebtoken::DecodingKey;
use std::{sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::{
    timeout::TimeoutLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

/// the only content type accepted on requests that carry a body
pub const MDS_CONTENT_TYPE: &str = "application/vnd.mds+json";

/// The main application state, this is cloned for every HTTP request and
/// thus its fields should contain types that are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn VehicleRepository>,
    pub jwt_public_key: Arc<DecodingKey>,
}

/// refuses requests with a body that is not declared as the mds content
/// type, requests without a body pass through untouched
async fn require_mds_content_type(req: Request, next: Next) -> Response {
    let content_length = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(0);

    if content_length > 0 {
        let declared = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| {
                value
                    .split(';')
                    .next()
                    .unwrap_or("")
                    .trim()
                    .to_ascii_lowercase()
            });

        if declared.as_deref() != Some(MDS_CONTENT_TYPE) {
            return StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response();
        }
    }

    next.run(req).await
}

/// Creates the main axum router to be served over http
pub fn new(repository: Arc<dyn VehicleRepository>, jwt_public_key: DecodingKey) -> Router {
    let state = AppState {
        repository,
        jwt_public_key: Arc::new(jwt_public_key),
    };

    let tracing_layer = TraceLayer::new_for_http()
        .on_request(|request: &http::Request<Body>, _span: &Span| {
            tracing::info!("request: {} {}", request.method(), request.uri().path())
        })
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let global_middlewares = ServiceBuilder::new()
        .layer(tracing_layer)
        .layer(TimeoutLayer::new(Duration::from_secs(
            app_config().request_timeout_seconds,
        )));

    Router::new()
        .merge(open_api::create_openapi_router())
        .route("/health", get(healthcheck))
        .nest(
            "/vehicles",
            vehicle::routes::create_router(state.clone())
                .layer(axum::middleware::from_fn(require_mds_content_type)),
        )
        .layer(global_middlewares)
        .with_state(state)
}

#[utoipa::path(
    get,
    tag = "meta",
    path = "/health",
    responses((status = OK)),
)]
pub async fn healthcheck() -> StatusCode {
    StatusCode::OK
}
