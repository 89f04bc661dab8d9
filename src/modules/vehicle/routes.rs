use super::{bulk, dto::PaginatedVehiclesResponse, model::{Vehicle, WriteOperation}};
use crate::{
    modules::{
        auth::{self, jwt::AuthInfo},
        common::{
            pagination::{self, PaginationLinks},
            responses::ApiError,
        },
        vehicle::repository::{ListVehiclesParams, RepositoryError},
    },
    server::controller::AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Host, OriginalUri, Path, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use http::{HeaderMap, StatusCode, Uri};
use tracing::{error, warn};
use url::Url;
use uuid::Uuid;

pub fn create_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_vehicles)
                .post(register_vehicles)
                .put(update_vehicles),
        )
        .route("/:device_id", get(fetch_vehicle))
        .layer(axum::middleware::from_fn_with_state(
            state,
            auth::middleware::require_provider,
        ))
}

/// the uniform response for request bodies that do not decode as a JSON
/// array of vehicles, sent before any item is processed
fn invalid_payload_response(rejection: JsonRejection) -> Response {
    warn!("malformed vehicles payload: {rejection}");

    (
        StatusCode::BAD_REQUEST,
        Json(ApiError::bad_param(vec![String::from(
            "vehicles payload is not valid JSON",
        )])),
    )
        .into_response()
}

/// rebuilds the absolute URL this request was made to, so pagination links
/// can preserve the caller's scheme, host, path and query
fn request_url(headers: &HeaderMap, host: &str, uri: &Uri) -> Result<Url, url::ParseError> {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("http");

    Url::parse(&format!("{scheme}://{host}{uri}"))
}

/// Registers a batch of vehicles for the authenticated provider
#[utoipa::path(
    post,
    tag = "vehicle",
    path = "/vehicles",
    security(("bearer_token" = [])),
    request_body(content = Vec<Vehicle>, content_type = "application/vnd.mds+json"),
    responses(
        (status = CREATED, description = "all vehicles were registered", body = VehicleBulkResponse),
        (status = BAD_REQUEST, description = "malformed payload or no vehicle was registered", body = VehicleBulkResponse),
        (status = UNAUTHORIZED, description = "missing or invalid bearer token"),
        (status = INTERNAL_SERVER_ERROR, description = "every vehicle failed due to a server error", body = VehicleBulkResponse),
    ),
)]
pub async fn register_vehicles(
    State(state): State<AppState>,
    auth: AuthInfo,
    payload: Result<Json<Vec<Vehicle>>, JsonRejection>,
) -> Response {
    let Json(vehicles) = match payload {
        Ok(json) => json,
        Err(rejection) => return invalid_payload_response(rejection),
    };

    let (status, response) = bulk::apply(
        state.repository.as_ref(),
        auth,
        WriteOperation::Register,
        vehicles,
    )
    .await;

    (status, Json(response)).into_response()
}

/// Updates a batch of the authenticated provider's registered vehicles
#[utoipa::path(
    put,
    tag = "vehicle",
    path = "/vehicles",
    security(("bearer_token" = [])),
    request_body(content = Vec<Vehicle>, content_type = "application/vnd.mds+json"),
    responses(
        (status = OK, description = "all vehicles were updated", body = VehicleBulkResponse),
        (status = BAD_REQUEST, description = "malformed payload or no vehicle was updated", body = VehicleBulkResponse),
        (status = UNAUTHORIZED, description = "missing or invalid bearer token"),
        (status = INTERNAL_SERVER_ERROR, description = "every vehicle failed due to a server error", body = VehicleBulkResponse),
    ),
)]
pub async fn update_vehicles(
    State(state): State<AppState>,
    auth: AuthInfo,
    payload: Result<Json<Vec<Vehicle>>, JsonRejection>,
) -> Response {
    let Json(vehicles) = match payload {
        Ok(json) => json,
        Err(rejection) => return invalid_payload_response(rejection),
    };

    let (status, response) = bulk::apply(
        state.repository.as_ref(),
        auth,
        WriteOperation::Update,
        vehicles,
    )
    .await;

    (status, Json(response)).into_response()
}

/// Lists the authenticated provider's vehicles with offset pagination
#[utoipa::path(
    get,
    tag = "vehicle",
    path = "/vehicles",
    security(("bearer_token" = [])),
    params(
        ("page[limit]" = i64, Query, description = "items per page, required, capped at 20"),
        ("page[offset]" = Option<i64>, Query, description = "offset to list from, defaults to 0"),
    ),
    responses(
        (status = OK, description = "one page of vehicles", body = PaginatedVehiclesResponse),
        (status = BAD_REQUEST, description = "missing or invalid pagination parameters", body = ApiError),
        (status = UNAUTHORIZED, description = "missing or invalid bearer token"),
    ),
)]
pub async fn list_vehicles(
    State(state): State<AppState>,
    auth: AuthInfo,
    Host(host): Host,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Response {
    let parsed = pagination::parse_page_params(uri.query());
    if !parsed.errors.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiError::bad_param(parsed.errors)),
        )
            .into_response();
    }
    for warning in &parsed.warnings {
        warn!("list vehicles: {warning}");
    }

    let page = match state
        .repository
        .list_vehicles(ListVehiclesParams {
            provider_id: auth.provider_id,
            limit: parsed.params.limit,
            offset: parsed.params.offset,
        })
        .await
    {
        Ok(page) => page,
        Err(err) => {
            error!("failed to list vehicles: {err:#}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let base = match request_url(&headers, &host, &uri) {
        Ok(url) => url,
        Err(err) => {
            error!("failed to rebuild request URL: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let links = PaginationLinks::for_request(&base, page.total, parsed.params);
    Json(PaginatedVehiclesResponse::new(links, page.items)).into_response()
}

/// Fetches a single vehicle by device_id.
///
/// a vehicle owned by another provider yields the same 404 as one that was
/// never registered
#[utoipa::path(
    get,
    tag = "vehicle",
    path = "/vehicles/{device_id}",
    security(("bearer_token" = [])),
    params(
        ("device_id" = String, Path, description = "device id of the vehicle"),
    ),
    responses(
        (status = OK, description = "the vehicle", body = Vehicle),
        (status = UNAUTHORIZED, description = "missing or invalid bearer token"),
        (status = NOT_FOUND, description = "no such vehicle visible to this provider"),
    ),
)]
pub async fn fetch_vehicle(
    State(state): State<AppState>,
    auth: AuthInfo,
    Path(device_id): Path<String>,
) -> Response {
    // an id that does not parse cannot name a visible vehicle
    let Ok(device_id) = Uuid::parse_str(&device_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match state
        .repository
        .fetch_vehicle(device_id, auth.provider_id)
        .await
    {
        Ok(vehicle) => Json(vehicle).into_response(),
        Err(RepositoryError::NotFound) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("failed to fetch vehicle: {err:#}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
