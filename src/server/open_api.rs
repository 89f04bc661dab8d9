use crate::modules::{common, vehicle};
use crate::server::controller;
use axum::Router;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::openapi::{InfoBuilder, OpenApiBuilder};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    components(schemas(
        vehicle::model::Vehicle,
        vehicle::model::VehicleType,
        vehicle::model::PropulsionType,
        vehicle::dto::PaginatedVehiclesResponse,

        common::pagination::PaginationLinks,
        common::responses::ApiError,
        common::responses::ApiErrorKind,
        common::responses::VehicleFailureDetails,
        common::responses::VehicleBulkResponse,
    )),
    paths(
        controller::healthcheck,

        vehicle::routes::register_vehicles,
        vehicle::routes::update_vehicles,
        vehicle::routes::list_vehicles,
        vehicle::routes::fetch_vehicle,
    ),
    modifiers(&BearerTokenSecurityScheme),
)]
struct ApiDoc;

/// provider bearer token, a RS256/RS384/RS512 signed JWT carrying the
/// provider_id claim
struct BearerTokenSecurityScheme;

impl Modify for BearerTokenSecurityScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

pub fn create_openapi_router() -> Router<controller::AppState> {
    let builder: OpenApiBuilder = ApiDoc::openapi().into();

    let info = InfoBuilder::new()
        .title("Vehicle Registry API")
        .description(Some(
            "Provider scoped registry for shared mobility vehicles.",
        ))
        .version("0.1.0")
        .build();

    let api_doc = builder.info(info).build();

    Router::new().merge(SwaggerUi::new("/swagger").url("/docs/openapi.json", api_doc))
}
