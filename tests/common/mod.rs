use axum::{body::Body, Router};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use http::{header, Method, Request, Response, StatusCode};
use http_body_util::BodyExt;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header};
use registry_api::modules::auth::jwt::Claims;
use registry_api::modules::vehicle::memory::MemoryVehicleRepository;
use registry_api::modules::vehicle::model::{
    PropulsionType, PropulsionTypeSet, Record, Vehicle, VehicleType,
};
use registry_api::server::controller;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const PRIVATE_KEY_PEM: &str = include_str!("../fixtures/jwt.test.key");
pub const PUBLIC_KEY_PEM: &str = include_str!("../fixtures/jwt.test.key.pub");

pub const TEST_HOST: &str = "registry.test";
pub const MDS_CONTENT_TYPE: &str = "application/vnd.mds+json";

/// the full application router backed by an empty in-memory repository
pub fn test_app() -> Router {
    let repository = Arc::new(MemoryVehicleRepository::new());
    let public_key =
        DecodingKey::from_rsa_pem(PUBLIC_KEY_PEM.as_bytes()).expect("invalid test public key");

    controller::new(repository, public_key)
}

/// a bearer token signed with the test RSA key, accepted by the app
pub fn provider_token(provider_id: Uuid) -> String {
    let mut claims = Claims::for_provider(provider_id);
    claims.set_expiration_in(chrono::Duration::minutes(5));

    jsonwebtoken::encode(
        &Header::new(Algorithm::RS256),
        &claims,
        &EncodingKey::from_rsa_pem(PRIVATE_KEY_PEM.as_bytes()).expect("invalid test private key"),
    )
    .expect("failed to sign test token")
}

/// a structurally well formed but unsigned token (algorithm "none"), the
/// service must never trust it
pub fn unsigned_token(provider_id: Uuid) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
    let claims =
        URL_SAFE_NO_PAD.encode(serde_json::json!({ "provider_id": provider_id }).to_string());

    format!("{header}.{claims}.")
}

/// a token signed with a symmetric key, outside the RSA allow list
pub fn hmac_token(provider_id: Uuid) -> String {
    let claims = Claims::for_provider(provider_id);

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"not the registry key"),
    )
    .expect("failed to sign hmac token")
}

/// a valid vehicle owned by the given provider, with a fresh device_id
pub fn make_vehicle(provider_id: Uuid) -> Vehicle {
    Vehicle {
        device_id: Uuid::new_v4(),
        provider_id,
        data_provider_id: None,
        vehicle_id: String::from("unit-7"),
        vehicle_type: VehicleType::ScooterStanding,
        vehicle_attributes: Record::default(),
        propulsion_types: PropulsionTypeSet::new([PropulsionType::Electric]),
        accessibility_attributes: Record::default(),
        battery_capacity: Some(5000),
        fuel_capacity: None,
        maximum_speed: Some(25),
    }
}

/// sends one request through the router, `token` becomes the bearer token
/// and a JSON body is sent with the mds content type
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<&serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, TEST_HOST);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, MDS_CONTENT_TYPE)
            .body(Body::from(serde_json::to_vec(json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn read_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("response body is not valid JSON")
}

/// asserts the response is the uniform 401 with the bearer challenge header
pub fn assert_unauthorized(response: &Response<Body>) {
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .and_then(|value| value.to_str().ok()),
        Some("Bearer, charset=\"UTF-8\"")
    );
}

/// turns an absolute pagination link into the path + query form oneshot accepts
pub fn link_to_uri(link: &str) -> String {
    let url = url::Url::parse(link).expect("pagination link is not an absolute URL");
    assert_eq!(url.host_str(), Some(TEST_HOST));

    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}
