use crate::modules::vehicle::model::Vehicle;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Stable error tokens returned to API clients, both standalone and as
/// per item failures of a bulk write
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ApiErrorKind {
    Unknown,
    BadParam,
    AlreadyRegistered,
    Unregistered,
}

impl ApiErrorKind {
    /// the fixed human readable description for this kind, internal error
    /// text is never exposed in its place
    pub fn description(self) -> &'static str {
        match self {
            ApiErrorKind::Unknown => "An unknown error occurred",
            ApiErrorKind::BadParam => "A validation error occurred",
            ApiErrorKind::AlreadyRegistered => "A vehicle with device_id is already registered",
            ApiErrorKind::Unregistered => "This device_id is unregistered",
        }
    }
}

/// An API level error, serialized with flat `error` / `error_description` /
/// `error_details` fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    #[serde(rename = "error")]
    pub kind: ApiErrorKind,

    #[serde(rename = "error_description")]
    pub description: String,

    #[serde(rename = "error_details", default)]
    pub details: Vec<String>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind) -> ApiError {
        ApiError {
            kind,
            description: String::from(kind.description()),
            details: Vec::new(),
        }
    }

    /// a validation error carrying the field level error strings
    pub fn bad_param(details: Vec<String>) -> ApiError {
        ApiError {
            details,
            ..ApiError::new(ApiErrorKind::BadParam)
        }
    }
}

/// A single failed item of a bulk write, echoing the submitted item
/// untouched next to the flattened error fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[aliases(VehicleFailureDetails = FailureDetails<Vehicle>)]
pub struct FailureDetails<T: for<'_s> ToSchema<'_s>> {
    pub item: T,

    #[serde(flatten)]
    pub error: ApiError,
}

/// Aggregate outcome of a multi item write: per item failures plus
/// the overall counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[aliases(VehicleBulkResponse = BulkResponse<Vehicle>)]
#[serde(bound(deserialize = "T: for<'_s> ToSchema<'_s> + Deserialize<'de>"))]
pub struct BulkResponse<T: for<'_s> ToSchema<'_s>> {
    pub success: usize,
    pub total: usize,

    #[serde(default)]
    pub failures: Vec<FailureDetails<T>>,
}

impl<T: for<'_s> ToSchema<'_s>> BulkResponse<T> {
    pub fn with_total(total: usize) -> BulkResponse<T> {
        BulkResponse {
            success: 0,
            total,
            failures: Vec::new(),
        }
    }
}
