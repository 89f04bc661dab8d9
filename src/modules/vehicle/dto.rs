use super::model::Vehicle;
use crate::modules::common::pagination::PaginationLinks;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// version of the mobility data spec the payloads follow, reported on
/// every paginated response
pub const MDS_VERSION: &str = "2.0.0";

/// One page of the provider's vehicles along with the navigation links
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaginatedVehiclesResponse {
    pub version: String,
    pub links: PaginationLinks,
    pub vehicles: Vec<Vehicle>,
}

impl PaginatedVehiclesResponse {
    pub fn new(links: PaginationLinks, vehicles: Vec<Vehicle>) -> PaginatedVehiclesResponse {
        PaginatedVehiclesResponse {
            version: String::from(MDS_VERSION),
            links,
            vehicles,
        }
    }
}
