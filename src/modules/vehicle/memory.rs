use super::model::Vehicle;
use super::repository::{ListVehiclesParams, Page, RepositoryError, VehicleRepository};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory implementation of `VehicleRepository`, used by the test suites
/// and handy for running the service without a database.
///
/// vehicles are keyed by device_id in a BTreeMap, which gives the same
/// deterministic primary key ordering the Postgres implementation has
#[derive(Debug, Default)]
pub struct MemoryVehicleRepository {
    vehicles: RwLock<BTreeMap<Uuid, Vehicle>>,
}

impl MemoryVehicleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VehicleRepository for MemoryVehicleRepository {
    async fn fetch_vehicle(
        &self,
        device_id: Uuid,
        provider_id: Uuid,
    ) -> Result<Vehicle, RepositoryError> {
        let vehicles = self.vehicles.read().await;

        vehicles
            .get(&device_id)
            .filter(|vehicle| vehicle.provider_id == provider_id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_vehicles(
        &self,
        params: ListVehiclesParams,
    ) -> Result<Page<Vehicle>, RepositoryError> {
        let vehicles = self.vehicles.read().await;

        let owned: Vec<&Vehicle> = vehicles
            .values()
            .filter(|vehicle| vehicle.provider_id == params.provider_id)
            .collect();

        let items = owned
            .iter()
            .skip(params.offset.max(0) as usize)
            .take(params.limit.max(0) as usize)
            .map(|vehicle| (*vehicle).clone())
            .collect();

        Ok(Page {
            items,
            total: owned.len() as i64,
        })
    }

    async fn insert_vehicle(&self, vehicle: &Vehicle) -> Result<(), RepositoryError> {
        let mut vehicles = self.vehicles.write().await;

        if vehicles.contains_key(&vehicle.device_id) {
            return Err(RepositoryError::Conflict);
        }

        vehicles.insert(vehicle.device_id, vehicle.clone());
        Ok(())
    }

    async fn update_vehicle(&self, vehicle: &Vehicle) -> Result<(), RepositoryError> {
        let mut vehicles = self.vehicles.write().await;

        match vehicles.get_mut(&vehicle.device_id) {
            Some(existing) if existing.provider_id == vehicle.provider_id => {
                *existing = vehicle.clone();
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }
}
