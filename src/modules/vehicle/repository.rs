use super::model::{PropulsionType, PropulsionTypeSet, Record, Vehicle, VehicleType};
use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::{types::Json, FromRow, PgPool};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by vehicle storage, anything that is not a conflict or a
/// missing row is wrapped as `Other` and never shown to API clients
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("vehicle not found")]
    NotFound,

    #[error("a vehicle with the same device_id is already registered")]
    Conflict,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        RepositoryError::Other(err.into())
    }
}

/// One page of a listing plus the total amount of records available,
/// both computed at the same logical point in time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListVehiclesParams {
    pub provider_id: Uuid,
    pub limit: i64,
    pub offset: i64,
}

/// Storage contract for vehicle records.
///
/// every read and write is scoped to a provider, a row owned by another
/// provider behaves exactly like a row that does not exist
#[async_trait]
pub trait VehicleRepository: Send + Sync {
    /// fetches a single vehicle owned by `provider_id`
    async fn fetch_vehicle(
        &self,
        device_id: Uuid,
        provider_id: Uuid,
    ) -> Result<Vehicle, RepositoryError>;

    /// lists the provider's vehicles in primary key order, page items and
    /// total count are mutually consistent
    async fn list_vehicles(
        &self,
        params: ListVehiclesParams,
    ) -> Result<Page<Vehicle>, RepositoryError>;

    /// inserts a new vehicle, `Conflict` when the device_id is taken
    async fn insert_vehicle(&self, vehicle: &Vehicle) -> Result<(), RepositoryError>;

    /// overwrites the vehicle matched by device_id and owning provider,
    /// `NotFound` when no such row exists
    async fn update_vehicle(&self, vehicle: &Vehicle) -> Result<(), RepositoryError>;
}

const FETCH_VEHICLE: &str = "\
    SELECT id, external_id, provider, data_provider, vehicle_type, propulsion_types, \
           attributes, accessibility_attributes, battery_capacity, fuel_capacity, maximum_speed \
    FROM vehicles \
    WHERE id = $1 AND provider = $2";

const LIST_VEHICLES: &str = "\
    SELECT id, external_id, provider, data_provider, vehicle_type, propulsion_types, \
           attributes, accessibility_attributes, battery_capacity, fuel_capacity, maximum_speed \
    FROM vehicles \
    WHERE provider = $1 \
    ORDER BY id \
    LIMIT $2 OFFSET $3";

const COUNT_VEHICLES: &str = "SELECT COUNT(*) FROM vehicles WHERE provider = $1";

const INSERT_VEHICLE: &str = "\
    INSERT INTO vehicles \
        (id, external_id, provider, data_provider, vehicle_type, propulsion_types, \
         attributes, accessibility_attributes, battery_capacity, fuel_capacity, maximum_speed) \
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)";

const UPDATE_VEHICLE: &str = "\
    UPDATE vehicles \
    SET external_id = $3, data_provider = $4, vehicle_type = $5, propulsion_types = $6, \
        attributes = $7, accessibility_attributes = $8, battery_capacity = $9, \
        fuel_capacity = $10, maximum_speed = $11 \
    WHERE id = $1 AND provider = $2";

/// Postgres implementation of `VehicleRepository` on top of a sqlx pool
#[derive(Debug, Clone)]
pub struct PgVehicleRepository {
    pool: PgPool,
}

impl PgVehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// row shape of the vehicles table, enums and attribute records are kept as
/// their storage representations (text / text[] / jsonb)
#[derive(Debug, FromRow)]
struct VehicleRow {
    id: Uuid,
    external_id: String,
    provider: Uuid,
    data_provider: Option<Uuid>,
    vehicle_type: String,
    propulsion_types: Vec<String>,
    attributes: Json<serde_json::Map<String, serde_json::Value>>,
    accessibility_attributes: Json<serde_json::Map<String, serde_json::Value>>,
    battery_capacity: Option<i32>,
    fuel_capacity: Option<i32>,
    maximum_speed: Option<i32>,
}

impl VehicleRow {
    fn into_vehicle(self) -> Result<Vehicle, RepositoryError> {
        let vehicle_type = VehicleType::from_str(&self.vehicle_type)
            .map_err(|_| anyhow!("unknown vehicle_type {:?} in storage", self.vehicle_type))?;

        let propulsion_types = self
            .propulsion_types
            .iter()
            .map(|raw| {
                PropulsionType::from_str(raw)
                    .map_err(|_| anyhow!("unknown propulsion_type {raw:?} in storage"))
            })
            .collect::<Result<PropulsionTypeSet, _>>()?;

        Ok(Vehicle {
            device_id: self.id,
            provider_id: self.provider,
            data_provider_id: self.data_provider,
            vehicle_id: self.external_id,
            vehicle_type,
            vehicle_attributes: Record(self.attributes.0),
            propulsion_types,
            accessibility_attributes: Record(self.accessibility_attributes.0),
            battery_capacity: self.battery_capacity.map(|n| n as u32),
            fuel_capacity: self.fuel_capacity.map(|n| n as u32),
            maximum_speed: self.maximum_speed.map(|n| n as u32),
        })
    }
}

fn propulsion_strings(vehicle: &Vehicle) -> Vec<String> {
    vehicle
        .propulsion_types
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[async_trait]
impl VehicleRepository for PgVehicleRepository {
    async fn fetch_vehicle(
        &self,
        device_id: Uuid,
        provider_id: Uuid,
    ) -> Result<Vehicle, RepositoryError> {
        let row: Option<VehicleRow> = sqlx::query_as(FETCH_VEHICLE)
            .bind(device_id)
            .bind(provider_id)
            .fetch_optional(&self.pool)
            .await?;

        row.ok_or(RepositoryError::NotFound)?.into_vehicle()
    }

    async fn list_vehicles(
        &self,
        params: ListVehiclesParams,
    ) -> Result<Page<Vehicle>, RepositoryError> {
        // page and count run in one transaction so the total cannot drift
        // from the returned items within a single request
        let mut tx = self.pool.begin().await?;

        let rows: Vec<VehicleRow> = sqlx::query_as(LIST_VEHICLES)
            .bind(params.provider_id)
            .bind(params.limit)
            .bind(params.offset)
            .fetch_all(&mut *tx)
            .await?;

        let total: i64 = sqlx::query_scalar(COUNT_VEHICLES)
            .bind(params.provider_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        let items = rows
            .into_iter()
            .map(VehicleRow::into_vehicle)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page { items, total })
    }

    async fn insert_vehicle(&self, vehicle: &Vehicle) -> Result<(), RepositoryError> {
        let result = sqlx::query(INSERT_VEHICLE)
            .bind(vehicle.device_id)
            .bind(&vehicle.vehicle_id)
            .bind(vehicle.provider_id)
            .bind(vehicle.data_provider_id)
            .bind(vehicle.vehicle_type.to_string())
            .bind(propulsion_strings(vehicle))
            .bind(Json(vehicle.vehicle_attributes.0.clone()))
            .bind(Json(vehicle.accessibility_attributes.0.clone()))
            .bind(vehicle.battery_capacity.map(|n| n as i32))
            .bind(vehicle.fuel_capacity.map(|n| n as i32))
            .bind(vehicle.maximum_speed.map(|n| n as i32))
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(RepositoryError::Conflict)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn update_vehicle(&self, vehicle: &Vehicle) -> Result<(), RepositoryError> {
        let result = sqlx::query(UPDATE_VEHICLE)
            .bind(vehicle.device_id)
            .bind(vehicle.provider_id)
            .bind(&vehicle.vehicle_id)
            .bind(vehicle.data_provider_id)
            .bind(vehicle.vehicle_type.to_string())
            .bind(propulsion_strings(vehicle))
            .bind(Json(vehicle.vehicle_attributes.0.clone()))
            .bind(Json(vehicle.accessibility_attributes.0.clone()))
            .bind(vehicle.battery_capacity.map(|n| n as i32))
            .bind(vehicle.fuel_capacity.map(|n| n as i32))
            .bind(vehicle.maximum_speed.map(|n| n as i32))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
