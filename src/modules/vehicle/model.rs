use crate::modules::common::set::Set;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use utoipa::ToSchema;
use uuid::Uuid;

/// Category of a registered vehicle, a closed enumeration from the
/// mobility data spec
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VehicleType {
    Other,
    Bicycle,
    Bus,
    CargoBicycle,
    Car,
    DeliveryRobot,
    Moped,
    ScooterStanding,
    ScooterSeated,
    Truck,
}

/// How a vehicle is propelled, a vehicle may have more than one
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PropulsionType {
    Unknown,
    Human,
    ElectricAssist,
    Electric,
    Combustion,
    CombustionDiesel,
    Hybrid,
    HydrogenFuelCell,
    PlugInHybrid,
}

impl Ord for PropulsionType {
    /// ordered by the canonical snake_case name so propulsion sets serialize
    /// in a stable order no matter how the declaration order changes
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_ref().cmp(other.as_ref())
    }
}

impl PartialOrd for PropulsionType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub type PropulsionTypeSet = Set<PropulsionType>;

/// An open record of JSON attributes keyed by string.
///
/// `null` or an absent field normalizes to the empty record, and the empty
/// record always serializes as `{}`, never as `null`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record(pub serde_json::Map<String, serde_json::Value>);

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Option::<serde_json::Map<String, serde_json::Value>>::deserialize(deserializer)?;
        Ok(Record(entries.unwrap_or_default()))
    }
}

/// deserializes an optional non negative integer where zero means "not provided"
fn zero_as_none<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<u32>::deserialize(deserializer)?;
    Ok(value.filter(|n| *n != 0))
}

/// A shared mobility vehicle as registered by its provider.
///
/// `device_id` is the primary identity and `provider_id` the tenant boundary,
/// both are immutable once the vehicle is registered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Vehicle {
    #[serde(default)]
    pub device_id: Uuid,

    #[serde(default)]
    pub provider_id: Uuid,

    /// secondary entity reporting on behalf of the provider, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_provider_id: Option<Uuid>,

    /// free text label assigned by the provider
    #[serde(default)]
    pub vehicle_id: String,

    pub vehicle_type: VehicleType,

    #[serde(default)]
    #[schema(value_type = Object)]
    pub vehicle_attributes: Record,

    #[serde(default)]
    #[schema(value_type = Vec<PropulsionType>)]
    pub propulsion_types: PropulsionTypeSet,

    #[serde(default)]
    #[schema(value_type = Object)]
    pub accessibility_attributes: Record,

    /// watt hours, omitted when not provided
    #[serde(
        default,
        deserialize_with = "zero_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub battery_capacity: Option<u32>,

    /// liters, omitted when not provided
    #[serde(
        default,
        deserialize_with = "zero_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub fuel_capacity: Option<u32>,

    /// km/h, omitted when not provided
    #[serde(
        default,
        deserialize_with = "zero_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub maximum_speed: Option<u32>,
}

/// The write being applied to a batch of vehicles, validation wording
/// differs between the two
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOperation {
    Register,
    Update,
}

/// Validates a vehicle payload against the acting provider.
///
/// returns machine stable error strings prefixed by the offending field,
/// an empty list means the vehicle is acceptable. Validating the same
/// payload twice always yields the same list
pub fn validate_vehicle(
    vehicle: &Vehicle,
    acting_provider: Uuid,
    operation: WriteOperation,
) -> Vec<String> {
    let mut errors = Vec::new();

    if vehicle.device_id.is_nil() {
        errors.push(String::from("device_id: null UUID is not allowed"));
    }

    if vehicle.provider_id != acting_provider {
        errors.push(String::from(match operation {
            WriteOperation::Register => {
                "provider_id: not allowed to register vehicle for another provider"
            }
            WriteOperation::Update => "provider_id: does not match user's provider ID",
        }));
    }

    errors
}


#[cfg(test)]
mod tests {
    use super::testing::sample_vehicle;
    use super::*;
    use serde_json::json;

    #[test]
    fn propulsion_sets_are_ordered_by_canonical_name() {
        let set = PropulsionTypeSet::new([
            PropulsionType::Human,
            PropulsionType::ElectricAssist,
            PropulsionType::Human,
            PropulsionType::Combustion,
        ]);

        assert_eq!(
            set.as_slice(),
            &[
                PropulsionType::Combustion,
                PropulsionType::ElectricAssist,
                PropulsionType::Human,
            ]
        );
    }

    #[test]
    fn propulsion_set_json_round_trip_ignores_input_order() {
        let a: PropulsionTypeSet = serde_json::from_value(json!(["electric", "human"])).unwrap();
        let b: PropulsionTypeSet =
            serde_json::from_value(json!(["human", "electric", "human"])).unwrap();

        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_value(&a).unwrap(),
            json!(["electric", "human"])
        );
    }

    #[test]
    fn vehicle_type_string_table_goes_both_ways() {
        use std::str::FromStr;

        assert_eq!(VehicleType::CargoBicycle.to_string(), "cargo_bicycle");
        assert_eq!(
            VehicleType::from_str("scooter_seated").unwrap(),
            VehicleType::ScooterSeated
        );
        assert!(VehicleType::from_str("submarine").is_err());
    }

    #[test]
    fn attribute_records_normalize_to_empty_objects() {
        let vehicle: Vehicle = serde_json::from_value(json!({
            "device_id": Uuid::new_v4(),
            "provider_id": Uuid::new_v4(),
            "vehicle_type": "moped",
            "accessibility_attributes": null,
        }))
        .unwrap();

        let output = serde_json::to_value(&vehicle).unwrap();
        assert_eq!(output["vehicle_attributes"], json!({}));
        assert_eq!(output["accessibility_attributes"], json!({}));
    }

    #[test]
    fn zero_capacities_are_treated_as_not_provided() {
        let vehicle: Vehicle = serde_json::from_value(json!({
            "device_id": Uuid::new_v4(),
            "provider_id": Uuid::new_v4(),
            "vehicle_type": "car",
            "battery_capacity": 0,
            "maximum_speed": 90,
        }))
        .unwrap();

        assert_eq!(vehicle.battery_capacity, None);
        assert_eq!(vehicle.maximum_speed, Some(90));

        let output = serde_json::to_value(&vehicle).unwrap();
        assert!(output.get("battery_capacity").is_none());
        assert!(output.get("fuel_capacity").is_none());
        assert_eq!(output["maximum_speed"], json!(90));
    }

    #[test]
    fn validation_rejects_the_null_uuid() {
        let provider = Uuid::new_v4();
        let mut vehicle = sample_vehicle(provider);
        vehicle.device_id = Uuid::nil();

        let errors = validate_vehicle(&vehicle, provider, WriteOperation::Register);
        assert_eq!(errors, vec!["device_id: null UUID is not allowed"]);
    }

    #[test]
    fn validation_wording_differs_between_register_and_update() {
        let vehicle = sample_vehicle(Uuid::new_v4());
        let other_provider = Uuid::new_v4();

        assert_eq!(
            validate_vehicle(&vehicle, other_provider, WriteOperation::Register),
            vec!["provider_id: not allowed to register vehicle for another provider"]
        );
        assert_eq!(
            validate_vehicle(&vehicle, other_provider, WriteOperation::Update),
            vec!["provider_id: does not match user's provider ID"]
        );
    }

    #[test]
    fn validation_is_idempotent() {
        let mut vehicle = sample_vehicle(Uuid::new_v4());
        vehicle.device_id = Uuid::nil();
        let acting = Uuid::new_v4();

        assert_eq!(
            validate_vehicle(&vehicle, acting, WriteOperation::Register),
            validate_vehicle(&vehicle, acting, WriteOperation::Register),
        );
    }

    #[test]
    fn valid_vehicle_produces_no_errors() {
        let provider = Uuid::new_v4();
        let vehicle = sample_vehicle(provider);

        assert!(validate_vehicle(&vehicle, provider, WriteOperation::Register).is_empty());
        assert!(validate_vehicle(&vehicle, provider, WriteOperation::Update).is_empty());
    }
}
