use serde::{Deserialize, Serialize};

use crate::field::CanonicalField;

/// One fully validated shipment row in the output schema.
///
/// Timestamps hold canonical UTC text (`YYYY-MM-DDTHH:MM:SSZ`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentRecord {
    pub id: String,
    pub origin_address: String,
    pub origin_timestamp: String,
    pub destination_address: String,
    pub destination_timestamp: String,
    pub status: String,
    pub operator_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_contact: Option<String>,
    pub vehicle_id: String,
    pub counterparty_name: String,
}

impl ShipmentRecord {
    /// Value of `field`; an absent contact reads as empty.
    pub fn get(&self, field: CanonicalField) -> &str {
        match field {
            CanonicalField::Id => &self.id,
            CanonicalField::OriginAddress => &self.origin_address,
            CanonicalField::OriginTimestamp => &self.origin_timestamp,
            CanonicalField::DestinationAddress => &self.destination_address,
            CanonicalField::DestinationTimestamp => &self.destination_timestamp,
            CanonicalField::Status => &self.status,
            CanonicalField::OperatorName => &self.operator_name,
            CanonicalField::OperatorContact => self.operator_contact.as_deref().unwrap_or(""),
            CanonicalField::VehicleId => &self.vehicle_id,
            CanonicalField::CounterpartyName => &self.counterparty_name,
        }
    }

    /// Sets `field`. An empty contact is stored as absent.
    pub fn set(&mut self, field: CanonicalField, value: String) {
        match field {
            CanonicalField::Id => self.id = value,
            CanonicalField::OriginAddress => self.origin_address = value,
            CanonicalField::OriginTimestamp => self.origin_timestamp = value,
            CanonicalField::DestinationAddress => self.destination_address = value,
            CanonicalField::DestinationTimestamp => self.destination_timestamp = value,
            CanonicalField::Status => self.status = value,
            CanonicalField::OperatorName => self.operator_name = value,
            CanonicalField::OperatorContact => {
                self.operator_contact = if value.is_empty() { None } else { Some(value) }
            }
            CanonicalField::VehicleId => self.vehicle_id = value,
            CanonicalField::CounterpartyName => self.counterparty_name = value,
        }
    }
}
