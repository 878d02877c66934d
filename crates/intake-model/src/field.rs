//! Canonical shipment fields.
//!
//! Every extract, whatever its headers look like, is mapped onto this fixed
//! set of fields. The order of [`CanonicalField::ALL`] is the schema order used
//! for matching phases and for reporting.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::IntakeError;

/// A field of the shipment record schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    /// Load or shipment identifier. Must be unique within an extract.
    Id,
    OriginAddress,
    /// Pickup moment, canonical UTC.
    OriginTimestamp,
    DestinationAddress,
    /// Delivery moment, canonical UTC.
    DestinationTimestamp,
    Status,
    /// Driver or operator name.
    OperatorName,
    /// Driver phone or other contact. The only optional field.
    OperatorContact,
    /// Truck, tractor or unit number.
    VehicleId,
    /// Carrier, customer or broker on the other side of the load.
    CounterpartyName,
}

impl CanonicalField {
    /// All fields in schema order.
    pub const ALL: [CanonicalField; 10] = [
        CanonicalField::Id,
        CanonicalField::OriginAddress,
        CanonicalField::OriginTimestamp,
        CanonicalField::DestinationAddress,
        CanonicalField::DestinationTimestamp,
        CanonicalField::Status,
        CanonicalField::OperatorName,
        CanonicalField::OperatorContact,
        CanonicalField::VehicleId,
        CanonicalField::CounterpartyName,
    ];

    /// Fields sourced from date/time text and normalized to canonical UTC.
    pub const DATETIME: [CanonicalField; 2] = [
        CanonicalField::OriginTimestamp,
        CanonicalField::DestinationTimestamp,
    ];

    /// Returns the serialized key (e.g. `origin_timestamp`).
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Id => "id",
            CanonicalField::OriginAddress => "origin_address",
            CanonicalField::OriginTimestamp => "origin_timestamp",
            CanonicalField::DestinationAddress => "destination_address",
            CanonicalField::DestinationTimestamp => "destination_timestamp",
            CanonicalField::Status => "status",
            CanonicalField::OperatorName => "operator_name",
            CanonicalField::OperatorContact => "operator_contact",
            CanonicalField::VehicleId => "vehicle_id",
            CanonicalField::CounterpartyName => "counterparty_name",
        }
    }

    /// Human-readable label used in issue messages.
    pub fn label(&self) -> &'static str {
        match self {
            CanonicalField::Id => "Load ID",
            CanonicalField::OriginAddress => "Origin address",
            CanonicalField::OriginTimestamp => "Pickup time",
            CanonicalField::DestinationAddress => "Destination address",
            CanonicalField::DestinationTimestamp => "Delivery time",
            CanonicalField::Status => "Status",
            CanonicalField::OperatorName => "Driver name",
            CanonicalField::OperatorContact => "Driver contact",
            CanonicalField::VehicleId => "Vehicle ID",
            CanonicalField::CounterpartyName => "Counterparty",
        }
    }

    pub fn is_required(&self) -> bool {
        !matches!(self, CanonicalField::OperatorContact)
    }

    pub fn is_datetime(&self) -> bool {
        matches!(
            self,
            CanonicalField::OriginTimestamp | CanonicalField::DestinationTimestamp
        )
    }

    /// Required fields in schema order.
    pub fn required() -> impl Iterator<Item = CanonicalField> {
        Self::ALL.into_iter().filter(CanonicalField::is_required)
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalField {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == key)
            .ok_or_else(|| IntakeError::UnknownField(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_contact_is_the_only_optional_field() {
        let optional: Vec<_> = CanonicalField::ALL
            .into_iter()
            .filter(|f| !f.is_required())
            .collect();
        assert_eq!(optional, vec![CanonicalField::OperatorContact]);
        assert_eq!(CanonicalField::required().count(), 9);
    }

    #[test]
    fn parses_keys_case_insensitively() {
        assert_eq!(
            " Origin_Timestamp ".parse::<CanonicalField>().unwrap(),
            CanonicalField::OriginTimestamp
        );
        let error = "pickup".parse::<CanonicalField>().unwrap_err();
        assert!(matches!(&error, IntakeError::UnknownField(key) if key == "pickup"));
        assert_eq!(error.to_string(), "unknown canonical field: pickup");
    }

    #[test]
    fn serde_key_matches_as_str() {
        for field in CanonicalField::ALL {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.as_str()));
        }
    }
}
