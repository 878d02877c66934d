//! Field synonym phrases used for header matching.

use std::collections::BTreeMap;

use intake_model::CanonicalField;
use tracing::debug;

use crate::utils::normalize_text;

/// Date-side and time-side fragments for one datetime field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitFragments {
    pub date: Vec<String>,
    pub time: Vec<String>,
}

/// Canonical field to lowercase candidate phrases.
///
/// Phrases feed the exact and fuzzy phases. Split fragments feed split
/// date/time detection and are kept apart so that a column such as
/// `PU Time` is only ever treated as the time half of a pickup moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymTable {
    phrases: BTreeMap<CanonicalField, Vec<String>>,
    split: BTreeMap<CanonicalField, SplitFragments>,
}

const STOCK_PHRASES: &[(CanonicalField, &[&str])] = &[
    (
        CanonicalField::Id,
        &[
            "load id",
            "load number",
            "load #",
            "shipment id",
            "pro number",
            "order id",
            "reference number",
        ],
    ),
    (
        CanonicalField::OriginAddress,
        &[
            "pickup address",
            "pu address",
            "origin",
            "origin address",
            "shipper address",
            "pickup location",
            "ship from",
        ],
    ),
    (
        CanonicalField::OriginTimestamp,
        &[
            "pickup datetime",
            "pu datetime",
            "pickup appointment",
            "origin timestamp",
        ],
    ),
    (
        CanonicalField::DestinationAddress,
        &[
            "delivery address",
            "del address",
            "destination",
            "consignee address",
            "drop address",
            "ship to",
        ],
    ),
    (
        CanonicalField::DestinationTimestamp,
        &[
            "delivery datetime",
            "del datetime",
            "delivery appointment",
            "destination timestamp",
        ],
    ),
    (
        CanonicalField::Status,
        &["status", "load status", "shipment status"],
    ),
    (
        CanonicalField::OperatorName,
        &["driver", "driver name", "operator"],
    ),
    (
        CanonicalField::OperatorContact,
        &["driver phone", "driver contact", "driver cell", "phone"],
    ),
    (
        CanonicalField::VehicleId,
        &[
            "truck",
            "truck id",
            "truck #",
            "vehicle",
            "vehicle id",
            "tractor",
            "unit number",
        ],
    ),
    (
        CanonicalField::CounterpartyName,
        &["carrier", "carrier name", "customer", "broker", "counterparty"],
    ),
];

const STOCK_SPLITS: &[(CanonicalField, &[&str], &[&str])] = &[
    (
        CanonicalField::OriginTimestamp,
        &["pickup date", "pu date", "ship date"],
        &["pickup time", "pu time", "ship time"],
    ),
    (
        CanonicalField::DestinationTimestamp,
        &["delivery date", "del date", "drop date"],
        &["delivery time", "del time", "drop time"],
    ),
];

fn owned(phrases: &[&str]) -> Vec<String> {
    phrases.iter().map(|p| (*p).to_string()).collect()
}

impl SynonymTable {
    /// The built-in table.
    pub fn stock() -> Self {
        let phrases = STOCK_PHRASES
            .iter()
            .map(|(field, phrases)| (*field, owned(phrases)))
            .collect();
        let split = STOCK_SPLITS
            .iter()
            .map(|(field, date, time)| {
                (
                    *field,
                    SplitFragments {
                        date: owned(date),
                        time: owned(time),
                    },
                )
            })
            .collect();
        Self { phrases, split }
    }

    /// Stock table extended with caller-supplied phrases.
    pub fn with_extras(extras: &BTreeMap<String, Vec<String>>) -> Self {
        let mut table = Self::stock();
        table.extend(extras);
        table
    }

    /// Adds phrases keyed by canonical field key. Unknown keys are skipped
    /// and returned; phrases are normalized and deduplicated.
    pub fn extend(&mut self, extras: &BTreeMap<String, Vec<String>>) -> Vec<String> {
        let mut unknown = Vec::new();
        for (key, phrases) in extras {
            let Ok(field) = key.parse::<CanonicalField>() else {
                debug!(key = %key, "ignoring synonyms for unknown field");
                unknown.push(key.clone());
                continue;
            };
            let entry = self.phrases.entry(field).or_default();
            for phrase in phrases {
                let phrase = normalize_text(phrase);
                if !phrase.is_empty() && !entry.contains(&phrase) {
                    entry.push(phrase);
                }
            }
        }
        unknown
    }

    /// Candidate phrases for `field`.
    pub fn phrases(&self, field: CanonicalField) -> &[String] {
        self.phrases.get(&field).map_or(&[], Vec::as_slice)
    }

    pub fn split_fragments(&self, field: CanonicalField) -> Option<&SplitFragments> {
        self.split.get(&field)
    }

    /// Fields with their phrases, in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, &[String])> {
        self.phrases.iter().map(|(f, p)| (*f, p.as_slice()))
    }

    /// Datetime fields with split fragments, in schema order.
    pub fn splits(&self) -> impl Iterator<Item = (CanonicalField, &SplitFragments)> {
        self.split.iter().map(|(f, s)| (*f, s))
    }
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self::stock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_covers_every_field() {
        let table = SynonymTable::stock();
        for field in CanonicalField::ALL {
            assert!(!table.phrases(field).is_empty(), "{field} has no phrases");
        }
        for field in CanonicalField::DATETIME {
            assert!(table.split_fragments(field).is_some());
        }
    }

    #[test]
    fn stock_phrases_are_normalized() {
        let table = SynonymTable::stock();
        for (_, phrases) in table.iter() {
            for phrase in phrases {
                assert_eq!(&normalize_text(phrase), phrase);
            }
        }
    }

    #[test]
    fn time_fragments_are_not_exact_synonyms() {
        let table = SynonymTable::stock();
        let all: Vec<&String> = table.iter().flat_map(|(_, p)| p).collect();
        for (_, fragments) in table.splits() {
            for time in &fragments.time {
                assert!(!all.contains(&time), "{time} doubles as a synonym");
            }
        }
    }

    #[test]
    fn extras_are_normalized_and_unknown_keys_reported() {
        let mut extras = BTreeMap::new();
        extras.insert("vehicle_id".to_string(), vec![" Rig_No ".to_string()]);
        extras.insert("trailer".to_string(), vec!["trailer".to_string()]);

        let mut table = SynonymTable::stock();
        let unknown = table.extend(&extras);

        assert_eq!(unknown, vec!["trailer".to_string()]);
        assert!(
            table
                .phrases(CanonicalField::VehicleId)
                .contains(&"rig no".to_string())
        );
    }
}
