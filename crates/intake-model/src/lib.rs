//! Data model for shipment intake.

pub mod error;
pub mod field;
pub mod issue;
pub mod mapping;
pub mod options;
pub mod processing;
pub mod record;
pub mod table;

pub use error::IntakeError;
pub use field::CanonicalField;
pub use issue::{Issue, IssueKind, Severity};
pub use mapping::{
    Ambiguity, ChangeKind, ChangeRecord, ConfidenceSuggestion, FieldMapping, MatchKind,
    SplitMapping,
};
pub use options::{DateOrder, ProcessingOptions, RequestOptions};
pub use processing::{IntakeRequest, IntakeResponse, MappingMeta, RunMeta};
pub use record::ShipmentRecord;
pub use table::{CellValue, RawTable};
