//! Header-to-field mapping for shipment extracts.

pub mod confidence;
pub mod mapper;
pub mod merge;
pub mod score;
pub mod synonyms;
pub mod utils;

pub use confidence::ConfidenceTier;
pub use mapper::{HeaderMapper, MappingOutcome};
pub use merge::{MergeReport, SuggestionMerger};
pub use score::{CLOSEST_HEADER_MIN, closest_header, header_similarity};
pub use synonyms::{SplitFragments, SynonymTable};
pub use utils::normalize_text;
