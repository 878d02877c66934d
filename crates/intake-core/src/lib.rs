//! Shipment intake orchestration.
//!
//! [`IntakePipeline`] runs header mapping, row validation, the optional
//! suggestion overlay, the final record re-check and issue aggregation, and
//! assembles the [`intake_model::IntakeResponse`].

pub mod pipeline;
pub mod suggest;

pub use pipeline::IntakePipeline;
pub use suggest::{
    StaticSuggestionProvider, SuggestError, SuggestionProvider, SuggestionRequest, extract_json,
    fetch_suggestions, parse_suggestions,
};
