//! Similarity scoring for remediation hints.

use rapidfuzz::distance::jaro_winkler;

use intake_model::CanonicalField;

use crate::synonyms::SynonymTable;
use crate::utils::normalize_text;

/// Minimum Jaro-Winkler similarity for a header to be offered as the
/// likely source of a missing field.
pub const CLOSEST_HEADER_MIN: f64 = 0.7;

/// Best Jaro-Winkler similarity between `header` and the field's phrases or key.
pub fn header_similarity(header: &str, field: CanonicalField, synonyms: &SynonymTable) -> f64 {
    let normalized = normalize_text(header);
    if normalized.is_empty() {
        return 0.0;
    }
    let key = field.as_str().replace('_', " ");
    synonyms
        .phrases(field)
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(key.as_str()))
        .map(|phrase| jaro_winkler::similarity(normalized.chars(), phrase.chars()))
        .fold(0.0, f64::max)
}

/// The candidate header most similar to `field`, if any reaches
/// [`CLOSEST_HEADER_MIN`]. Ties keep the earliest candidate.
pub fn closest_header<'a>(
    field: CanonicalField,
    candidates: &'a [String],
    synonyms: &SynonymTable,
) -> Option<(&'a str, f64)> {
    let mut best: Option<(&str, f64)> = None;
    for header in candidates {
        let score = header_similarity(header, field, synonyms);
        if score < CLOSEST_HEADER_MIN {
            continue;
        }
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((header.as_str(), score));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn misspelled_header_is_offered() {
        let table = SynonymTable::stock();
        let candidates = vec!["Notes".to_string(), "Vehicel".to_string()];
        let (header, score) =
            closest_header(CanonicalField::VehicleId, &candidates, &table).expect("closest");
        assert_eq!(header, "Vehicel");
        assert!(score >= CLOSEST_HEADER_MIN);
    }

    #[test]
    fn unrelated_headers_are_not_offered() {
        let table = SynonymTable::stock();
        let candidates = vec!["Zzz".to_string()];
        assert_eq!(closest_header(CanonicalField::Status, &candidates, &table), None);
    }
}
