//! Text helpers shared by the matching phases.

/// Normalizes header or phrase text for comparison: trimmed, lowercased,
/// separators replaced by spaces and whitespace collapsed.
pub fn normalize_text(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace(['_', '-', '.', '/', '\\'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Substring containment in either direction.
pub fn contains_either(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_separators_and_case() {
        assert_eq!(normalize_text("  PU_Date "), "pu date");
        assert_eq!(normalize_text("Del.-Time"), "del time");
        assert_eq!(normalize_text("Truck  #"), "truck #");
        assert_eq!(normalize_text("   "), "");
    }

    #[test]
    fn containment_checks_both_directions() {
        assert!(contains_either("pu", "pu date"));
        assert!(contains_either("pickup date local", "pickup date"));
        assert!(!contains_either("del time", "del date"));
    }
}
