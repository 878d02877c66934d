//! Confidence tiers for externally suggested mappings.

/// Bucket a suggestion falls into by confidence.
///
/// The tiers partition `[0, 1]` without gaps or overlap:
/// - `Auto`: at or above [`ConfidenceTier::AUTO_MIN`], applied to the mapping
/// - `Review`: at or above [`ConfidenceTier::REVIEW_MIN`], surfaced as a warning
/// - `Reject`: everything lower, surfaced as an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfidenceTier {
    Reject,
    Review,
    Auto,
}

impl ConfidenceTier {
    pub const AUTO_MIN: f64 = 0.9;
    pub const REVIEW_MIN: f64 = 0.6;

    /// Tier for `confidence`. NaN is rejected.
    #[must_use]
    pub fn of(confidence: f64) -> Self {
        if confidence >= Self::AUTO_MIN {
            Self::Auto
        } else if confidence >= Self::REVIEW_MIN {
            Self::Review
        } else {
            Self::Reject
        }
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Auto => "auto - applied without review",
            Self::Review => "review - left for confirmation",
            Self::Reject => "reject - header flagged as unclear",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn boundaries_fall_into_upper_tier() {
        assert_eq!(ConfidenceTier::of(0.9), ConfidenceTier::Auto);
        assert_eq!(ConfidenceTier::of(0.6), ConfidenceTier::Review);
        assert_eq!(ConfidenceTier::of(0.599), ConfidenceTier::Reject);
        assert_eq!(ConfidenceTier::of(f64::NAN), ConfidenceTier::Reject);
    }

    proptest! {
        #[test]
        fn tiers_are_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(ConfidenceTier::of(low) <= ConfidenceTier::of(high));
        }

        #[test]
        fn every_confidence_has_exactly_one_tier(c in 0.0f64..=1.0) {
            let tier = ConfidenceTier::of(c);
            let auto = c >= 0.9;
            let review = (0.6..0.9).contains(&c);
            let reject = c < 0.6;
            prop_assert_eq!([auto, review, reject].iter().filter(|b| **b).count(), 1);
            prop_assert_eq!(tier == ConfidenceTier::Auto, auto);
            prop_assert_eq!(tier == ConfidenceTier::Review, review);
        }
    }
}
