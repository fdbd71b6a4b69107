//! Confidence Levels
//!
//! A verification confidence arrives from the backend either as a legacy
//! numeric score in [0,1] or as a pre-labeled category string. Both decode
//! into [`ConfidenceValue`] once at the API boundary; every display site goes
//! through [`ConfidenceLevel`] so the mapping is applied in exactly one place.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Five-point ordinal confidence category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfidenceLevel {
    Low,
    SlightlyLow,
    Medium,
    MediumHigh,
    High,
}

impl ConfidenceLevel {
    /// Map a numeric score in [0,1] to a level (inclusive lower bounds).
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            ConfidenceLevel::High
        } else if score >= 0.65 {
            ConfidenceLevel::MediumHigh
        } else if score >= 0.4 {
            ConfidenceLevel::Medium
        } else if score >= 0.2 {
            ConfidenceLevel::SlightlyLow
        } else {
            ConfidenceLevel::Low
        }
    }

    /// Parse a pre-labeled category string.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "高" => Some(ConfidenceLevel::High),
            "中高" => Some(ConfidenceLevel::MediumHigh),
            "中" => Some(ConfidenceLevel::Medium),
            "偏低" => Some(ConfidenceLevel::SlightlyLow),
            "低" => Some(ConfidenceLevel::Low),
            _ => None,
        }
    }

    /// Display label as shown in result panels and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "高",
            ConfidenceLevel::MediumHigh => "中高",
            ConfidenceLevel::Medium => "中",
            ConfidenceLevel::SlightlyLow => "偏低",
            ConfidenceLevel::Low => "低",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Confidence as it appears on the wire: numeric score or labeled category.
///
/// Pre-labeled strings pass through unchanged; unrecognized labels fall back
/// to the lowest level rather than failing the decode (the backend defaults
/// missing confidences to 低 the same way).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfidenceValue {
    Score(f64),
    Label(String),
}

impl ConfidenceValue {
    pub fn level(&self) -> ConfidenceLevel {
        match self {
            ConfidenceValue::Score(score) => ConfidenceLevel::from_score(*score),
            ConfidenceValue::Label(label) => {
                ConfidenceLevel::from_label(label).unwrap_or(ConfidenceLevel::Low)
            }
        }
    }

    /// Display text: labels pass through verbatim, scores map to a label.
    pub fn display(&self) -> String {
        match self {
            ConfidenceValue::Score(_) => self.level().label().to_string(),
            ConfidenceValue::Label(label) => label.clone(),
        }
    }
}

impl Default for ConfidenceValue {
    fn default() -> Self {
        ConfidenceValue::Score(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.85, ConfidenceLevel::High)]
    #[case(0.7, ConfidenceLevel::MediumHigh)]
    #[case(0.5, ConfidenceLevel::Medium)]
    #[case(0.25, ConfidenceLevel::SlightlyLow)]
    #[case(0.1, ConfidenceLevel::Low)]
    fn test_score_mapping(#[case] score: f64, #[case] expected: ConfidenceLevel) {
        assert_eq!(ConfidenceLevel::from_score(score), expected);
    }

    #[rstest]
    #[case(0.8, ConfidenceLevel::High)]
    #[case(0.65, ConfidenceLevel::MediumHigh)]
    #[case(0.4, ConfidenceLevel::Medium)]
    #[case(0.2, ConfidenceLevel::SlightlyLow)]
    #[case(0.0, ConfidenceLevel::Low)]
    fn test_inclusive_lower_bounds(#[case] score: f64, #[case] expected: ConfidenceLevel) {
        assert_eq!(ConfidenceLevel::from_score(score), expected);
    }

    #[test]
    fn test_labels_pass_through() {
        for label in ["高", "中高", "中", "偏低", "低"] {
            let value = ConfidenceValue::Label(label.to_string());
            assert_eq!(value.display(), label);
            assert_eq!(value.level().label(), label);
        }
    }

    #[test]
    fn test_unknown_label_falls_back_to_low() {
        let value = ConfidenceValue::Label("unknown".to_string());
        assert_eq!(value.level(), ConfidenceLevel::Low);
    }

    #[test]
    fn test_untagged_decode() {
        let score: ConfidenceValue = serde_json::from_str("0.72").expect("number decodes");
        assert_eq!(score, ConfidenceValue::Score(0.72));
        assert_eq!(score.level(), ConfidenceLevel::MediumHigh);

        let label: ConfidenceValue = serde_json::from_str("\"中高\"").expect("string decodes");
        assert_eq!(label, ConfidenceValue::Label("中高".to_string()));
        assert_eq!(label.level(), ConfidenceLevel::MediumHigh);
    }

    #[test]
    fn test_levels_are_ordered() {
        assert!(ConfidenceLevel::High > ConfidenceLevel::MediumHigh);
        assert!(ConfidenceLevel::MediumHigh > ConfidenceLevel::Medium);
        assert!(ConfidenceLevel::Medium > ConfidenceLevel::SlightlyLow);
        assert!(ConfidenceLevel::SlightlyLow > ConfidenceLevel::Low);
    }
}
