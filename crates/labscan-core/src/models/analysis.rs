//! Analysis models produced by each pipeline stage.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::catalog::CanonicalTest;
use super::range::ReferenceRange;

/// A value found in the report text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedValue {
    /// Test the value belongs to
    pub test: CanonicalTest,
    /// Numeric value as written
    pub value: f64,
    /// Unit as written, if any (e.g., "mg/dl")
    pub raw_unit: Option<String>,
    /// Text the value was matched from
    pub source_span: String,
}

/// Extraction output, keyed and ordered by test.
pub type ExtractedValues = BTreeMap<CanonicalTest, ExtractedValue>;

/// Severity of a value relative to its reference range.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Borderline,
    Elevated,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::Borderline => "borderline",
            Severity::Elevated => "elevated",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the reference range a value falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Deviation {
    Below,
    Within,
    Above,
}

/// An extracted value graded against its reference range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifiedValue {
    /// The value as extracted
    pub extracted: ExtractedValue,
    /// Value expressed in the range's unit
    pub value: f64,
    /// Unit of `value` (the range's unit)
    pub unit: String,
    /// Direction of deviation from the range
    pub deviation: Deviation,
    /// Graded severity
    pub status: Severity,
    /// Range the value was compared against
    pub range_used: ReferenceRange,
}

impl ClassifiedValue {
    pub fn test(&self) -> CanonicalTest {
        self.extracted.test
    }

    pub fn is_normal(&self) -> bool {
        self.status == Severity::Normal
    }

    /// Short status word: "normal", "low", "high", or a graded severity.
    pub fn status_label(&self) -> &'static str {
        match (self.deviation, self.status) {
            (Deviation::Within, _) | (_, Severity::Normal) => "normal",
            (Deviation::Below, Severity::Critical) => "critically low",
            (Deviation::Below, Severity::Borderline) => "borderline low",
            (Deviation::Below, _) => "low",
            (Deviation::Above, severity) => severity.as_str(),
        }
    }
}

/// Classification output, keyed and ordered by test.
pub type ClassifiedValues = BTreeMap<CanonicalTest, ClassifiedValue>;

/// A non-normal value surfaced to the reader.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub test: CanonicalTest,
    pub value: f64,
    pub unit: String,
    pub status: Severity,
    pub deviation: Deviation,
    pub message: String,
}

/// Aggregate risk scores, each in 0..=100.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct RiskScores {
    pub cardiovascular: f64,
    pub diabetes: f64,
    pub overall: f64,
}

/// Advice category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationCategory {
    Immediate,
    Dietary,
    Exercise,
    Lifestyle,
    Medical,
    General,
}

impl RecommendationCategory {
    pub const ALL: [RecommendationCategory; 6] = [
        RecommendationCategory::Immediate,
        RecommendationCategory::Dietary,
        RecommendationCategory::Exercise,
        RecommendationCategory::Lifestyle,
        RecommendationCategory::Medical,
        RecommendationCategory::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationCategory::Immediate => "immediate",
            RecommendationCategory::Dietary => "dietary",
            RecommendationCategory::Exercise => "exercise",
            RecommendationCategory::Lifestyle => "lifestyle",
            RecommendationCategory::Medical => "medical",
            RecommendationCategory::General => "general",
        }
    }
}

impl fmt::Display for RecommendationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categorized advice for a report. No string appears twice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct Recommendations {
    categories: BTreeMap<RecommendationCategory, Vec<String>>,
}

impl Recommendations {
    pub(crate) fn from_categories(
        categories: BTreeMap<RecommendationCategory, Vec<String>>,
    ) -> Self {
        Self { categories }
    }

    /// Advice in one category, in the order it was produced.
    pub fn get(&self, category: RecommendationCategory) -> &[String] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterate non-empty categories in category order.
    pub fn iter(&self) -> impl Iterator<Item = (RecommendationCategory, &[String])> {
        self.categories
            .iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(category, items)| (*category, items.as_slice()))
    }

    /// All advice as one flat list, category order first.
    pub fn flatten(&self) -> Vec<String> {
        self.iter()
            .flat_map(|(_, items)| items.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Overall verdict for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallStatus {
    Good,
    AttentionNeeded,
    ConsultationRecommended,
}

impl OverallStatus {
    pub fn label(&self) -> &'static str {
        match self {
            OverallStatus::Good => "Good",
            OverallStatus::AttentionNeeded => "Attention Needed",
            OverallStatus::ConsultationRecommended => "Medical Consultation Recommended",
        }
    }
}

/// Report-level counts and verdict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub overall_status: OverallStatus,
    pub total_tests: usize,
    pub normal_tests: usize,
    pub abnormal_tests: usize,
    pub summary_text: String,
}

/// Everything one analysis run produces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub extracted_values: ExtractedValues,
    pub classified_values: ClassifiedValues,
    pub alerts: Vec<Alert>,
    pub risk_scores: RiskScores,
    pub recommendations: Recommendations,
    pub summary: Summary,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classified(deviation: Deviation, status: Severity) -> ClassifiedValue {
        ClassifiedValue {
            extracted: ExtractedValue {
                test: CanonicalTest::GlucoseFasting,
                value: 50.0,
                raw_unit: None,
                source_span: "glucose: 50".into(),
            },
            value: 50.0,
            unit: "mg/dL".into(),
            deviation,
            status,
            range_used: ReferenceRange::new(70.0, 100.0, "mg/dL"),
        }
    }

    #[test]
    fn test_severity_total_order() {
        assert!(Severity::Normal < Severity::Borderline);
        assert!(Severity::Borderline < Severity::Elevated);
        assert!(Severity::Elevated < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_status_label() {
        assert_eq!(classified(Deviation::Within, Severity::Normal).status_label(), "normal");
        assert_eq!(classified(Deviation::Below, Severity::High).status_label(), "low");
        assert_eq!(
            classified(Deviation::Below, Severity::Critical).status_label(),
            "critically low"
        );
        assert_eq!(classified(Deviation::Above, Severity::Elevated).status_label(), "elevated");
        assert_eq!(classified(Deviation::Above, Severity::High).status_label(), "high");
    }

    #[test]
    fn test_recommendations_flatten_follows_category_order() {
        let mut categories = BTreeMap::new();
        categories.insert(RecommendationCategory::Medical, vec!["see a doctor".to_string()]);
        categories.insert(RecommendationCategory::Dietary, vec!["eat oats".to_string()]);
        categories.insert(RecommendationCategory::Exercise, Vec::new());
        let recs = Recommendations::from_categories(categories);

        assert_eq!(recs.flatten(), vec!["eat oats", "see a doctor"]);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs.iter().count(), 2);
        assert!(recs.get(RecommendationCategory::Immediate).is_empty());
    }

    #[test]
    fn test_overall_status_labels() {
        assert_eq!(OverallStatus::Good.label(), "Good");
        assert_eq!(OverallStatus::AttentionNeeded.label(), "Attention Needed");
        assert_eq!(
            OverallStatus::ConsultationRecommended.label(),
            "Medical Consultation Recommended"
        );
    }
}
