//! Range classification.
//!
//! Grading:
//! - Basic tier: inside the range is normal, outside is high severity
//!   (reported as "low" or "high" by direction)
//! - Advanced tier: graded by percent distance beyond the violated bound
//!   using [`SeverityThresholds`]

use tracing::{debug, warn};

use crate::config::{AnalysisTier, AnalyzerConfig, SeverityThresholds};
use crate::extract::Normalizer;
use crate::models::{
    Alert, CanonicalTest, ClassifiedValue, ClassifiedValues, Deviation, ExtractedValue,
    ExtractedValues, ReferenceRange, ReferenceTable, Severity, Sex,
};

/// Classifies values against a reference table.
pub struct RangeClassifier {
    table: ReferenceTable,
    tier: AnalysisTier,
    thresholds: SeverityThresholds,
    sex: Option<Sex>,
    normalizer: Normalizer,
}

impl Default for RangeClassifier {
    fn default() -> Self {
        Self::from_config(&AnalyzerConfig::default())
    }
}

impl RangeClassifier {
    /// Create a classifier over an explicit table.
    pub fn new(
        table: ReferenceTable,
        tier: AnalysisTier,
        thresholds: SeverityThresholds,
        sex: Option<Sex>,
    ) -> Self {
        Self {
            table,
            tier,
            thresholds,
            sex,
            normalizer: Normalizer::new(),
        }
    }

    /// Create a classifier from an analyzer config.
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(
            config.reference_table(),
            config.tier,
            config.thresholds,
            config.sex,
        )
    }

    pub fn tier(&self) -> AnalysisTier {
        self.tier
    }

    /// Classify a bare value, assumed to be in the range's unit.
    ///
    /// Returns `None` when the table has no range for the test.
    pub fn classify(&self, test: CanonicalTest, value: f64) -> Option<ClassifiedValue> {
        self.classify_extracted(&ExtractedValue {
            test,
            value,
            raw_unit: None,
            source_span: String::new(),
        })
    }

    /// Classify an extracted value, converting its unit first.
    ///
    /// Returns `None` when the table has no range for the test, or when the
    /// value's unit cannot be expressed in the range's unit.
    pub fn classify_extracted(&self, extracted: &ExtractedValue) -> Option<ClassifiedValue> {
        let Some(range) = self.table.lookup(extracted.test, self.sex) else {
            debug!(test = %extracted.test, "no reference range, skipping");
            return None;
        };

        let Some((value, unit)) = self.normalizer.convert_to_range_unit(
            extracted.test,
            extracted.value,
            extracted.raw_unit.as_deref(),
            &range.unit,
        ) else {
            warn!(
                test = %extracted.test,
                value = extracted.value,
                unit = extracted.raw_unit.as_deref().unwrap_or(""),
                expected = %range.unit,
                "incompatible unit, value not classified"
            );
            return None;
        };
        let (deviation, status) = self.grade(range, value);

        debug!(
            test = %extracted.test,
            value,
            range = %range.label(),
            status = %status,
            "classified value"
        );

        Some(ClassifiedValue {
            extracted: extracted.clone(),
            value,
            unit,
            deviation,
            status,
            range_used: range.clone(),
        })
    }

    /// Classify every extracted value that has a range.
    pub fn classify_all(&self, extracted: &ExtractedValues) -> ClassifiedValues {
        extracted
            .values()
            .filter_map(|value| self.classify_extracted(value))
            .map(|classified| (classified.test(), classified))
            .collect()
    }

    /// Grade a value against a range.
    pub fn grade(&self, range: &ReferenceRange, value: f64) -> (Deviation, Severity) {
        if range.contains(value) {
            return (Deviation::Within, Severity::Normal);
        }

        let (deviation, bound) = if value < range.min {
            (Deviation::Below, range.min)
        } else {
            (Deviation::Above, range.max)
        };

        let severity = match self.tier {
            AnalysisTier::Basic => Severity::High,
            AnalysisTier::Advanced => self.graduated(distance_pct(value, bound)),
        };

        (deviation, severity)
    }

    fn graduated(&self, distance_pct: f64) -> Severity {
        let t = &self.thresholds;
        if distance_pct <= t.borderline_pct {
            Severity::Borderline
        } else if distance_pct <= t.elevated_pct {
            Severity::Elevated
        } else if distance_pct <= t.critical_pct {
            Severity::High
        } else {
            Severity::Critical
        }
    }

    /// One alert per non-normal value, in test order.
    pub fn alerts(&self, classified: &ClassifiedValues) -> Vec<Alert> {
        classified
            .values()
            .filter(|c| !c.is_normal())
            .map(|c| Alert {
                test: c.test(),
                value: c.value,
                unit: c.unit.clone(),
                status: c.status,
                deviation: c.deviation,
                message: self.alert_message(c),
            })
            .collect()
    }

    fn alert_message(&self, classified: &ClassifiedValue) -> String {
        let direction = match classified.deviation {
            Deviation::Below => "below",
            _ => "above",
        };
        let name = classified.test().display_name();

        match self.tier {
            AnalysisTier::Basic => format!("{} is {} normal range", name, direction),
            AnalysisTier::Advanced => format!(
                "{} is {} normal range ({})",
                name,
                direction,
                classified.status_label()
            ),
        }
    }
}

/// Percent distance of `value` beyond `bound`. A zero bound has no
/// relative scale, so the absolute gap is used.
fn distance_pct(value: f64, bound: f64) -> f64 {
    let gap = (value - bound).abs();
    if bound == 0.0 {
        gap
    } else {
        gap * 100.0 / bound.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advanced() -> RangeClassifier {
        RangeClassifier::new(
            ReferenceTable::default(),
            AnalysisTier::Advanced,
            SeverityThresholds::default(),
            None,
        )
    }

    #[test]
    fn test_basic_tier_normal_low_high() {
        let classifier = RangeClassifier::default();

        let normal = classifier.classify(CanonicalTest::GlucoseFasting, 85.0).unwrap();
        assert_eq!(normal.status, Severity::Normal);
        assert_eq!(normal.deviation, Deviation::Within);

        let high = classifier.classify(CanonicalTest::CholesterolTotal, 250.0).unwrap();
        assert_eq!(high.status, Severity::High);
        assert_eq!(high.status_label(), "high");

        let low = classifier.classify(CanonicalTest::CholesterolHdl, 30.0).unwrap();
        assert_eq!(low.status, Severity::High);
        assert_eq!(low.deviation, Deviation::Below);
        assert_eq!(low.status_label(), "low");
    }

    #[test]
    fn test_bounds_are_normal() {
        let classifier = RangeClassifier::default();
        assert!(classifier.classify(CanonicalTest::GlucoseFasting, 70.0).unwrap().is_normal());
        assert!(classifier.classify(CanonicalTest::GlucoseFasting, 100.0).unwrap().is_normal());
    }

    #[test]
    fn test_unknown_range_is_excluded() {
        let classifier = RangeClassifier::default();
        assert!(classifier.classify(CanonicalTest::Weight, 82.0).is_none());
    }

    #[test]
    fn test_advanced_tier_grades() {
        let classifier = advanced();
        let grade = |value| {
            classifier
                .classify(CanonicalTest::GlucoseFasting, value)
                .unwrap()
                .status
        };

        // max = 100
        assert_eq!(grade(95.0), Severity::Normal);
        assert_eq!(grade(110.0), Severity::Borderline);
        assert_eq!(grade(120.0), Severity::Elevated);
        assert_eq!(grade(125.0), Severity::Elevated);
        assert_eq!(grade(140.0), Severity::High);
        assert_eq!(grade(150.0), Severity::High);
        assert_eq!(grade(151.0), Severity::Critical);

        // min = 70: 52.5 is 25% below
        assert_eq!(grade(52.5), Severity::Elevated);
        assert_eq!(grade(30.0), Severity::Critical);
    }

    #[test]
    fn test_zero_bound_uses_absolute_distance() {
        let table = ReferenceTable::from_entries(vec![crate::models::RangeEntry {
            test: CanonicalTest::Creatinine,
            sex: None,
            range: ReferenceRange::new(0.0, 1.0, "mg/dL"),
        }]);
        let classifier = RangeClassifier::new(
            table,
            AnalysisTier::Advanced,
            SeverityThresholds::default(),
            None,
        );

        assert_eq!(distance_pct(-5.0, 0.0), 5.0);
        let below = classifier.classify(CanonicalTest::Creatinine, -5.0).unwrap();
        assert_eq!(below.deviation, Deviation::Below);
        assert_eq!(below.status, Severity::Borderline);
    }

    #[test]
    fn test_sex_specific_classification() {
        let config = AnalyzerConfig {
            sex: Some(Sex::Male),
            ..AnalyzerConfig::default()
        };
        let male = RangeClassifier::from_config(&config);
        let neutral = RangeClassifier::default();

        // 13.0 g/dL is low for men but inside the neutral band
        assert!(!male.classify(CanonicalTest::Hemoglobin, 13.0).unwrap().is_normal());
        assert!(neutral.classify(CanonicalTest::Hemoglobin, 13.0).unwrap().is_normal());
    }

    #[test]
    fn test_unit_conversion_before_grading() {
        let classifier = RangeClassifier::default();
        let extracted = ExtractedValue {
            test: CanonicalTest::GlucoseFasting,
            value: 7.0,
            raw_unit: Some("mmol/l".to_string()),
            source_span: "glucose: 7.0 mmol/l".to_string(),
        };

        let classified = classifier.classify_extracted(&extracted).unwrap();
        assert!((classified.value - 126.0).abs() < 0.001);
        assert_eq!(classified.unit, "mg/dL");
        assert_eq!(classified.status, Severity::High);
        assert_eq!(classified.extracted.value, 7.0);
    }

    #[test]
    fn test_incompatible_unit_is_excluded() {
        let classifier = RangeClassifier::default();
        let extracted = ExtractedValue {
            test: CanonicalTest::HeartRate,
            value: 165.0,
            raw_unit: Some("mg/dl".to_string()),
            source_span: "hr: 165 mg/dl".to_string(),
        };

        assert!(classifier.classify_extracted(&extracted).is_none());

        let mut values = ExtractedValues::new();
        values.insert(CanonicalTest::HeartRate, extracted);
        assert!(classifier.classify_all(&values).is_empty());
    }

    #[test]
    fn test_alert_messages() {
        let mut extracted = ExtractedValues::new();
        for (test, value) in [
            (CanonicalTest::CholesterolTotal, 250.0),
            (CanonicalTest::CholesterolHdl, 30.0),
            (CanonicalTest::GlucoseFasting, 85.0),
        ] {
            extracted.insert(
                test,
                ExtractedValue {
                    test,
                    value,
                    raw_unit: None,
                    source_span: String::new(),
                },
            );
        }

        let basic = RangeClassifier::default();
        let alerts = basic.alerts(&basic.classify_all(&extracted));
        assert_eq!(alerts.len(), 2);
        let messages: Vec<&str> = alerts.iter().map(|a| a.message.as_str()).collect();
        assert!(messages.contains(&"Total Cholesterol is above normal range"));
        assert!(messages.contains(&"HDL Cholesterol is below normal range"));

        let advanced = advanced();
        let alerts = advanced.alerts(&advanced.classify_all(&extracted));
        let chol = alerts
            .iter()
            .find(|a| a.test == CanonicalTest::CholesterolTotal)
            .unwrap();
        assert_eq!(chol.status, Severity::Elevated);
        assert_eq!(chol.message, "Total Cholesterol is above normal range (elevated)");
    }
}
