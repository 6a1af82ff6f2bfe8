//! Risk scoring.
//!
//! Scoring weights (cardiovascular):
//! - Total cholesterol: 30%
//! - Systolic blood pressure: 25%
//! - Fasting glucose: 20%
//! - Diastolic blood pressure: 15%
//! - BMI: 10%
//!
//! Only values above their range contribute. Diabetes risk comes from
//! fasting glucose alone.

use crate::models::{CanonicalTest, ClassifiedValue, ClassifiedValues, Deviation, RiskScores, Severity};

const CARDIOVASCULAR_WEIGHTS: [(CanonicalTest, f64); 5] = [
    (CanonicalTest::CholesterolTotal, 0.30),
    (CanonicalTest::BloodPressureSystolic, 0.25),
    (CanonicalTest::BloodPressureDiastolic, 0.15),
    (CanonicalTest::GlucoseFasting, 0.20),
    (CanonicalTest::Bmi, 0.10),
];

const HIGH_MULTIPLIER: f64 = 3.0;
const BORDERLINE_MULTIPLIER: f64 = 1.5;

const HIGH_DIABETES_STEP: f64 = 0.5;
const BORDERLINE_DIABETES_STEP: f64 = 0.2;

const MAX_SCORE: f64 = 100.0;

/// Score classified values. Pure: equal input gives equal scores.
pub fn score(classified: &ClassifiedValues) -> RiskScores {
    let mut cv_acc = 0.0;
    let mut diabetes_acc = 0.0;

    for (test, weight) in CARDIOVASCULAR_WEIGHTS {
        let Some(value) = classified.get(&test) else {
            continue;
        };

        cv_acc += weight * severity_multiplier(value);
        if test == CanonicalTest::GlucoseFasting {
            diabetes_acc += diabetes_step(value);
        }
    }

    RiskScores {
        cardiovascular: (100.0 * cv_acc).min(MAX_SCORE),
        diabetes: (100.0 * diabetes_acc).min(MAX_SCORE),
        overall: (50.0 * (cv_acc + diabetes_acc)).min(MAX_SCORE),
    }
}

fn severity_multiplier(value: &ClassifiedValue) -> f64 {
    if value.deviation != Deviation::Above {
        return 0.0;
    }
    match value.status {
        Severity::Normal => 0.0,
        Severity::Borderline | Severity::Elevated => BORDERLINE_MULTIPLIER,
        Severity::High | Severity::Critical => HIGH_MULTIPLIER,
    }
}

fn diabetes_step(value: &ClassifiedValue) -> f64 {
    if value.deviation != Deviation::Above {
        return 0.0;
    }
    match value.status {
        Severity::Normal => 0.0,
        Severity::Borderline | Severity::Elevated => BORDERLINE_DIABETES_STEP,
        Severity::High | Severity::Critical => HIGH_DIABETES_STEP,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::RangeClassifier;
    use crate::config::{AnalysisTier, SeverityThresholds};
    use crate::models::ReferenceTable;

    fn classify(classifier: &RangeClassifier, values: &[(CanonicalTest, f64)]) -> ClassifiedValues {
        values
            .iter()
            .filter_map(|(test, value)| classifier.classify(*test, *value))
            .map(|c| (c.test(), c))
            .collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_all_normal_scores_zero() {
        let classifier = RangeClassifier::default();
        let classified = classify(
            &classifier,
            &[
                (CanonicalTest::CholesterolTotal, 180.0),
                (CanonicalTest::GlucoseFasting, 85.0),
            ],
        );

        assert_eq!(score(&classified), RiskScores::default());
    }

    #[test]
    fn test_high_glucose_only() {
        let classifier = RangeClassifier::default();
        let classified = classify(&classifier, &[(CanonicalTest::GlucoseFasting, 130.0)]);
        let scores = score(&classified);

        // cv_acc = 0.2 * 3 = 0.6, diabetes_acc = 0.5
        assert!(approx(scores.cardiovascular, 60.0));
        assert!(approx(scores.diabetes, 50.0));
        assert!(approx(scores.overall, 55.0));
    }

    #[test]
    fn test_scores_are_capped() {
        let classifier = RangeClassifier::default();
        let classified = classify(
            &classifier,
            &[
                (CanonicalTest::CholesterolTotal, 250.0),
                (CanonicalTest::BloodPressureSystolic, 150.0),
                (CanonicalTest::BloodPressureDiastolic, 95.0),
            ],
        );
        let scores = score(&classified);

        assert_eq!(scores.cardiovascular, 100.0);
        assert_eq!(scores.diabetes, 0.0);
        assert_eq!(scores.overall, 100.0);
    }

    #[test]
    fn test_low_values_do_not_add_risk() {
        let classifier = RangeClassifier::default();
        let classified = classify(
            &classifier,
            &[
                (CanonicalTest::GlucoseFasting, 50.0),
                (CanonicalTest::Bmi, 16.0),
            ],
        );

        assert_eq!(score(&classified), RiskScores::default());
    }

    #[test]
    fn test_intermediate_severities_use_borderline_weights() {
        let classifier = RangeClassifier::new(
            ReferenceTable::default(),
            AnalysisTier::Advanced,
            SeverityThresholds::default(),
            None,
        );
        // 110 is borderline, 26.0 BMI is borderline (4.4% over)
        let classified = classify(
            &classifier,
            &[
                (CanonicalTest::GlucoseFasting, 110.0),
                (CanonicalTest::Bmi, 26.0),
            ],
        );
        let scores = score(&classified);

        // cv_acc = 0.2 * 1.5 + 0.1 * 1.5 = 0.45, diabetes_acc = 0.2
        assert!(approx(scores.cardiovascular, 45.0));
        assert!(approx(scores.diabetes, 20.0));
        assert!(approx(scores.overall, 32.5));
    }

    #[test]
    fn test_unweighted_tests_are_ignored() {
        let classifier = RangeClassifier::default();
        let classified = classify(
            &classifier,
            &[
                (CanonicalTest::Triglycerides, 400.0),
                (CanonicalTest::GlucoseRandom, 250.0),
            ],
        );

        assert_eq!(score(&classified), RiskScores::default());
    }
}
