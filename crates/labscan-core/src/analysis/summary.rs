//! Report summary.

use crate::models::{Alert, ClassifiedValues, OverallStatus, Summary};

/// Abnormal counts up to this value are "attention needed".
const ATTENTION_MAX_ABNORMAL: usize = 2;

/// Build the report-level verdict from classified values and alerts.
pub fn summarize(classified: &ClassifiedValues, alerts: &[Alert]) -> Summary {
    let total_tests = classified.len();
    let abnormal_tests = alerts.len();
    let normal_tests = total_tests.saturating_sub(abnormal_tests);

    let (overall_status, summary_text) = match abnormal_tests {
        0 => (
            OverallStatus::Good,
            "Your health report shows normal values across all tested parameters. \
             Keep maintaining your healthy lifestyle!"
                .to_string(),
        ),
        n if n <= ATTENTION_MAX_ABNORMAL => (
            OverallStatus::AttentionNeeded,
            format!(
                "Your report shows {} parameter(s) outside normal range. \
                 Some adjustments to your lifestyle may be beneficial.",
                n
            ),
        ),
        n => (
            OverallStatus::ConsultationRecommended,
            format!(
                "Your report shows {} parameters outside normal range. \
                 Please consult with your healthcare provider.",
                n
            ),
        ),
    };

    Summary {
        overall_status,
        total_tests,
        normal_tests,
        abnormal_tests,
        summary_text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::RangeClassifier;
    use crate::models::CanonicalTest;

    fn summarize_values(values: &[(CanonicalTest, f64)]) -> Summary {
        let classifier = RangeClassifier::default();
        let classified: ClassifiedValues = values
            .iter()
            .filter_map(|(test, value)| classifier.classify(*test, *value))
            .map(|c| (c.test(), c))
            .collect();
        let alerts = classifier.alerts(&classified);
        summarize(&classified, &alerts)
    }

    #[test]
    fn test_good_summary() {
        let summary = summarize_values(&[(CanonicalTest::GlucoseFasting, 85.0)]);
        assert_eq!(summary.overall_status, OverallStatus::Good);
        assert_eq!(summary.total_tests, 1);
        assert_eq!(summary.normal_tests, 1);
        assert!(summary.summary_text.starts_with("Your health report shows normal values"));
    }

    #[test]
    fn test_empty_report_is_good() {
        let summary = summarize(&ClassifiedValues::new(), &[]);
        assert_eq!(summary.overall_status, OverallStatus::Good);
        assert_eq!(summary.total_tests, 0);
    }

    #[test]
    fn test_attention_needed_embeds_count() {
        let summary = summarize_values(&[
            (CanonicalTest::GlucoseFasting, 130.0),
            (CanonicalTest::Bmi, 22.0),
        ]);
        assert_eq!(summary.overall_status, OverallStatus::AttentionNeeded);
        assert_eq!(summary.abnormal_tests, 1);
        assert_eq!(summary.normal_tests, 1);
        assert_eq!(
            summary.summary_text,
            "Your report shows 1 parameter(s) outside normal range. \
             Some adjustments to your lifestyle may be beneficial."
        );
    }

    #[test]
    fn test_consultation_recommended() {
        let summary = summarize_values(&[
            (CanonicalTest::CholesterolTotal, 250.0),
            (CanonicalTest::BloodPressureSystolic, 150.0),
            (CanonicalTest::BloodPressureDiastolic, 95.0),
        ]);
        assert_eq!(summary.overall_status, OverallStatus::ConsultationRecommended);
        assert_eq!(summary.abnormal_tests, 3);
        assert_eq!(summary.normal_tests, 0);
        assert!(summary.summary_text.contains("3 parameters outside normal range"));
    }
}
