//! Golden tests for the analysis pipeline.
//!
//! These tests run full reports through the analyzer and check extraction,
//! classification and the summary verdict against known cases.

use labscan_core::models::{CanonicalTest, OverallStatus, RecommendationCategory};
use labscan_core::{AnalysisTier, Analyzer, AnalyzerConfig};

/// Test case from golden file.
struct GoldenCase {
    id: &'static str,
    text: &'static str,
    tier: AnalysisTier,
    expected_values: &'static [(CanonicalTest, f64)],
    expected_labels: &'static [(CanonicalTest, &'static str)],
    expected_alerts: usize,
    expected_status: OverallStatus,
}

fn get_golden_cases() -> Vec<GoldenCase> {
    use CanonicalTest::*;

    vec![
        GoldenCase {
            id: "cholesterol-and-blood-pressure",
            text: "Cholesterol: 250 mg/dL, Blood Pressure: 150/95",
            tier: AnalysisTier::Basic,
            expected_values: &[
                (CholesterolTotal, 250.0),
                (BloodPressureSystolic, 150.0),
                (BloodPressureDiastolic, 95.0),
            ],
            expected_labels: &[
                (CholesterolTotal, "high"),
                (BloodPressureSystolic, "high"),
                (BloodPressureDiastolic, "high"),
            ],
            expected_alerts: 3,
            expected_status: OverallStatus::ConsultationRecommended,
        },
        GoldenCase {
            id: "normal-glucose",
            text: "Glucose: 85 mg/dL",
            tier: AnalysisTier::Basic,
            expected_values: &[(GlucoseFasting, 85.0)],
            expected_labels: &[(GlucoseFasting, "normal")],
            expected_alerts: 0,
            expected_status: OverallStatus::Good,
        },
        GoldenCase {
            id: "first-match-wins",
            text: "Glucose: 90 mg/dL on admission. Repeat glucose: 200 mg/dL",
            tier: AnalysisTier::Basic,
            expected_values: &[(GlucoseFasting, 90.0)],
            expected_labels: &[(GlucoseFasting, "normal")],
            expected_alerts: 0,
            expected_status: OverallStatus::Good,
        },
        GoldenCase {
            id: "no-numbers",
            text: "Patient reports feeling well. Follow up in spring.",
            tier: AnalysisTier::Basic,
            expected_values: &[],
            expected_labels: &[],
            expected_alerts: 0,
            expected_status: OverallStatus::Good,
        },
        GoldenCase {
            id: "si-glucose",
            text: "Fasting glucose: 7.0 mmol/L",
            tier: AnalysisTier::Basic,
            expected_values: &[(GlucoseFasting, 7.0)],
            expected_labels: &[(GlucoseFasting, "high")],
            expected_alerts: 1,
            expected_status: OverallStatus::AttentionNeeded,
        },
        GoldenCase {
            id: "advanced-grades",
            text: "Total Cholesterol: 210 mg/dL\nLDL: 160 mg/dL\nHbA1c: 6.0 %\nBP: 118/76 mmHg",
            tier: AnalysisTier::Advanced,
            expected_values: &[
                (CholesterolLdl, 160.0),
                (CholesterolTotal, 210.0),
                (Hba1c, 6.0),
                (BloodPressureSystolic, 118.0),
                (BloodPressureDiastolic, 76.0),
            ],
            expected_labels: &[
                (CholesterolTotal, "borderline"),
                (CholesterolLdl, "critical"),
                (Hba1c, "borderline"),
                (BloodPressureSystolic, "normal"),
                (BloodPressureDiastolic, "normal"),
            ],
            expected_alerts: 3,
            expected_status: OverallStatus::ConsultationRecommended,
        },
        GoldenCase {
            id: "low-hdl",
            text: "HDL Cholesterol: 35 mg/dL\nTriglycerides: 120 mg/dL",
            tier: AnalysisTier::Basic,
            expected_values: &[(CholesterolHdl, 35.0), (Triglycerides, 120.0)],
            expected_labels: &[(CholesterolHdl, "low"), (Triglycerides, "normal")],
            expected_alerts: 1,
            expected_status: OverallStatus::AttentionNeeded,
        },
        GoldenCase {
            id: "hemoglobin-no-sex",
            text: "Hemoglobin: 13.0 g/dL",
            tier: AnalysisTier::Basic,
            expected_values: &[(Hemoglobin, 13.0)],
            expected_labels: &[(Hemoglobin, "normal")],
            expected_alerts: 0,
            expected_status: OverallStatus::Good,
        },
        GoldenCase {
            id: "vitals-with-body-measures",
            text: "Heart Rate: 110 bpm\nBMI: 31.2 kg/m2\nWeight: 95 kg\nHeight: 175 cm",
            tier: AnalysisTier::Basic,
            expected_values: &[
                (HeartRate, 110.0),
                (Bmi, 31.2),
                (Weight, 95.0),
                (Height, 175.0),
            ],
            expected_labels: &[(HeartRate, "high"), (Bmi, "high")],
            expected_alerts: 2,
            expected_status: OverallStatus::AttentionNeeded,
        },
        GoldenCase {
            id: "lab-table",
            text: "LAB RESULTS\n\
                   Test Result Unit Range\n\
                   Hemoglobin 11.2 g/dL 12.0-17.5 Low\n\
                   WBC 12,500 /uL 4000-11000 High\n\
                   Creatinine 1.0 mg/dL 0.6-1.3 Normal",
            tier: AnalysisTier::Basic,
            expected_values: &[
                (Hemoglobin, 11.2),
                (WhiteBloodCells, 12500.0),
                (Creatinine, 1.0),
            ],
            expected_labels: &[
                (Hemoglobin, "low"),
                (WhiteBloodCells, "high"),
                (Creatinine, "normal"),
            ],
            expected_alerts: 2,
            expected_status: OverallStatus::AttentionNeeded,
        },
        GoldenCase {
            id: "ocr-table-typos",
            text: "Parameter Value Unit\nHemoglobln 14.1 g/dL\nGlucoes 132 mg/dL",
            tier: AnalysisTier::Basic,
            expected_values: &[(GlucoseFasting, 132.0), (Hemoglobin, 14.1)],
            expected_labels: &[(GlucoseFasting, "high"), (Hemoglobin, "normal")],
            expected_alerts: 1,
            expected_status: OverallStatus::AttentionNeeded,
        },
        GoldenCase {
            id: "random-blood-sugar",
            text: "Random Blood Sugar: 180 mg/dL",
            tier: AnalysisTier::Basic,
            expected_values: &[(GlucoseRandom, 180.0)],
            expected_labels: &[(GlucoseRandom, "high")],
            expected_alerts: 1,
            expected_status: OverallStatus::AttentionNeeded,
        },
        GoldenCase {
            id: "abbreviation-in-parentheses",
            text: "Fasting Blood Sugar (FBS): 110 mg/dL\nBlood Pressure - 150/95 mmHg",
            tier: AnalysisTier::Basic,
            expected_values: &[
                (GlucoseFasting, 110.0),
                (BloodPressureSystolic, 150.0),
                (BloodPressureDiastolic, 95.0),
            ],
            expected_labels: &[
                (GlucoseFasting, "high"),
                (BloodPressureSystolic, "high"),
                (BloodPressureDiastolic, "high"),
            ],
            expected_alerts: 3,
            expected_status: OverallStatus::ConsultationRecommended,
        },
        GoldenCase {
            id: "hours-are-not-heart-rate",
            text: "Glucose tolerance 2 hr: 165 mg/dL",
            tier: AnalysisTier::Basic,
            expected_values: &[],
            expected_labels: &[],
            expected_alerts: 0,
            expected_status: OverallStatus::Good,
        },
    ]
}

fn analyzer_for(tier: AnalysisTier) -> Analyzer {
    Analyzer::new(AnalyzerConfig {
        tier,
        ..AnalyzerConfig::default()
    })
    .unwrap()
}

#[test]
fn test_golden_cases() {
    for case in get_golden_cases() {
        let result = analyzer_for(case.tier).analyze(case.text);

        assert_eq!(
            result.extracted_values.len(),
            case.expected_values.len(),
            "Case {}: extracted {:?}",
            case.id,
            result.extracted_values.keys().collect::<Vec<_>>()
        );

        for (test, expected) in case.expected_values {
            let actual = result
                .extracted_values
                .get(test)
                .map(|v| v.value)
                .unwrap_or(f64::NAN);
            assert!(
                (actual - expected).abs() < 0.001,
                "Case {}: {} value mismatch - expected {}, got {}",
                case.id, test, expected, actual
            );
        }

        for (test, expected) in case.expected_labels {
            let actual = result
                .classified_values
                .get(test)
                .map(|c| c.status_label())
                .unwrap_or("missing");
            assert_eq!(
                actual, *expected,
                "Case {}: {} status mismatch", case.id, test
            );
        }

        assert_eq!(
            result.alerts.len(),
            case.expected_alerts,
            "Case {}: alert count mismatch", case.id
        );

        assert_eq!(
            result.summary.overall_status, case.expected_status,
            "Case {}: overall status mismatch", case.id
        );
    }
}

#[test]
fn test_counts_are_consistent() {
    for case in get_golden_cases() {
        let result = analyzer_for(case.tier).analyze(case.text);
        let summary = &result.summary;

        assert_eq!(
            summary.total_tests,
            result.classified_values.len(),
            "Case {}: total mismatch", case.id
        );
        assert_eq!(
            summary.normal_tests + summary.abnormal_tests,
            summary.total_tests,
            "Case {}: counts do not add up", case.id
        );
    }
}

#[test]
fn test_high_cholesterol_recommendations() {
    let result = analyzer_for(AnalysisTier::Basic)
        .analyze("Cholesterol: 250 mg/dL, Blood Pressure: 150/95");
    let recs = &result.recommendations;

    assert!(recs
        .get(RecommendationCategory::Dietary)
        .contains(&"Reduce intake of saturated fats and trans fats".to_string()));
    assert!(recs
        .get(RecommendationCategory::Medical)
        .contains(&"Consult with your doctor about blood pressure medication".to_string()));
    assert!(recs.get(RecommendationCategory::General).is_empty());
}

#[test]
fn test_normal_report_gets_fallback_block() {
    let result = analyzer_for(AnalysisTier::Basic).analyze("Glucose: 85 mg/dL");

    assert_eq!(
        result.recommendations.get(RecommendationCategory::General),
        [
            "Maintain current healthy lifestyle",
            "Continue regular check-ups",
            "Stay hydrated and eat balanced meals",
            "Keep up with regular physical activity",
        ]
    );
    assert_eq!(
        result.summary.summary_text,
        "Your health report shows normal values across all tested parameters. \
         Keep maintaining your healthy lifestyle!"
    );
}

#[test]
fn test_advanced_critical_is_urgent() {
    let result = analyzer_for(AnalysisTier::Advanced).analyze("LDL: 160 mg/dL");

    assert_eq!(
        result.recommendations.get(RecommendationCategory::Immediate),
        ["URGENT: LDL Cholesterol level (160) requires immediate medical attention"]
    );
    assert_eq!(
        result.alerts[0].message,
        "LDL Cholesterol is above normal range (critical)"
    );
}

#[test]
fn test_blood_pressure_pair_shares_source() {
    let result = analyzer_for(AnalysisTier::Basic).analyze("BP: 128/84 mmHg");
    let values = &result.extracted_values;

    assert_eq!(
        values[&CanonicalTest::BloodPressureSystolic].source_span,
        values[&CanonicalTest::BloodPressureDiastolic].source_span
    );
}

#[test]
fn test_sex_specific_ranges() {
    let text = "Hemoglobin: 13.0 g/dL";

    let male = Analyzer::new(AnalyzerConfig::from_toml_str("sex = \"male\"").unwrap()).unwrap();
    let female =
        Analyzer::new(AnalyzerConfig::from_toml_str("sex = \"female\"").unwrap()).unwrap();

    let male_result = male.analyze(text);
    let female_result = female.analyze(text);

    assert_eq!(
        male_result.classified_values[&CanonicalTest::Hemoglobin].status_label(),
        "low"
    );
    assert_eq!(
        female_result.classified_values[&CanonicalTest::Hemoglobin].status_label(),
        "normal"
    );
}

#[test]
fn test_incompatible_unit_is_not_graded() {
    let result = analyzer_for(AnalysisTier::Basic).analyze("Hemoglobin: 8.5 mmol/L\nGlucose: 90 mg/dL");

    assert_eq!(result.extracted_values[&CanonicalTest::Hemoglobin].value, 8.5);
    assert!(!result.classified_values.contains_key(&CanonicalTest::Hemoglobin));
    assert!(result.alerts.is_empty());
    assert_eq!(result.summary.total_tests, 1);
    assert_eq!(result.summary.overall_status, OverallStatus::Good);
}
