//! LabScan Core Library
//!
//! Extracts lab values from free-form medical report text and grades them
//! against reference ranges.
//!
//! # Architecture
//!
//! ```text
//! Report text (PDF / OCR / plain file, extracted upstream)
//!        │
//!   clean_text
//!        │
//!        ├──────────────► Pattern rules ──┐
//!        │                                ├──► ExtractedValues
//!        └──► Table rows → Normalizer ────┘          │
//!                                                    ▼
//!                                          RangeClassifier (+ unit conversion)
//!                                                    │
//!                          ┌────────────┬────────────┼──────────────┐
//!                          ▼            ▼            ▼              ▼
//!                       Alerts     RiskScores  Recommendations   Summary
//! ```
//!
//! # Core Principle
//!
//! **Outputs are heuristics, not diagnoses.** Unrecognized text yields empty
//! results, never an error. Only configuration can fail.
//!
//! # Modules
//!
//! - [`models`]: Domain types (CanonicalTest, ReferenceRange, AnalysisResult, etc.)
//! - [`extract`]: Text cleanup, pattern and table extraction, label normalization
//! - [`analysis`]: Classification, risk scoring, recommendations, summary
//! - [`config`]: TOML analyzer configuration
//! - [`export`]: JSON and CSV report export

pub mod analysis;
pub mod config;
pub mod export;
pub mod extract;
pub mod models;

// Re-export commonly used types
pub use analysis::{Analyzer, RangeClassifier, RecommendationEngine, TextSource};
pub use config::{AnalysisTier, AnalyzerConfig, ConfigError, SeverityThresholds};
pub use export::{ExportError, ReportExport};
pub use extract::{LabValueExtractor, Normalizer};
pub use models::{
    AnalysisResult, CanonicalTest, ClassifiedValue, ExtractedValue, OverallStatus,
    RecommendationCategory, ReferenceRange, RiskScores, Severity, Sex,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum LabScanError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<ConfigError> for LabScanError {
    fn from(e: ConfigError) -> Self {
        LabScanError::InvalidConfig(e.to_string())
    }
}

impl From<ExportError> for LabScanError {
    fn from(e: ExportError) -> Self {
        LabScanError::SerializationError(e.to_string())
    }
}

// =========================================================================
// Functions (exported to FFI)
// =========================================================================

/// Analyze report text with the default configuration.
#[uniffi::export]
pub fn analyze_report(text: String) -> FfiAnalysisReport {
    let result = Analyzer::default().analyze(&text);
    FfiAnalysisReport::new(&text, result)
}

/// Analyze report text with a TOML configuration.
#[uniffi::export]
pub fn analyze_report_with_config(
    text: String,
    config_toml: String,
) -> Result<FfiAnalysisReport, LabScanError> {
    let analyzer = analyzer_from_toml(&config_toml)?;
    let result = analyzer.analyze(&text);
    Ok(FfiAnalysisReport::new(&text, result))
}

/// Analyze report text and export the full result as JSON.
///
/// An empty `config_toml` uses the default configuration.
#[uniffi::export]
pub fn export_report_json(text: String, config_toml: String) -> Result<String, LabScanError> {
    let analyzer = analyzer_from_toml(&config_toml)?;
    let result = analyzer.analyze(&text);
    let export = ReportExport::from_analysis(&text, analyzer.config().tier, result);
    Ok(export.to_json()?)
}

/// Analyze report text and export extracted values as CSV.
///
/// An empty `config_toml` uses the default configuration.
#[uniffi::export]
pub fn export_report_csv(text: String, config_toml: String) -> Result<String, LabScanError> {
    let analyzer = analyzer_from_toml(&config_toml)?;
    let result = analyzer.analyze(&text);
    let export = ReportExport::from_analysis(&text, analyzer.config().tier, result);
    Ok(export.to_csv())
}

/// Resolve a raw label to its canonical test id (e.g., "hgb" → "hemoglobin").
///
/// Exact alias containment is tried first, then fuzzy matching.
#[uniffi::export]
pub fn normalize_label(label: String) -> Option<String> {
    Normalizer::new()
        .normalize_fuzzy(&label)
        .map(|test| test.as_str().to_string())
}

fn analyzer_from_toml(config_toml: &str) -> Result<Analyzer, LabScanError> {
    let config = AnalyzerConfig::from_toml_str(config_toml)?;
    Ok(Analyzer::new(config)?)
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe extracted value.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiExtractedValue {
    pub test: String,
    pub value: f64,
    pub raw_unit: Option<String>,
    pub source_span: String,
}

impl From<ExtractedValue> for FfiExtractedValue {
    fn from(value: ExtractedValue) -> Self {
        Self {
            test: value.test.as_str().to_string(),
            value: value.value,
            raw_unit: value.raw_unit,
            source_span: value.source_span,
        }
    }
}

/// FFI-safe classified value.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiClassifiedValue {
    pub test: String,
    pub name: String,
    pub value: f64,
    pub unit: String,
    /// "normal", "low", "high", or a graded severity
    pub status: String,
    pub normal_range: String,
}

impl From<ClassifiedValue> for FfiClassifiedValue {
    fn from(value: ClassifiedValue) -> Self {
        let test = value.test();
        Self {
            test: test.as_str().to_string(),
            name: test.display_name().to_string(),
            value: value.value,
            status: value.status_label().to_string(),
            normal_range: value.range_used.label(),
            unit: value.unit,
        }
    }
}

/// FFI-safe alert.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAlert {
    pub test: String,
    pub value: f64,
    pub unit: String,
    pub severity: String,
    pub message: String,
}

impl From<models::Alert> for FfiAlert {
    fn from(alert: models::Alert) -> Self {
        Self {
            test: alert.test.as_str().to_string(),
            value: alert.value,
            unit: alert.unit,
            severity: alert.status.as_str().to_string(),
            message: alert.message,
        }
    }
}

/// FFI-safe recommendation.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRecommendation {
    pub category: String,
    pub advice: String,
}

/// FFI-safe analysis report.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAnalysisReport {
    pub extracted: Vec<FfiExtractedValue>,
    pub classified: Vec<FfiClassifiedValue>,
    pub alerts: Vec<FfiAlert>,
    pub cardiovascular_risk: f64,
    pub diabetes_risk: f64,
    pub overall_risk: f64,
    pub recommendations: Vec<FfiRecommendation>,
    pub overall_status: String,
    pub summary_text: String,
    pub total_tests: u32,
    pub normal_tests: u32,
    pub abnormal_tests: u32,
    pub text_digest: String,
    pub analyzed_at: String,
}

impl FfiAnalysisReport {
    fn new(text: &str, result: AnalysisResult) -> Self {
        let recommendations = result
            .recommendations
            .iter()
            .flat_map(|(category, items)| {
                items.iter().map(move |advice| FfiRecommendation {
                    category: category.as_str().to_string(),
                    advice: advice.clone(),
                })
            })
            .collect();

        Self {
            extracted: result
                .extracted_values
                .into_values()
                .map(|v| v.into())
                .collect(),
            classified: result
                .classified_values
                .into_values()
                .map(|v| v.into())
                .collect(),
            alerts: result.alerts.into_iter().map(|a| a.into()).collect(),
            cardiovascular_risk: result.risk_scores.cardiovascular,
            diabetes_risk: result.risk_scores.diabetes,
            overall_risk: result.risk_scores.overall,
            recommendations,
            overall_status: result.summary.overall_status.label().to_string(),
            summary_text: result.summary.summary_text,
            total_tests: count_u32(result.summary.total_tests),
            normal_tests: count_u32(result.summary.normal_tests),
            abnormal_tests: count_u32(result.summary.abnormal_tests),
            text_digest: export::text_digest(text),
            analyzed_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Counts saturate at `u32::MAX` across the FFI boundary.
fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_report_ffi() {
        let report = analyze_report("Cholesterol: 250 mg/dL, Blood Pressure: 150/95".to_string());

        assert_eq!(report.extracted.len(), 3);
        assert_eq!(report.classified.len(), 3);
        assert_eq!(report.alerts.len(), 3);
        assert_eq!(report.overall_status, "Medical Consultation Recommended");
        assert_eq!(report.abnormal_tests, 3);
        assert!(report.classified.iter().all(|c| c.status == "high"));
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.category == "medical" && r.advice == "Consider consulting a cardiologist"));
    }

    #[test]
    fn test_analyze_report_with_config_ffi() {
        let report = analyze_report_with_config(
            "Glucose: 105 mg/dL".to_string(),
            "tier = \"advanced\"".to_string(),
        )
        .unwrap();

        assert_eq!(report.classified[0].status, "borderline");
        assert_eq!(report.alerts[0].severity, "borderline");
    }

    #[test]
    fn test_invalid_config_ffi() {
        let err = analyze_report_with_config("Glucose: 85".to_string(), "tier = 3".to_string())
            .unwrap_err();
        assert!(matches!(err, LabScanError::InvalidConfig(_)));
    }

    #[test]
    fn test_export_ffi() {
        let json = export_report_json("Glucose: 85 mg/dL".to_string(), String::new()).unwrap();
        assert!(json.contains("\"text_digest\""));

        let csv = export_report_csv("Glucose: 85 mg/dL".to_string(), String::new()).unwrap();
        assert_eq!(csv.lines().count(), 2);
    }

    #[test]
    fn test_counts_saturate() {
        assert_eq!(count_u32(3), 3);
        assert_eq!(count_u32(usize::MAX), u32::MAX);
    }

    #[test]
    fn test_normalize_label_ffi() {
        assert_eq!(normalize_label("HGB".to_string()), Some("hemoglobin".to_string()));
        assert_eq!(normalize_label("Sys".to_string()), Some("blood_pressure_systolic".to_string()));
        assert_eq!(normalize_label("SBP".to_string()), Some("blood_pressure_systolic".to_string()));
        assert_eq!(normalize_label("TG".to_string()), Some("triglycerides".to_string()));
        assert_eq!(normalize_label("vitamin d".to_string()), None);
    }
}
