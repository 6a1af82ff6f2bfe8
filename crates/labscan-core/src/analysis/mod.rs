//! Report analysis pipeline.
//!
//! Pipeline:
//! 1. Clean the text
//! 2. Extract values by pattern, then fill gaps from table rows
//! 3. Classify against reference ranges
//! 4. Build alerts, risk scores, recommendations and summary

mod classifier;
mod recommend;
pub mod risk;
mod summary;

pub use classifier::RangeClassifier;
pub use recommend::{AdviceRule, RecommendationEngine, Trigger};
pub use summary::summarize;

use tracing::{debug, info};

use crate::config::{AnalyzerConfig, ConfigResult};
use crate::extract::{clean_text, extract_tables, LabValueExtractor, Normalizer};
use crate::models::{AnalysisResult, ExtractedValue, ExtractedValues};

/// Anything that can hand over report text.
pub trait TextSource {
    fn get_text(&self) -> String;
}

impl TextSource for str {
    fn get_text(&self) -> String {
        self.to_string()
    }
}

impl TextSource for String {
    fn get_text(&self) -> String {
        self.clone()
    }
}

/// Lab report analyzer.
///
/// Stateless across calls: analyzing the same text twice gives equal
/// results.
pub struct Analyzer {
    config: AnalyzerConfig,
    extractor: LabValueExtractor,
    normalizer: Normalizer,
    classifier: RangeClassifier,
    engine: RecommendationEngine,
}

impl Default for Analyzer {
    fn default() -> Self {
        let config = AnalyzerConfig::default();
        Self {
            extractor: LabValueExtractor::new(),
            normalizer: Normalizer::new(),
            classifier: RangeClassifier::from_config(&config),
            engine: RecommendationEngine::new(config.tier),
            config,
        }
    }
}

impl Analyzer {
    /// Create an analyzer, validating the config first.
    pub fn new(config: AnalyzerConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            extractor: LabValueExtractor::new(),
            normalizer: Normalizer::new(),
            classifier: RangeClassifier::from_config(&config),
            engine: RecommendationEngine::new(config.tier),
            config,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Extract values from report text.
    ///
    /// Pattern matches come first. Table rows whose label resolves to a
    /// test only fill tests the patterns missed.
    pub fn extract(&self, text: &str) -> ExtractedValues {
        let cleaned = clean_text(text);
        let mut values = self.extractor.extract(&cleaned);

        for row in extract_tables(&cleaned).into_iter().flatten() {
            let Some(test) = self.normalizer.normalize_fuzzy(&row.test) else {
                debug!(label = %row.test, "unrecognized table row");
                continue;
            };
            if values.contains_key(&test) {
                continue;
            }

            debug!(test = %test, value = row.value, "value from table row");
            values.insert(
                test,
                ExtractedValue {
                    test,
                    value: row.value,
                    raw_unit: (!row.unit.is_empty()).then(|| row.unit.to_lowercase()),
                    source_span: row.source_line,
                },
            );
        }

        values
    }

    /// Run the full pipeline on report text.
    pub fn analyze(&self, text: &str) -> AnalysisResult {
        let extracted_values = self.extract(text);
        let classified_values = self.classifier.classify_all(&extracted_values);
        let alerts = self.classifier.alerts(&classified_values);
        let risk_scores = risk::score(&classified_values);
        let recommendations = self.engine.recommend(&classified_values, &risk_scores);
        let summary = summarize(&classified_values, &alerts);

        info!(
            tier = self.config.tier.as_str(),
            extracted = extracted_values.len(),
            classified = classified_values.len(),
            alerts = alerts.len(),
            status = summary.overall_status.label(),
            "analyzed report"
        );

        AnalysisResult {
            extracted_values,
            classified_values,
            alerts,
            risk_scores,
            recommendations,
            summary,
        }
    }

    /// Run the full pipeline on text from any source.
    pub fn analyze_source<S: TextSource + ?Sized>(&self, source: &S) -> AnalysisResult {
        self.analyze(&source.get_text())
    }
}
