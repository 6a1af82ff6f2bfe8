//! Analysis report export.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::AnalysisTier;
use crate::models::AnalysisResult;

use super::ExportResult;

/// Characters of input text kept in the export preview.
const PREVIEW_CHARS: usize = 500;

/// Exported analysis of one report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportExport {
    /// Export metadata
    pub metadata: ReportMetadata,
    /// Full analysis result
    pub result: AnalysisResult,
}

/// Report export metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// SHA-256 of the input text, hex encoded
    pub text_digest: String,
    /// Export timestamp
    pub exported_at: String,
    /// Tier the report was classified with
    pub tier: AnalysisTier,
    /// Start of the input text
    pub text_preview: String,
}

impl ReportExport {
    /// Wrap an analysis result with metadata about its input text.
    pub fn from_analysis(text: &str, tier: AnalysisTier, result: AnalysisResult) -> Self {
        Self {
            metadata: ReportMetadata {
                text_digest: text_digest(text),
                exported_at: chrono::Utc::now().to_rfc3339(),
                tier,
                text_preview: text_preview(text),
            },
            result,
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> ExportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Export to CSV format, one line per extracted value.
    ///
    /// Values without a reference range have empty status and range.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        // Header
        csv.push_str("test,name,value,unit,status,reference_range,source,text_digest\n");

        for (test, extracted) in &self.result.extracted_values {
            let classified = self.result.classified_values.get(test);

            let (value, unit, status, range) = match classified {
                Some(c) => (c.value, c.unit.clone(), c.status_label(), c.range_used.label()),
                None => (
                    extracted.value,
                    extracted.raw_unit.clone().unwrap_or_default(),
                    "",
                    String::new(),
                ),
            };

            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{}\n",
                test.as_str(),
                escape_csv(test.display_name()),
                value,
                escape_csv(&unit),
                status,
                escape_csv(&range),
                escape_csv(&extracted.source_span),
                self.metadata.text_digest,
            ));
        }

        csv
    }
}

/// SHA-256 of the text, hex encoded.
pub fn text_digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

fn text_preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let mut preview: String = text.chars().take(PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
