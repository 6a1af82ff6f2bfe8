//! Pattern-based lab value extraction.
//!
//! Each test family has its own rule: a compiled pattern plus the tests it
//! fills. Rules run independently over the lowercased text and the earliest
//! accepted match per test wins. Later mentions of the same test are
//! ignored.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::debug;

use crate::models::{CanonicalTest, ExtractedValue, ExtractedValues};

/// Units recognized directly after a value. Longer spellings come first so
/// `mg/dl` wins over `g/dl` and `lbs` over `lb`.
const UNIT_PATTERN: &str = r"mg/dl|mmol/l|µmol/l|μmol/l|umol/l|g/dl|g/l|mmhg|bpm|kg/m²|kg/m2|cells/μl|cells/µl|cells/ul|/μl|/µl|/ul|/mm3|%|kg|lbs|lb|cm";

/// Optional filler between a label and its value ("glucose level: 95").
const FILLER_PATTERN: &str = r"(?:\s+(?:level|count|value|reading|result))?";

/// Between a label and its value: an optional parenthesized abbreviation
/// ("fasting blood sugar (fbs): 110"), then separators.
const SEPARATOR_PATTERN: &str = r"(?:\s*\([a-z0-9 .\-]+\))?[\s:=\-]*";

const NUMBER_PATTERN: &str = r"\d+(?:\.\d+)?";

/// What a rule fills when it matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTarget {
    /// One value, one test
    Single(CanonicalTest),
    /// Two values separated by `/` or `-` (blood pressure)
    Pair(CanonicalTest, CanonicalTest),
}

/// A value pair read by a rule, before it is split into per-test entries.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Single(f64),
    Pair(f64, f64),
}

/// An accepted match of one rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    /// Byte offset of the match in the scanned text
    pub start: usize,
    pub reading: Reading,
    pub unit: Option<String>,
    pub span: String,
}

/// One extraction rule: a label pattern bound to its target tests.
pub struct ExtractionRule {
    target: RuleTarget,
    regex: Regex,
    /// A match is rejected when the word right before it is one of these
    rejected_prefixes: &'static [&'static str],
}

impl ExtractionRule {
    fn single(
        test: CanonicalTest,
        variants: &str,
        rejected_prefixes: &'static [&'static str],
    ) -> Self {
        let labels = label_pattern(test, variants);
        let pattern = format!(
            r"\b(?:{labels})\b{FILLER_PATTERN}{SEPARATOR_PATTERN}(?P<value>{NUMBER_PATTERN})(?:\s*(?P<unit>{UNIT_PATTERN}))?"
        );
        Self {
            target: RuleTarget::Single(test),
            regex: Regex::new(&pattern).expect("Invalid extraction regex pattern"),
            rejected_prefixes,
        }
    }

    fn pair(first: CanonicalTest, second: CanonicalTest, labels: &str) -> Self {
        let pattern = format!(
            r"\b(?:{labels})\b{FILLER_PATTERN}{SEPARATOR_PATTERN}(?P<value>{NUMBER_PATTERN})\s*[/\-]\s*(?P<second>{NUMBER_PATTERN})(?:\s*(?P<unit>{UNIT_PATTERN}))?"
        );
        Self {
            target: RuleTarget::Pair(first, second),
            regex: Regex::new(&pattern).expect("Invalid extraction regex pattern"),
            rejected_prefixes: &[],
        }
    }

    pub fn target(&self) -> RuleTarget {
        self.target
    }

    /// Tests this rule can fill.
    pub fn tests(&self) -> Vec<CanonicalTest> {
        match self.target {
            RuleTarget::Single(test) => vec![test],
            RuleTarget::Pair(first, second) => vec![first, second],
        }
    }

    /// First accepted match in already-lowercased `text`.
    pub fn first_match(&self, text: &str) -> Option<RuleMatch> {
        self.regex.captures_iter(text).find_map(|caps| {
            let whole = caps.get(0)?;
            let prefix = preceding_word(text, whole.start());
            if self.rejected_prefixes.contains(&prefix) {
                debug!(
                    target_rule = ?self.target,
                    prefix = %prefix,
                    span = %whole.as_str(),
                    "rejected match by preceding word"
                );
                return None;
            }
            self.read(&caps).map(|reading| RuleMatch {
                start: whole.start(),
                reading,
                unit: caps.name("unit").map(|m| m.as_str().to_string()),
                span: whole.as_str().trim().to_string(),
            })
        })
    }

    fn read(&self, caps: &Captures<'_>) -> Option<Reading> {
        let value = parse_number(caps, "value")?;
        match self.target {
            RuleTarget::Single(_) => Some(Reading::Single(value)),
            RuleTarget::Pair(..) => Some(Reading::Pair(value, parse_number(caps, "second")?)),
        }
    }
}

fn parse_number(caps: &Captures<'_>, group: &str) -> Option<f64> {
    caps.name(group)?.as_str().parse::<f64>().ok()
}

/// The word directly before `start`, with trailing hyphens removed.
fn preceding_word(text: &str, start: usize) -> &str {
    let before = text[..start].trim_end();
    let word_start = before
        .char_indices()
        .rev()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '-'))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    before[word_start..].trim_end_matches('-')
}

/// All rules, in priority order for tests filled at the same offset.
///
/// Single rules accept every catalog alias of their test, plus the regex
/// variants listed here for spellings the aliases cannot express.
static EXTRACTION_RULES: LazyLock<Vec<ExtractionRule>> = LazyLock::new(|| {
    use CanonicalTest::*;

    vec![
        // Vitals
        ExtractionRule::pair(
            BloodPressureSystolic,
            BloodPressureDiastolic,
            r"blood\s*pressure|bp",
        ),
        ExtractionRule::single(
            BloodPressureSystolic,
            r"systolic\s+(?:blood\s+pressure|bp)",
            &[],
        ),
        ExtractionRule::single(
            BloodPressureDiastolic,
            r"diastolic\s+(?:blood\s+pressure|bp)",
            &[],
        ),
        ExtractionRule::single(HeartRate, r"heart\s+rate|pulse\s+rate", &[]),
        ExtractionRule::single(Bmi, "", &[]),
        ExtractionRule::single(Weight, r"body\s+weight", &[]),
        ExtractionRule::single(Height, "", &[]),
        // Lipids
        ExtractionRule::single(
            CholesterolLdl,
            r"ldl(?:[\s\-]+chol(?:esterol)?|-c)",
            &[],
        ),
        ExtractionRule::single(
            CholesterolHdl,
            r"hdl(?:[\s\-]+chol(?:esterol)?|-c)",
            &["non"],
        ),
        ExtractionRule::single(
            CholesterolTotal,
            r"total\s+chol",
            &["ldl", "hdl", "non-hdl", "vldl"],
        ),
        ExtractionRule::single(Triglycerides, r"trigs", &[]),
        // Glycemic
        ExtractionRule::single(Hba1c, r"ha?emoglobin\s+a1c|hb\s+a1c", &[]),
        ExtractionRule::single(
            GlucoseRandom,
            r"(?:random|post[\s\-]?prandial)\s+(?:blood\s+)?(?:glucose|sugar)",
            &[],
        ),
        ExtractionRule::single(
            GlucoseFasting,
            r"(?:fasting\s+)?(?:blood\s+)?(?:glucose|sugar)",
            &["random", "prandial", "postprandial", "urine"],
        ),
        // Hematology
        ExtractionRule::single(
            Hemoglobin,
            "",
            &["glycated", "glycosylated", "corpuscular"],
        ),
        ExtractionRule::single(
            WhiteBloodCells,
            r"white\s+blood\s+cells|leu[ck]ocytes|total\s+leu[ck]ocyte",
            &[],
        ),
        // Renal
        ExtractionRule::single(Creatinine, r"serum\s+creatinine", &[]),
    ]
});

/// Regex alternation over `variants` followed by every alias of `test`.
fn label_pattern(test: CanonicalTest, variants: &str) -> String {
    let aliases = test
        .aliases()
        .iter()
        .map(|alias| regex::escape(alias).replace(' ', r"\s+"));

    Some(variants.to_string())
        .filter(|v| !v.is_empty())
        .into_iter()
        .chain(aliases)
        .collect::<Vec<_>>()
        .join("|")
}

/// Extracts lab values from report text using the fixed rule list.
pub struct LabValueExtractor {
    rules: &'static [ExtractionRule],
}

impl Default for LabValueExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LabValueExtractor {
    /// Create an extractor over the built-in rules.
    pub fn new() -> Self {
        Self {
            rules: EXTRACTION_RULES.as_slice(),
        }
    }

    /// The rules, for inspecting or testing one family at a time.
    pub fn rules(&self) -> &[ExtractionRule] {
        self.rules
    }

    /// Extract the first value per test from `text`.
    ///
    /// Matching runs on the lowercased text. When two rules fill the same
    /// test, the one matching earlier in the text wins; ties go to the rule
    /// listed first. Text with nothing recognizable yields an empty map.
    pub fn extract(&self, text: &str) -> ExtractedValues {
        let lowered = text.to_lowercase();
        let mut earliest: Vec<(CanonicalTest, usize, ExtractedValue)> = Vec::new();

        for rule in self.rules {
            let Some(found) = rule.first_match(&lowered) else {
                continue;
            };

            let values = match (rule.target, &found.reading) {
                (RuleTarget::Single(test), Reading::Single(v)) => vec![(test, *v)],
                (RuleTarget::Pair(first, second), Reading::Pair(a, b)) => {
                    vec![(first, *a), (second, *b)]
                }
                _ => Vec::new(),
            };

            for (test, value) in values {
                let candidate = ExtractedValue {
                    test,
                    value,
                    raw_unit: found.unit.clone(),
                    source_span: found.span.clone(),
                };
                match earliest.iter_mut().find(|(t, _, _)| *t == test) {
                    Some(slot) if found.start < slot.1 => *slot = (test, found.start, candidate),
                    Some(_) => {}
                    None => earliest.push((test, found.start, candidate)),
                }
            }
        }

        earliest
            .into_iter()
            .map(|(test, _, value)| {
                debug!(
                    test = %test,
                    value = value.value,
                    unit = value.raw_unit.as_deref().unwrap_or(""),
                    "extracted lab value"
                );
                (test, value)
            })
            .collect()
    }
}
