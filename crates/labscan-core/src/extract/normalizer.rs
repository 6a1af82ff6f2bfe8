//! Lab label normalizer.
//!
//! Handles:
//! - Alias lookup (chol→cholesterol_total, hgb→hemoglobin, sys→systolic)
//! - Fuzzy alias lookup for OCR-damaged table labels
//! - Unit canonicalization (mg/dl→mg/dL, mmhg→mmHg)
//! - SI unit conversion into the reference range's unit (mmol/L→mg/dL)

use std::collections::HashMap;

use strsim::jaro_winkler;
use tracing::debug;

use crate::models::CanonicalTest;

/// Minimum Jaro-Winkler similarity for a fuzzy alias hit.
const FUZZY_THRESHOLD: f64 = 0.90;

/// Aliases shorter than this never take part in fuzzy matching.
const FUZZY_MIN_ALIAS_LEN: usize = 4;

/// Normalizer for lab labels and units.
pub struct Normalizer {
    /// Aliases per test, in declaration order
    aliases: Vec<(CanonicalTest, &'static [&'static str])>,
    /// Unit spellings: lowercase variant → canonical unit
    unit_map: HashMap<&'static str, &'static str>,
    /// Conversions: (test, from canonical unit, to canonical unit) → multiplier
    conversions: HashMap<(CanonicalTest, &'static str, &'static str), f64>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    /// Create a new normalizer with default mappings.
    pub fn new() -> Self {
        Self {
            aliases: CanonicalTest::ALL
                .into_iter()
                .map(|test| (test, test.aliases()))
                .collect(),
            unit_map: Self::default_units(),
            conversions: Self::default_conversions(),
        }
    }

    /// Map a raw label to its canonical test.
    ///
    /// The label is lowercased and trimmed, then each test's aliases are
    /// checked by substring containment in declaration order. The first
    /// test with a matching alias wins.
    pub fn normalize(&self, raw_label: &str) -> Option<CanonicalTest> {
        let label = raw_label.trim().to_lowercase();
        if label.is_empty() {
            return None;
        }

        self.aliases
            .iter()
            .find(|(_, aliases)| aliases.iter().any(|alias| label.contains(alias)))
            .map(|(test, _)| *test)
    }

    /// Like [`normalize`](Self::normalize), but falls back to the closest
    /// alias by Jaro-Winkler similarity when no alias is contained in the
    /// label. Intended for table rows, where OCR misspellings are common.
    pub fn normalize_fuzzy(&self, raw_label: &str) -> Option<CanonicalTest> {
        if let Some(test) = self.normalize(raw_label) {
            return Some(test);
        }

        let label = raw_label.trim().to_lowercase();
        if label.len() < FUZZY_MIN_ALIAS_LEN {
            return None;
        }

        let mut best: Option<(CanonicalTest, f64)> = None;
        for (test, aliases) in &self.aliases {
            for alias in aliases.iter().filter(|a| a.len() >= FUZZY_MIN_ALIAS_LEN) {
                let score = jaro_winkler(&label, alias);
                // Strictly greater keeps the earlier test on ties.
                if score >= FUZZY_THRESHOLD && best.map_or(true, |(_, s)| score > s) {
                    best = Some((*test, score));
                }
            }
        }

        if let Some((test, score)) = best {
            debug!(label = %label, test = %test, score, "fuzzy label match");
        }
        best.map(|(test, _)| test)
    }

    /// Canonical spelling of a unit. Unknown units pass through lowercase.
    pub fn canonical_unit(&self, raw_unit: &str) -> String {
        let lower = raw_unit.trim().to_lowercase();
        self.unit_map
            .get(lower.as_str())
            .map(|u| u.to_string())
            .unwrap_or(lower)
    }

    /// Express `value` in `range_unit`.
    ///
    /// Values without a unit, or already in the range's unit, pass through.
    /// Known SI conversions are applied. Unrecognized unit spellings pass
    /// through unchanged. A recognized unit that differs from the range's
    /// unit with no conversion returns `None`: the value cannot be compared.
    pub fn convert_to_range_unit(
        &self,
        test: CanonicalTest,
        value: f64,
        raw_unit: Option<&str>,
        range_unit: &str,
    ) -> Option<(f64, String)> {
        let Some(raw_unit) = raw_unit else {
            return Some((value, range_unit.to_string()));
        };

        let from = self.canonical_unit(raw_unit);
        let to = self.canonical_unit(range_unit);
        if from.eq_ignore_ascii_case(&to) || !self.is_known_unit(&from) {
            return Some((value, range_unit.to_string()));
        }

        let multiplier = self
            .conversions
            .iter()
            .find(|((t, f, target), _)| {
                *t == test && *f == from.as_str() && target.eq_ignore_ascii_case(&to)
            })
            .map(|(_, m)| *m)?;

        debug!(test = %test, from = %from, to = %range_unit, multiplier, "converted unit");
        Some((value * multiplier, range_unit.to_string()))
    }

    fn is_known_unit(&self, canonical: &str) -> bool {
        self.unit_map.values().any(|u| *u == canonical)
    }

    /// Default unit spellings.
    fn default_units() -> HashMap<&'static str, &'static str> {
        let mut map = HashMap::new();

        // Mass concentration
        map.insert("mg/dl", "mg/dL");
        map.insert("g/dl", "g/dL");
        map.insert("g/l", "g/L");

        // Molar concentration
        map.insert("mmol/l", "mmol/L");
        map.insert("µmol/l", "µmol/L");
        map.insert("μmol/l", "µmol/L");
        map.insert("umol/l", "µmol/L");

        // Vitals
        map.insert("mmhg", "mmHg");
        map.insert("bpm", "bpm");
        map.insert("kg/m2", "kg/m²");
        map.insert("kg/m²", "kg/m²");

        // Cell counts
        map.insert("/μl", "/μL");
        map.insert("/µl", "/μL");
        map.insert("/ul", "/μL");
        map.insert("cells/μl", "/μL");
        map.insert("cells/µl", "/μL");
        map.insert("cells/ul", "/μL");
        map.insert("/mm3", "/μL");

        // Body measures
        map.insert("%", "%");
        map.insert("kg", "kg");
        map.insert("lb", "lb");
        map.insert("lbs", "lb");
        map.insert("cm", "cm");

        map
    }

    /// Default SI → conventional conversions.
    fn default_conversions() -> HashMap<(CanonicalTest, &'static str, &'static str), f64> {
        let mut map = HashMap::new();

        map.insert((CanonicalTest::GlucoseFasting, "mmol/L", "mg/dL"), 18.0);
        map.insert((CanonicalTest::GlucoseRandom, "mmol/L", "mg/dL"), 18.0);
        map.insert((CanonicalTest::CholesterolTotal, "mmol/L", "mg/dL"), 38.67);
        map.insert((CanonicalTest::CholesterolLdl, "mmol/L", "mg/dL"), 38.67);
        map.insert((CanonicalTest::CholesterolHdl, "mmol/L", "mg/dL"), 38.67);
        map.insert((CanonicalTest::Triglycerides, "mmol/L", "mg/dL"), 88.57);
        map.insert((CanonicalTest::Creatinine, "µmol/L", "mg/dL"), 1.0 / 88.4);
        map.insert((CanonicalTest::Hemoglobin, "g/L", "g/dL"), 0.1);

        map
    }
}
