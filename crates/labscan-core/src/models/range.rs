//! Reference ranges for classifying lab values.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use super::catalog::CanonicalTest;

/// Biological sex, used to pick sex-specific reference ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

/// Inclusive "normal" band for a test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceRange {
    /// Lowest normal value (inclusive)
    pub min: f64,
    /// Highest normal value (inclusive)
    pub max: f64,
    /// Unit the bounds are expressed in (e.g., "mg/dL")
    pub unit: String,
}

impl ReferenceRange {
    pub fn new(min: f64, max: f64, unit: impl Into<String>) -> Self {
        Self {
            min,
            max,
            unit: unit.into(),
        }
    }

    /// Check if a value lies inside the normal band.
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Range formatted for display, e.g. "125-200 mg/dL".
    pub fn label(&self) -> String {
        format!("{}-{} {}", self.min, self.max, self.unit)
    }
}

/// One row of the reference table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RangeEntry {
    pub test: CanonicalTest,
    /// Sex this row applies to; `None` applies to everyone
    pub sex: Option<Sex>,
    pub range: ReferenceRange,
}

/// Lookup table from test (and optional sex) to reference range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceTable {
    entries: Vec<RangeEntry>,
}

/// Built-in ranges, constructed once.
pub static DEFAULT_REFERENCE_TABLE: LazyLock<ReferenceTable> =
    LazyLock::new(ReferenceTable::built_in);

impl Default for ReferenceTable {
    fn default() -> Self {
        DEFAULT_REFERENCE_TABLE.clone()
    }
}

impl ReferenceTable {
    /// Create a table from explicit entries.
    pub fn from_entries(entries: Vec<RangeEntry>) -> Self {
        Self { entries }
    }

    /// Find the range for a test.
    ///
    /// A row matching `sex` is preferred; otherwise the sex-neutral row is
    /// used. Tests with no row return `None`.
    pub fn lookup(&self, test: CanonicalTest, sex: Option<Sex>) -> Option<&ReferenceRange> {
        let specific = sex.and_then(|wanted| {
            self.entries
                .iter()
                .find(|e| e.test == test && e.sex == Some(wanted))
        });

        specific
            .or_else(|| self.entries.iter().find(|e| e.test == test && e.sex.is_none()))
            .map(|e| &e.range)
    }

    /// Check for a row with exactly this test and sex, without falling back
    /// to the sex-neutral row.
    pub fn has_entry(&self, test: CanonicalTest, sex: Option<Sex>) -> bool {
        self.entries.iter().any(|e| e.test == test && e.sex == sex)
    }

    /// Check whether the table knows anything about a test.
    pub fn covers(&self, test: CanonicalTest) -> bool {
        self.entries.iter().any(|e| e.test == test)
    }

    /// Return a copy of this table with `entry` replacing any row for the
    /// same test and sex.
    pub fn with_entry(&self, entry: RangeEntry) -> Self {
        let mut entries: Vec<RangeEntry> = self
            .entries
            .iter()
            .filter(|e| !(e.test == entry.test && e.sex == entry.sex))
            .cloned()
            .collect();
        entries.push(entry);
        Self { entries }
    }

    pub fn entries(&self) -> &[RangeEntry] {
        &self.entries
    }

    fn built_in() -> Self {
        use CanonicalTest::*;

        let row = |test, min, max, unit: &str| RangeEntry {
            test,
            sex: None,
            range: ReferenceRange::new(min, max, unit),
        };
        let sexed = |test, sex, min, max, unit: &str| RangeEntry {
            test,
            sex: Some(sex),
            range: ReferenceRange::new(min, max, unit),
        };

        Self::from_entries(vec![
            // Lipids
            row(CholesterolTotal, 125.0, 200.0, "mg/dL"),
            row(CholesterolLdl, 50.0, 100.0, "mg/dL"),
            row(CholesterolHdl, 40.0, 80.0, "mg/dL"),
            row(Triglycerides, 50.0, 150.0, "mg/dL"),
            // Glycemic
            row(GlucoseFasting, 70.0, 100.0, "mg/dL"),
            row(GlucoseRandom, 70.0, 140.0, "mg/dL"),
            row(Hba1c, 4.0, 5.7, "%"),
            // Vitals
            row(BloodPressureSystolic, 90.0, 120.0, "mmHg"),
            row(BloodPressureDiastolic, 60.0, 80.0, "mmHg"),
            row(HeartRate, 60.0, 100.0, "bpm"),
            row(Bmi, 18.5, 24.9, "kg/m²"),
            // Hematology
            row(Hemoglobin, 12.0, 17.5, "g/dL"),
            sexed(Hemoglobin, Sex::Male, 13.5, 17.5, "g/dL"),
            sexed(Hemoglobin, Sex::Female, 12.0, 15.5, "g/dL"),
            row(WhiteBloodCells, 4000.0, 11000.0, "/μL"),
            // Renal
            row(Creatinine, 0.6, 1.3, "mg/dL"),
        ])
    }
}
