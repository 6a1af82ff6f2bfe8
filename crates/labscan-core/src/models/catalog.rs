//! Catalog of recognized lab tests and their label aliases.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A lab test or vital sign the pipeline knows how to recognize.
///
/// Declaration order is significant: alias lookup walks the variants in this
/// order and the first test whose aliases match a label wins. More specific
/// tests (LDL, HDL, HbA1c, random glucose) are therefore declared before the
/// broader ones whose aliases they contain.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalTest {
    CholesterolLdl,
    CholesterolHdl,
    CholesterolTotal,
    Triglycerides,
    Hba1c,
    GlucoseRandom,
    GlucoseFasting,
    Hemoglobin,
    WhiteBloodCells,
    BloodPressureSystolic,
    BloodPressureDiastolic,
    HeartRate,
    Bmi,
    Creatinine,
    Weight,
    Height,
}

impl CanonicalTest {
    /// Every test, in declaration order.
    pub const ALL: [CanonicalTest; 16] = [
        CanonicalTest::CholesterolLdl,
        CanonicalTest::CholesterolHdl,
        CanonicalTest::CholesterolTotal,
        CanonicalTest::Triglycerides,
        CanonicalTest::Hba1c,
        CanonicalTest::GlucoseRandom,
        CanonicalTest::GlucoseFasting,
        CanonicalTest::Hemoglobin,
        CanonicalTest::WhiteBloodCells,
        CanonicalTest::BloodPressureSystolic,
        CanonicalTest::BloodPressureDiastolic,
        CanonicalTest::HeartRate,
        CanonicalTest::Bmi,
        CanonicalTest::Creatinine,
        CanonicalTest::Weight,
        CanonicalTest::Height,
    ];

    /// Stable snake_case identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalTest::CholesterolLdl => "cholesterol_ldl",
            CanonicalTest::CholesterolHdl => "cholesterol_hdl",
            CanonicalTest::CholesterolTotal => "cholesterol_total",
            CanonicalTest::Triglycerides => "triglycerides",
            CanonicalTest::Hba1c => "hba1c",
            CanonicalTest::GlucoseRandom => "glucose_random",
            CanonicalTest::GlucoseFasting => "glucose_fasting",
            CanonicalTest::Hemoglobin => "hemoglobin",
            CanonicalTest::WhiteBloodCells => "white_blood_cells",
            CanonicalTest::BloodPressureSystolic => "blood_pressure_systolic",
            CanonicalTest::BloodPressureDiastolic => "blood_pressure_diastolic",
            CanonicalTest::HeartRate => "heart_rate",
            CanonicalTest::Bmi => "bmi",
            CanonicalTest::Creatinine => "creatinine",
            CanonicalTest::Weight => "weight",
            CanonicalTest::Height => "height",
        }
    }

    /// Human-readable name used in alerts and advice.
    pub fn display_name(&self) -> &'static str {
        match self {
            CanonicalTest::CholesterolLdl => "LDL Cholesterol",
            CanonicalTest::CholesterolHdl => "HDL Cholesterol",
            CanonicalTest::CholesterolTotal => "Total Cholesterol",
            CanonicalTest::Triglycerides => "Triglycerides",
            CanonicalTest::Hba1c => "HbA1c",
            CanonicalTest::GlucoseRandom => "Random Glucose",
            CanonicalTest::GlucoseFasting => "Fasting Glucose",
            CanonicalTest::Hemoglobin => "Hemoglobin",
            CanonicalTest::WhiteBloodCells => "White Blood Cells",
            CanonicalTest::BloodPressureSystolic => "Systolic Blood Pressure",
            CanonicalTest::BloodPressureDiastolic => "Diastolic Blood Pressure",
            CanonicalTest::HeartRate => "Heart Rate",
            CanonicalTest::Bmi => "BMI",
            CanonicalTest::Creatinine => "Creatinine",
            CanonicalTest::Weight => "Weight",
            CanonicalTest::Height => "Height",
        }
    }

    /// Lowercase label fragments that identify this test by substring.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            CanonicalTest::CholesterolLdl => &[
                "ldl",
                "low density lipoprotein",
                "low-density lipoprotein",
            ],
            CanonicalTest::CholesterolHdl => &[
                "hdl",
                "high density lipoprotein",
                "high-density lipoprotein",
            ],
            CanonicalTest::CholesterolTotal => &["cholesterol", "chol", "total cholesterol"],
            CanonicalTest::Triglycerides => &["triglycerides", "triglyceride", "trig", "tg"],
            CanonicalTest::Hba1c => &[
                "hba1c",
                "a1c",
                "glycated hemoglobin",
                "glycated haemoglobin",
                "glycosylated hemoglobin",
                "glycosylated haemoglobin",
            ],
            CanonicalTest::GlucoseRandom => &[
                "random glucose",
                "random blood glucose",
                "random blood sugar",
                "random sugar",
                "rbs",
                "ppbs",
                "postprandial",
                "post prandial",
                "post-prandial",
            ],
            CanonicalTest::GlucoseFasting => &[
                "glucose",
                "sugar",
                "blood sugar",
                "fasting glucose",
                "fbs",
            ],
            CanonicalTest::Hemoglobin => &["hemoglobin", "haemoglobin", "hgb", "hb"],
            CanonicalTest::WhiteBloodCells => &[
                "white blood cell",
                "wbc",
                "leukocyte",
                "leucocyte",
                "tlc",
            ],
            CanonicalTest::BloodPressureSystolic => &["systolic", "systolic bp", "sys", "sbp"],
            CanonicalTest::BloodPressureDiastolic => &["diastolic", "diastolic bp", "dia", "dbp"],
            CanonicalTest::HeartRate => &["heart rate", "pulse"],
            CanonicalTest::Bmi => &["bmi", "body mass index"],
            CanonicalTest::Creatinine => &["creatinine", "creat"],
            CanonicalTest::Weight => &["weight", "wt"],
            CanonicalTest::Height => &["height"],
        }
    }
}

impl fmt::Display for CanonicalTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalTest {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        CanonicalTest::ALL
            .into_iter()
            .find(|test| test.as_str() == wanted)
            .ok_or_else(|| format!("unknown test identifier: {}", s))
    }
}
