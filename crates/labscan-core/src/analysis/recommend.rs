//! Recommendation engine.
//!
//! Advice comes from a per-tier rule table. Each rule pairs a trigger
//! (a test out of range, or a risk score over a threshold) with a fixed
//! block of advice in one category. Critical values add an urgent entry,
//! abnormal tests no rule covers get a generic medical note, and a report
//! with nothing abnormal gets the general maintenance block.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::debug;

use crate::config::AnalysisTier;
use crate::models::{
    CanonicalTest, ClassifiedValue, ClassifiedValues, Deviation, RecommendationCategory,
    Recommendations, RiskScores, Severity,
};

use RecommendationCategory::{Dietary, Exercise, Lifestyle, Medical};

/// Advice when nothing is out of range.
const FALLBACK_ADVICE: &[&str] = &[
    "Maintain current healthy lifestyle",
    "Continue regular check-ups",
    "Stay hydrated and eat balanced meals",
    "Keep up with regular physical activity",
];

/// Condition under which a rule contributes its advice.
#[derive(Debug, Clone, Copy)]
pub enum Trigger {
    /// Any of the tests is above its range
    Above(&'static [CanonicalTest]),
    /// The test is outside its range in either direction
    NotNormal(CanonicalTest),
    /// Cardiovascular score strictly greater than the value
    CardiovascularOver(f64),
    /// Overall score strictly greater than the value
    OverallOver(f64),
}

impl Trigger {
    /// Tests that made this trigger fire, or `None` if it did not fire.
    /// Risk triggers fire with an empty list.
    fn evaluate(
        &self,
        classified: &ClassifiedValues,
        risk: &RiskScores,
    ) -> Option<Vec<CanonicalTest>> {
        match *self {
            Trigger::Above(tests) => {
                let hits: Vec<CanonicalTest> = tests
                    .iter()
                    .copied()
                    .filter(|test| {
                        classified
                            .get(test)
                            .is_some_and(|c| !c.is_normal() && c.deviation == Deviation::Above)
                    })
                    .collect();
                (!hits.is_empty()).then_some(hits)
            }
            Trigger::NotNormal(test) => classified
                .get(&test)
                .filter(|c| !c.is_normal())
                .map(|_| vec![test]),
            Trigger::CardiovascularOver(threshold) => {
                (risk.cardiovascular > threshold).then(Vec::new)
            }
            Trigger::OverallOver(threshold) => (risk.overall > threshold).then(Vec::new),
        }
    }
}

/// One entry of the rule table.
#[derive(Debug, Clone)]
pub struct AdviceRule {
    pub trigger: Trigger,
    pub category: RecommendationCategory,
    pub advice: &'static [&'static str],
}

impl AdviceRule {
    fn new(
        trigger: Trigger,
        category: RecommendationCategory,
        advice: &'static [&'static str],
    ) -> Self {
        Self {
            trigger,
            category,
            advice,
        }
    }
}

/// Generates categorized advice from classified values and risk scores.
pub struct RecommendationEngine {
    tier: AnalysisTier,
    rules: Vec<AdviceRule>,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new(AnalysisTier::default())
    }
}

impl RecommendationEngine {
    /// Create an engine with the rule table for `tier`.
    pub fn new(tier: AnalysisTier) -> Self {
        let rules = match tier {
            AnalysisTier::Basic => Self::basic_rules(),
            AnalysisTier::Advanced => Self::advanced_rules(),
        };
        Self { tier, rules }
    }

    pub fn tier(&self) -> AnalysisTier {
        self.tier
    }

    pub fn rules(&self) -> &[AdviceRule] {
        &self.rules
    }

    /// Produce advice for one report. No string appears twice.
    pub fn recommend(&self, classified: &ClassifiedValues, risk: &RiskScores) -> Recommendations {
        let mut list = AdviceList::default();

        let abnormal: Vec<&ClassifiedValue> =
            classified.values().filter(|c| !c.is_normal()).collect();

        if abnormal.is_empty() {
            for advice in FALLBACK_ADVICE {
                list.push(RecommendationCategory::General, advice.to_string());
            }
            return list.finish();
        }

        for value in abnormal.iter().filter(|c| c.status == Severity::Critical) {
            list.push(
                RecommendationCategory::Immediate,
                format!(
                    "URGENT: {} level ({}) requires immediate medical attention",
                    value.test().display_name(),
                    value.extracted.value
                ),
            );
        }

        let mut covered = BTreeSet::new();
        for rule in &self.rules {
            let Some(tests) = rule.trigger.evaluate(classified, risk) else {
                continue;
            };
            debug!(trigger = ?rule.trigger, category = %rule.category, "advice rule fired");

            covered.extend(tests);
            for advice in rule.advice {
                list.push(rule.category, advice.to_string());
            }
        }

        for value in abnormal.iter().filter(|c| !covered.contains(&c.test())) {
            list.push(
                Medical,
                format!(
                    "Discuss your {} result ({} {}) with your healthcare provider",
                    value.test().display_name(),
                    format_value(value.value),
                    value.unit
                ),
            );
        }

        list.finish()
    }

    /// Rules for the basic tier. All fire on values above range.
    fn basic_rules() -> Vec<AdviceRule> {
        use CanonicalTest::*;

        const CHOLESTEROL: &[CanonicalTest] = &[CholesterolTotal];
        const BLOOD_PRESSURE: &[CanonicalTest] = &[BloodPressureSystolic, BloodPressureDiastolic];
        const GLUCOSE: &[CanonicalTest] = &[GlucoseFasting, GlucoseRandom, Hba1c];
        const WEIGHT: &[CanonicalTest] = &[Bmi];

        vec![
            // Cholesterol
            AdviceRule::new(
                Trigger::Above(CHOLESTEROL),
                Dietary,
                &[
                    "Reduce intake of saturated fats and trans fats",
                    "Increase fiber-rich foods like oats and beans",
                ],
            ),
            AdviceRule::new(
                Trigger::Above(CHOLESTEROL),
                Exercise,
                &["Exercise regularly (30 minutes, 5 days a week)"],
            ),
            AdviceRule::new(
                Trigger::Above(CHOLESTEROL),
                Medical,
                &["Consider consulting a cardiologist"],
            ),
            // Blood pressure
            AdviceRule::new(
                Trigger::Above(BLOOD_PRESSURE),
                Dietary,
                &["Reduce sodium intake (less than 2300mg daily)"],
            ),
            AdviceRule::new(
                Trigger::Above(BLOOD_PRESSURE),
                Lifestyle,
                &[
                    "Maintain healthy weight",
                    "Limit alcohol consumption",
                    "Practice stress management techniques",
                ],
            ),
            AdviceRule::new(
                Trigger::Above(BLOOD_PRESSURE),
                Medical,
                &["Consult with your doctor about blood pressure medication"],
            ),
            // Glucose
            AdviceRule::new(
                Trigger::Above(GLUCOSE),
                Dietary,
                &[
                    "Monitor carbohydrate intake",
                    "Choose whole grains over refined carbs",
                    "Maintain regular meal times",
                ],
            ),
            AdviceRule::new(
                Trigger::Above(GLUCOSE),
                Exercise,
                &["Increase physical activity"],
            ),
            AdviceRule::new(
                Trigger::Above(GLUCOSE),
                Medical,
                &["Consider diabetes screening with your doctor"],
            ),
            // BMI
            AdviceRule::new(
                Trigger::Above(WEIGHT),
                Dietary,
                &[
                    "Create a calorie deficit through diet and exercise",
                    "Focus on whole foods and portion control",
                ],
            ),
            AdviceRule::new(
                Trigger::Above(WEIGHT),
                Exercise,
                &["Aim for 150 minutes of moderate exercise weekly"],
            ),
            AdviceRule::new(
                Trigger::Above(WEIGHT),
                Medical,
                &["Consider consulting a nutritionist"],
            ),
        ]
    }

    /// Rules for the advanced tier: lipid, vitals and risk-driven blocks.
    fn advanced_rules() -> Vec<AdviceRule> {
        use CanonicalTest::*;

        const LIPIDS: &[CanonicalTest] = &[CholesterolTotal, CholesterolLdl];
        const GLUCOSE: &[CanonicalTest] = &[GlucoseFasting, GlucoseRandom, Hba1c];
        const WEIGHT: &[CanonicalTest] = &[Bmi];
        const TRIGLYCERIDES: &[CanonicalTest] = &[Triglycerides];

        vec![
            AdviceRule::new(
                Trigger::Above(LIPIDS),
                Dietary,
                &[
                    "Reduce saturated fat intake to less than 7% of total calories",
                    "Include soluble fiber foods (oats, beans, fruits)",
                    "Consume omega-3 rich fish twice per week",
                    "Choose lean proteins and plant-based options",
                ],
            ),
            AdviceRule::new(
                Trigger::CardiovascularOver(30.0),
                Exercise,
                &[
                    "Aim for 150 minutes of moderate aerobic activity weekly",
                    "Include 2 sessions of strength training per week",
                    "Start with low-impact activities if new to exercise",
                    "Consider working with a fitness professional",
                ],
            ),
            AdviceRule::new(
                Trigger::NotNormal(BloodPressureSystolic),
                Lifestyle,
                &[
                    "Limit sodium intake to less than 2300mg daily",
                    "Maintain healthy sleep schedule (7-9 hours nightly)",
                    "Practice stress reduction techniques",
                    "Limit alcohol consumption",
                ],
            ),
            AdviceRule::new(
                Trigger::OverallOver(50.0),
                Medical,
                &[
                    "Schedule comprehensive metabolic panel in 3 months",
                    "Consider consultation with cardiologist",
                    "Discuss medication options with primary care physician",
                    "Regular monitoring of key biomarkers",
                ],
            ),
            AdviceRule::new(
                Trigger::Above(GLUCOSE),
                Dietary,
                &[
                    "Monitor carbohydrate intake",
                    "Choose whole grains over refined carbs",
                    "Maintain regular meal times",
                ],
            ),
            AdviceRule::new(
                Trigger::Above(GLUCOSE),
                Medical,
                &["Consider diabetes screening with your doctor"],
            ),
            AdviceRule::new(
                Trigger::Above(WEIGHT),
                Dietary,
                &[
                    "Create a calorie deficit through diet and exercise",
                    "Focus on whole foods and portion control",
                ],
            ),
            AdviceRule::new(
                Trigger::Above(WEIGHT),
                Medical,
                &["Consider consulting a nutritionist"],
            ),
            AdviceRule::new(
                Trigger::Above(TRIGLYCERIDES),
                Dietary,
                &["Limit added sugars and refined carbohydrates"],
            ),
            AdviceRule::new(
                Trigger::Above(TRIGLYCERIDES),
                Lifestyle,
                &["Limit alcohol consumption"],
            ),
        ]
    }
}

/// Category lists with global first-occurrence dedup.
#[derive(Default)]
struct AdviceList {
    categories: BTreeMap<RecommendationCategory, Vec<String>>,
    seen: HashSet<String>,
}

impl AdviceList {
    fn push(&mut self, category: RecommendationCategory, advice: String) {
        if self.seen.insert(advice.clone()) {
            self.categories.entry(category).or_default().push(advice);
        }
    }

    fn finish(self) -> Recommendations {
        Recommendations::from_categories(self.categories)
    }
}

/// Up to two decimals, trailing zeros dropped.
fn format_value(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}
