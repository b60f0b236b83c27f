//! Candidate scoring
//!
//! The point weights and the 55-point promising threshold are fixed policy
//! parameters carried over from the original campaign tuning; they are data,
//! not derived quantities. Keep the arithmetic exactly as-is for score
//! compatibility across runs.

use serde::{Deserialize, Serialize};

pub const NEGATIVE_ASSESSMENT_HINTS: [&str; 6] = [
    "high risk",
    "unsafe",
    "toxic",
    "toxicity",
    "poor",
    "liability",
];

pub const POSITIVE_ASSESSMENT_HINTS: [&str; 7] = [
    "promising",
    "favorable",
    "favourable",
    "good",
    "strong",
    "safe",
    "high confidence",
];

/// The five resolvable numeric signals of one candidate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CureMetrics {
    pub binding_probability: Option<f64>,
    pub admet_score: Option<f64>,
    pub affinity: Option<f64>,
    pub ic50: Option<f64>,
    pub kd: Option<f64>,
}

impl CureMetrics {
    pub fn resolved_count(&self) -> usize {
        [
            self.binding_probability,
            self.admet_score,
            self.affinity,
            self.ic50,
            self.kd,
        ]
        .iter()
        .filter(|value| value.is_some())
        .count()
    }

    pub fn any_resolved(&self) -> bool {
        self.resolved_count() > 0
    }
}

/// Composite score point weights. Defaults are the original campaign constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub binding_probability: f64,
    pub admet_score: f64,
    pub affinity_negative: f64,
    pub affinity_positive: f64,
    pub ic50: f64,
    pub kd: f64,
    pub per_metric_bonus: f64,
    pub metric_bonus_cap: usize,
    pub negative_hint_penalty: f64,
    pub positive_hint_bonus: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            binding_probability: 55.0,
            admet_score: 25.0,
            affinity_negative: 12.0,
            affinity_positive: 8.0,
            ic50: 8.0,
            kd: 6.0,
            per_metric_bonus: 1.5,
            metric_bonus_cap: 5,
            negative_hint_penalty: 12.0,
            positive_hint_bonus: 6.0,
        }
    }
}

/// Weighted composite over whichever metrics resolved, adjusted by assessment
/// hints (negative wins over positive), clamped to [0,100], rounded to 2 dp.
pub fn score_candidate(metrics: &CureMetrics, assessment: Option<&str>, weights: &ScoreWeights) -> f64 {
    let mut score = 0.0;

    if let Some(bp) = metrics.binding_probability {
        // values above 1 are treated as already-percent
        let bp = if bp > 1.0 { bp / 100.0 } else { bp };
        score += weights.binding_probability * clamp01(bp);
    }

    if let Some(ad) = metrics.admet_score {
        let ad = if ad > 1.0 { ad / 100.0 } else { ad };
        score += weights.admet_score * clamp01(ad);
    }

    if let Some(affinity) = metrics.affinity {
        if affinity < 0.0 {
            // more negative = stronger binding, normalized on a 15-unit scale
            score += weights.affinity_negative * clamp01(-affinity / 15.0);
        } else {
            score += weights.affinity_positive * clamp01(affinity / 15.0);
        }
    }

    if let Some(ic50) = metrics.ic50 {
        if ic50 > 0.0 {
            score += weights.ic50 * potency_score(ic50);
        }
    }

    if let Some(kd) = metrics.kd {
        if kd > 0.0 {
            score += weights.kd * potency_score(kd);
        }
    }

    let covered = metrics.resolved_count().min(weights.metric_bonus_cap);
    score += covered as f64 * weights.per_metric_bonus;

    if let Some(assessment) = assessment {
        let lowered = assessment.to_lowercase();
        if has_negative_hint(&lowered) {
            score -= weights.negative_hint_penalty;
        } else if POSITIVE_ASSESSMENT_HINTS.iter().any(|hint| lowered.contains(hint)) {
            score += weights.positive_hint_bonus;
        }
    }

    round2(score.clamp(0.0, 100.0))
}

/// Synthesized assessment when the tool reported none: ADMET thresholds when
/// an ADMET score is known, composite-score tiers otherwise.
pub fn assessment_from_score(score: f64, admet_score: Option<f64>) -> String {
    if let Some(admet) = admet_score {
        if admet >= 0.8 {
            return "Promising ADMET profile with strong translational potential.".to_string();
        }
        if admet >= 0.65 {
            return "Balanced ADMET profile with moderate optimization risk.".to_string();
        }
        return "ADMET profile indicates notable optimization risk.".to_string();
    }

    if score >= 80.0 {
        "High-confidence promising therapeutic candidate.".to_string()
    } else if score >= 60.0 {
        "Promising candidate with meaningful follow-up signal.".to_string()
    } else if score >= 45.0 {
        "Early signal candidate requiring optimization.".to_string()
    } else {
        "Low-confidence candidate; substantial optimization required.".to_string()
    }
}

/// Potency transform for IC50/Kd: smaller positive values score higher.
pub fn potency_score(value: f64) -> f64 {
    clamp01(1.0 / (1.0 + (value + 1.0).log10()))
}

pub fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Case-insensitive scan for negative hint phrases. Caller passes any casing.
pub fn has_negative_hint(text: &str) -> bool {
    let lowered = text.to_lowercase();
    NEGATIVE_ASSESSMENT_HINTS.iter().any(|hint| lowered.contains(hint))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(bp: Option<f64>, admet: Option<f64>, affinity: Option<f64>, ic50: Option<f64>, kd: Option<f64>) -> CureMetrics {
        CureMetrics {
            binding_probability: bp,
            admet_score: admet,
            affinity,
            ic50,
            kd,
        }
    }

    #[test]
    fn documented_example_scores_above_threshold() {
        // binding 0.88, ic50 0.12, admet 0.83 -> 55*0.88 + 25*0.83 + 8*potency(0.12) + 3*1.5
        let m = metrics(Some(0.88), Some(0.83), None, Some(0.12), None);
        let score = score_candidate(&m, None, &ScoreWeights::default());
        let expected = 55.0 * 0.88 + 25.0 * 0.83 + 8.0 * potency_score(0.12) + 3.0 * 1.5;
        assert_eq!(score, round2(expected));
        assert!(score > 55.0);
    }

    #[test]
    fn percent_scale_inputs_are_normalized() {
        let plain = score_candidate(&metrics(Some(0.9), None, None, None, None), None, &ScoreWeights::default());
        let percent = score_candidate(&metrics(Some(90.0), None, None, None, None), None, &ScoreWeights::default());
        assert_eq!(plain, percent);
    }

    #[test]
    fn negative_affinity_outscores_positive() {
        let strong = score_candidate(&metrics(None, None, Some(-9.0), None, None), None, &ScoreWeights::default());
        let weak = score_candidate(&metrics(None, None, Some(9.0), None, None), None, &ScoreWeights::default());
        assert!(strong > weak);
    }

    #[test]
    fn nonpositive_potency_values_contribute_nothing() {
        let zero = score_candidate(&metrics(None, None, None, Some(0.0), Some(-1.0)), None, &ScoreWeights::default());
        // only the coverage bonus remains (2 metrics resolved)
        assert_eq!(zero, 3.0);
    }

    #[test]
    fn negative_hint_takes_priority_over_positive() {
        let m = metrics(Some(0.9), None, None, None, None);
        let mixed = score_candidate(&m, Some("promising but toxic"), &ScoreWeights::default());
        let neutral = score_candidate(&m, None, &ScoreWeights::default());
        assert_eq!(mixed, round2(neutral - 12.0));
    }

    #[test]
    fn score_is_clamped_and_rounded() {
        let m = metrics(Some(1.0), Some(1.0), Some(-15.0), Some(0.001), Some(0.001));
        let score = score_candidate(&m, Some("strong and favorable"), &ScoreWeights::default());
        assert!(score <= 100.0);
        assert_eq!(score, round2(score));
    }

    #[test]
    fn assessment_tiers() {
        assert!(assessment_from_score(0.0, Some(0.85)).contains("strong translational potential"));
        assert!(assessment_from_score(0.0, Some(0.7)).contains("moderate optimization risk"));
        assert!(assessment_from_score(0.0, Some(0.2)).contains("notable optimization risk"));
        assert!(assessment_from_score(85.0, None).starts_with("High-confidence"));
        assert!(assessment_from_score(65.0, None).starts_with("Promising candidate"));
        assert!(assessment_from_score(50.0, None).starts_with("Early signal"));
        assert!(assessment_from_score(10.0, None).starts_with("Low-confidence"));
    }
}
