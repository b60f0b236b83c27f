//! Disease program portfolio ranking
//!
//! Pure weighted scoring over five bounded criteria. Missing or
//! non-numeric criteria score zero rather than failing the entry, so a
//! sparse program list still ranks.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Criterion weights. Defaults reflect the campaign prioritization policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioWeights {
    pub burden: f64,
    pub tractability: f64,
    pub unmet_need: f64,
    pub translational_readiness: f64,
    pub novelty: f64,
}

impl Default for PortfolioWeights {
    fn default() -> Self {
        Self {
            burden: 0.35,
            tractability: 0.25,
            unmet_need: 0.20,
            translational_readiness: 0.10,
            novelty: 0.10,
        }
    }
}

/// One scored program with its per-criterion rationale and source object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedDisease {
    pub name: String,
    pub score: f64,
    pub rationale: Vec<String>,
    pub raw: Value,
}

/// Score and sort disease programs, highest first. Non-object entries are
/// skipped; ties keep input order.
pub fn rank_disease_programs(diseases: &[Value], weights: &PortfolioWeights) -> Vec<RankedDisease> {
    let mut ranked: Vec<RankedDisease> = Vec::new();
    for item in diseases {
        let Some(map) = item.as_object() else {
            continue;
        };
        let name = map
            .get("name")
            .or_else(|| map.get("disease"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or("unknown")
            .to_string();

        let burden = bounded_score(map.get("burden"));
        let tractability = bounded_score(map.get("tractability"));
        let unmet_need = bounded_score(map.get("unmet_need"));
        let translational = bounded_score(map.get("translational_readiness"));
        let novelty = bounded_score(map.get("novelty"));

        let score = weights.burden * burden
            + weights.tractability * tractability
            + weights.unmet_need * unmet_need
            + weights.translational_readiness * translational
            + weights.novelty * novelty;

        let rationale = vec![
            format!("burden={burden:.3}"),
            format!("tractability={tractability:.3}"),
            format!("unmet_need={unmet_need:.3}"),
            format!("translational_readiness={translational:.3}"),
            format!("novelty={novelty:.3}"),
        ];

        ranked.push(RankedDisease {
            name,
            score: round6(score),
            rationale,
            raw: item.clone(),
        });
    }
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    ranked
}

/// Coerce one criterion into [0,1]; anything non-numeric scores zero.
fn bounded_score(value: Option<&Value>) -> f64 {
    let numeric = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    numeric.unwrap_or(0.0).clamp(0.0, 1.0)
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ranks_by_weighted_score_descending() {
        let programs = vec![
            json!({"name": "rare_low", "burden": 0.1, "tractability": 0.2}),
            json!({"name": "pandemic_high", "burden": 0.95, "tractability": 0.8, "unmet_need": 0.9}),
        ];
        let ranked = rank_disease_programs(&programs, &PortfolioWeights::default());
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].name, "pandemic_high");
        assert!(ranked[0].score > ranked[1].score);
    }

    #[test]
    fn missing_and_out_of_range_criteria_are_bounded() {
        let programs = vec![json!({"name": "odd", "burden": 7.0, "novelty": -3.0})];
        let ranked = rank_disease_programs(&programs, &PortfolioWeights::default());
        // burden clamps to 1.0, novelty to 0.0, all other criteria default to 0.0
        assert_eq!(ranked[0].score, 0.35);
        assert!(ranked[0].rationale.contains(&"burden=1.000".to_string()));
        assert!(ranked[0].rationale.contains(&"novelty=0.000".to_string()));
    }

    #[test]
    fn non_object_entries_are_skipped() {
        let programs = vec![json!("not-a-program"), json!({"disease": "ALS", "burden": 0.5})];
        let ranked = rank_disease_programs(&programs, &PortfolioWeights::default());
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].name, "ALS");
    }

    #[test]
    fn unnamed_program_gets_placeholder() {
        let ranked = rank_disease_programs(&[json!({"burden": 0.4})], &PortfolioWeights::default());
        assert_eq!(ranked[0].name, "unknown");
    }
}
