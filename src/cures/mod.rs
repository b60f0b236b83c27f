//! Promising-cure extraction
//!
//! Turns arbitrary nested tool-execution payloads into ranked, explainable
//! candidate records. The engine is pure: each invocation is independent,
//! no state survives between calls, and every sourced field keeps the path
//! it was taken from as provenance.

pub mod flatten;
pub mod scoring;

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cures::flatten::{coerce_float, flatten, pick_bool, pick_float, pick_string, FlatMap};
use crate::cures::scoring::{
    assessment_from_score, has_negative_hint, round2, score_candidate, CureMetrics, ScoreWeights,
};
use crate::tools::ExecutionResult;

/// Default score threshold for the promising classification.
pub const DEFAULT_MIN_SCORE: f64 = 55.0;

/// Path substrings that mark ADMET-related leaves worth harvesting.
const ADMET_PATH_HINTS: [&str; 16] = [
    "admet",
    "tox",
    "herg",
    "ames",
    "dili",
    "carcinogen",
    "clintox",
    "clearance",
    "half_life",
    "bioavailability",
    "solubility",
    "permeability",
    "caco2",
    "pampa",
    "cyp",
    "metabolic",
];

const ADMET_KEY_METRICS: [&str; 4] = ["admet_score", "safety_score", "adme_score", "rdkit_score"];

/// Harvested ADMET block: raw properties keyed by normalized path, the four
/// resolvable key metrics, and an optional status. Properties keep payload
/// order (serde_json preserve_order).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdmetPayload {
    pub properties: Map<String, Value>,
    pub key_metrics: BTreeMap<String, Option<f64>>,
    pub status: Option<String>,
}

/// One scored, classified candidate derived from one tool-execution result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromisingCure {
    pub cure_id: String,
    pub name: Option<String>,
    pub smiles: Option<String>,
    pub target: Option<String>,
    pub tool: String,
    pub score: f64,
    pub promising: bool,
    pub assessment: Option<String>,
    pub metrics: CureMetrics,
    pub admet: AdmetPayload,
    pub evidence_paths: BTreeMap<String, String>,
    pub tool_args: Value,
}

/// Aggregate over one extraction batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CureSummary {
    pub total_candidates: usize,
    pub promising_count: usize,
    pub with_admet_properties: usize,
}

/// Extract candidates with the default score weights.
pub fn extract_promising_cures(results: &[ExecutionResult], min_score: f64) -> Vec<PromisingCure> {
    extract_promising_cures_with(results, min_score, &ScoreWeights::default())
}

/// Extract, score, classify, and rank candidates from execution results.
/// Results with no numeric signal and no SMILES yield nothing.
pub fn extract_promising_cures_with(
    results: &[ExecutionResult],
    min_score: f64,
    weights: &ScoreWeights,
) -> Vec<PromisingCure> {
    let mut extracted: Vec<PromisingCure> = results
        .iter()
        .enumerate()
        .filter_map(|(index, result)| extract_cure_from_result(result, index, min_score, weights))
        .collect();
    // stable: ties keep original result order
    extracted.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    extracted
}

/// Pure aggregate over an extraction batch.
pub fn summarize_promising_cures(cures: &[PromisingCure]) -> CureSummary {
    CureSummary {
        total_candidates: cures.len(),
        promising_count: cures.iter().filter(|cure| cure.promising).count(),
        with_admet_properties: cures
            .iter()
            .filter(|cure| !cure.admet.properties.is_empty())
            .count(),
    }
}

fn extract_cure_from_result(
    result: &ExecutionResult,
    index: usize,
    min_score: f64,
    weights: &ScoreWeights,
) -> Option<PromisingCure> {
    let mut flat = FlatMap::new();
    flatten(&result.args, "args", &mut flat);
    flatten(&result.output, "output", &mut flat);

    let mut evidence_paths: BTreeMap<String, String> = BTreeMap::new();
    fn note_path(field: &str, path: &str, paths: &mut BTreeMap<String, String>) {
        paths.insert(field.to_string(), path.to_string());
    }

    let name = pick_string(&flat, &["name", "candidate_name", "compound_name", "ligand_name", "binder"])
        .map(|(value, path)| {
            note_path("name", &path, &mut evidence_paths);
            value
        });
    let smiles = pick_string(&flat, &["smiles", "ligand_smiles", "compound_smiles"]).map(|(value, path)| {
        note_path("smiles", &path, &mut evidence_paths);
        value
    });
    let target = pick_string(&flat, &["target", "target_name", "protein", "antigen"]).map(|(value, path)| {
        note_path("target", &path, &mut evidence_paths);
        value
    });

    let binding_probability = pick_float(
        &flat,
        &["binding_probability", "predicted_probability", "p_bind", "probability"],
    )
    .map(|(value, path)| {
        note_path("binding_probability", &path, &mut evidence_paths);
        value
    });
    let affinity = pick_float(&flat, &["affinity", "predicted_affinity", "delta_g"]).map(|(value, path)| {
        note_path("affinity", &path, &mut evidence_paths);
        value
    });
    let ic50 = pick_float(&flat, &["ic50", "predicted_ic50"]).map(|(value, path)| {
        note_path("ic50", &path, &mut evidence_paths);
        value
    });
    let kd = pick_float(&flat, &["kd", "predicted_kd"]).map(|(value, path)| {
        note_path("kd", &path, &mut evidence_paths);
        value
    });

    let admet_properties = collect_admet_properties(&flat);
    let admet_key_metrics = collect_admet_key_metrics(&admet_properties);
    let admet_score = admet_key_metrics.get("admet_score").copied().flatten();
    if admet_score.is_some() {
        evidence_paths
            .entry("admet_score".to_string())
            .or_insert_with(|| "admet.properties.admet_score".to_string());
    }

    let mut assessment = pick_string(
        &flat,
        &["assessment", "assessment_text", "admet_assessment", "safety_assessment", "summary"],
    )
    .map(|(value, path)| {
        note_path("assessment", &path, &mut evidence_paths);
        value
    });

    let metrics = CureMetrics {
        binding_probability,
        admet_score,
        affinity,
        ic50,
        kd,
    };

    if !metrics.any_resolved() && smiles.is_none() {
        return None;
    }

    let explicit_score = pick_float(&flat, &["promising_score", "priority_score", "composite_score"]);
    let score = match explicit_score {
        Some((value, _)) => round2(value.clamp(0.0, 100.0)),
        None => score_candidate(&metrics, assessment.as_deref(), weights),
    };

    if assessment.is_none() {
        assessment = Some(assessment_from_score(score, admet_score));
    }

    let explicit_promising = pick_bool(&flat, &["promising", "is_promising", "recommended", "is_recommended"]);
    let promising = match explicit_promising {
        Some((flag, _)) => flag,
        None => {
            let negative = assessment
                .as_deref()
                .map(has_negative_hint)
                .unwrap_or(false);
            score >= min_score && !negative
        }
    };

    Some(PromisingCure {
        cure_id: resolve_cure_id(name.as_deref(), smiles.as_deref(), &result.tool, index),
        name,
        smiles,
        target,
        tool: result.tool.clone(),
        score,
        promising,
        assessment,
        metrics,
        admet: AdmetPayload {
            properties: admet_properties.into_iter().collect(),
            key_metrics: admet_key_metrics,
            status: infer_admet_status(&flat),
        },
        evidence_paths,
        tool_args: result.args.clone(),
    })
}

/// Select ADMET-flavored leaves in walk order, skipping raw-output dumps; the
/// normalized path becomes the property key, first occurrence wins on collision.
fn collect_admet_properties(flat: &FlatMap) -> Vec<(String, Value)> {
    let mut properties: Vec<(String, Value)> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for (path, value) in flat {
        let lowered = path.to_lowercase();
        if lowered.contains("raw_output") {
            continue;
        }
        if !ADMET_PATH_HINTS.iter().any(|hint| lowered.contains(hint)) {
            continue;
        }
        let key = normalize_admet_key(path);
        if seen.insert(key.clone()) {
            properties.push((key, value.clone()));
        }
    }
    properties
}

fn collect_admet_key_metrics(properties: &[(String, Value)]) -> BTreeMap<String, Option<f64>> {
    ADMET_KEY_METRICS
        .iter()
        .map(|metric| (metric.to_string(), find_admet_metric(properties, metric)))
        .collect()
}

/// Exact key first, then the first property in harvest order whose key
/// contains the metric name with a numeric-coercible value.
fn find_admet_metric(properties: &[(String, Value)], metric_name: &str) -> Option<f64> {
    if let Some((_, direct)) = properties.iter().find(|(key, _)| key == metric_name) {
        if let Value::Number(number) = direct {
            return number.as_f64();
        }
    }
    for (key, value) in properties {
        if !key.to_lowercase().contains(metric_name) {
            continue;
        }
        if value.is_boolean() {
            continue;
        }
        if let Some(number) = coerce_float(value) {
            return Some(number);
        }
    }
    None
}

/// Strip the output root; when an `admet.` segment exists, keep only what
/// follows it, so `output.admet.results[0].admet_score` and a top-level
/// `admet_score` collapse to the same key.
fn normalize_admet_key(path: &str) -> String {
    let key = path.strip_prefix("output.").unwrap_or(path);
    match key.find("admet.") {
        Some(idx) => key[idx + "admet.".len()..].to_string(),
        None => key.to_string(),
    }
}

fn infer_admet_status(flat: &FlatMap) -> Option<String> {
    let (value, _) = pick_string(flat, &["admet_status", "status"])?;
    let lowered = value.to_lowercase();
    if lowered.contains("success") {
        Some("success".to_string())
    } else if lowered.contains("unavailable") {
        Some("unavailable".to_string())
    } else if lowered.contains("failed") {
        Some("failed".to_string())
    } else {
        Some(value)
    }
}

/// Deterministic id: tool plus a slug of the name, the SMILES prefix, or the
/// positional index as a last resort.
fn resolve_cure_id(name: Option<&str>, smiles: Option<&str>, tool: &str, index: usize) -> String {
    if let Some(name) = name {
        return format!("{tool}:{}", slugify(name));
    }
    if let Some(smiles) = smiles {
        let prefix: String = smiles.chars().take(20).collect();
        return format!("{tool}:{}", slugify(&prefix));
    }
    format!("{tool}:{index}")
}

fn slugify(value: &str) -> String {
    let mut cleaned = String::new();
    for ch in value.to_lowercase().chars() {
        if ch.is_alphanumeric() {
            cleaned.push(ch);
        } else if !cleaned.is_empty() && !cleaned.ends_with('-') {
            cleaned.push('-');
        }
    }
    let slug = cleaned.trim_matches('-').to_string();
    if slug.is_empty() {
        "candidate".to_string()
    } else {
        slug
    }
}
