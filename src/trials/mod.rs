//! Managed clinical trials
//!
//! A small JSON-file store behind the trials-* commands. Every mutating
//! operation loads the store, applies the change, and writes the whole file
//! back; trial volumes here are tens of records, not millions. Simulation is
//! deterministic for a given seed so replays are comparable.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::core::CampaignError;

const DEFAULT_REPLICATES: u32 = 200;

/// One enrolled patient, human or simulated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub patient_id: String,
    pub source: String,
    pub arm_id: Option<String>,
    pub site_id: Option<String>,
    #[serde(default)]
    pub demographics: Value,
    #[serde(default)]
    pub baseline: Value,
    #[serde(default)]
    pub metadata: Value,
    pub enrolled_at: String,
}

/// One recorded patient observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialResult {
    pub result_id: String,
    pub patient_id: String,
    pub result_type: String,
    pub visit: Option<String>,
    pub source: Option<String>,
    pub site_id: Option<String>,
    pub values: Value,
    pub recorded_at: String,
}

/// One managed trial record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trial {
    pub trial_id: String,
    pub indication: Option<String>,
    pub phase: Option<String>,
    pub objective: Option<String>,
    pub status: String,
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub patients: Vec<Patient>,
    #[serde(default)]
    pub results: Vec<TrialResult>,
    #[serde(default)]
    pub simulation: Option<Value>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TrialStore {
    #[serde(default)]
    trials: BTreeMap<String, Trial>,
}

/// Fields accepted by `add_trial`.
#[derive(Debug, Clone, Default)]
pub struct NewTrial {
    pub trial_id: Option<String>,
    pub config: Option<Value>,
    pub indication: Option<String>,
    pub phase: Option<String>,
    pub objective: Option<String>,
    pub status: Option<String>,
    pub metadata: Option<Value>,
}

/// Fields accepted by `enroll_patient`.
#[derive(Debug, Clone, Default)]
pub struct NewPatient {
    pub patient_id: Option<String>,
    pub source: Option<String>,
    pub arm_id: Option<String>,
    pub site_id: Option<String>,
    pub demographics: Option<Value>,
    pub baseline: Option<Value>,
    pub metadata: Option<Value>,
}

/// Fields accepted by `add_result`.
#[derive(Debug, Clone)]
pub struct NewResult {
    pub patient_id: String,
    pub values: Value,
    pub result_type: String,
    pub visit: Option<String>,
    pub source: Option<String>,
    pub site_id: Option<String>,
}

/// File-backed trial controller. Methods return the JSON payloads the CLI
/// prints verbatim.
pub struct ClinicalTrialController {
    store_path: PathBuf,
}

impl ClinicalTrialController {
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
        }
    }

    /// Default store location under the current working directory.
    pub fn default_store_path() -> PathBuf {
        PathBuf::from("data").join("clinical_store.json")
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    pub fn list_trials(&self) -> Result<Value, CampaignError> {
        let store = self.load()?;
        let trials: Vec<Value> = store
            .trials
            .values()
            .map(|trial| serde_json::to_value(trial).unwrap_or(Value::Null))
            .collect();
        Ok(json!({
            "store_path": self.store_path.display().to_string(),
            "count": trials.len(),
            "trials": trials,
        }))
    }

    pub fn get_trial(&self, trial_id: &str) -> Result<Value, CampaignError> {
        let store = self.load()?;
        let trial = store
            .trials
            .get(trial_id)
            .ok_or_else(|| unknown_trial(trial_id))?;
        Ok(json!({
            "store_path": self.store_path.display().to_string(),
            "trial": serde_json::to_value(trial)?,
        }))
    }

    pub fn add_trial(&self, new: NewTrial) -> Result<Value, CampaignError> {
        let mut store = self.load()?;
        let trial_id = new
            .trial_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("trial-{}", Uuid::new_v4()));
        if store.trials.contains_key(&trial_id) {
            return Err(CampaignError::TrialStore(format!(
                "Trial '{trial_id}' already exists."
            )));
        }

        let now = Utc::now().to_rfc3339();
        let trial = Trial {
            trial_id: trial_id.clone(),
            indication: new.indication,
            phase: new.phase,
            objective: new.objective,
            status: new.status.unwrap_or_else(|| "planned".to_string()),
            config: new.config.unwrap_or_else(|| json!({})),
            metadata: new.metadata.unwrap_or_else(|| json!({})),
            patients: Vec::new(),
            results: Vec::new(),
            simulation: None,
            created_at: now.clone(),
            updated_at: now,
        };
        let payload = json!({"trial": serde_json::to_value(&trial)?});
        store.trials.insert(trial_id, trial);
        self.save(&store)?;
        Ok(payload)
    }

    /// Apply a partial patch. Scalar fields replace, `config` and `metadata`
    /// objects merge key by key.
    pub fn update_trial(&self, trial_id: &str, updates: &Value) -> Result<Value, CampaignError> {
        let patch = updates.as_object().ok_or_else(|| {
            CampaignError::TrialStore("Trial updates must be a JSON object.".to_string())
        })?;

        let mut store = self.load()?;
        let trial = store
            .trials
            .get_mut(trial_id)
            .ok_or_else(|| unknown_trial(trial_id))?;

        for (key, value) in patch {
            match key.as_str() {
                "status" => {
                    if let Some(status) = value.as_str() {
                        trial.status = status.to_string();
                    }
                }
                "indication" => trial.indication = value.as_str().map(str::to_string),
                "phase" => trial.phase = value.as_str().map(str::to_string),
                "objective" => trial.objective = value.as_str().map(str::to_string),
                "config" => merge_object(&mut trial.config, value),
                "metadata" => merge_object(&mut trial.metadata, value),
                other => {
                    return Err(CampaignError::TrialStore(format!(
                        "Unsupported trial field '{other}' in updates."
                    )));
                }
            }
        }
        trial.updated_at = Utc::now().to_rfc3339();

        let payload = json!({"trial": serde_json::to_value(&*trial)?});
        self.save(&store)?;
        Ok(payload)
    }

    pub fn remove_trial(&self, trial_id: &str) -> Result<Value, CampaignError> {
        let mut store = self.load()?;
        if store.trials.remove(trial_id).is_none() {
            return Err(unknown_trial(trial_id));
        }
        self.save(&store)?;
        Ok(json!({"trial_id": trial_id, "removed": true}))
    }

    pub fn enroll_patient(&self, trial_id: &str, new: NewPatient) -> Result<Value, CampaignError> {
        let mut store = self.load()?;
        let trial = store
            .trials
            .get_mut(trial_id)
            .ok_or_else(|| unknown_trial(trial_id))?;

        let patient = Patient {
            patient_id: new
                .patient_id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| format!("patient-{}", Uuid::new_v4())),
            source: new.source.unwrap_or_else(|| "human".to_string()),
            arm_id: new.arm_id,
            site_id: new.site_id,
            demographics: new.demographics.unwrap_or_else(|| json!({})),
            baseline: new.baseline.unwrap_or_else(|| json!({})),
            metadata: new.metadata.unwrap_or_else(|| json!({})),
            enrolled_at: Utc::now().to_rfc3339(),
        };
        if trial.patients.iter().any(|p| p.patient_id == patient.patient_id) {
            return Err(CampaignError::TrialStore(format!(
                "Patient '{}' is already enrolled in trial '{trial_id}'.",
                patient.patient_id
            )));
        }

        trial.patients.push(patient.clone());
        trial.updated_at = Utc::now().to_rfc3339();
        let payload = json!({
            "trial_id": trial_id,
            "patient": serde_json::to_value(&patient)?,
            "enrolled": trial.patients.len(),
        });
        self.save(&store)?;
        Ok(payload)
    }

    /// Enroll `count` synthetic patients, alternating arms. Demographics come
    /// from the seeded generator so a fixed seed reproduces the cohort.
    pub fn enroll_simulated_patients(
        &self,
        trial_id: &str,
        count: usize,
        seed: Option<u64>,
    ) -> Result<Value, CampaignError> {
        let mut store = self.load()?;
        let trial = store
            .trials
            .get_mut(trial_id)
            .ok_or_else(|| unknown_trial(trial_id))?;

        let mut rng = SeededRng::new(seed.unwrap_or(0));
        let existing = trial.patients.len();
        let now = Utc::now().to_rfc3339();
        let mut enrolled: Vec<Value> = Vec::with_capacity(count);
        for offset in 0..count.max(1) {
            let index = existing + offset;
            let arm = if index % 2 == 0 { "control" } else { "treatment" };
            let patient = Patient {
                patient_id: format!("sim-{trial_id}-{index:04}"),
                source: "simulated".to_string(),
                arm_id: Some(arm.to_string()),
                site_id: None,
                demographics: json!({
                    "age": 18 + (rng.next_f64() * 62.0) as u64,
                    "sex": if rng.next_f64() < 0.5 { "F" } else { "M" },
                }),
                baseline: json!({"severity": round3(rng.next_f64())}),
                metadata: json!({}),
                enrolled_at: now.clone(),
            };
            enrolled.push(serde_json::to_value(&patient)?);
            trial.patients.push(patient);
        }
        trial.updated_at = now;

        let payload = json!({
            "trial_id": trial_id,
            "enrolled": enrolled.len(),
            "total_patients": trial.patients.len(),
            "patients": enrolled,
        });
        self.save(&store)?;
        Ok(payload)
    }

    pub fn add_result(&self, trial_id: &str, new: NewResult) -> Result<Value, CampaignError> {
        let mut store = self.load()?;
        let trial = store
            .trials
            .get_mut(trial_id)
            .ok_or_else(|| unknown_trial(trial_id))?;
        if !trial.patients.iter().any(|p| p.patient_id == new.patient_id) {
            return Err(CampaignError::TrialStore(format!(
                "Patient '{}' is not enrolled in trial '{trial_id}'.",
                new.patient_id
            )));
        }

        let result = TrialResult {
            result_id: format!("result-{}", Uuid::new_v4()),
            patient_id: new.patient_id,
            result_type: new.result_type,
            visit: new.visit,
            source: new.source,
            site_id: new.site_id,
            values: new.values,
            recorded_at: Utc::now().to_rfc3339(),
        };
        trial.results.push(result.clone());
        trial.updated_at = Utc::now().to_rfc3339();

        let payload = json!({
            "trial_id": trial_id,
            "result": serde_json::to_value(&result)?,
            "result_count": trial.results.len(),
        });
        self.save(&store)?;
        Ok(payload)
    }

    /// Run a seeded Monte Carlo pass and blend the simulated treatment effect
    /// with whatever observed results exist. The simulation payload is stored
    /// on the trial and returned.
    pub fn simulate_trial(
        &self,
        trial_id: &str,
        replicates: Option<u32>,
        seed: Option<u64>,
    ) -> Result<Value, CampaignError> {
        let mut store = self.load()?;
        let trial = store
            .trials
            .get_mut(trial_id)
            .ok_or_else(|| unknown_trial(trial_id))?;

        let replicates = replicates
            .or_else(|| {
                trial
                    .config
                    .get("replicates")
                    .and_then(Value::as_u64)
                    .map(|value| value as u32)
            })
            .unwrap_or(DEFAULT_REPLICATES)
            .max(1);
        let seed = seed.unwrap_or(0);

        let observed: Vec<f64> = trial
            .results
            .iter()
            .filter_map(|result| result.values.get("change").and_then(Value::as_f64))
            .collect();
        let observed_mean = mean(&observed);

        let mut rng = SeededRng::new(seed);
        let mut simulated_effects = Vec::with_capacity(replicates as usize);
        for _ in 0..replicates {
            // treatment effect prior centered at 2.0 with uniform noise
            let effect = 2.0 + (rng.next_f64() - 0.5) * 4.0;
            simulated_effects.push(effect);
        }
        let simulated_mean = mean(&simulated_effects);

        // Observed data dominates as it accumulates: n/(n+4) weighting.
        let observed_n = observed.len() as f64;
        let observed_weight = observed_n / (observed_n + 4.0);
        let blended = match observed_mean {
            Some(observed_mean) => {
                observed_weight * observed_mean
                    + (1.0 - observed_weight) * simulated_mean.unwrap_or(0.0)
            }
            None => simulated_mean.unwrap_or(0.0),
        };

        let simulation = json!({
            "replicates": replicates,
            "seed": seed,
            "generated_at": Utc::now().to_rfc3339(),
            "summary": {
                "observed_results": observed.len(),
                "observed_effect_mean": observed_mean.map(round3),
                "simulated_effect_mean": simulated_mean.map(round3),
                "blended_effect_estimate": round3(blended),
            },
        });
        trial.simulation = Some(simulation.clone());
        trial.updated_at = Utc::now().to_rfc3339();

        let payload = json!({
            "trial_id": trial_id,
            "simulation": simulation,
        });
        self.save(&store)?;
        Ok(payload)
    }

    fn load(&self) -> Result<TrialStore, CampaignError> {
        if !self.store_path.exists() {
            return Ok(TrialStore::default());
        }
        let text = std::fs::read_to_string(&self.store_path)?;
        if text.trim().is_empty() {
            return Ok(TrialStore::default());
        }
        serde_json::from_str(&text).map_err(|e| {
            CampaignError::TrialStore(format!(
                "Trial store {} is corrupt: {e}",
                self.store_path.display()
            ))
        })
    }

    fn save(&self, store: &TrialStore) -> Result<(), CampaignError> {
        if let Some(parent) = self.store_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let rendered = serde_json::to_string_pretty(store)?;
        std::fs::write(&self.store_path, rendered + "\n")?;
        Ok(())
    }
}

fn unknown_trial(trial_id: &str) -> CampaignError {
    CampaignError::TrialStore(format!("Unknown trial '{trial_id}'."))
}

/// Merge an object patch into an existing object field key by key.
/// Non-object patches are ignored; these fields are always objects.
fn merge_object(target: &mut Value, patch: &Value) {
    let Some(incoming) = patch.as_object() else {
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Some(existing) = target.as_object_mut() {
        for (key, value) in incoming {
            existing.insert(key.clone(), value.clone());
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Linear congruential generator (numerical recipes constants). Good enough
/// for reproducible synthetic cohorts, not for statistics-grade sampling.
struct SeededRng {
    state: u64,
}

impl SeededRng {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407),
        }
    }

    fn next_f64(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.state >> 11) as f64) / ((1u64 << 53) as f64)
    }
}
