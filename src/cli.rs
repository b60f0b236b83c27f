//! ClawCures command-line interface
//!
//! Every command prints one JSON payload (or plain text for the prompt and
//! tool listing) so output composes with jq and file redirection. Failures
//! propagate to main, which renders them on stderr and exits nonzero.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use crate::autonomy::{evaluate_plan_policy, AutonomousPlanner, PlanPolicy};
use crate::config::load_config;
use crate::core::CampaignError;
use crate::cures::{extract_promising_cures, summarize_promising_cures};
use crate::openclaw::OpenClawClient;
use crate::orchestrator::CampaignOrchestrator;
use crate::portfolio::{rank_disease_programs, PortfolioWeights};
use crate::prompts::load_system_prompt;
use crate::tools::{StaticToolAdapter, ToolAdapter};
use crate::trials::{ClinicalTrialController, NewPatient, NewResult, NewTrial};

pub const DEFAULT_OBJECTIVE: &str = "Find cures for all diseases by prioritizing the \
    highest-burden conditions and researching the best drug design strategies for each.";

#[derive(Parser)]
#[command(name = "clawcures")]
#[command(about = "Campaign orchestration on top of OpenClaw planning and refua tool execution.", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one plan+execute cycle
    Run {
        /// Campaign objective for the planner
        #[arg(long, default_value = DEFAULT_OBJECTIVE)]
        objective: String,

        /// Optional override for the default campaign system prompt
        #[arg(long)]
        system_prompt_file: Option<PathBuf>,

        /// Generate and print the plan without executing tools
        #[arg(long)]
        dry_run: bool,

        /// Optional path to write run JSON output
        #[arg(long)]
        output: Option<PathBuf>,

        /// Optional JSON plan file; when set, OpenClaw planning is skipped
        #[arg(long)]
        plan_file: Option<PathBuf>,
    },

    /// Run the planner/critic autonomous loop with policy checks
    RunAutonomous {
        /// Campaign objective for the planner
        #[arg(long, default_value = DEFAULT_OBJECTIVE)]
        objective: String,

        /// Optional override for the default campaign system prompt
        #[arg(long)]
        system_prompt_file: Option<PathBuf>,

        /// Maximum planner/critic rounds
        #[arg(long, default_value_t = 3)]
        max_rounds: usize,

        /// Maximum number of tool calls allowed in a plan
        #[arg(long, default_value_t = 10)]
        max_calls: usize,

        /// Disable the warning that the first call should be refua_validate_spec
        #[arg(long)]
        allow_skip_validate_first: bool,

        /// Do not execute tools after approval; emit the final plan only
        #[arg(long)]
        dry_run: bool,

        /// Optional path to write run JSON output
        #[arg(long)]
        output: Option<PathBuf>,

        /// Optional JSON plan file; when set, autonomous planning is skipped
        #[arg(long)]
        plan_file: Option<PathBuf>,
    },

    /// Print the default campaign system prompt
    PrintDefaultPrompt,

    /// List supported refua tools
    ListTools,

    /// Validate a JSON tool plan against autonomy policy
    ValidatePlan {
        /// Path to the JSON plan file
        #[arg(long)]
        plan_file: PathBuf,

        /// Maximum number of calls allowed
        #[arg(long, default_value_t = 10)]
        max_calls: usize,

        /// Disable the warning that the first call should be refua_validate_spec
        #[arg(long)]
        allow_skip_validate_first: bool,
    },

    /// Rank disease programs from a JSON list using weighted scoring
    RankPortfolio {
        /// JSON file containing a list of disease program objects
        #[arg(long)]
        input: PathBuf,

        /// Optional path to write ranking output JSON
        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long, default_value_t = 0.35)]
        w_burden: f64,
        #[arg(long, default_value_t = 0.25)]
        w_tractability: f64,
        #[arg(long, default_value_t = 0.20)]
        w_unmet_need: f64,
        #[arg(long, default_value_t = 0.10)]
        w_translational_readiness: f64,
        #[arg(long, default_value_t = 0.10)]
        w_novelty: f64,
    },

    /// List managed clinical trials
    TrialsList {
        /// Optional trial store file path override
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Get one managed clinical trial by id
    TrialsGet {
        #[arg(long)]
        trial_id: String,
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Add a managed clinical trial
    TrialsAdd {
        #[arg(long)]
        trial_id: Option<String>,
        /// JSON file with the trial design config
        #[arg(long)]
        config_file: Option<PathBuf>,
        #[arg(long)]
        indication: Option<String>,
        #[arg(long)]
        phase: Option<String>,
        #[arg(long)]
        objective: Option<String>,
        #[arg(long, default_value = "planned")]
        status: String,
        /// Optional JSON object for trial metadata
        #[arg(long)]
        metadata_json: Option<String>,
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Apply partial updates to a managed trial
    TrialsUpdate {
        #[arg(long)]
        trial_id: String,
        /// JSON object patch, e.g. '{"status":"active"}'
        #[arg(long)]
        updates_json: String,
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Remove a managed clinical trial
    TrialsRemove {
        #[arg(long)]
        trial_id: String,
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Enroll a patient (human or simulated) in a managed trial
    TrialsEnroll {
        #[arg(long)]
        trial_id: String,
        #[arg(long)]
        patient_id: Option<String>,
        #[arg(long, default_value = "human")]
        source: String,
        #[arg(long)]
        arm_id: Option<String>,
        #[arg(long)]
        demographics_json: Option<String>,
        #[arg(long)]
        baseline_json: Option<String>,
        #[arg(long)]
        metadata_json: Option<String>,
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Enroll simulated patients in a managed trial
    TrialsEnrollSimulated {
        #[arg(long)]
        trial_id: String,
        #[arg(long)]
        count: usize,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Add a patient result to a managed trial
    TrialsResult {
        #[arg(long)]
        trial_id: String,
        #[arg(long)]
        patient_id: String,
        /// JSON object containing endpoint/result values
        #[arg(long)]
        values_json: String,
        #[arg(long, default_value = "endpoint")]
        result_type: String,
        #[arg(long)]
        visit: Option<String>,
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Run or refresh simulation for a managed trial
    TrialsSimulate {
        #[arg(long)]
        trial_id: String,
        #[arg(long)]
        replicates: Option<u32>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        store: Option<PathBuf>,
    },
}

pub async fn run(cli: Cli) -> Result<(), CampaignError> {
    match cli.command {
        Commands::Run {
            objective,
            system_prompt_file,
            dry_run,
            output,
            plan_file,
        } => cmd_run(&objective, system_prompt_file.as_deref(), dry_run, output.as_deref(), plan_file.as_deref()).await,
        Commands::RunAutonomous {
            objective,
            system_prompt_file,
            max_rounds,
            max_calls,
            allow_skip_validate_first,
            dry_run,
            output,
            plan_file,
        } => {
            cmd_run_autonomous(
                &objective,
                system_prompt_file.as_deref(),
                max_rounds,
                max_calls,
                allow_skip_validate_first,
                dry_run,
                output.as_deref(),
                plan_file.as_deref(),
            )
            .await
        }
        Commands::PrintDefaultPrompt => {
            println!("{}", load_system_prompt(None)?);
            Ok(())
        }
        Commands::ListTools => {
            let (adapter, warning) = build_adapter();
            if let Some(warning) = warning {
                eprintln!("warning: {warning}");
            }
            for name in adapter.available_tools() {
                println!("{name}");
            }
            Ok(())
        }
        Commands::ValidatePlan {
            plan_file,
            max_calls,
            allow_skip_validate_first,
        } => cmd_validate_plan(&plan_file, max_calls, allow_skip_validate_first),
        Commands::RankPortfolio {
            input,
            output,
            w_burden,
            w_tractability,
            w_unmet_need,
            w_translational_readiness,
            w_novelty,
        } => {
            let weights = PortfolioWeights {
                burden: w_burden,
                tractability: w_tractability,
                unmet_need: w_unmet_need,
                translational_readiness: w_translational_readiness,
                novelty: w_novelty,
            };
            cmd_rank_portfolio(&input, output.as_deref(), &weights)
        }
        Commands::TrialsList { store } => print_payload(&controller(store).list_trials()?, None),
        Commands::TrialsGet { trial_id, store } => {
            print_payload(&controller(store).get_trial(&trial_id)?, None)
        }
        Commands::TrialsAdd {
            trial_id,
            config_file,
            indication,
            phase,
            objective,
            status,
            metadata_json,
            store,
        } => {
            let config = match config_file {
                Some(path) => Some(load_json_object_file(&path, "--config-file")?),
                None => None,
            };
            let payload = controller(store).add_trial(NewTrial {
                trial_id,
                config,
                indication,
                phase,
                objective,
                status: Some(status),
                metadata: parse_optional_json_object(metadata_json.as_deref(), "--metadata-json")?,
            })?;
            print_payload(&payload, None)
        }
        Commands::TrialsUpdate {
            trial_id,
            updates_json,
            store,
        } => {
            let updates = parse_json_object_flag(&updates_json, "--updates-json")?;
            print_payload(&controller(store).update_trial(&trial_id, &updates)?, None)
        }
        Commands::TrialsRemove { trial_id, store } => {
            print_payload(&controller(store).remove_trial(&trial_id)?, None)
        }
        Commands::TrialsEnroll {
            trial_id,
            patient_id,
            source,
            arm_id,
            demographics_json,
            baseline_json,
            metadata_json,
            store,
        } => {
            let payload = controller(store).enroll_patient(
                &trial_id,
                NewPatient {
                    patient_id,
                    source: Some(source),
                    arm_id,
                    site_id: None,
                    demographics: parse_optional_json_object(
                        demographics_json.as_deref(),
                        "--demographics-json",
                    )?,
                    baseline: parse_optional_json_object(baseline_json.as_deref(), "--baseline-json")?,
                    metadata: parse_optional_json_object(metadata_json.as_deref(), "--metadata-json")?,
                },
            )?;
            print_payload(&payload, None)
        }
        Commands::TrialsEnrollSimulated {
            trial_id,
            count,
            seed,
            store,
        } => print_payload(
            &controller(store).enroll_simulated_patients(&trial_id, count.max(1), seed)?,
            None,
        ),
        Commands::TrialsResult {
            trial_id,
            patient_id,
            values_json,
            result_type,
            visit,
            source,
            store,
        } => {
            let values = parse_json_object_flag(&values_json, "--values-json")?;
            let payload = controller(store).add_result(
                &trial_id,
                NewResult {
                    patient_id,
                    values,
                    result_type,
                    visit,
                    source,
                    site_id: None,
                },
            )?;
            print_payload(&payload, None)
        }
        Commands::TrialsSimulate {
            trial_id,
            replicates,
            seed,
            store,
        } => print_payload(
            &controller(store).simulate_trial(&trial_id, replicates, seed)?,
            None,
        ),
    }
}

async fn cmd_run(
    objective: &str,
    system_prompt_file: Option<&Path>,
    dry_run: bool,
    output: Option<&Path>,
    plan_file: Option<&Path>,
) -> Result<(), CampaignError> {
    let system_prompt = load_system_prompt(system_prompt_file)?;
    let app_config = load_config(None)?;
    let (adapter, adapter_warning) = build_adapter();

    let (planner_text, plan) = match plan_file {
        Some(path) => ("Loaded from --plan-file".to_string(), load_json_object_file(path, "--plan-file")?),
        None => {
            let openclaw = Arc::new(OpenClawClient::new(&app_config.openclaw)?);
            let orchestrator = CampaignOrchestrator::new(openclaw, adapter.clone());
            orchestrator.plan(objective, &system_prompt).await?
        }
    };

    let payload = if dry_run {
        let mut payload = json!({
            "objective": objective,
            "system_prompt": system_prompt,
            "planner_response_text": planner_text,
            "plan": plan,
            "dry_run": true,
        });
        if let Some(warning) = &adapter_warning {
            payload["warnings"] = json!([warning]);
        }
        payload
    } else {
        if let Some(warning) = adapter_warning {
            return Err(CampaignError::ToolExecution(warning));
        }
        let results = adapter.execute_plan(&plan).await?;
        let cures = extract_promising_cures(&results, app_config.extraction.min_score);
        let summary = summarize_promising_cures(&cures);
        json!({
            "objective": objective,
            "system_prompt": system_prompt,
            "planner_response_text": planner_text,
            "plan": plan,
            "results": results,
            "promising_cures": cures,
            "promising_cures_summary": summary,
            "dry_run": false,
        })
    };

    print_payload(&payload, output)
}

#[allow(clippy::too_many_arguments)]
async fn cmd_run_autonomous(
    objective: &str,
    system_prompt_file: Option<&Path>,
    max_rounds: usize,
    max_calls: usize,
    allow_skip_validate_first: bool,
    dry_run: bool,
    output: Option<&Path>,
    plan_file: Option<&Path>,
) -> Result<(), CampaignError> {
    let system_prompt = load_system_prompt(system_prompt_file)?;
    let app_config = load_config(None)?;
    let (adapter, adapter_warning) = build_adapter();
    let policy = PlanPolicy {
        max_calls: max_calls.max(1),
        require_validate_first: !allow_skip_validate_first,
        ..PlanPolicy::default()
    };

    let mut payload = match plan_file {
        Some(path) => {
            // Offline mode: gate the given plan, skip planner and critic.
            let plan = load_json_object_file(path, "--plan-file")?;
            let check = evaluate_plan_policy(&plan, &adapter.available_tools(), &policy);
            let approved = check.approved;
            json!({
                "objective": objective,
                "system_prompt": system_prompt,
                "approved": approved,
                "iterations": [{
                    "round_index": 1,
                    "planner_text": "Loaded from --plan-file",
                    "plan": plan.clone(),
                    "policy": check,
                    "critic_text": "Skipped (offline plan file mode).",
                    "critic": {"approved": approved},
                }],
                "final_plan": plan,
            })
        }
        None => {
            let openclaw = Arc::new(OpenClawClient::new(&app_config.openclaw)?);
            let planner = AutonomousPlanner::new(openclaw, adapter.available_tools(), policy);
            let result = planner
                .run(objective, &system_prompt, max_rounds.max(1))
                .await?;
            serde_json::to_value(&result)?
        }
    };

    payload["dry_run"] = json!(dry_run);
    if let Some(warning) = &adapter_warning {
        push_warning(&mut payload, warning);
    }

    let approved = payload["approved"].as_bool().unwrap_or(false);
    if approved && !dry_run {
        if let Some(warning) = adapter_warning {
            return Err(CampaignError::ToolExecution(warning));
        }
        let final_plan = payload["final_plan"].clone();
        let results = adapter.execute_plan(&final_plan).await?;
        let cures = extract_promising_cures(&results, app_config.extraction.min_score);
        payload["results"] = serde_json::to_value(&results)?;
        payload["promising_cures"] = serde_json::to_value(&cures)?;
        payload["promising_cures_summary"] = serde_json::to_value(summarize_promising_cures(&cures))?;
    } else if !approved {
        push_warning(&mut payload, "Autonomous loop finished without an approved plan.");
    }

    print_payload(&payload, output)
}

fn cmd_validate_plan(
    plan_file: &Path,
    max_calls: usize,
    allow_skip_validate_first: bool,
) -> Result<(), CampaignError> {
    let plan = load_json_object_file(plan_file, "--plan-file")?;
    let (adapter, adapter_warning) = build_adapter();
    let policy = PlanPolicy {
        max_calls: max_calls.max(1),
        require_validate_first: !allow_skip_validate_first,
        ..PlanPolicy::default()
    };
    let check = evaluate_plan_policy(&plan, &adapter.available_tools(), &policy);

    let mut payload = serde_json::to_value(&check)?;
    if let Some(warning) = adapter_warning {
        if let Some(warnings) = payload["warnings"].as_array_mut() {
            warnings.push(json!(warning));
        }
    }
    print_payload(&payload, None)
}

fn cmd_rank_portfolio(
    input: &Path,
    output: Option<&Path>,
    weights: &PortfolioWeights,
) -> Result<(), CampaignError> {
    let payload: Value = serde_json::from_str(&std::fs::read_to_string(input)?)?;
    let programs = payload.as_array().ok_or_else(|| {
        CampaignError::Config("--input must contain a JSON list of disease programs.".to_string())
    })?;

    let ranked = rank_disease_programs(programs, weights);
    let rendered = json!({
        "weights": serde_json::to_value(weights)?,
        "ranked": serde_json::to_value(&ranked)?,
    });
    print_payload(&rendered, output)
}

/// The refua runtime is an external deployment. The CLI always plans against
/// the static manifest; embedding callers wire a RegistryAdapter instead.
fn build_adapter() -> (Arc<dyn ToolAdapter>, Option<String>) {
    (
        Arc::new(StaticToolAdapter),
        Some("refua tool runtime is not installed; using the static tool manifest.".to_string()),
    )
}

fn controller(store: Option<PathBuf>) -> ClinicalTrialController {
    ClinicalTrialController::new(store.unwrap_or_else(ClinicalTrialController::default_store_path))
}

fn print_payload(payload: &Value, output: Option<&Path>) -> Result<(), CampaignError> {
    let rendered = serde_json::to_string_pretty(payload)?;
    println!("{rendered}");
    if let Some(path) = output {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, rendered + "\n")?;
    }
    Ok(())
}

fn push_warning(payload: &mut Value, warning: &str) {
    match payload.get_mut("warnings").and_then(Value::as_array_mut) {
        Some(warnings) => warnings.push(json!(warning)),
        None => payload["warnings"] = json!([warning]),
    }
}

fn load_json_object_file(path: &Path, flag: &str) -> Result<Value, CampaignError> {
    let payload: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    if !payload.is_object() {
        return Err(CampaignError::Config(format!(
            "{flag} must contain a JSON object."
        )));
    }
    Ok(payload)
}

fn parse_json_object_flag(raw: &str, flag: &str) -> Result<Value, CampaignError> {
    let payload: Value = serde_json::from_str(raw)?;
    if !payload.is_object() {
        return Err(CampaignError::Config(format!("{flag} must be a JSON object.")));
    }
    Ok(payload)
}

fn parse_optional_json_object(
    raw: Option<&str>,
    flag: &str,
) -> Result<Option<Value>, CampaignError> {
    raw.map(|value| parse_json_object_flag(value, flag)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_defaults_to_all_disease_objective() {
        let cli = Cli::try_parse_from(["clawcures", "run", "--dry-run"]).unwrap();
        match cli.command {
            Commands::Run { objective, dry_run, .. } => {
                assert_eq!(objective, DEFAULT_OBJECTIVE);
                assert!(dry_run);
            }
            _ => panic!("expected run command"),
        }
    }

    #[tokio::test]
    async fn list_tools_reports_static_manifest_warning() {
        let (adapter, warning) = build_adapter();
        assert!(!adapter.available_tools().is_empty());
        assert!(warning.unwrap().contains("static tool manifest"));

        let cli = Cli::try_parse_from(["clawcures", "list-tools"]).unwrap();
        run(cli).await.unwrap();
    }

    #[test]
    fn run_autonomous_defaults() {
        let cli = Cli::try_parse_from(["clawcures", "run-autonomous"]).unwrap();
        match cli.command {
            Commands::RunAutonomous {
                objective,
                max_rounds,
                max_calls,
                allow_skip_validate_first,
                ..
            } => {
                assert_eq!(objective, DEFAULT_OBJECTIVE);
                assert_eq!(max_rounds, 3);
                assert_eq!(max_calls, 10);
                assert!(!allow_skip_validate_first);
            }
            _ => panic!("expected run-autonomous command"),
        }
    }

    #[test]
    fn trials_add_accepts_metadata_json() {
        let cli = Cli::try_parse_from([
            "clawcures",
            "trials-add",
            "--trial-id",
            "cc-demo",
            "--metadata-json",
            r#"{"sponsor":"clawcures"}"#,
        ])
        .unwrap();
        match cli.command {
            Commands::TrialsAdd {
                trial_id,
                status,
                metadata_json,
                ..
            } => {
                assert_eq!(trial_id.as_deref(), Some("cc-demo"));
                assert_eq!(status, "planned");
                assert!(metadata_json.unwrap().contains("sponsor"));
            }
            _ => panic!("expected trials-add command"),
        }
    }

    #[test]
    fn json_flag_parsing_rejects_non_objects() {
        assert!(parse_json_object_flag(r#"{"a":1}"#, "--updates-json").is_ok());
        assert!(parse_json_object_flag("[1,2]", "--updates-json").is_err());
        assert!(parse_optional_json_object(None, "--metadata-json").unwrap().is_none());
    }
}
