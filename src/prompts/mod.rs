//! Campaign prompt assembly.

use std::path::Path;

use crate::core::CampaignError;

/// Shipped with the binary so a bare checkout can plan without extra files.
const DEFAULT_SYSTEM_PROMPT: &str = include_str!("default_system_prompt.txt");

/// Load the campaign system prompt, from an override file when given.
pub fn load_system_prompt(path: Option<&Path>) -> Result<String, CampaignError> {
    match path {
        Some(path) => Ok(std::fs::read_to_string(path)?.trim().to_string()),
        None => Ok(DEFAULT_SYSTEM_PROMPT.trim().to_string()),
    }
}

/// Strict output-contract suffix appended to every planner instruction block.
pub fn planner_suffix(allowed_tools: &[String]) -> String {
    let mut sorted: Vec<&str> = allowed_tools.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    let tools = sorted.join(", ");
    format!(
        "Output only valid JSON with this shape: \
         {{\"calls\":[{{\"tool\":\"<name>\",\"args\":{{...}}}}]}}. \
         Allowed tools: {tools}. \
         Never emit markdown, prose, or comments."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_prompt_is_nonempty_and_trimmed() {
        let prompt = load_system_prompt(None).unwrap();
        assert!(prompt.contains("ClawCures"));
        assert_eq!(prompt, prompt.trim());
    }

    #[test]
    fn override_file_wins() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  custom mission prompt  ").unwrap();
        let prompt = load_system_prompt(Some(file.path())).unwrap();
        assert_eq!(prompt, "custom mission prompt");
    }

    #[test]
    fn suffix_sorts_tools_and_states_contract() {
        let suffix = planner_suffix(&["refua_fold".into(), "refua_affinity".into()]);
        assert!(suffix.contains("refua_affinity, refua_fold"));
        assert!(suffix.starts_with("Output only valid JSON"));
        assert!(suffix.ends_with("Never emit markdown, prose, or comments."));
    }
}
