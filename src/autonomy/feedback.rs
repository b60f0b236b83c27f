//! Feedback aggregation
//!
//! Merges policy findings and critic findings into one guidance list for the
//! next planning round. Fixed priority order: policy errors, policy warnings,
//! critic issues, suggested fixes. Deduplicated on trimmed equality, first
//! occurrence kept. An empty result means there is nothing new to act on and
//! the loop must stop rather than spin.

use std::collections::HashSet;

use crate::autonomy::critic::CriticVerdict;
use crate::autonomy::policy::PolicyCheck;

pub fn build_feedback(policy: &PolicyCheck, critic: &CriticVerdict) -> Vec<String> {
    let mut deduped: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    let ordered = policy
        .errors
        .iter()
        .chain(policy.warnings.iter())
        .chain(critic.issues.iter())
        .chain(critic.suggested_fixes.iter());

    for item in ordered {
        let normalized = item.trim();
        if normalized.is_empty() || seen.contains(normalized) {
            continue;
        }
        seen.insert(normalized.to_string());
        deduped.push(normalized.to_string());
    }
    deduped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(errors: &[&str], warnings: &[&str]) -> PolicyCheck {
        PolicyCheck {
            approved: errors.is_empty(),
            errors: errors.iter().map(|s| s.to_string()).collect(),
            warnings: warnings.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn critic(issues: &[&str], fixes: &[&str]) -> CriticVerdict {
        CriticVerdict {
            approved: false,
            issues: issues.iter().map(|s| s.to_string()).collect(),
            suggested_fixes: fixes.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn dedupes_in_first_seen_order() {
        let merged = build_feedback(&policy(&["a", "a", "b"], &[]), &critic(&["b", "c"], &[]));
        assert_eq!(merged, vec!["a", "b", "c"]);
    }

    #[test]
    fn priority_order_is_errors_warnings_issues_fixes() {
        let merged = build_feedback(&policy(&["err"], &["warn"]), &critic(&["issue"], &["fix"]));
        assert_eq!(merged, vec!["err", "warn", "issue", "fix"]);
    }

    #[test]
    fn whitespace_only_entries_are_dropped() {
        let merged = build_feedback(&policy(&["  "], &[]), &critic(&[" x "], &[]));
        assert_eq!(merged, vec!["x"]);
    }

    #[test]
    fn empty_inputs_yield_empty_feedback() {
        assert!(build_feedback(&policy(&[], &[]), &critic(&[], &[])).is_empty());
    }
}
