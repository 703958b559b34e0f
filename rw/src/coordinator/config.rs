//! Coordinator configuration

use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::messages::PendingEntry;
use crate::action::Namespace;

/// How a SUCCESS signal is matched back to pending entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchRule {
    /// Settle an entry only when both its kind and start mark equal the signal's
    #[default]
    Exact,

    /// Settle every entry sharing either the kind or the start mark with the signal.
    /// Two in-flight effects of the same kind are both settled by the first
    /// success; kept for applications that depend on that behaviour.
    AnyField,
}

impl MatchRule {
    /// Whether `signal` settles `entry` under this rule
    pub fn settles(self, entry: &PendingEntry, signal: &PendingEntry) -> bool {
        match self {
            MatchRule::Exact => entry == signal,
            MatchRule::AnyField => entry.action_kind == signal.action_kind || entry.started_at == signal.started_at,
        }
    }
}

/// Coordinator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Reserved action-kind prefix for coordinator signals
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Kind of the initial navigation action
    #[serde(rename = "navigate-kind", default = "default_navigate_kind")]
    pub navigate_kind: String,

    /// Success-signal matching rule
    #[serde(rename = "match-rule", default)]
    pub match_rule: MatchRule,
}

fn default_namespace() -> String {
    debug!("default_namespace: called");
    crate::DEFAULT_NAMESPACE.to_string()
}

fn default_navigate_kind() -> String {
    debug!("default_navigate_kind: called");
    crate::NAVIGATE.to_string()
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        debug!("CoordinatorConfig::default: called");
        Self {
            namespace: default_namespace(),
            navigate_kind: default_navigate_kind(),
            match_rule: MatchRule::default(),
        }
    }
}

impl CoordinatorConfig {
    /// The signal namespace built from the configured prefix
    pub fn namespace(&self) -> Namespace {
        debug!(namespace = %self.namespace, "CoordinatorConfig::namespace: called");
        Namespace::new(self.namespace.clone())
    }

    /// Reject settings under which ordinary actions would read as signals
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(eyre!("Coordinator namespace must not be empty"));
        }
        if self.navigate_kind.starts_with(&self.namespace) {
            return Err(eyre!(
                "Navigate kind {} falls inside the coordinator namespace {}",
                self.navigate_kind,
                self.namespace
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: &str, started_at: u64) -> PendingEntry {
        PendingEntry {
            action_kind: kind.to_string(),
            started_at,
        }
    }

    #[test]
    fn test_default_config() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.namespace, "SSR/");
        assert_eq!(config.navigate_kind, "@@router/LOCATION_CHANGE");
        assert_eq!(config.match_rule, MatchRule::Exact);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: CoordinatorConfig = serde_yaml::from_str("match-rule: any-field\n").unwrap();
        assert_eq!(config.match_rule, MatchRule::AnyField);
        assert_eq!(config.namespace, "SSR/");
        assert_eq!(config.navigate_kind, "@@router/LOCATION_CHANGE");
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(CoordinatorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_namespace() {
        let config: CoordinatorConfig = serde_yaml::from_str("namespace: \"\"\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_validate_rejects_navigate_kind_inside_namespace() {
        let config = CoordinatorConfig {
            navigate_kind: "SSR/NAVIGATE".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("SSR/NAVIGATE"));
    }

    #[test]
    fn test_exact_rule_requires_both_fields() {
        let rule = MatchRule::Exact;
        assert!(rule.settles(&entry("LOAD_USER", 1), &entry("LOAD_USER", 1)));
        assert!(!rule.settles(&entry("LOAD_USER", 1), &entry("LOAD_USER", 2)));
        assert!(!rule.settles(&entry("LOAD_USER", 1), &entry("LOAD_POSTS", 1)));
    }

    #[test]
    fn test_any_field_rule_matches_either_field() {
        let rule = MatchRule::AnyField;
        assert!(rule.settles(&entry("LOAD_USER", 1), &entry("LOAD_USER", 2)));
        assert!(rule.settles(&entry("LOAD_USER", 1), &entry("LOAD_POSTS", 1)));
        assert!(!rule.settles(&entry("LOAD_USER", 1), &entry("LOAD_POSTS", 2)));
    }
}
