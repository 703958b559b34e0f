//! Actions flowing through the dispatch pipeline and the reserved signal namespace

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coordinator::PendingEntry;
use crate::error::{RenderError, RenderResult};

/// A dispatched event: a kind tag plus an arbitrary JSON payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

impl Action {
    /// Create an action with no payload
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Value::Null,
        }
    }

    /// Create an action carrying a payload
    pub fn with_payload(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// The navigation action that starts a render for `path`
    pub fn navigate(kind: impl Into<String>, path: &str) -> Self {
        Self::with_payload(kind, serde_json::json!({ "path": path }))
    }
}

/// The three coordinator signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Pending,
    Error,
    Success,
}

impl SignalKind {
    fn suffix(self) -> &'static str {
        match self {
            SignalKind::Pending => "PENDING",
            SignalKind::Error => "ERROR",
            SignalKind::Success => "SUCCESS",
        }
    }
}

/// Wire body shared by every coordinator signal
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SignalBody {
    #[serde(flatten)]
    entry: PendingEntry,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    payload: Value,
}

/// The reserved action-kind prefix used for coordinator signalling
///
/// Every action whose kind starts with the prefix belongs to the coordinator;
/// `SSR/PENDING`, `SSR/ERROR` and `SSR/SUCCESS` with the default prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    prefix: String,
}

impl Namespace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Full action kind for a signal, e.g. `SSR/SUCCESS`
    pub fn kind_of(&self, signal: SignalKind) -> String {
        format!("{}{}", self.prefix, signal.suffix())
    }

    /// Whether an action is coordinator-namespaced
    pub fn contains(&self, action: &Action) -> bool {
        action.kind.starts_with(&self.prefix)
    }

    /// Classify a namespaced action; `None` for foreign or unknown kinds
    pub fn classify(&self, action: &Action) -> Option<SignalKind> {
        let suffix = action.kind.strip_prefix(&self.prefix)?;
        [SignalKind::Pending, SignalKind::Error, SignalKind::Success]
            .into_iter()
            .find(|kind| kind.suffix() == suffix)
    }

    /// PENDING signal mirroring the triggering action's payload
    pub fn pending(&self, entry: &PendingEntry, payload: Value) -> Action {
        self.encode(SignalKind::Pending, entry, payload)
    }

    /// SUCCESS signal for a finished entry
    pub fn success(&self, entry: &PendingEntry) -> Action {
        self.encode(SignalKind::Success, entry, Value::Null)
    }

    /// ERROR signal for a failed entry
    pub fn error(&self, entry: &PendingEntry, message: &str) -> Action {
        self.encode(SignalKind::Error, entry, serde_json::json!({ "message": message }))
    }

    /// Recover the entry a signal refers to
    pub fn entry_of(&self, action: &Action) -> RenderResult<PendingEntry> {
        let body: SignalBody = serde_json::from_value(action.payload.clone())
            .map_err(|e| RenderError::Signal(format!("{}: {}", action.kind, e)))?;
        Ok(body.entry)
    }

    fn encode(&self, signal: SignalKind, entry: &PendingEntry, payload: Value) -> Action {
        let body = SignalBody {
            entry: entry.clone(),
            payload,
        };
        // SignalBody holds only strings, integers and JSON values
        let payload = serde_json::to_value(body).unwrap_or(Value::Null);
        Action::with_payload(self.kind_of(signal), payload)
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new(crate::DEFAULT_NAMESPACE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(kind: &str, started_at: u64) -> PendingEntry {
        PendingEntry {
            action_kind: kind.to_string(),
            started_at,
        }
    }

    #[test]
    fn test_signal_kinds_use_prefix() {
        let ns = Namespace::default();
        assert_eq!(ns.kind_of(SignalKind::Pending), "SSR/PENDING");
        assert_eq!(ns.kind_of(SignalKind::Error), "SSR/ERROR");
        assert_eq!(ns.kind_of(SignalKind::Success), "SSR/SUCCESS");
    }

    #[test]
    fn test_contains_only_prefixed_kinds() {
        let ns = Namespace::default();
        assert!(ns.contains(&Action::new("SSR/SUCCESS")));
        assert!(ns.contains(&Action::new("SSR/SOMETHING_ELSE")));
        assert!(!ns.contains(&Action::new("LOAD_USER")));
        assert!(!ns.contains(&Action::new("APP/SSR/SUCCESS")));
    }

    #[test]
    fn test_classify_unknown_suffix() {
        let ns = Namespace::default();
        assert_eq!(ns.classify(&Action::new("SSR/SUCCESS")), Some(SignalKind::Success));
        assert_eq!(ns.classify(&Action::new("SSR/RETRY")), None);
        assert_eq!(ns.classify(&Action::new("LOAD_USER")), None);
    }

    #[test]
    fn test_pending_carries_entry_and_payload() {
        let ns = Namespace::default();
        let action = ns.pending(&entry("LOAD_USER", 3), json!({"id": 7}));

        assert_eq!(action.kind, "SSR/PENDING");
        assert_eq!(action.payload["action-kind"], "LOAD_USER");
        assert_eq!(action.payload["started-at"], 3);
        assert_eq!(action.payload["payload"]["id"], 7);
    }

    #[test]
    fn test_entry_of_success_signal() {
        let ns = Namespace::new("COORD/");
        let action = ns.success(&entry("LOAD_POSTS", 11));
        assert_eq!(action.kind, "COORD/SUCCESS");
        assert_eq!(ns.entry_of(&action).unwrap(), entry("LOAD_POSTS", 11));
    }

    #[test]
    fn test_entry_of_malformed_payload() {
        let ns = Namespace::default();
        let action = Action::with_payload("SSR/SUCCESS", json!({"started-at": "soon"}));
        let err = ns.entry_of(&action).unwrap_err();
        assert!(matches!(err, RenderError::Signal(_)));
    }

    #[test]
    fn test_navigate_payload() {
        let action = Action::navigate(crate::NAVIGATE, "/home");
        assert_eq!(action.kind, "@@router/LOCATION_CHANGE");
        assert_eq!(action.payload, json!({"path": "/home"}));
    }
}
