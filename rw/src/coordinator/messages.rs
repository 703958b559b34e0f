//! Bookkeeping and outcome types for the RenderCoordinator

use serde::{Deserialize, Serialize};

/// HTTP status reported with a redirect outcome
pub const REDIRECT_STATUS: u16 = 301;

/// HTTP status reported with a not-found outcome
pub const NOT_FOUND_STATUS: u16 = 404;

/// One in-flight async operation
///
/// `started_at` is a per-request mark handed out in increasing order, so two
/// operations of the same kind started back to back never collide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEntry {
    #[serde(rename = "action-kind")]
    pub action_kind: String,
    #[serde(rename = "started-at")]
    pub started_at: u64,
}

/// Payload handed to the redirect callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectInfo {
    pub status: u16,
    #[serde(rename = "redirect-url")]
    pub redirect_url: String,
}

/// Payload handed to the not-found callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotFoundInfo {
    pub status: u16,
}

/// How a render request concluded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum RenderOutcome {
    /// All observed work settled; the page can be rendered
    Ready,
    Redirect(RedirectInfo),
    NotFound(NotFoundInfo),
}

impl RenderOutcome {
    pub(crate) fn redirect(url: &str) -> Self {
        RenderOutcome::Redirect(RedirectInfo {
            status: REDIRECT_STATUS,
            redirect_url: url.to_string(),
        })
    }

    pub(crate) fn not_found() -> Self {
        RenderOutcome::NotFound(NotFoundInfo {
            status: NOT_FOUND_STATUS,
        })
    }

    /// Response status implied by the outcome
    pub fn status(&self) -> u16 {
        match self {
            RenderOutcome::Ready => 200,
            RenderOutcome::Redirect(info) => info.status,
            RenderOutcome::NotFound(info) => info.status,
        }
    }
}

/// Coordinator metrics for observability
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinatorMetrics {
    /// Entries registered via observe
    pub observed: u64,
    /// Entries removed by success signals
    pub settled: u64,
    /// Entries currently outstanding
    pub pending: usize,
    /// Namespaced actions processed while pending
    pub signals_seen: u64,
    /// Namespaced actions that arrived after completion
    pub late_signals: u64,
}
