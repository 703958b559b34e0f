//! Simulated render runs described in YAML
//!
//! A scenario stands in for an application: it names the requested path and the
//! effects its logic would start. Running one wires a coordinator into a
//! [`Store`], starts every effect on tokio and reports how the render ended.
//!
//! ```yaml
//! path: /users/42
//! timeout-ms: 2000
//! effects:
//!   - kind: LOAD_USER
//!     delay-ms: 30
//!   - kind: LOAD_POSTS
//!     delay-ms: 80
//!     fail: backend unavailable
//! ```

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use eyre::{Context, Result, eyre};
use futures::{Stream, stream};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::action::Action;
use crate::coordinator::{CoordinatorConfig, PendingEntry, RenderCoordinator, RenderOutcome};
use crate::store::{DispatchSink, Store, run_effect};

/// One simulated render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Requested path
    pub path: String,

    /// Effects started after the initial navigation
    #[serde(default)]
    pub effects: Vec<EffectSpec>,

    /// Overrides the configured render timeout
    #[serde(rename = "timeout-ms", default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// One simulated async effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSpec {
    /// Kind of the action that triggers the effect
    pub kind: String,

    /// Simulated latency
    #[serde(rename = "delay-ms", default)]
    pub delay_ms: u64,

    /// Fail with this message instead of producing a result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail: Option<String>,

    /// Ask for a redirect once the delay has elapsed
    #[serde(rename = "redirect-to", default, skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,

    /// Ask for not-found once the delay has elapsed
    #[serde(rename = "not-found", default)]
    pub not_found: bool,
}

impl Scenario {
    /// Load a scenario file
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).context(format!("Failed to read scenario {}", path.display()))?;
        Self::from_yaml(&content).context(format!("Failed to parse scenario {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let scenario: Self = serde_yaml::from_str(content)?;
        if scenario.path.is_empty() {
            return Err(eyre!("Scenario path must not be empty"));
        }
        Ok(scenario)
    }
}

/// How a scenario run ended
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Requested path
    pub path: String,

    /// None when the run timed out
    pub outcome: Option<RenderOutcome>,

    /// Callbacks that fired, in order
    pub callbacks: Vec<String>,

    /// Entries still outstanding when the run ended
    pub pending: Vec<PendingEntry>,

    /// Kinds of every action that went through the store
    pub dispatched: Vec<String>,

    /// Effect failures observed before the run ended
    pub failures: Vec<String>,
}

impl RunReport {
    pub fn timed_out(&self) -> bool {
        self.outcome.is_none()
    }
}

/// Run a scenario to its outcome or until `timeout` elapses
pub async fn run_scenario(scenario: &Scenario, config: &CoordinatorConfig, timeout: Duration) -> Result<RunReport> {
    info!(path = %scenario.path, effects = scenario.effects.len(), "Running scenario");
    config.validate()?;

    let callbacks = Arc::new(Mutex::new(Vec::new()));
    let coordinator = {
        let (ready, redirect, not_found) = (callbacks.clone(), callbacks.clone(), callbacks.clone());
        RenderCoordinator::builder(&scenario.path)
            .config(config.clone())
            .on_ready(move |_| record(&ready, "ready".to_string()))
            .on_redirect(move |_, info| record(&redirect, format!("redirect {}", info.redirect_url)))
            .on_not_found(move |_, _| record(&not_found, "not-found".to_string()))
            .build()
    };
    let store = Arc::new(Store::with_interceptors(vec![coordinator.interceptor()]));

    coordinator
        .dispatch_initial_event(&store)
        .context("Failed to dispatch initial navigation")?;

    let mut tasks = JoinSet::new();
    for spec in &scenario.effects {
        let trigger = Action::new(spec.kind.clone());
        store.send(trigger.clone())?;
        let observed = coordinator.observe(&trigger, simulated_effect(spec.clone(), coordinator.clone()))?;
        let store = store.clone();
        tasks.spawn(async move { run_effect(store.as_ref(), observed).await });
    }

    let outcome = tokio::time::timeout(timeout, coordinator.settled()).await.ok();
    if outcome.is_none() {
        warn!(path = %scenario.path, ?timeout, "Scenario timed out");
    }

    tasks.abort_all();
    let mut failures = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Err(e)) => failures.push(format!("{:#}", e)),
            Ok(Ok(())) => {}
            Err(e) if e.is_cancelled() => {}
            Err(e) => failures.push(e.to_string()),
        }
    }

    let callbacks = callbacks.lock().unwrap_or_else(PoisonError::into_inner).clone();
    debug!(?callbacks, failures = failures.len(), "Scenario finished");
    Ok(RunReport {
        path: scenario.path.clone(),
        outcome,
        callbacks,
        pending: coordinator.pending(),
        dispatched: store.kinds(),
        failures,
    })
}

fn record(log: &Mutex<Vec<String>>, entry: String) {
    log.lock().unwrap_or_else(PoisonError::into_inner).push(entry);
}

fn simulated_effect(
    spec: EffectSpec,
    coordinator: Arc<RenderCoordinator>,
) -> impl Stream<Item = Result<Action>> + Send + 'static {
    stream::once(async move {
        tokio::time::sleep(Duration::from_millis(spec.delay_ms)).await;
        if let Some(url) = &spec.redirect_to {
            coordinator.redirect(url)?;
        }
        if spec.not_found {
            coordinator.not_found()?;
        }
        match &spec.fail {
            Some(message) => Err(eyre!("{} failed: {}", spec.kind, message)),
            None => Ok(Action::with_payload(
                format!("{}_DONE", spec.kind),
                serde_json::json!({ "delay-ms": spec.delay_ms }),
            )),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn effect(kind: &str, delay_ms: u64) -> EffectSpec {
        EffectSpec {
            kind: kind.to_string(),
            delay_ms,
            fail: None,
            redirect_to: None,
            not_found: false,
        }
    }

    #[test]
    fn test_parse_scenario() {
        let yaml = r#"
path: /users/42
timeout-ms: 500
effects:
  - kind: LOAD_USER
    delay-ms: 10
  - kind: LOAD_POSTS
    fail: nope
  - kind: CHECK_AUTH
    redirect-to: /login
"#;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        assert_eq!(scenario.path, "/users/42");
        assert_eq!(scenario.timeout_ms, Some(500));
        assert_eq!(scenario.effects.len(), 3);
        assert_eq!(scenario.effects[1].fail.as_deref(), Some("nope"));
        assert_eq!(scenario.effects[1].delay_ms, 0);
        assert_eq!(scenario.effects[2].redirect_to.as_deref(), Some("/login"));
        assert!(!scenario.effects[2].not_found);
    }

    #[test]
    fn test_empty_path_rejected() {
        assert!(Scenario::from_yaml("path: \"\"\n").is_err());
    }

    #[tokio::test]
    async fn test_all_effects_settle_to_ready() {
        let scenario = Scenario {
            path: "/home".to_string(),
            effects: vec![effect("LOAD_USER", 5), effect("LOAD_POSTS", 15)],
            timeout_ms: None,
        };

        let report = run_scenario(&scenario, &CoordinatorConfig::default(), Duration::from_secs(2))
            .await
            .unwrap();

        assert_eq!(report.outcome, Some(RenderOutcome::Ready));
        assert_eq!(report.callbacks, vec!["ready"]);
        assert!(report.pending.is_empty());
        assert_eq!(report.dispatched[0], crate::NAVIGATE);
        assert!(report.dispatched.iter().any(|k| k == "LOAD_USER_DONE"));
    }

    #[tokio::test]
    async fn test_empty_namespace_is_refused_before_dispatch() {
        let scenario = Scenario {
            path: "/home".to_string(),
            effects: vec![effect("LOAD_USER", 5)],
            timeout_ms: None,
        };
        let config = CoordinatorConfig {
            namespace: String::new(),
            ..Default::default()
        };

        let err = run_scenario(&scenario, &config, Duration::from_secs(1)).await.unwrap_err();
        assert!(err.to_string().contains("namespace"));
    }

    #[tokio::test]
    async fn test_redirect_effect_concludes_early() {
        let mut auth = effect("CHECK_AUTH", 5);
        auth.redirect_to = Some("/login".to_string());
        let scenario = Scenario {
            path: "/account".to_string(),
            effects: vec![auth, effect("LOAD_ACCOUNT", 200)],
            timeout_ms: None,
        };

        let report = run_scenario(&scenario, &CoordinatorConfig::default(), Duration::from_secs(2))
            .await
            .unwrap();

        assert_eq!(report.outcome, Some(RenderOutcome::redirect("/login")));
        assert_eq!(report.callbacks, vec!["redirect /login"]);
    }

    #[tokio::test]
    async fn test_failed_effect_times_out_with_stale_entry() {
        let mut posts = effect("LOAD_POSTS", 5);
        posts.fail = Some("backend unavailable".to_string());
        let scenario = Scenario {
            path: "/home".to_string(),
            effects: vec![effect("LOAD_USER", 1), posts],
            timeout_ms: None,
        };

        let report = run_scenario(&scenario, &CoordinatorConfig::default(), Duration::from_millis(150))
            .await
            .unwrap();

        assert!(report.timed_out());
        assert!(report.callbacks.is_empty());
        assert_eq!(report.pending.len(), 1);
        assert_eq!(report.pending[0].action_kind, "LOAD_POSTS");
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].contains("backend unavailable"));
    }
}
