//! RenderCoordinator - pending-work tracking and the completion state machine

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use tokio::sync::Notify;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use super::config::{CoordinatorConfig, MatchRule};
use super::interceptor::CoordinatorInterceptor;
use super::messages::{CoordinatorMetrics, NotFoundInfo, PendingEntry, RedirectInfo, RenderOutcome};
use crate::action::{Action, Namespace, SignalKind};
use crate::error::{CallbackKind, RenderError, RenderResult};
use crate::store::{DispatchSink, Interceptor};

type ReadyFn = Box<dyn Fn(&Arc<dyn DispatchSink>) + Send + Sync>;
type RedirectFn = Box<dyn Fn(&Arc<dyn DispatchSink>, &RedirectInfo) + Send + Sync>;
type NotFoundFn = Box<dyn Fn(&Arc<dyn DispatchSink>, &NotFoundInfo) + Send + Sync>;

#[derive(Default)]
struct Callbacks {
    ready: Option<ReadyFn>,
    redirect: Option<RedirectFn>,
    not_found: Option<NotFoundFn>,
}

/// Builder for a [`RenderCoordinator`]
///
/// Callbacks are fixed once [`build`](Self::build) returns; registering one twice
/// before that keeps the last.
pub struct RenderCoordinatorBuilder {
    requested_path: String,
    config: CoordinatorConfig,
    callbacks: Callbacks,
    built: bool,
}

impl RenderCoordinatorBuilder {
    /// Use a non-default configuration
    pub fn config(&mut self, config: CoordinatorConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Called with the store once all observed work has settled
    pub fn on_ready<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Arc<dyn DispatchSink>) + Send + Sync + 'static,
    {
        self.callbacks.ready = Some(Box::new(f));
        self
    }

    /// Called with the store and a 301 payload on redirect
    pub fn on_redirect<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Arc<dyn DispatchSink>, &RedirectInfo) + Send + Sync + 'static,
    {
        self.callbacks.redirect = Some(Box::new(f));
        self
    }

    /// Called with the store and a 404 payload on not-found
    pub fn on_not_found<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Arc<dyn DispatchSink>, &NotFoundInfo) + Send + Sync + 'static,
    {
        self.callbacks.not_found = Some(Box::new(f));
        self
    }

    /// Finalize the coordinator
    ///
    /// Takes the registered callbacks; the builder is left without any, so a
    /// second `build` yields a coordinator whose terminal calls report
    /// [`RenderError::MissingCallback`] unless callbacks are registered again.
    pub fn build(&mut self) -> Arc<RenderCoordinator> {
        let request_id = Uuid::now_v7().to_string();
        debug!(%request_id, path = %self.requested_path, "RenderCoordinatorBuilder::build: called");
        if std::mem::replace(&mut self.built, true) {
            warn!(
                %request_id,
                ready = self.callbacks.ready.is_some(),
                redirect = self.callbacks.redirect.is_some(),
                not_found = self.callbacks.not_found.is_some(),
                "Builder reused; only callbacks registered since the last build are kept"
            );
        }
        Arc::new(RenderCoordinator {
            initial_event: Action::navigate(self.config.navigate_kind.clone(), &self.requested_path),
            namespace: self.config.namespace(),
            match_rule: self.config.match_rule,
            requested_path: self.requested_path.clone(),
            request_id,
            callbacks: std::mem::take(&mut self.callbacks),
            state: Mutex::new(State::default()),
            settled: Notify::new(),
        })
    }
}

enum Phase {
    Pending,
    Complete(RenderOutcome),
}

struct State {
    phase: Phase,
    pending: Vec<PendingEntry>,
    store: Option<Weak<dyn DispatchSink>>,
    next_mark: u64,
    metrics: CoordinatorMetrics,
}

impl Default for State {
    fn default() -> Self {
        Self {
            phase: Phase::Pending,
            pending: Vec::new(),
            store: None,
            next_mark: 0,
            metrics: CoordinatorMetrics::default(),
        }
    }
}

impl State {
    fn is_complete(&self) -> bool {
        matches!(self.phase, Phase::Complete(_))
    }

    fn store(&self) -> RenderResult<Arc<dyn DispatchSink>> {
        self.store
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or(RenderError::StoreNotBound)
    }
}

/// Tracks the async work of one render request and decides when it is done
///
/// The coordinator starts `Pending`. It moves to `Complete` exactly once: when
/// the last observed effect reports success (ready), or when [`redirect`] or
/// [`not_found`] is called. `Complete` is absorbing; tracking calls made after
/// it are no-ops.
///
/// [`redirect`]: RenderCoordinator::redirect
/// [`not_found`]: RenderCoordinator::not_found
pub struct RenderCoordinator {
    request_id: String,
    requested_path: String,
    initial_event: Action,
    namespace: Namespace,
    match_rule: MatchRule,
    callbacks: Callbacks,
    state: Mutex<State>,
    settled: Notify,
}

impl RenderCoordinator {
    /// Start building a coordinator for `requested_path`
    pub fn builder(requested_path: impl Into<String>) -> RenderCoordinatorBuilder {
        RenderCoordinatorBuilder {
            requested_path: requested_path.into(),
            config: CoordinatorConfig::default(),
            callbacks: Callbacks::default(),
            built: false,
        }
    }

    /// A coordinator with default configuration and no callbacks
    pub fn new(requested_path: impl Into<String>) -> Arc<Self> {
        Self::builder(requested_path).build()
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn requested_path(&self) -> &str {
        &self.requested_path
    }

    /// The navigation action that starts the render
    pub fn initial_event(&self) -> &Action {
        &self.initial_event
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn is_complete(&self) -> bool {
        self.state().is_complete()
    }

    /// Whether a live store is bound
    pub fn is_store_bound(&self) -> bool {
        self.state().store().is_ok()
    }

    /// Snapshot of the outstanding entries, oldest first
    pub fn pending(&self) -> Vec<PendingEntry> {
        self.state().pending.clone()
    }

    /// The terminal outcome, once complete
    pub fn outcome(&self) -> Option<RenderOutcome> {
        match &self.state().phase {
            Phase::Pending => None,
            Phase::Complete(outcome) => Some(outcome.clone()),
        }
    }

    pub fn metrics(&self) -> CoordinatorMetrics {
        let state = self.state();
        CoordinatorMetrics {
            pending: state.pending.len(),
            ..state.metrics.clone()
        }
    }

    /// Bind (or rebind) the store the coordinator dispatches through
    ///
    /// Only a weak reference is kept; the store's pipeline usually owns the
    /// coordinator's interceptor.
    pub fn bind_store<S>(&self, store: &Arc<S>)
    where
        S: DispatchSink + 'static,
    {
        debug!(request_id = %self.request_id, "RenderCoordinator::bind_store: called");
        let weak: Weak<S> = Arc::downgrade(store);
        let store: Weak<dyn DispatchSink> = weak;
        self.state().store = Some(store);
    }

    /// The bound store, or [`RenderError::StoreNotBound`]
    pub fn require_store(&self) -> RenderResult<Arc<dyn DispatchSink>> {
        self.state().store()
    }

    /// Bind `store` and dispatch the initial navigation action through it
    pub fn dispatch_initial_event<S>(&self, store: &Arc<S>) -> RenderResult<()>
    where
        S: DispatchSink + 'static,
    {
        self.bind_store(store);
        let store = self.require_store()?;
        info!(request_id = %self.request_id, path = %self.requested_path, "Dispatching initial navigation");
        store.send(self.initial_event.clone())
    }

    /// Track an async effect started in response to `trigger`
    ///
    /// Registers a pending entry and dispatches a PENDING signal. The returned
    /// stream yields the effect's first result followed by one SUCCESS signal,
    /// then ends. An effect error is passed through unchanged and no SUCCESS is
    /// emitted, leaving the entry outstanding. Once complete, the effect is
    /// returned as-is.
    pub fn observe<S, E>(&self, trigger: &Action, effect: S) -> RenderResult<BoxStream<'static, Result<Action, E>>>
    where
        S: Stream<Item = Result<Action, E>> + Send + 'static,
        E: Send + 'static,
    {
        debug!(request_id = %self.request_id, kind = %trigger.kind, "RenderCoordinator::observe: called");
        let Some(entry) = self.add_pending_action(trigger)? else {
            debug!("RenderCoordinator::observe: complete, passing effect through");
            return Ok(effect.boxed());
        };

        let success = self.namespace.success(&entry);
        let observed = effect.take(1).flat_map(move |item| {
            let items = match item {
                Ok(action) => vec![Ok(action), Ok(success.clone())],
                Err(e) => vec![Err(e)],
            };
            stream::iter(items)
        });
        Ok(observed.boxed())
    }

    fn add_pending_action(&self, trigger: &Action) -> RenderResult<Option<PendingEntry>> {
        let (entry, store) = {
            let mut state = self.state();
            if state.is_complete() {
                return Ok(None);
            }
            let store = state.store()?;
            let entry = PendingEntry {
                action_kind: trigger.kind.clone(),
                started_at: state.next_mark,
            };
            state.next_mark += 1;
            state.pending.push(entry.clone());
            state.metrics.observed += 1;
            (entry, store)
        };

        debug!(
            request_id = %self.request_id,
            kind = %entry.action_kind,
            started_at = entry.started_at,
            "Registered pending entry"
        );
        store.send(self.namespace.pending(&entry, trigger.payload.clone()))?;
        Ok(Some(entry))
    }

    /// Interceptor to install into the store's pipeline
    pub fn interceptor(self: &Arc<Self>) -> Arc<dyn Interceptor> {
        Arc::new(CoordinatorInterceptor::new(Arc::clone(self)))
    }

    /// Apply a namespaced action to the bookkeeping
    ///
    /// SUCCESS removes the entries it settles; PENDING, ERROR and unknown
    /// namespaced kinds change nothing. If nothing is left outstanding the
    /// coordinator completes and the ready callback runs.
    pub(crate) fn handle_signal(&self, action: &Action) -> RenderResult<()> {
        let store = {
            let mut state = self.state();
            if state.is_complete() {
                state.metrics.late_signals += 1;
                trace!(request_id = %self.request_id, kind = %action.kind, "Ignoring late signal");
                return Ok(());
            }
            state.metrics.signals_seen += 1;

            match self.namespace.classify(action) {
                Some(SignalKind::Success) => {
                    let signal = self.namespace.entry_of(action)?;
                    state.store()?;
                    let before = state.pending.len();
                    let rule = self.match_rule;
                    state.pending.retain(|entry| !rule.settles(entry, &signal));
                    let removed = before - state.pending.len();
                    state.metrics.settled += removed as u64;
                    debug!(
                        request_id = %self.request_id,
                        kind = %signal.action_kind,
                        started_at = signal.started_at,
                        removed,
                        remaining = state.pending.len(),
                        "Success signal"
                    );
                }
                Some(SignalKind::Error) => {
                    warn!(request_id = %self.request_id, payload = %action.payload, "Error signal");
                }
                Some(SignalKind::Pending) | None => {
                    trace!(request_id = %self.request_id, kind = %action.kind, "Signal without bookkeeping change");
                }
            }

            if !state.pending.is_empty() {
                return Ok(());
            }
            let store = state.store()?;
            state.phase = Phase::Complete(RenderOutcome::Ready);
            store
        };

        self.settled.notify_waiters();
        info!(request_id = %self.request_id, path = %self.requested_path, "Render ready");
        let ready = self
            .callbacks
            .ready
            .as_ref()
            .ok_or(RenderError::MissingCallback(CallbackKind::Ready))?;
        ready(&store);
        Ok(())
    }

    /// Conclude the render with a 301 to `url`
    ///
    /// A no-op once complete.
    pub fn redirect(&self, url: &str) -> RenderResult<()> {
        debug!(request_id = %self.request_id, %url, "RenderCoordinator::redirect: called");
        let outcome = RenderOutcome::redirect(url);
        let Some(store) = self.conclude(&outcome)? else {
            return Ok(());
        };
        let redirect = self
            .callbacks
            .redirect
            .as_ref()
            .ok_or(RenderError::MissingCallback(CallbackKind::Redirect))?;
        if let RenderOutcome::Redirect(info) = &outcome {
            redirect(&store, info);
        }
        Ok(())
    }

    /// Conclude the render with a 404
    ///
    /// A no-op once complete.
    pub fn not_found(&self) -> RenderResult<()> {
        debug!(request_id = %self.request_id, "RenderCoordinator::not_found: called");
        let outcome = RenderOutcome::not_found();
        let Some(store) = self.conclude(&outcome)? else {
            return Ok(());
        };
        let not_found = self
            .callbacks
            .not_found
            .as_ref()
            .ok_or(RenderError::MissingCallback(CallbackKind::NotFound))?;
        if let RenderOutcome::NotFound(info) = &outcome {
            not_found(&store, info);
        }
        Ok(())
    }

    /// Move to `Complete(outcome)` unless already complete
    ///
    /// Returns the store to hand to the callback, or `None` when this call lost
    /// the race to complete.
    fn conclude(&self, outcome: &RenderOutcome) -> RenderResult<Option<Arc<dyn DispatchSink>>> {
        let store = {
            let mut state = self.state();
            if state.is_complete() {
                debug!(request_id = %self.request_id, "RenderCoordinator::conclude: already complete");
                return Ok(None);
            }
            let store = state.store()?;
            state.phase = Phase::Complete(outcome.clone());
            store
        };
        self.settled.notify_waiters();
        info!(
            request_id = %self.request_id,
            path = %self.requested_path,
            status = outcome.status(),
            "Render concluded early"
        );
        Ok(Some(store))
    }

    /// Wait until the coordinator completes and return the outcome
    pub async fn settled(&self) -> RenderOutcome {
        loop {
            let notified = self.settled.notified();
            if let Some(outcome) = self.outcome() {
                return outcome;
            }
            notified.await;
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
