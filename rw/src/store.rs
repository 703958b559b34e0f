//! Dispatch pipeline - the sink contract, interceptors, and a reference store
//!
//! The coordinator only needs something it can `send` actions into, and a way to
//! be spliced into that thing's pipeline. [`DispatchSink`] and [`Interceptor`]
//! are those two capabilities. [`Store`] is a small implementation that runs an
//! ordered interceptor chain and records every action that reaches the end of
//! it, which is all the render driver and the tests need.
//!
//! ```text
//! send(action) → interceptor[0] → interceptor[1] → ... → history
//! ```

use std::pin::pin;
use std::sync::{Arc, Mutex, PoisonError};

use futures::{Stream, StreamExt};
use tracing::debug;

use crate::action::Action;
use crate::error::{RenderError, RenderResult};

/// Anything actions can be dispatched into
pub trait DispatchSink: Send + Sync {
    fn send(&self, action: Action) -> RenderResult<()>;
}

/// One stage of a dispatch pipeline
///
/// An interceptor sees every action before the stages after it. It decides
/// whether to call `next` (normally it does, exactly once).
pub trait Interceptor: Send + Sync {
    fn intercept(&self, store: &dyn DispatchSink, action: Action, next: Next<'_>) -> RenderResult<()>;
}

/// The remainder of the pipeline after the current interceptor
pub struct Next<'a> {
    store: &'a Store,
    rest: &'a [Arc<dyn Interceptor>],
}

impl Next<'_> {
    /// Forward an action to the next stage
    pub fn run(self, action: Action) -> RenderResult<()> {
        match self.rest.split_first() {
            Some((head, rest)) => head.intercept(self.store, action, Next { store: self.store, rest }),
            None => {
                self.store.record(action);
                Ok(())
            }
        }
    }
}

/// Reference store: an interceptor chain that ends in an action log
#[derive(Default)]
pub struct Store {
    interceptors: Vec<Arc<dyn Interceptor>>,
    history: Mutex<Vec<Action>>,
}

impl Store {
    /// Create a store with no interceptors
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store running `interceptors` in order
    pub fn with_interceptors(interceptors: Vec<Arc<dyn Interceptor>>) -> Self {
        debug!(count = interceptors.len(), "Store::with_interceptors: called");
        Self {
            interceptors,
            history: Mutex::new(Vec::new()),
        }
    }

    /// Every action that made it through the pipeline, in arrival order
    pub fn history(&self) -> Vec<Action> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Just the kinds from [`Store::history`]
    pub fn kinds(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|a| a.kind.clone())
            .collect()
    }

    fn record(&self, action: Action) {
        self.history.lock().unwrap_or_else(PoisonError::into_inner).push(action);
    }
}

impl DispatchSink for Store {
    fn send(&self, action: Action) -> RenderResult<()> {
        debug!(kind = %action.kind, "Store::send: called");
        Next {
            store: self,
            rest: &self.interceptors,
        }
        .run(action)
    }
}

/// Drain an effect into a store
///
/// Every `Ok` action is dispatched. The first effect error stops the drain and
/// is returned as-is; dispatch failures are converted into `E`.
pub async fn run_effect<S, E>(store: &dyn DispatchSink, effect: S) -> Result<(), E>
where
    S: Stream<Item = Result<Action, E>>,
    E: From<RenderError>,
{
    let mut effect = pin!(effect);
    while let Some(item) = effect.next().await {
        store.send(item?)?;
    }
    Ok(())
}
