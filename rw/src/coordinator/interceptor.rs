//! Pipeline stage feeding namespaced actions to the coordinator

use std::sync::Arc;

use tracing::trace;

use super::core::RenderCoordinator;
use crate::action::Action;
use crate::error::RenderResult;
use crate::store::{DispatchSink, Interceptor, Next};

/// The coordinator's dispatch-pipeline stage
///
/// Namespaced actions update the coordinator before they continue down the
/// chain. Every action is forwarded, namespaced or not.
pub struct CoordinatorInterceptor {
    coordinator: Arc<RenderCoordinator>,
}

impl CoordinatorInterceptor {
    pub fn new(coordinator: Arc<RenderCoordinator>) -> Self {
        Self { coordinator }
    }
}

impl Interceptor for CoordinatorInterceptor {
    fn intercept(&self, _store: &dyn DispatchSink, action: Action, next: Next<'_>) -> RenderResult<()> {
        let updated = if self.coordinator.namespace().contains(&action) {
            trace!(kind = %action.kind, "CoordinatorInterceptor::intercept: namespaced");
            self.coordinator.handle_signal(&action)
        } else {
            Ok(())
        };
        next.run(action)?;
        updated
    }
}
