//! RenderCoordinator - decides when a server render may proceed
//!
//! The coordinator tracks the async effects started while handling a render
//! request and concludes the request exactly once:
//! - **Ready:** every observed effect has reported success
//! - **Redirect:** application logic asked for a 301
//! - **Not found:** application logic asked for a 404

mod config;
mod core;
mod interceptor;
mod messages;

pub use self::config::{CoordinatorConfig, MatchRule};
pub use self::core::{RenderCoordinator, RenderCoordinatorBuilder};
pub use self::interceptor::CoordinatorInterceptor;
pub use self::messages::{
    CoordinatorMetrics, NOT_FOUND_STATUS, NotFoundInfo, PendingEntry, REDIRECT_STATUS, RedirectInfo, RenderOutcome,
};
