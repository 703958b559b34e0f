//! renderwait - server-side render completion tracking
//!
//! A server render of an action-driven application cannot be emitted until the
//! async work kicked off by the initial navigation has finished. `renderwait`
//! tracks that work and concludes each request exactly once: ready, redirect,
//! or not found.
//!
//! # Architecture
//!
//! ```text
//! dispatch_initial_event ──► Store ──► [CoordinatorInterceptor] ──► ...
//!                              ▲                │ SSR/* actions
//!        observe(trigger, fx)  │                ▼
//!        fx' yields result +   │        RenderCoordinator
//!        SSR/SUCCESS ──────────┘      (pending entries, phase)
//!                                               │
//!                               on_ready / on_redirect / on_not_found
//! ```
//!
//! # Example
//!
//! ```ignore
//! use renderwait::{Action, RenderCoordinator, Store, run_effect};
//!
//! let coordinator = RenderCoordinator::builder("/home")
//!     .on_ready(|_store| println!("render now"))
//!     .on_redirect(|_store, info| println!("301 {}", info.redirect_url))
//!     .on_not_found(|_store, _info| println!("404"))
//!     .build();
//! let store = Arc::new(Store::with_interceptors(vec![coordinator.interceptor()]));
//! coordinator.dispatch_initial_event(&store)?;
//!
//! let observed = coordinator.observe(&Action::new("LOAD_USER"), load_user())?;
//! run_effect(store.as_ref(), observed).await?;
//! ```

pub mod action;
pub mod cli;
pub mod config;
pub mod control;
pub mod coordinator;
pub mod error;
pub mod scenario;
pub mod store;

pub use action::{Action, Namespace, SignalKind};
pub use config::Config;
pub use control::{Inert, RenderControl};
pub use coordinator::{
    CoordinatorConfig, CoordinatorMetrics, MatchRule, NotFoundInfo, PendingEntry, RedirectInfo, RenderCoordinator,
    RenderCoordinatorBuilder, RenderOutcome,
};
pub use error::{CallbackKind, RenderError, RenderResult};
pub use store::{DispatchSink, Interceptor, Next, Store, run_effect};

/// Default reserved prefix for coordinator signals
pub const DEFAULT_NAMESPACE: &str = "SSR/";

/// Default kind of the initial navigation action
pub const NAVIGATE: &str = "@@router/LOCATION_CHANGE";
