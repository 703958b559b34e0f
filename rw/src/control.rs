//! RenderControl - what application logic may ask of the render
//!
//! Effects and route handlers take a `RenderControl`. On the server it is the
//! request's [`RenderCoordinator`]; in a client build, where nothing waits for
//! the render, it is [`Inert`].

use futures::stream::BoxStream;
use futures::{Stream, StreamExt};

use crate::action::Action;
use crate::coordinator::RenderCoordinator;
use crate::error::RenderResult;

/// Capability handed to application logic during a render
pub trait RenderControl {
    /// Wrap an effect so the render waits for it
    fn observe<S, E>(&self, trigger: &Action, effect: S) -> RenderResult<BoxStream<'static, Result<Action, E>>>
    where
        S: Stream<Item = Result<Action, E>> + Send + 'static,
        E: Send + 'static;

    /// Conclude with a redirect to `url`
    fn redirect(&self, url: &str) -> RenderResult<()>;

    /// Conclude with not-found
    fn not_found(&self) -> RenderResult<()>;
}

impl RenderControl for RenderCoordinator {
    fn observe<S, E>(&self, trigger: &Action, effect: S) -> RenderResult<BoxStream<'static, Result<Action, E>>>
    where
        S: Stream<Item = Result<Action, E>> + Send + 'static,
        E: Send + 'static,
    {
        RenderCoordinator::observe(self, trigger, effect)
    }

    fn redirect(&self, url: &str) -> RenderResult<()> {
        RenderCoordinator::redirect(self, url)
    }

    fn not_found(&self) -> RenderResult<()> {
        RenderCoordinator::not_found(self)
    }
}

/// Control that tracks nothing and concludes nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct Inert;

impl RenderControl for Inert {
    fn observe<S, E>(&self, _trigger: &Action, effect: S) -> RenderResult<BoxStream<'static, Result<Action, E>>>
    where
        S: Stream<Item = Result<Action, E>> + Send + 'static,
        E: Send + 'static,
    {
        Ok(effect.boxed())
    }

    fn redirect(&self, _url: &str) -> RenderResult<()> {
        Ok(())
    }

    fn not_found(&self) -> RenderResult<()> {
        Ok(())
    }
}
