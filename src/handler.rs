//! Handler traits and adapters.
//!
//! A layer's handler comes in exactly two variants, fixed at registration
//! time: [`Handler`] runs on the normal path, [`ErrorHandler`] runs only
//! while an error is in flight. The dispatcher never probes a handler at
//! request time to decide which it is; the variant is part of the layer.
//!
//! Plain closures of the matching shape implement the traits directly. For
//! simple synchronous handlers that want `Result` ergonomics instead of
//! driving the continuation by hand, [`from_fn`] adapts a fallible function
//! into a [`Handler`], converting `Err` returns into the same error channel
//! used by explicit propagation.

use crate::conn::{Request, Response};
use crate::dispatcher::Next;
use crate::error::DispatchError;

/// A normal-path layer handler.
///
/// Receives the request/response handles and the continuation. The handler
/// either consumes the continuation (`next.run(...)`, synchronously or
/// after moving it elsewhere) or terminates the request by ending the
/// response.
pub trait Handler: Send + Sync + 'static {
    /// Invoke the handler.
    fn call(&self, req: Request, res: Response, next: Next);
}

/// An error-path layer handler.
///
/// Only invoked while an error is in flight. Calling `next.run(None)`
/// consumes the error and resumes the normal path; passing an error along
/// keeps searching for the next error handler.
pub trait ErrorHandler: Send + Sync + 'static {
    /// Invoke the handler with the in-flight error.
    fn call(&self, err: DispatchError, req: Request, res: Response, next: Next);
}

impl<F> Handler for F
where
    F: Fn(Request, Response, Next) + Send + Sync + 'static,
{
    fn call(&self, req: Request, res: Response, next: Next) {
        self(req, res, next);
    }
}

impl<F> ErrorHandler for F
where
    F: Fn(DispatchError, Request, Response, Next) + Send + Sync + 'static,
{
    fn call(&self, err: DispatchError, req: Request, res: Response, next: Next) {
        self(err, req, res, next);
    }
}

/// What a [`from_fn`] handler wants to happen after it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Advance to the next matching layer.
    Continue,
    /// Stop dispatching; the handler ended the response itself.
    Halt,
}

/// Adapt a fallible synchronous function into a [`Handler`].
///
/// The returned handler drives the continuation from the function's
/// result: `Ok(Flow::Continue)` advances the chain, `Ok(Flow::Halt)` stops
/// it, and `Err(e)` forwards `e` down the error path — the result-capturing
/// boundary sits around this single call, not around the dispatch loop.
///
/// ```
/// use midstack::{from_fn, Flow, Request, Response};
///
/// let logger = from_fn(|req: &Request, _res: &Response| {
///     tracing::debug!(url = %req.url(), "request seen");
///     Ok(Flow::Continue)
/// });
/// # let _ = logger;
/// ```
pub fn from_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&Request, &Response) -> Result<Flow, DispatchError> + Send + Sync + 'static,
{
    FnHandler { f }
}

/// Handler produced by [`from_fn`].
pub struct FnHandler<F> {
    f: F,
}

impl<F> Handler for FnHandler<F>
where
    F: Fn(&Request, &Response) -> Result<Flow, DispatchError> + Send + Sync + 'static,
{
    fn call(&self, req: Request, res: Response, next: Next) {
        match (self.f)(&req, &res) {
            Ok(Flow::Continue) => next.run(None),
            Ok(Flow::Halt) => {}
            Err(err) => next.run(Some(err)),
        }
    }
}
