//! # midstack
//!
//! **midstack** is a mount-point middleware dispatch core: an ordered chain
//! of handlers, each optionally scoped to a URL prefix, invoked in
//! registration order through an explicit continuation.
//!
//! ## Overview
//!
//! The crate implements the classic `use`/`handle` pair. During setup,
//! handlers are mounted onto an [`App`] under a prefix; at request time the
//! dispatcher walks the layers in order, matching each prefix against the
//! current pathname (with a boundary check, so `/admin` matches `/admin/x`
//! and `/admin.json` but never `/administrator`), trimming the matched
//! prefix off the URL for the duration of the handler and restoring it
//! before the following matching decision.
//!
//! Handlers come in two variants fixed at registration: normal handlers run
//! while no error is in flight, error handlers only when one is. A handler
//! advances the chain by consuming its [`Next`] continuation — immediately,
//! or later from another thread — optionally carrying an error onto the
//! error path; panics at the invocation point are converted into that same
//! error channel.
//!
//! The library is organized into a few small modules:
//!
//! - **[`stack`]** — the [`App`] registration surface: layers, mount
//!   prefixes, nested sub-stacks.
//! - **[`dispatcher`]** — the [`Next`] continuation and terminal handling.
//! - **[`handler`]** — the [`Handler`]/[`ErrorHandler`] traits and the
//!   [`from_fn`] adapter for fallible synchronous handlers.
//! - **[`conn`]** — shared-handle [`Request`]/[`Response`] types modelling
//!   the transport surface the dispatcher consumes.
//! - **[`finalize`]** — the pluggable renderer for end-of-chain responses.
//! - **[`runtime_config`]** — environment-driven configuration (quiet
//!   mode for the operator error channel).
//!
//! Transport concerns — socket I/O, header serialization, higher-level
//! routing such as path parameters — are deliberately out of scope; an
//! embedding server supplies them.
//!
//! ## Quick Start
//!
//! ```
//! use http::{Method, StatusCode};
//! use midstack::{from_fn, App, Flow, Next, Request, Response, RuntimeConfig};
//!
//! # fn main() -> Result<(), midstack::ConfigError> {
//! let mut app = App::with_config(RuntimeConfig::silent());
//!
//! // Root-mounted handler: sees every request, passes control along.
//! app.with(from_fn(|req: &Request, _res: &Response| {
//!     tracing::debug!(url = %req.url(), "request seen");
//!     Ok(Flow::Continue)
//! }));
//!
//! // Mounted handler: only runs under /admin, sees the trimmed URL.
//! app.mount("/admin", |req: Request, res: Response, _next: Next| {
//!     res.set_status(StatusCode::OK);
//!     res.end(format!("admin saw {}", req.url()));
//! })?;
//!
//! let req = Request::new(Method::GET, "/admin/settings");
//! let res = Response::new();
//! app.handle(req, res.clone());
//!
//! assert_eq!(res.status(), StatusCode::OK);
//! assert_eq!(res.body_utf8(), "admin saw /settings");
//! # Ok(())
//! # }
//! ```
//!
//! ## Nesting
//!
//! An [`App`] is itself a handler, so stacks compose: mounting a sub-stack
//! under a prefix dispatches into it with the outer continuation as parent
//! delegate. When the sub-stack exhausts its layers it hands control (and
//! any in-flight error) back to the outer chain instead of producing a
//! terminal response.

pub mod conn;
pub mod dispatcher;
pub mod error;
pub mod finalize;
pub mod handler;
pub mod runtime_config;
pub mod stack;
pub mod util;

pub use conn::{Request, Response};
pub use dispatcher::{Delegate, Next};
pub use error::{ConfigError, DispatchError};
pub use finalize::{DefaultFinalizer, Finalizer};
pub use handler::{from_fn, ErrorHandler, Flow, Handler};
pub use runtime_config::RuntimeConfig;
pub use stack::{App, Endpoint, Layer};
