//! # Dispatcher Module
//!
//! The request-time half of the crate: the [`Next`] continuation that walks
//! a stack's layers and the terminal handling at the end of the chain.
//!
//! ## Overview
//!
//! Dispatch is a single logical continuation per request. Each step:
//!
//! 1. **Restore** — re-prepend the prefix the previous layer trimmed off
//!    (and drop any synthetic leading slash) so matching always sees the
//!    full URL; snapshot the original URL on the first pass.
//! 2. **Advance** — take the layer at the cursor index.
//! 3. **Terminate** — when layers are exhausted or the response was already
//!    sent: delegate to the parent if one exists, otherwise render the
//!    unhandled-error or default not-found response.
//! 4. **Match** — case-insensitive prefix compare against the current
//!    pathname, with a boundary check so `/admin` never matches
//!    `/administrator`.
//! 5. **Commit** — trim the matched prefix off the URL, adding a synthetic
//!    leading slash for non-fully-qualified targets when needed.
//! 6. **Invoke** — call the handler whose variant fits the current error
//!    state, inside the panic-conversion boundary.
//!
//! ## Error flow
//!
//! An in-flight error skips every normal layer and is offered to error
//! layers in registration order until one consumes it by resuming with
//! `next.run(None)`. Skipping never consumes the error. At the end of the
//! chain an unconsumed error is handed to the parent delegate when nested,
//! or rendered terminally with the never-downgrade status policy.
//!
//! ## Reentrancy and deferral
//!
//! Handlers may consume their continuation synchronously — dispatch then
//! proceeds on the same call stack, so depth grows with the number of
//! traversed layers — or move it to another thread and resume later. Once
//! the response's sent signal is set, no further layer runs.

mod core;

pub use core::{Delegate, Next};
