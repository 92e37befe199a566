//! Terminal response rendering.
//!
//! When a dispatch chain runs out of layers with no parent delegate, the
//! dispatcher has to produce *something*: a default not-found response, or
//! a rendering of the unconsumed error. The exact bodies and headers are
//! deployment policy, so they hang off a [`Finalizer`] injected into the
//! stack rather than being baked into the dispatch loop. The status-code
//! policy for errors (respect the error's declared status, default 500,
//! never downgrade an existing 4xx/5xx) stays in the dispatcher; finalizers
//! only render.

use http::{Method, StatusCode};

use crate::conn::{Request, Response};
use crate::error::DispatchError;
use crate::util::escape_html;

/// Renders terminal responses for exhausted dispatch chains.
pub trait Finalizer: Send + Sync {
    /// No layer handled the request and no error is in flight.
    fn unhandled(&self, req: &Request, res: &Response);

    /// An error reached the end of the chain unconsumed. The response
    /// status has already been set by the dispatcher's status policy.
    fn unhandled_error(&self, err: &DispatchError, req: &Request, res: &Response);
}

/// Default terminal rendering: plain-text diagnostics, nothing for HEAD.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFinalizer;

impl Finalizer for DefaultFinalizer {
    fn unhandled(&self, req: &Request, res: &Response) {
        res.set_status(StatusCode::NOT_FOUND);
        if req.method() == Method::HEAD {
            res.end_empty();
            return;
        }
        let target = req.original_url().unwrap_or_else(|| req.url());
        res.set_header("Content-Type", "text/plain");
        res.end(format!("Cannot {} {}", req.method(), escape_html(&target)));
    }

    fn unhandled_error(&self, err: &DispatchError, req: &Request, res: &Response) {
        if req.method() == Method::HEAD {
            res.end_empty();
            return;
        }
        res.set_header("Content-Type", "text/plain");
        res.end(err.to_string());
    }
}
