use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use http::StatusCode;
use tracing::{debug, error, trace, warn};

use crate::conn::{Request, Response};
use crate::error::DispatchError;
use crate::finalize::Finalizer;
use crate::handler::{ErrorHandler, Handler};
use crate::runtime_config::RuntimeConfig;
use crate::stack::{Endpoint, Layer};
use crate::util::pathname;

/// Parent callback a nested dispatch defers to at the end of its chain,
/// instead of producing a terminal response itself.
pub type Delegate = Arc<dyn Fn(Option<DispatchError>) + Send + Sync>;

/// The continuation that advances dispatch to the next matching layer.
///
/// `Next` is the per-request cursor: the layer index, the prefix removed
/// from the URL for the current layer (restored before the following
/// matching decision), the synthetic-leading-slash flag, and the optional
/// parent delegate. It is owned by exactly one in-flight dispatch and
/// consumed by [`Next::run`] — a handler may call it synchronously or move
/// it (together with its request/response handles) to another thread and
/// resume later.
pub struct Next {
    layers: Arc<Vec<Layer>>,
    index: usize,
    removed: String,
    slash_added: bool,
    fqdn: bool,
    req: Request,
    res: Response,
    parent: Option<Delegate>,
    config: RuntimeConfig,
    finalizer: Arc<dyn Finalizer>,
    consumed: Arc<AtomicBool>,
}

// Manual clone: only used for the pre-invocation recovery snapshot; the
// clone shares the `consumed` flag with the original on purpose.
impl Clone for Next {
    fn clone(&self) -> Self {
        Self {
            layers: Arc::clone(&self.layers),
            index: self.index,
            removed: self.removed.clone(),
            slash_added: self.slash_added,
            fqdn: self.fqdn,
            req: self.req.clone(),
            res: self.res.clone(),
            parent: self.parent.clone(),
            config: self.config,
            finalizer: Arc::clone(&self.finalizer),
            consumed: Arc::clone(&self.consumed),
        }
    }
}

enum Invoke {
    Normal(Arc<dyn Handler>),
    Error(Arc<dyn ErrorHandler>, DispatchError),
}

impl Next {
    pub(crate) fn new(
        layers: Arc<Vec<Layer>>,
        req: Request,
        res: Response,
        parent: Option<Delegate>,
        config: RuntimeConfig,
        finalizer: Arc<dyn Finalizer>,
    ) -> Self {
        let fqdn = req.url().contains("://");
        Self {
            layers,
            index: 0,
            removed: String::new(),
            slash_added: false,
            fqdn,
            req,
            res,
            parent,
            config,
            finalizer,
            consumed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Advance dispatch, optionally carrying an error onto the error path.
    ///
    /// Walks layers from the current index: restores the request URL,
    /// matches the layer prefix against the current pathname (with the
    /// boundary check), trims the matched prefix, and invokes the layer's
    /// handler if its variant fits the current error state. Terminates by
    /// delegating to the parent, rendering a terminal response through the
    /// stack's finalizer, or returning after a handler took over.
    pub fn run(self, err: Option<DispatchError>) {
        self.consumed.store(true, Ordering::SeqCst);
        let mut next = self;
        let mut err = err;
        loop {
            // Restore phase: undo the previous layer's URL trimming so the
            // matching decision below sees the full URL again.
            if next.slash_added {
                let url = next.req.url();
                if let Some(rest) = url.strip_prefix('/') {
                    next.req.set_url(rest.to_string());
                }
                next.slash_added = false;
            }
            if !next.removed.is_empty() {
                let url = next.req.url();
                next.req.set_url(format!("{}{}", next.removed, url));
                next.removed.clear();
            }
            next.req.snapshot_original_url();

            let layer = next.layers.get(next.index).cloned();
            next.index += 1;

            let Some(layer) = layer.filter(|_| !next.res.sent()) else {
                return finish(next, err);
            };

            let url = next.req.url();
            let path = match pathname(&url) {
                Some(p) if !p.is_empty() => p.into_owned(),
                _ => "/".to_string(),
            };
            if !prefix_matches(&path, &layer.prefix) {
                trace!(
                    index = next.index - 1,
                    prefix = %layer.prefix,
                    path = %path,
                    "layer skipped: prefix mismatch"
                );
                continue;
            }

            // Commit phase: trim the matched prefix off the URL for the
            // duration of this layer's invocation.
            let Some(rest) = url.get(layer.prefix.len()..) else {
                continue;
            };
            next.removed = layer.prefix.clone();
            let mut trimmed = rest.to_string();
            if !next.fqdn && !trimmed.starts_with('/') {
                trimmed.insert(0, '/');
                next.slash_added = true;
            }
            next.req.set_url(trimmed);

            // Variant dispatch: error handlers only see the error path,
            // normal handlers only the normal path. A skip here does not
            // consume the in-flight error.
            let invoke = match &layer.endpoint {
                Endpoint::Error(h) => err.take().map(|e| Invoke::Error(Arc::clone(h), e)),
                Endpoint::Normal(h) if err.is_none() => Some(Invoke::Normal(Arc::clone(h))),
                Endpoint::Normal(_) => None,
            };
            let Some(invoke) = invoke else {
                trace!(
                    index = next.index - 1,
                    kind = layer.endpoint.kind(),
                    error_in_flight = err.is_some(),
                    "layer skipped: variant does not fit error state"
                );
                continue;
            };

            debug!(
                index = next.index - 1,
                prefix = %layer.prefix,
                kind = layer.endpoint.kind(),
                url = %next.req.url(),
                "invoking layer"
            );

            // The single synchronous-failure boundary: a panic inside the
            // handler is converted into the same error channel as an
            // explicit `next.run(Some(err))`, resuming from a snapshot
            // taken before the invocation. The shared `consumed` flag stops
            // the recovery path from re-dispatching layers the handler
            // already advanced past.
            next.consumed = Arc::new(AtomicBool::new(false));
            let consumed = Arc::clone(&next.consumed);
            let snapshot = next.clone();
            let req = next.req.clone();
            let res = next.res.clone();
            let outcome = panic::catch_unwind(AssertUnwindSafe(move || match invoke {
                Invoke::Normal(h) => h.call(req, res, next),
                Invoke::Error(h, e) => h.call(e, req, res, next),
            }));
            match outcome {
                Ok(()) => return,
                Err(payload) => {
                    let panic_err = DispatchError::from_panic(payload);
                    if consumed.load(Ordering::SeqCst) {
                        error!(
                            error = %panic_err,
                            "handler panicked after consuming the continuation; dropping"
                        );
                        return;
                    }
                    error!(error = %panic_err, "handler panicked; converting to dispatch error");
                    err = Some(panic_err);
                    next = snapshot;
                }
            }
        }
    }
}

/// Single terminal exit of the continuation: parent delegation, unhandled
/// error rendering, or the default unhandled response.
fn finish(next: Next, err: Option<DispatchError>) {
    if let Some(parent) = next.parent {
        debug!(
            error_in_flight = err.is_some(),
            "chain exhausted; delegating to parent"
        );
        return (*parent)(err);
    }

    match err {
        Some(e) => {
            // Status policy: default to 500 only when nothing 4xx/5xx was
            // set already, then let the error's declared status win.
            if next.res.status().as_u16() < 400 {
                next.res.set_status(StatusCode::INTERNAL_SERVER_ERROR);
            }
            if let Some(status) = e.status() {
                next.res.set_status(status);
            }
            if !next.config.quiet {
                error!(
                    status = next.res.status().as_u16(),
                    error = %e,
                    method = %next.req.method(),
                    url = %next.req.url(),
                    "unhandled error at end of stack"
                );
            }
            if next.res.sent() {
                return;
            }
            next.finalizer.unhandled_error(&e, &next.req, &next.res);
        }
        None => {
            if next.res.sent() {
                return;
            }
            warn!(
                method = %next.req.method(),
                url = %next.req.url(),
                "no layer handled the request"
            );
            next.finalizer.unhandled(&next.req, &next.res);
        }
    }
}

/// Case-insensitive prefix match with the boundary check: the character
/// after the matched prefix must be absent, `/`, or `.` — so `/admin`
/// matches `/admin`, `/admin/x`, and `/admin.json`, but not
/// `/administrator`.
fn prefix_matches(path: &str, prefix: &str) -> bool {
    let Some(head) = path.get(..prefix.len()) else {
        return false;
    };
    if !head.eq_ignore_ascii_case(prefix) {
        return false;
    }
    matches!(
        path[prefix.len()..].chars().next(),
        None | Some('/') | Some('.')
    )
}
