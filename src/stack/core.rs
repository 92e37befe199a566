use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::conn::{Request, Response};
use crate::dispatcher::{Delegate, Next};
use crate::error::ConfigError;
use crate::finalize::{DefaultFinalizer, Finalizer};
use crate::handler::{ErrorHandler, Handler};
use crate::runtime_config::RuntimeConfig;

/// The two handler variants a layer can carry, fixed at registration time.
#[derive(Clone)]
pub enum Endpoint {
    /// Runs on the normal path; skipped while an error is in flight.
    Normal(Arc<dyn Handler>),
    /// Runs only while an error is in flight.
    Error(Arc<dyn ErrorHandler>),
}

impl Endpoint {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Endpoint::Normal(_) => "normal",
            Endpoint::Error(_) => "error",
        }
    }
}

/// A single registered (prefix, handler) pair.
///
/// The stored prefix is normalized: no trailing `/`, with the root mount
/// collapsed to the empty string (which matches every path).
#[derive(Clone)]
pub struct Layer {
    pub(crate) prefix: String,
    pub(crate) endpoint: Endpoint,
}

impl Layer {
    /// The normalized mount prefix this layer is scoped to.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

/// An ordered stack of middleware layers with a dispatch entry point.
///
/// Layers are appended during setup and never reordered or removed;
/// registration order is dispatch order. At request time the stack is
/// read-only and can be shared freely across threads — [`App`] is `Clone`
/// and clones share the same layer snapshot.
///
/// ```
/// use http::{Method, StatusCode};
/// use midstack::{App, Next, Request, Response, RuntimeConfig};
///
/// # fn main() -> Result<(), midstack::ConfigError> {
/// let mut app = App::with_config(RuntimeConfig::silent());
/// app.mount("/admin", |req: Request, res: Response, _next: Next| {
///     res.end(format!("admin saw {}", req.url()));
/// })?;
///
/// let req = Request::new(Method::GET, "/admin/settings");
/// let res = Response::new();
/// app.handle(req, res.clone());
/// assert_eq!(res.status(), StatusCode::OK);
/// assert_eq!(res.body_utf8(), "admin saw /settings");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct App {
    layers: Arc<Vec<Layer>>,
    config: RuntimeConfig,
    finalizer: Arc<dyn Finalizer>,
    // Shared across clones so the prefix recorded at mount time is visible
    // through handles taken before the stack was mounted.
    mount_point: Arc<Mutex<String>>,
}

impl App {
    /// Create an empty stack configured from the environment.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::from_env())
    }

    /// Create an empty stack with explicit runtime configuration.
    #[must_use]
    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            layers: Arc::new(Vec::new()),
            config,
            finalizer: Arc::new(DefaultFinalizer),
            mount_point: Arc::new(Mutex::new("/".to_string())),
        }
    }

    /// Replace the terminal-response renderer.
    pub fn set_finalizer(&mut self, finalizer: impl Finalizer + 'static) -> &mut Self {
        self.finalizer = Arc::new(finalizer);
        self
    }

    /// Mount a normal handler at a prefix.
    ///
    /// The prefix must begin with `/`; one trailing slash is stripped, so
    /// `/foo/` and `/foo` register identically and `/` mounts at the root
    /// (matching every path). Chainable through `?`.
    pub fn mount<H: Handler>(&mut self, prefix: &str, handler: H) -> Result<&mut Self, ConfigError> {
        let prefix = normalize_prefix(prefix)?;
        self.push(prefix, Endpoint::Normal(Arc::new(handler)));
        Ok(self)
    }

    /// Mount an error handler at a prefix.
    pub fn mount_error<H: ErrorHandler>(
        &mut self,
        prefix: &str,
        handler: H,
    ) -> Result<&mut Self, ConfigError> {
        let prefix = normalize_prefix(prefix)?;
        self.push(prefix, Endpoint::Error(Arc::new(handler)));
        Ok(self)
    }

    /// Mount a normal handler at the root prefix.
    pub fn with(&mut self, handler: impl Handler) -> &mut Self {
        self.push(String::new(), Endpoint::Normal(Arc::new(handler)));
        self
    }

    /// Mount an error handler at the root prefix.
    pub fn with_error(&mut self, handler: impl ErrorHandler) -> &mut Self {
        self.push(String::new(), Endpoint::Error(Arc::new(handler)));
        self
    }

    /// Mount another stack as a nested sub-stack.
    ///
    /// Records the mount prefix on the sub-stack (see [`App::mount_point`])
    /// and registers it as a normal layer. When the sub-stack exhausts its
    /// own layers it hands control — and any in-flight error — back to this
    /// stack's continuation instead of producing a terminal response.
    pub fn mount_app(&mut self, prefix: &str, sub: App) -> Result<&mut Self, ConfigError> {
        let normalized = normalize_prefix(prefix)?;
        *sub
            .mount_point
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = if normalized.is_empty() {
            "/".to_string()
        } else {
            normalized.clone()
        };
        self.push(normalized, Endpoint::Normal(Arc::new(sub)));
        Ok(self)
    }

    /// The prefix this stack was mounted at, `/` when top-level.
    #[must_use]
    pub fn mount_point(&self) -> String {
        self.mount_point
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of registered layers.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Dispatch a request through the stack.
    ///
    /// Side effects only: the request URL is rewritten and restored while
    /// layers are traversed, and the response may be written. If no layer
    /// terminates the request, the stack's [`Finalizer`] renders a default
    /// response.
    pub fn handle(&self, req: Request, res: Response) {
        self.dispatch(req, res, None);
    }

    /// Dispatch with a parent delegate.
    ///
    /// When the chain is exhausted (or the response was already sent) the
    /// delegate is invoked with the in-flight error, if any, and this stack
    /// writes nothing itself.
    pub fn handle_with(&self, req: Request, res: Response, parent: Delegate) {
        self.dispatch(req, res, Some(parent));
    }

    fn dispatch(&self, req: Request, res: Response, parent: Option<Delegate>) {
        let next = Next::new(
            Arc::clone(&self.layers),
            req,
            res,
            parent,
            self.config,
            Arc::clone(&self.finalizer),
        );
        next.run(None);
    }

    fn push(&mut self, prefix: String, endpoint: Endpoint) {
        debug!(
            prefix = %if prefix.is_empty() { "/" } else { &prefix },
            kind = endpoint.kind(),
            total_layers = self.layers.len() + 1,
            "layer registered"
        );
        Arc::make_mut(&mut self.layers).push(Layer { prefix, endpoint });
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// A mounted stack is itself a handler: it forwards the request into its
/// own dispatch with the outer continuation as parent delegate.
impl Handler for App {
    fn call(&self, req: Request, res: Response, next: Next) {
        let cell = Mutex::new(Some(next));
        let parent: Delegate = Arc::new(move |err| {
            let taken = cell.lock().unwrap_or_else(|e| e.into_inner()).take();
            if let Some(outer) = taken {
                outer.run(err);
            }
        });
        self.dispatch(req, res, Some(parent));
    }
}

fn normalize_prefix(prefix: &str) -> Result<String, ConfigError> {
    if !prefix.starts_with('/') {
        return Err(ConfigError::InvalidPrefix(prefix.to_string()));
    }
    let mut normalized = prefix.to_string();
    if normalized.ends_with('/') {
        normalized.pop();
    }
    Ok(normalized)
}
