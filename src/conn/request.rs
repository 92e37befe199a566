use std::sync::{Arc, Mutex, OnceLock};

use http::Method;

/// Shared handle to the request surface the dispatcher operates on.
///
/// Models exactly what the dispatch loop needs from a transport request:
/// an immutable method, a mutable URL (rewritten while layers are
/// traversed and restored between matching decisions), and an original-URL
/// snapshot taken once on first dispatch.
///
/// Cloning is cheap and every clone observes the same underlying request,
/// so a handler may move its handle to another thread and resume the
/// continuation later.
#[derive(Debug, Clone)]
pub struct Request {
    inner: Arc<RequestInner>,
}

#[derive(Debug)]
struct RequestInner {
    method: Method,
    url: Mutex<String>,
    original_url: OnceLock<String>,
}

impl Request {
    /// Create a request from a method and a target URL.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RequestInner {
                method,
                url: Mutex::new(url.into()),
                original_url: OnceLock::new(),
            }),
        }
    }

    /// The HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.inner.method
    }

    /// The current URL, as rewritten by the dispatcher so far.
    ///
    /// Inside a mounted layer this is the URL with the mount prefix
    /// trimmed off; between layers it is always the restored full URL.
    #[must_use]
    pub fn url(&self) -> String {
        self.lock_url().clone()
    }

    /// Replace the current URL.
    pub fn set_url(&self, url: impl Into<String>) {
        *self.lock_url() = url.into();
    }

    /// The URL as it was when dispatch first saw this request.
    ///
    /// `None` until the request has entered a dispatch chain.
    #[must_use]
    pub fn original_url(&self) -> Option<String> {
        self.inner.original_url.get().cloned()
    }

    /// Record the original URL. First call wins; later calls (including
    /// those from nested stacks) are no-ops.
    pub(crate) fn snapshot_original_url(&self) {
        let url = self.url();
        let _ = self.inner.original_url.set(url);
    }

    fn lock_url(&self) -> std::sync::MutexGuard<'_, String> {
        self.inner.url.lock().unwrap_or_else(|e| e.into_inner())
    }
}
