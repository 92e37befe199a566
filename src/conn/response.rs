use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Mutex};

use http::StatusCode;
use tracing::warn;

/// Shared handle to the response surface the dispatcher operates on.
///
/// Carries a mutable status code, headers, a body buffer, and the `sent`
/// signal. Once `sent` is observed the dispatcher refuses to invoke
/// further layers or write further output for the request.
///
/// Cloning is cheap and every clone observes the same underlying response.
#[derive(Debug, Clone)]
pub struct Response {
    inner: Arc<ResponseInner>,
}

#[derive(Debug)]
struct ResponseInner {
    status: AtomicU16,
    sent: AtomicBool,
    headers: Mutex<Vec<(String, String)>>,
    body: Mutex<Vec<u8>>,
}

impl Response {
    /// Create an empty response with status 200 and nothing sent.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ResponseInner {
                status: AtomicU16::new(StatusCode::OK.as_u16()),
                sent: AtomicBool::new(false),
                headers: Mutex::new(Vec::new()),
                body: Mutex::new(Vec::new()),
            }),
        }
    }

    /// The current status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.inner.status.load(Ordering::SeqCst))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Set the status code.
    pub fn set_status(&self, status: StatusCode) {
        self.inner.status.store(status.as_u16(), Ordering::SeqCst);
    }

    /// Whether the response has been ended.
    #[must_use]
    pub fn sent(&self) -> bool {
        self.inner.sent.load(Ordering::SeqCst)
    }

    /// Add or replace a header (name comparison is case-insensitive).
    pub fn set_header(&self, name: &str, value: impl Into<String>) {
        let mut headers = self.lock_headers();
        headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        headers.push((name.to_string(), value.into()));
    }

    /// Look up a header by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        self.lock_headers()
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    /// Snapshot of all headers in insertion order.
    #[must_use]
    pub fn headers(&self) -> Vec<(String, String)> {
        self.lock_headers().clone()
    }

    /// End the response with the given body, marking it as sent.
    ///
    /// Returns `false` (and writes nothing) if the response was already
    /// ended; ending a response is a one-shot operation.
    pub fn end(&self, body: impl AsRef<[u8]>) -> bool {
        let mut buf = self.lock_body();
        if self.inner.sent.swap(true, Ordering::SeqCst) {
            warn!("response already ended; refusing to write");
            return false;
        }
        *buf = body.as_ref().to_vec();
        true
    }

    /// End the response with an empty body.
    pub fn end_empty(&self) -> bool {
        self.end(b"")
    }

    /// The body written by `end`, empty until then.
    #[must_use]
    pub fn body(&self) -> Vec<u8> {
        self.lock_body().clone()
    }

    /// The body decoded as UTF-8, for diagnostics and tests.
    #[must_use]
    pub fn body_utf8(&self) -> String {
        String::from_utf8_lossy(&self.body()).into_owned()
    }

    fn lock_headers(&self) -> std::sync::MutexGuard<'_, Vec<(String, String)>> {
        self.inner.headers.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_body(&self) -> std::sync::MutexGuard<'_, Vec<u8>> {
        self.inner.body.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}
