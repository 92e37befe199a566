//! Tests for the layer dispatch loop
//!
//! # Test Coverage
//!
//! Validates the continuation's core responsibilities:
//! - Registration order is dispatch order
//! - Prefix matching with the boundary check (`/admin` vs `/administrator`)
//! - URL trimming inside a mounted layer and restoration between layers
//! - The sent signal short-circuiting further layers
//! - Default terminal responses (404 body, HEAD elision, HTML escaping)
//! - Deferred resumption of the continuation from another thread
//!
//! # Test Strategy
//!
//! Each test builds a small stack with closure handlers that record what
//! they observed into shared state, dispatches a single request, and
//! asserts on the recorded order/URLs and the final response.

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use http::{Method, StatusCode};
use midstack::{App, Next, Request, Response, RuntimeConfig};

use tracing_util::TestTracing;

fn quiet_app() -> App {
    App::with_config(RuntimeConfig::silent())
}

fn recorder() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

fn recorded(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[test]
fn mounted_layer_sees_trimmed_url() {
    let _tracing = TestTracing::init();
    let log = recorder();
    let mut app = quiet_app();

    let seen = Arc::clone(&log);
    app.with(move |req: Request, _res: Response, next: Next| {
        seen.lock().unwrap().push(format!("root:{}", req.url()));
        next.run(None);
    });
    let seen = Arc::clone(&log);
    app.mount("/admin", move |req: Request, res: Response, _next: Next| {
        seen.lock().unwrap().push(format!("admin:{}", req.url()));
        res.end("handled");
    })
    .unwrap();

    let req = Request::new(Method::GET, "/admin/x");
    let res = Response::new();
    app.handle(req, res.clone());

    assert_eq!(recorded(&log), vec!["root:/admin/x", "admin:/x"]);
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body_utf8(), "handled");
    assert!(res.sent());
}

#[test]
fn boundary_check_refuses_longer_segment() {
    let _tracing = TestTracing::init();
    let log = recorder();
    let mut app = quiet_app();

    let seen = Arc::clone(&log);
    app.mount("/admin", move |_req: Request, res: Response, _next: Next| {
        seen.lock().unwrap().push("admin".to_string());
        res.end("nope");
    })
    .unwrap();

    let req = Request::new(Method::GET, "/administrator");
    let res = Response::new();
    app.handle(req, res.clone());

    assert!(recorded(&log).is_empty());
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.body_utf8(), "Cannot GET /administrator");
}

#[test]
fn shorter_path_than_prefix_falls_through() {
    let _tracing = TestTracing::init();
    let mut app = quiet_app();
    app.mount("/admin", |_req: Request, res: Response, _next: Next| {
        res.end("nope");
    })
    .unwrap();

    let req = Request::new(Method::GET, "/adm");
    let res = Response::new();
    app.handle(req, res.clone());

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.body_utf8(), "Cannot GET /adm");
}

#[test]
fn dot_boundary_matches() {
    let _tracing = TestTracing::init();
    let mut app = quiet_app();
    app.mount("/admin", |req: Request, res: Response, _next: Next| {
        res.end(req.url());
    })
    .unwrap();

    let req = Request::new(Method::GET, "/admin.json");
    let res = Response::new();
    app.handle(req, res.clone());

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body_utf8(), "/.json");
}

#[test]
fn exact_prefix_match_gets_synthetic_slash() {
    let _tracing = TestTracing::init();
    let mut app = quiet_app();
    app.mount("/admin", |req: Request, res: Response, _next: Next| {
        res.end(req.url());
    })
    .unwrap();

    let req = Request::new(Method::GET, "/admin");
    let res = Response::new();
    app.handle(req, res.clone());

    assert_eq!(res.body_utf8(), "/");
}

#[test]
fn prefix_matching_is_case_insensitive() {
    let _tracing = TestTracing::init();
    let mut app = quiet_app();
    app.mount("/Admin", |req: Request, res: Response, _next: Next| {
        res.end(req.url());
    })
    .unwrap();

    let req = Request::new(Method::GET, "/ADMIN/x");
    let res = Response::new();
    app.handle(req, res.clone());

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body_utf8(), "/x");
}

#[test]
fn registration_order_is_dispatch_order() {
    let _tracing = TestTracing::init();
    let log = recorder();
    let mut app = quiet_app();
    for name in ["first", "second", "third"] {
        let seen = Arc::clone(&log);
        app.with(move |_req: Request, _res: Response, next: Next| {
            seen.lock().unwrap().push(name.to_string());
            next.run(None);
        });
    }

    let req = Request::new(Method::GET, "/");
    let res = Response::new();
    app.handle(req, res.clone());

    assert_eq!(recorded(&log), vec!["first", "second", "third"]);
    // Nothing ended the response, so the default terminal fires.
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[test]
fn url_restored_after_mounted_layer() {
    let _tracing = TestTracing::init();
    let log = recorder();
    let mut app = quiet_app();

    app.mount("/admin", |_req: Request, _res: Response, next: Next| {
        next.run(None);
    })
    .unwrap();
    let seen = Arc::clone(&log);
    app.with(move |req: Request, res: Response, _next: Next| {
        seen.lock().unwrap().push(req.url());
        res.end("done");
    });

    let req = Request::new(Method::GET, "/admin/x");
    let res = Response::new();
    app.handle(req.clone(), res);

    assert_eq!(recorded(&log), vec!["/admin/x"]);
    assert_eq!(req.original_url().as_deref(), Some("/admin/x"));
}

#[test]
fn trailing_slash_prefix_registers_identically() {
    let _tracing = TestTracing::init();
    let mut app = quiet_app();
    app.mount("/foo/", |req: Request, res: Response, _next: Next| {
        res.end(req.url());
    })
    .unwrap();

    let req = Request::new(Method::GET, "/foo/bar");
    let res = Response::new();
    app.handle(req, res.clone());

    assert_eq!(res.body_utf8(), "/bar");
}

#[test]
fn query_string_does_not_affect_matching() {
    let _tracing = TestTracing::init();
    let mut app = quiet_app();
    app.mount("/admin", |req: Request, res: Response, _next: Next| {
        res.end(req.url());
    })
    .unwrap();

    let req = Request::new(Method::GET, "/admin/x?sort=asc");
    let res = Response::new();
    app.handle(req, res.clone());

    // Matching uses the pathname, trimming uses the raw URL.
    assert_eq!(res.body_utf8(), "/x?sort=asc");
}

#[test]
fn sent_signal_stops_further_layers() {
    let _tracing = TestTracing::init();
    let log = recorder();
    let mut app = quiet_app();

    app.with(|_req: Request, res: Response, next: Next| {
        res.end("first wins");
        next.run(None);
    });
    let seen = Arc::clone(&log);
    app.with(move |_req: Request, _res: Response, next: Next| {
        seen.lock().unwrap().push("late".to_string());
        next.run(None);
    });

    let req = Request::new(Method::GET, "/");
    let res = Response::new();
    app.handle(req, res.clone());

    assert!(recorded(&log).is_empty());
    assert_eq!(res.body_utf8(), "first wins");
}

#[test]
fn unhandled_head_request_has_empty_body() {
    let _tracing = TestTracing::init();
    let app = quiet_app();

    let req = Request::new(Method::HEAD, "/nope");
    let res = Response::new();
    app.handle(req, res.clone());

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(res.body().is_empty());
    assert!(res.sent());
}

#[test]
fn default_not_found_escapes_the_target() {
    let _tracing = TestTracing::init();
    let app = quiet_app();

    let req = Request::new(Method::GET, "/<script>alert(1)</script>");
    let res = Response::new();
    app.handle(req, res.clone());

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        res.body_utf8(),
        "Cannot GET /&lt;script&gt;alert(1)&lt;/script&gt;"
    );
    assert_eq!(res.header("Content-Type").as_deref(), Some("text/plain"));
}

#[test]
fn continuation_can_resume_on_another_thread() {
    let _tracing = TestTracing::init();
    let mut app = quiet_app();
    let worker: Arc<Mutex<Option<JoinHandle<()>>>> = Arc::new(Mutex::new(None));

    let slot = Arc::clone(&worker);
    app.with(move |_req: Request, _res: Response, next: Next| {
        let handle = std::thread::spawn(move || next.run(None));
        *slot.lock().unwrap() = Some(handle);
    });
    app.with(|_req: Request, res: Response, _next: Next| {
        res.set_status(StatusCode::OK);
        res.end("resumed elsewhere");
    });

    let req = Request::new(Method::GET, "/");
    let res = Response::new();
    app.handle(req, res.clone());

    let handle = worker.lock().unwrap().take().unwrap();
    handle.join().unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body_utf8(), "resumed elsewhere");
}

#[test]
fn absolute_form_target_matches_by_pathname() {
    let _tracing = TestTracing::init();
    let log = recorder();
    let mut app = quiet_app();

    let seen = Arc::clone(&log);
    app.with(move |req: Request, res: Response, _next: Next| {
        seen.lock().unwrap().push(req.url());
        res.end("ok");
    });

    let req = Request::new(Method::GET, "http://example.com/anything");
    let res = Response::new();
    app.handle(req, res.clone());

    // A root layer matches and sees the target untouched.
    assert_eq!(recorded(&log), vec!["http://example.com/anything"]);
    assert_eq!(res.status(), StatusCode::OK);
}
