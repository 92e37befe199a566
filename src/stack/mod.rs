//! # Stack Module
//!
//! The registration half of the crate: [`App`] owns the ordered sequence of
//! [`Layer`]s and exposes the mount API that populates it during setup.
//!
//! ## Overview
//!
//! - Each layer pairs a normalized mount prefix with an [`Endpoint`] — the
//!   tagged normal/error handler variant decided once, at registration.
//! - Registration order is dispatch order; the stack is append-only and
//!   becomes read-only at request time (a cheap `Arc` snapshot is shared by
//!   every in-flight dispatch).
//! - Nested stacks are first-class: an [`App`] is itself a handler, so
//!   mounting one under a prefix delegates a whole sub-chain and returns
//!   control to the outer chain when the sub-chain is exhausted.

mod core;

pub use core::{App, Endpoint, Layer};
