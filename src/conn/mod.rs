//! # Connection Module
//!
//! Shared-handle [`Request`] and [`Response`] types modelling the transport
//! surface the dispatcher consumes: a mutable URL plus original-URL snapshot
//! and method on the request side; status, headers, body, and the
//! "already sent" signal on the response side.
//!
//! Actual socket I/O and header serialization live in whatever server
//! embeds this crate; these types are the contract between that server and
//! the dispatch core. Both are cheap to clone (`Arc`-backed) so handlers
//! can defer work to other threads and resume the continuation there.

mod request;
mod response;

pub use request::Request;
pub use response::Response;
