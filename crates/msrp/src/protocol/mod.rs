//! Core protocol data model.
//!
//! This module holds the message types produced by the decoder and the pieces
//! they are built from:
//!
//! - [`FieldMap`]: insertion-ordered, case-insensitive header field storage
//! - [`Request`] / [`Response`]: one parsed message each, linked by a
//!   transaction identifier that this crate carries but does not verify
//! - [`SessionMessage`]: the request-or-response sum type the decoder emits
//! - [`BodySource`]: lazily consumed, externally bounded body bytes
//! - [`ParseError`]: the full error taxonomy, with its fatal/non-fatal split

mod header;
pub use header::FieldMap;

mod request;
pub use request::Request;

mod response;
pub use response::Response;

mod message;
pub use message::SessionMessage;

mod body;
pub use body::BodySource;
pub use body::FixedBody;

mod error;
pub use error::ParseError;

/// Protocol literal used for request construction and optional strict
/// start-line validation.
pub const PROTOCOL: &str = "MSRP";
