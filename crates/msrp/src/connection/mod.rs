//! Per-connection stream consumption.
//!
//! One [`SessionConnection`] owns one reassembled byte stream exclusively and
//! drives the alternating request/response read loop over it:
//!
//! - clean end-of-stream terminates the loop, it never blocks past it
//! - non-fatal parse errors are reported to the sink and the loop
//!   resynchronizes on the next line, so one malformed frame does not discard
//!   a long-lived stream
//! - only IO failure and stream closure end the connection task

mod session_connection;

pub use session_connection::SessionConnection;
