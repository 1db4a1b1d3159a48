//! Start-line parsing for requests and responses.
//!
//! Requests use a fixed `PROTO TXN METHOD` shape. Status lines exist in two
//! divergent layouts in the wild: one where the status code is the second
//! whitespace-delimited field (`PROTO CODE [REASON...]`, no transaction id)
//! and one where it is the third (`PROTO TXN CODE [REASON...]`). Which layout
//! a deployment speaks is a configuration choice; the default auto-detection
//! picks the transaction-id layout when the leading field equals the
//! configured protocol literal.

use crate::ensure;
use crate::protocol::{PROTOCOL, ParseError};

/// Status-line field layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusLineLayout {
    /// Pick [`StatusLineLayout::CodeThird`] when the first field equals the
    /// protocol literal, [`StatusLineLayout::CodeSecond`] otherwise.
    #[default]
    Auto,
    /// `PROTO CODE [REASON...]`, no transaction id on the status line.
    CodeSecond,
    /// `PROTO TXN CODE [REASON...]`.
    CodeThird,
}

/// Decoding configuration shared by both start-line parsers.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    protocol: String,
    strict_protocol: bool,
    status_line: StatusLineLayout,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { protocol: PROTOCOL.to_owned(), strict_protocol: false, status_line: StatusLineLayout::Auto }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the protocol literal used for strict validation and layout
    /// auto-detection.
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// Rejects request lines whose leading token differs from the protocol
    /// literal. Off by default: any non-space leading token is accepted.
    pub fn strict_protocol(mut self, strict: bool) -> Self {
        self.strict_protocol = strict;
        self
    }

    pub fn status_line(mut self, layout: StatusLineLayout) -> Self {
        self.status_line = layout;
        self
    }
}

/// Parses `"MSRP 95529209 SEND"` into `(proto, transaction_id, method)`.
///
/// Splits at the first two spaces; fewer than two spaces is a
/// [`ParseError::MalformedStartLine`] carrying the raw line.
pub fn parse_request_line(line: &str, options: &DecodeOptions) -> Result<(String, String, String), ParseError> {
    let Some(s1) = line.find(' ') else {
        return Err(ParseError::malformed_start_line(line));
    };
    let Some(s2) = line[s1 + 1..].find(' ').map(|at| at + s1 + 1) else {
        return Err(ParseError::malformed_start_line(line));
    };

    let proto = &line[..s1];
    ensure!(
        !options.strict_protocol || proto == options.protocol,
        ParseError::malformed_start_line(line)
    );

    Ok((proto.to_owned(), line[s1 + 1..s2].to_owned(), line[s2 + 1..].to_owned()))
}

/// Parses a status line into `(proto, transaction_id, status_code, reason)`.
///
/// The transaction id is empty in the [`StatusLineLayout::CodeSecond`]
/// layout. The reason phrase is the literal remainder after the status code,
/// or empty if none remains.
pub fn parse_response_line(line: &str, options: &DecodeOptions) -> Result<(String, String, u16, String), ParseError> {
    let has_transaction_id = match options.status_line {
        StatusLineLayout::Auto => line.split(' ').next() == Some(options.protocol.as_str()),
        StatusLineLayout::CodeSecond => false,
        StatusLineLayout::CodeThird => true,
    };

    if has_transaction_id {
        let mut fields = line.splitn(4, ' ');
        let proto = fields.next().ok_or_else(|| ParseError::malformed_start_line(line))?;
        let transaction_id = fields.next().ok_or_else(|| ParseError::malformed_start_line(line))?;
        let code_field = fields.next().ok_or_else(|| ParseError::malformed_start_line(line))?;
        let reason = fields.next().unwrap_or("");
        Ok((proto.to_owned(), transaction_id.to_owned(), parse_status_code(code_field)?, reason.to_owned()))
    } else {
        let mut fields = line.splitn(3, ' ');
        let proto = fields.next().ok_or_else(|| ParseError::malformed_start_line(line))?;
        let code_field = fields.next().ok_or_else(|| ParseError::malformed_start_line(line))?;
        let reason = fields.next().unwrap_or("");
        Ok((proto.to_owned(), String::new(), parse_status_code(code_field)?, reason.to_owned()))
    }
}

/// Renders a status line in the transaction-id layout, the inverse of
/// [`parse_response_line`].
pub fn format_status_line(proto: &str, transaction_id: &str, status_code: u16, reason: &str) -> String {
    if reason.is_empty() {
        format!("{proto} {transaction_id} {status_code:03}")
    } else {
        format!("{proto} {transaction_id} {status_code:03} {reason}")
    }
}

/// Status codes are exactly three base-10 digits.
fn parse_status_code(field: &str) -> Result<u16, ParseError> {
    ensure!(
        field.len() == 3 && field.bytes().all(|b| b.is_ascii_digit()),
        ParseError::malformed_status_code(field)
    );
    field.parse::<u16>().map_err(|_| ParseError::malformed_status_code(field))
}
