//! Message decoder: one start line plus its header block per message.
//!
//! This is the message reader at the heart of the crate, written as a
//! [`Decoder`] so `FramedRead` can drive it over a reassembled, in-order byte
//! stream. `Ok(None)` means not enough bytes have arrived yet;
//! [`Decoder::decode_eof`] discriminates a clean end-of-stream from a stream
//! that died mid-message.
//!
//! Malformed input never fails the frame stream. Each parse failure is
//! emitted in-band as a [`DecodeItem::Diagnostic`] and decoding
//! resynchronizes on the following line, so completed messages and
//! diagnostics reach the consumer in stream order and a single bad frame
//! cannot discard the rest of a long-lived connection. Only transport IO
//! failure surfaces as a stream error.
//!
//! # State machine
//!
//! `StartLine → Fields → (emit message) → StartLine`, plus a `Skip` state
//! that discards the rest of a header block after a field parse error so a
//! single malformed block produces a single diagnostic rather than a cascade
//! of bogus start-line errors.
//!
//! The alternation between request and response start lines is owned by the
//! caller: the consumption loop flips [`MessageDecoder::expect_request`] /
//! [`MessageDecoder::expect_response`] between messages.

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::start_line::{DecodeOptions, parse_request_line, parse_response_line};
use crate::protocol::{FieldMap, ParseError, Request, Response, SessionMessage};

/// Maximum size in bytes allowed for one start line plus header block.
const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Maximum number of field lines allowed in one header block.
const MAX_FIELD_LINES: usize = 64;

/// One decoded item: either a completed message or an in-band diagnostic.
#[derive(Debug)]
pub enum DecodeItem {
    Message(SessionMessage),
    Diagnostic(ParseError),
}

impl DecodeItem {
    #[inline]
    pub fn is_diagnostic(&self) -> bool {
        matches!(self, DecodeItem::Diagnostic(_))
    }

    pub fn into_message(self) -> Option<SessionMessage> {
        match self {
            DecodeItem::Message(message) => Some(message),
            DecodeItem::Diagnostic(_) => None,
        }
    }
}

/// Which kind of start line the next message is expected to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expect {
    #[default]
    Request,
    Response,
}

#[derive(Debug)]
enum DecodeState {
    /// Waiting for a complete start line.
    StartLine,
    /// Start line parsed, reading the header block.
    Fields(Partial),
    /// A field line failed to parse; discard through the next blank line.
    Skip,
}

/// A message whose start line parsed but whose header block is still arriving.
#[derive(Debug)]
struct Partial {
    kind: PartialKind,
    fields: FieldMap,
    /// Most recent field line, kept out of the map until its continuation
    /// lines (if any) have been folded in.
    pending: Option<(String, String)>,
    line_count: usize,
}

#[derive(Debug)]
enum PartialKind {
    Request { proto: String, transaction_id: String, method: String },
    Response { proto: String, transaction_id: String, status_code: u16, reason: String },
}

impl Partial {
    fn flush_pending(&mut self) {
        if let Some((name, value)) = self.pending.take() {
            self.fields.append(name, value);
        }
    }

    fn finish(mut self) -> SessionMessage {
        self.flush_pending();
        match self.kind {
            PartialKind::Request { proto, transaction_id, method } => {
                SessionMessage::Request(Request::from_wire(proto, transaction_id, method, self.fields))
            }
            PartialKind::Response { proto, transaction_id, status_code, reason } => {
                SessionMessage::Response(Response::from_wire(proto, transaction_id, status_code, reason, self.fields))
            }
        }
    }
}

/// Decoder for session messages, reusable across connections via
/// [`DecoderPool`](crate::codec::DecoderPool).
#[derive(Debug)]
pub struct MessageDecoder {
    options: DecodeOptions,
    expect: Expect,
    state: DecodeState,
}

impl MessageDecoder {
    pub fn new(options: DecodeOptions) -> Self {
        Self { options, expect: Expect::Request, state: DecodeState::StartLine }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    pub fn expect(&self) -> Expect {
        self.expect
    }

    /// The next start line will be parsed as a request line.
    pub fn expect_request(&mut self) {
        self.expect = Expect::Request;
    }

    /// The next start line will be parsed as a status line.
    pub fn expect_response(&mut self) {
        self.expect = Expect::Response;
    }

    /// Restores the pristine state so the decoder can serve another
    /// connection without leaking state across reuse.
    pub(crate) fn reset(&mut self) {
        self.expect = Expect::Request;
        self.state = DecodeState::StartLine;
    }

    fn diagnostic(&mut self, error: ParseError) -> Option<DecodeItem> {
        self.state = DecodeState::Skip;
        Some(DecodeItem::Diagnostic(error))
    }
}

impl Default for MessageDecoder {
    fn default() -> Self {
        Self::new(DecodeOptions::default())
    }
}

impl Decoder for MessageDecoder {
    type Item = DecodeItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match &mut self.state {
                DecodeState::StartLine => {
                    let Some(line) = take_line(src) else {
                        if src.len() > MAX_HEADER_BYTES {
                            let current_size = src.len();
                            src.clear();
                            return Ok(self.diagnostic(ParseError::too_large_header(current_size, MAX_HEADER_BYTES)));
                        }
                        return Ok(None);
                    };
                    // stray terminators between messages
                    if line.is_empty() {
                        continue;
                    }
                    let kind = match self.expect {
                        Expect::Request => match parse_request_line(&line, &self.options) {
                            Ok((proto, transaction_id, method)) => PartialKind::Request { proto, transaction_id, method },
                            // resynchronize on the next line
                            Err(error) => return Ok(Some(DecodeItem::Diagnostic(error))),
                        },
                        Expect::Response => match parse_response_line(&line, &self.options) {
                            Ok((proto, transaction_id, status_code, reason)) => {
                                PartialKind::Response { proto, transaction_id, status_code, reason }
                            }
                            Err(error) => return Ok(Some(DecodeItem::Diagnostic(error))),
                        },
                    };
                    trace!(expect = ?self.expect, "parsed start line");
                    self.state = DecodeState::Fields(Partial { kind, fields: FieldMap::new(), pending: None, line_count: 0 });
                }

                DecodeState::Fields(partial) => {
                    let Some(line) = take_line(src) else {
                        if src.len() > MAX_HEADER_BYTES {
                            let current_size = src.len();
                            src.clear();
                            return Ok(self.diagnostic(ParseError::too_large_header(current_size, MAX_HEADER_BYTES)));
                        }
                        return Ok(None);
                    };
                    if line.is_empty() {
                        let DecodeState::Fields(partial) = std::mem::replace(&mut self.state, DecodeState::StartLine) else {
                            unreachable!("state checked above");
                        };
                        return Ok(Some(DecodeItem::Message(partial.finish())));
                    }
                    if partial.line_count >= MAX_FIELD_LINES {
                        return Ok(self.diagnostic(ParseError::too_many_fields(MAX_FIELD_LINES)));
                    }
                    partial.line_count += 1;

                    if line.starts_with([' ', '\t']) {
                        // MIME-style folding: continuation text joins the
                        // previous field value with a single space
                        let Some((_, value)) = partial.pending.as_mut() else {
                            return Ok(self.diagnostic(ParseError::invalid_header("continuation line without a preceding field")));
                        };
                        value.push(' ');
                        value.push_str(line.trim());
                    } else {
                        let Some(colon) = line.find(':') else {
                            return Ok(self.diagnostic(ParseError::invalid_header(format!("field line without colon: {line:?}"))));
                        };
                        let name = line[..colon].trim_end();
                        if name.is_empty() {
                            return Ok(self.diagnostic(ParseError::invalid_header("empty field name")));
                        }
                        let value = line[colon + 1..].trim().to_owned();
                        partial.flush_pending();
                        partial.pending = Some((name.to_owned(), value));
                    }
                }

                DecodeState::Skip => {
                    let Some(line) = take_line(src) else {
                        if src.len() > MAX_HEADER_BYTES {
                            let current_size = src.len();
                            src.clear();
                            return Ok(self.diagnostic(ParseError::too_large_header(current_size, MAX_HEADER_BYTES)));
                        }
                        return Ok(None);
                    };
                    if line.is_empty() {
                        self.state = DecodeState::StartLine;
                    }
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None => {
                if src.is_empty() && matches!(self.state, DecodeState::StartLine | DecodeState::Skip) {
                    // clean end-of-stream
                    return Ok(None);
                }
                // truncated mid-message: report once, then finish cleanly on
                // the next poll
                src.clear();
                self.state = DecodeState::StartLine;
                Ok(Some(DecodeItem::Diagnostic(ParseError::UnexpectedEof)))
            }
        }
    }
}

/// Takes one complete line off the front of `src`, without its terminator.
///
/// Lines end at LF; a CR directly before the LF is stripped, so CRLF and bare
/// LF senders are both accepted. Returns `None` when no full line has
/// arrived. Field text is decoded lossily rather than rejected on invalid
/// UTF-8.
fn take_line(src: &mut BytesMut) -> Option<String> {
    let at = src.iter().position(|b| *b == b'\n')?;
    let mut line = src.split_to(at + 1);
    line.truncate(at);
    if line.last() == Some(&b'\r') {
        line.truncate(line.len() - 1);
    }
    Some(String::from_utf8_lossy(&line).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn decode_all(decoder: &mut MessageDecoder, wire: &str) -> Vec<DecodeItem> {
        let mut src = BytesMut::from(wire);
        let mut out = Vec::new();
        while let Some(item) = decoder.decode(&mut src).unwrap() {
            out.push(item);
        }
        out
    }

    fn request(item: DecodeItem) -> Request {
        match item {
            DecodeItem::Message(SessionMessage::Request(request)) => request,
            other => panic!("expected request, got {other:?}"),
        }
    }

    #[test]
    fn reads_complete_request_with_fields() {
        let wire = "MSRP d93kswow SEND\r\nTo-Path: msrp://a/1,tcp\r\n\r\n";
        let mut decoder = MessageDecoder::default();
        let mut src = BytesMut::from(wire);

        let item = decoder.decode(&mut src).unwrap().unwrap();
        let request = request(item);

        assert_eq!(request.proto(), "MSRP");
        assert_eq!(request.transaction_id(), "d93kswow");
        assert_eq!(request.method(), "SEND");
        assert_eq!(request.fields().get_all("To-Path"), &["msrp://a/1,tcp".to_owned()]);
        assert!(src.is_empty());
    }

    #[test]
    fn partial_input_yields_none_until_block_ends() {
        let mut decoder = MessageDecoder::default();
        let mut src = BytesMut::from("MSRP 1 SEND\r\nMessage-ID: 5");

        assert!(decoder.decode(&mut src).unwrap().is_none());

        src.extend_from_slice(b"5\r\n\r\n");
        let item = decoder.decode(&mut src).unwrap().unwrap();
        assert_eq!(request(item).fields().get("Message-ID"), Some("55"));
    }

    #[test]
    fn bare_lf_lines_are_accepted() {
        let mut decoder = MessageDecoder::default();
        let mut src = BytesMut::from("MSRP 7 SEND\nFailure-Report: yes\n\n");

        let request = request(decoder.decode(&mut src).unwrap().unwrap());
        assert_eq!(request.transaction_id(), "7");
        assert_eq!(request.fields().get("failure-report"), Some("yes"));
    }

    #[test]
    fn continuation_line_folds_into_previous_field() {
        let wire = "MSRP 1 SEND\r\nA: 1\r\n B: 2\r\n\r\n";
        let mut decoder = MessageDecoder::default();
        let mut src = BytesMut::from(wire);

        let request = request(decoder.decode(&mut src).unwrap().unwrap());
        // folding policy: continuation text is trimmed and joined with one space
        assert_eq!(request.fields().get("A"), Some("1 B: 2"));
        assert_eq!(request.fields().len(), 1);
    }

    #[test]
    fn continuation_without_preceding_field_is_invalid() {
        let wire = "MSRP 1 SEND\r\n  floating\r\nIgnored: yes\r\n\r\nMSRP 2 SEND\r\n\r\n";
        let mut decoder = MessageDecoder::default();
        let items = decode_all(&mut decoder, wire);

        let [first, second] = items.try_into().unwrap();
        assert!(matches!(first, DecodeItem::Diagnostic(ParseError::InvalidHeader { .. })));
        // the rest of the bad block was skipped; decoding resumed at the next message
        assert_eq!(request(second).transaction_id(), "2");
    }

    #[test]
    fn field_line_without_colon_skips_block_with_one_diagnostic() {
        let wire = indoc! {"
            MSRP 1 SEND\r
            To-Path: a\r
            not a field line\r
            From-Path: b\r
            \r
            MSRP 2 REPORT\r
            \r
        "};
        let mut decoder = MessageDecoder::default();
        let items = decode_all(&mut decoder, wire);

        let [first, second] = items.try_into().unwrap();
        assert!(matches!(first, DecodeItem::Diagnostic(ParseError::InvalidHeader { .. })));
        assert_eq!(request(second).transaction_id(), "2");
    }

    #[test]
    fn expectation_flips_between_request_and_response() {
        let mut decoder = MessageDecoder::default();
        let mut src = BytesMut::from("MSRP 123 SEND\r\n\r\nMSRP 123 200 OK\r\n\r\n");

        let request = request(decoder.decode(&mut src).unwrap().unwrap());
        assert_eq!(request.transaction_id(), "123");

        decoder.expect_response();
        let item = decoder.decode(&mut src).unwrap().unwrap();
        let DecodeItem::Message(SessionMessage::Response(response)) = item else {
            panic!("expected response");
        };
        assert_eq!(response.transaction_id(), "123");
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.reason(), "OK");
    }

    #[test]
    fn malformed_start_line_consumes_only_the_offending_line() {
        let mut decoder = MessageDecoder::default();
        let mut src = BytesMut::from("garbage line\r\n\r\nMSRP 123 SEND\r\n\r\n");

        match decoder.decode(&mut src).unwrap().unwrap() {
            DecodeItem::Diagnostic(ParseError::MalformedStartLine { line }) => assert_eq!(line, "garbage line"),
            other => panic!("expected malformed start line, got {other:?}"),
        }

        let request = request(decoder.decode(&mut src).unwrap().unwrap());
        assert_eq!(request.transaction_id(), "123");
    }

    #[test]
    fn eof_before_any_bytes_is_clean() {
        let mut decoder = MessageDecoder::default();
        let mut src = BytesMut::new();
        assert!(decoder.decode_eof(&mut src).unwrap().is_none());
    }

    #[test]
    fn eof_mid_message_reports_exactly_once() {
        let mut decoder = MessageDecoder::default();
        let mut src = BytesMut::from("MSRP 1 SEND\r\nTo-Path: msrp://a/1,tcp\r\n");

        let item = decoder.decode_eof(&mut src).unwrap().unwrap();
        assert!(matches!(item, DecodeItem::Diagnostic(ParseError::UnexpectedEof)));
        // second poll after the diagnostic terminates cleanly
        assert!(decoder.decode_eof(&mut src).unwrap().is_none());
    }

    #[test]
    fn eof_on_partial_line_is_unexpected() {
        let mut decoder = MessageDecoder::default();
        let mut src = BytesMut::from("MSRP 1 SE");

        let item = decoder.decode_eof(&mut src).unwrap().unwrap();
        assert!(matches!(item, DecodeItem::Diagnostic(ParseError::UnexpectedEof)));
        assert!(decoder.decode_eof(&mut src).unwrap().is_none());
    }

    #[test]
    fn oversized_header_block_is_skipped_with_a_diagnostic() {
        let mut decoder = MessageDecoder::default();
        let mut wire = String::from("MSRP 1 SEND\r\n");
        wire.push_str(&"x".repeat(MAX_HEADER_BYTES + 1));
        let mut src = BytesMut::from(wire.as_str());

        let item = decoder.decode(&mut src).unwrap().unwrap();
        assert!(matches!(item, DecodeItem::Diagnostic(ParseError::TooLargeHeader { .. })));
        assert!(src.is_empty());
    }

    #[test]
    fn skipped_block_still_bounds_buffered_bytes() {
        let mut decoder = MessageDecoder::default();
        let mut src = BytesMut::from("MSRP 1 SEND\r\nnot a field line\r\n");

        let item = decoder.decode(&mut src).unwrap().unwrap();
        assert!(matches!(item, DecodeItem::Diagnostic(ParseError::InvalidHeader { .. })));

        // while discarding the bad block, a long run with no terminator must
        // not accumulate past the header cap
        src.extend_from_slice("x".repeat(MAX_HEADER_BYTES + 1).as_bytes());
        let item = decoder.decode(&mut src).unwrap().unwrap();
        assert!(matches!(item, DecodeItem::Diagnostic(ParseError::TooLargeHeader { .. })));
        assert!(src.is_empty());
    }

    #[test]
    fn field_line_limit_skips_block_with_one_diagnostic() {
        let mut decoder = MessageDecoder::default();
        let mut wire = String::from("MSRP 1 SEND\r\n");
        for n in 0..=MAX_FIELD_LINES {
            wire.push_str(&format!("Field-{n}: v\r\n"));
        }
        wire.push_str("\r\nMSRP 2 SEND\r\n\r\n");

        let items = decode_all(&mut decoder, &wire);
        let [first, second] = items.try_into().unwrap();
        assert!(matches!(first, DecodeItem::Diagnostic(ParseError::TooManyFields { max_num: MAX_FIELD_LINES })));
        assert_eq!(request(second).transaction_id(), "2");
    }

    #[test]
    fn reset_clears_expectation_and_state() {
        let mut decoder = MessageDecoder::default();
        let mut src = BytesMut::from("MSRP 1 SEND\r\nTo-Path: a\r\n");
        assert!(decoder.decode(&mut src).unwrap().is_none());
        decoder.expect_response();

        decoder.reset();
        assert_eq!(decoder.expect(), Expect::Request);

        let mut src = BytesMut::from("MSRP 9 SEND\r\n\r\n");
        let request = request(decoder.decode(&mut src).unwrap().unwrap());
        // nothing from the interrupted block leaked through
        assert_eq!(request.transaction_id(), "9");
        assert!(request.fields().is_empty());
    }
}
