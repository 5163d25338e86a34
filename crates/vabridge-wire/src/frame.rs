//! Fixed-layout frame for the aggregation sink.
//!
//! ```text
//! ┌──────────── header A (23) ─────────────┬─ len (4) ─┬──────── header B (44) ────────┬─ body ─┐
//! │ tag(3) site(8) app(2) svc(9) pattern(1) │ u32 LE    │ type(3) trace(24) timestamp(17)│ bytes  │
//! └─────────────────────────────────────────┴───────────┴────────────────────────────────┴────────┘
//! ```
//!
//! Header values are right-aligned and left-padded with spaces. The length
//! field is always computed from the body actually written.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use vabridge_settings::HeaderSettings;

use crate::errors::FrameError;
use crate::message::compact_timestamp;

const TAG_WIDTH: usize = 3;
const SITE_WIDTH: usize = 8;
const APP_WIDTH: usize = 2;
const SERVICE_WIDTH: usize = 9;
const PATTERN_WIDTH: usize = 1;
const TYPE_WIDTH: usize = 3;
const TRACE_WIDTH: usize = 24;
const TIMESTAMP_WIDTH: usize = 17;

/// Header A length in bytes.
pub const HEADER_A_LEN: usize = TAG_WIDTH + SITE_WIDTH + APP_WIDTH + SERVICE_WIDTH + PATTERN_WIDTH;
/// Length field size in bytes.
pub const LENGTH_LEN: usize = 4;
/// Header B length in bytes.
pub const HEADER_B_LEN: usize = TYPE_WIDTH + TRACE_WIDTH + TIMESTAMP_WIDTH;
/// Bytes preceding the body.
pub const PREFIX_LEN: usize = HEADER_A_LEN + LENGTH_LEN + HEADER_B_LEN;

/// Builds frames with a fixed header A and message type.
#[derive(Clone, Debug)]
pub struct FrameCodec {
    header_a: Bytes,
    message_type: String,
}

impl FrameCodec {
    /// Validate and pre-render the fixed header fields.
    pub fn new(header: &HeaderSettings) -> Result<Self, FrameError> {
        let mut a = String::with_capacity(HEADER_A_LEN);
        a.push_str(&pad("protocolTag", &header.protocol_tag, TAG_WIDTH)?);
        a.push_str(&pad("siteCode", &header.site_code, SITE_WIDTH)?);
        a.push_str(&pad("appCode", &header.app_code, APP_WIDTH)?);
        a.push_str(&pad("serviceCode", &header.service_code, SERVICE_WIDTH)?);
        a.push_str(&pad("exchangePattern", &header.exchange_pattern, PATTERN_WIDTH)?);

        Ok(Self {
            header_a: Bytes::from(a),
            message_type: pad("messageType", &header.message_type, TYPE_WIDTH)?,
        })
    }

    /// Frame `body` stamped with the current local time.
    pub fn frame(&self, body: &[u8]) -> Result<Bytes, FrameError> {
        self.frame_at(body, &compact_timestamp())
    }

    /// Frame `body` with an explicit header-B timestamp.
    pub fn frame_at(&self, body: &[u8], timestamp: &str) -> Result<Bytes, FrameError> {
        let len = u32::try_from(body.len()).map_err(|_| FrameError::BodyTooLarge(body.len()))?;

        let mut buf = BytesMut::with_capacity(PREFIX_LEN + body.len());
        buf.put_slice(&self.header_a);
        buf.put_u32_le(len);
        buf.put_slice(self.message_type.as_bytes());
        buf.put_bytes(b' ', TRACE_WIDTH);
        buf.put_slice(fit(timestamp, TIMESTAMP_WIDTH).as_bytes());
        buf.put_slice(body);
        Ok(buf.freeze())
    }
}

/// Right-align `value` in `width` bytes.
fn pad(field: &'static str, value: &str, width: usize) -> Result<String, FrameError> {
    if value.len() > width || !value.is_ascii() {
        return Err(FrameError::FieldTooWide {
            field,
            width,
            value: value.to_string(),
        });
    }
    Ok(format!("{value:>width$}"))
}

/// Left-align and pad or cut to exactly `width` ASCII bytes.
fn fit(value: &str, width: usize) -> String {
    let ascii: String = value.chars().filter(char::is_ascii).take(width).collect();
    format!("{ascii:<width$}")
}

/// A frame parsed back into its parts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedFrame {
    /// Protocol tag, trimmed.
    pub protocol_tag: String,
    /// Site code, trimmed.
    pub site_code: String,
    /// Application code, trimmed.
    pub app_code: String,
    /// Service code, trimmed.
    pub service_code: String,
    /// Exchange pattern flag, untrimmed (a single space is meaningful).
    pub exchange_pattern: String,
    /// Declared body length.
    pub body_len: u32,
    /// Message type code, trimmed.
    pub message_type: String,
    /// Trace identifier, trimmed (empty when unset).
    pub trace_id: String,
    /// Header-B timestamp, trimmed.
    pub timestamp: String,
    /// Body bytes.
    pub body: Bytes,
}

/// Parse one frame from the front of `input`.
///
/// Returns the frame and the number of bytes consumed, so callers can walk a
/// stream of concatenated frames.
pub fn decode_frame(input: &[u8]) -> Result<(DecodedFrame, usize), FrameError> {
    if input.len() < PREFIX_LEN {
        return Err(FrameError::Incomplete {
            needed: PREFIX_LEN - input.len(),
        });
    }

    let mut cur = input;
    let header_a = take_str(&mut cur, HEADER_A_LEN, "header A")?;
    let body_len = cur.get_u32_le();
    let header_b = take_str(&mut cur, HEADER_B_LEN, "header B")?;

    let body_usize = body_len as usize;
    if cur.len() < body_usize {
        return Err(FrameError::Incomplete {
            needed: body_usize - cur.len(),
        });
    }
    let body = Bytes::copy_from_slice(&cur[..body_usize]);

    let mut a = Fields(header_a);
    let mut b = Fields(header_b);
    let frame = DecodedFrame {
        protocol_tag: a.next_trimmed(TAG_WIDTH),
        site_code: a.next_trimmed(SITE_WIDTH),
        app_code: a.next_trimmed(APP_WIDTH),
        service_code: a.next_trimmed(SERVICE_WIDTH),
        exchange_pattern: a.next_raw(PATTERN_WIDTH),
        body_len,
        message_type: b.next_trimmed(TYPE_WIDTH),
        trace_id: b.next_trimmed(TRACE_WIDTH),
        timestamp: b.next_trimmed(TIMESTAMP_WIDTH),
        body,
    };
    Ok((frame, PREFIX_LEN + body_usize))
}

fn take_str<'a>(
    cur: &mut &'a [u8],
    len: usize,
    segment: &'static str,
) -> Result<&'a str, FrameError> {
    let (head, rest) = cur.split_at(len);
    *cur = rest;
    match std::str::from_utf8(head) {
        Ok(s) if s.is_ascii() => Ok(s),
        _ => Err(FrameError::InvalidHeader(segment)),
    }
}

struct Fields<'a>(&'a str);

impl Fields<'_> {
    fn next_raw(&mut self, width: usize) -> String {
        let (field, rest) = self.0.split_at(width);
        self.0 = rest;
        field.to_string()
    }

    fn next_trimmed(&mut self, width: usize) -> String {
        self.next_raw(width).trim().to_string()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
