//! # vabridge-wire
//!
//! Outbound path from an alert event to the downstream aggregation sink.
//!
//! ```text
//! ForwardMessage ──serde_json──▶ body ──FrameCodec::frame──▶ frame ──ForwardSink──▶ TCP
//! ```
//!
//! - [`frame`]: fixed-width headers around a little-endian length prefix
//! - [`message`]: the `StatEvet` body record
//! - [`sink`]: one connection and one write per event, no response read
//! - [`pool`]: bounded fire-and-forget delivery with an explicit drop policy

#![deny(unsafe_code)]

pub mod errors;
pub mod frame;
pub mod message;
pub mod pool;
pub mod sink;

pub use errors::{ForwardError, FrameError};
pub use frame::{
    DecodedFrame, FrameCodec, HEADER_A_LEN, HEADER_B_LEN, LENGTH_LEN, PREFIX_LEN, decode_frame,
};
pub use message::{ForwardMessage, StatEvent, compact_timestamp};
pub use pool::{ForwardPool, ForwardStats};
pub use sink::{ForwardSink, TcpSink};
