//! # vabridge-core
//!
//! Foundation types shared by every vabridge crate:
//!
//! - [`Credential`]: the opaque session token issued by the appliance
//! - [`EventRecord`] / [`ImageName`]: parsed alarm metadata and the key that
//!   correlates it with the image frame that follows
//! - [`EventCategory`]: fixed lookup table for appliance event-type codes
//! - [`logging`]: `tracing` subscriber setup
//! - [`metrics`]: names of the counters recorded across crates
//! - [`shutdown`]: hierarchical cancellation with a bounded grace period

#![deny(unsafe_code)]

pub mod category;
pub mod credential;
pub mod errors;
pub mod event;
pub mod logging;
pub mod metrics;
pub mod shutdown;

pub use category::EventCategory;
pub use credential::Credential;
pub use errors::DecodeError;
pub use event::{EventRecord, ImageName};
pub use logging::{LogFormat, LogLevel, init_subscriber};
pub use shutdown::ShutdownCoordinator;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
