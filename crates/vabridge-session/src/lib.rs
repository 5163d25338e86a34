//! # vabridge-session
//!
//! Supervises the appliance subscription.
//!
//! ```text
//! Authenticating ─▶ Connecting ─▶ Active ─▶ Draining ─▶ Restarting ─┐
//!       ▲                                      │                     │
//!       └──────────────────────────────────────┼─────────────────────┘
//!                                              └─▶ Stopped (shutdown)
//! ```
//!
//! - [`Orchestrator`]: the state machine above, one attempt at a time
//! - [`keepalive`]: periodic credential probe, one fatal signal at most
//! - [`pipeline`]: ordered dispatch of inbound frames (metadata → image)
//! - [`images`]: decode and persist still images as JPEG

#![deny(unsafe_code)]

pub mod errors;
pub mod images;
pub mod keepalive;
pub mod orchestrator;
pub mod pipeline;

pub use errors::PersistError;
pub use images::{ImageStore, JpegImageStore};
pub use keepalive::{KeepaliveResult, run_keepalive};
pub use orchestrator::{Orchestrator, OrchestratorConfig, SessionState};
pub use pipeline::{EventPipeline, PipelineExit};
