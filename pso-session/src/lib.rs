//! # pso-session
//!
//! Connects client sessions to `pso-records`. A [`SessionHost`] hands out
//! [`ClientSession`]s, each holding exclusive use of one character slot
//! through a [`SlotLease`] for as long as its record store is alive.
//! Decoded client actions arrive as [`ClientEvent`]s.

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod lease;
pub mod logging;
pub mod session;

pub use config::{LogFormat, LoggingConfig, SessionConfig};
pub use error::{Result, SessionError};
pub use events::{ClientEvent, EventOutcome};
pub use host::SessionHost;
pub use lease::{SlotLease, SlotRegistry};
pub use session::ClientSession;
