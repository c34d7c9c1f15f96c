//! # Built-in handlers
//!
//! Small, self-contained handlers useful for demos and for the consumers
//! that sit on top of the bus.
//!
//! - [`PayloadTally`]: tolerant counters for test and file events.
//! - [`LogHandler`]: writes every event as a `tracing` record (feature `logging`).

#[cfg(feature = "logging")]
mod log;
mod tally;

#[cfg(feature = "logging")]
pub use log::LogHandler;
pub use tally::{PayloadTally, TallySnapshot};
