//! Bus core: dispatch, async worker pool and lifecycle.
//!
//! The public API from this module is [`EventBus`] (with [`EventBusBuilder`]),
//! its configuration [`BusConfig`] and the observable outputs [`BusMetrics`],
//! [`BusState`] and [`ShutdownReport`].
//!
//! Internal modules:
//! - [`dispatch`]: tiered handler invocation with panic recovery and stats;
//! - [`pool`]: bounded async dispatch queue and its workers;
//! - [`lifecycle`]: open/closing/closed state;
//! - [`metrics`]: live bus counters and their snapshot.

mod builder;
mod bus;
mod config;
mod dispatch;
mod lifecycle;
mod metrics;
mod pool;


pub use builder::EventBusBuilder;
pub use bus::EventBus;
pub use config::BusConfig;
pub use lifecycle::{BusState, ShutdownReport};
pub use metrics::BusMetrics;
