//! Port Interfaces
//!
//! Contracts between the simulation services and the outside world,
//! following the Hexagonal Architecture pattern.
//!
//! ## Driven Ports (Outbound)
//!
//! - `Clock`: Source of timestamps and time-based seeds
//! - `TradeSink`: Consumer of simulated trade ticks

mod clock_port;
mod trade_sink_port;

#[cfg(test)]
pub use clock_port::MockClock;
pub use clock_port::{Clock, FixedClock, SystemClock};
pub use trade_sink_port::{NoOpTradeSink, TradeSink};
