//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the application services and the port interfaces
//! through which they reach time and trade consumers.

/// Port interfaces for time and trade delivery.
pub mod ports;

/// Application services for market data and trade streaming.
pub mod services;
