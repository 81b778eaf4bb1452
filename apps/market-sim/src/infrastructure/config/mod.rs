//! Configuration Module
//!
//! Configuration loading for the simulator binary.

mod dotenv;
mod settings;

pub use dotenv::load_dotenv_from;
pub use settings::{ConfigError, FeedSettings, ServerSettings, SimConfig, TradeStreamSettings};
