//! # DealScope Common Library
//!
//! Shared code for the DealScope engine and its binary including:
//! - Meeting record model and dimension enumeration
//! - Engine policy parameters
//! - Configuration loading
//! - Clock abstraction for time-window math
//! - SQLite pool initialization and record table schema

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod params;
pub mod record;
pub mod time;

pub use error::{Error, Result};
pub use params::EngineParams;
pub use record::{Dimension, Record};
pub use time::{Clock, FixedClock, SystemClock};
