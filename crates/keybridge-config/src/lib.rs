//! Configuration parsing for keybridge
//!
//! This crate handles parsing the KDL configuration file that tunes the
//! keyboard coalescer (repeat timing, release delay) and logging.

mod error;
mod model;
mod parser;

pub use error::ConfigError;
pub use model::*;
pub use parser::{parse_config, parse_config_str};
