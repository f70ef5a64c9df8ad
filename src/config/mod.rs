//! Configuration module for ControlClose
//!
//! - Data directory resolution
//! - Settings persistence (input policy, uniqueness, display preferences)

pub mod paths;
pub mod settings;

pub use paths::ControlClosePaths;
pub use settings::{InputPolicy, Settings};
