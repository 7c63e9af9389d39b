//! Configuration module for Taskloop.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{AgentSettings, GeneralSettings, ModelSettings, ServerSettings, Settings};
