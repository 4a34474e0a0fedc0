// Configuration module for the AI server
// Handles loading and managing settings from a TOML file

pub mod loader;
pub mod types;

pub use loader::{create_default_config, get_config_path, load_config};
pub use types::{AiDefaultsConfig, Config, LoggingConfig, NetworkConfig};
