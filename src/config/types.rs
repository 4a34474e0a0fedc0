// Server configuration types
// All settings carry defaults matching the original deployment values

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub ai: AiDefaultsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    // Address the WebSocket listener binds to
    pub listen_addr: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AiDefaultsConfig {
    // Difficulty used when a decision frame references a game nobody
    // initialized: "easy", "medium", "hard", "impossible"
    pub default_difficulty: String,
}

impl Default for AiDefaultsConfig {
    fn default() -> Self {
        Self {
            default_difficulty: "medium".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    // Log verbosity: "error", "warn", "info", "debug", "trace"
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
