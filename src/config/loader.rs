// Configuration file loading and creation

use super::types::Config;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Get the path to the configuration file
pub fn get_config_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("pong-ai-server");

    // Create config directory if it doesn't exist
    fs::create_dir_all(&path).ok();

    path.push("config.toml");
    path
}

/// Load configuration from file, or create default if it doesn't exist
pub fn load_config() -> Result<Config, io::Error> {
    let config_path = get_config_path();

    if config_path.exists() {
        let contents = fs::read_to_string(&config_path)?;
        match toml::from_str(&contents) {
            Ok(config) => Ok(config),
            Err(e) => {
                eprintln!("Warning: Failed to parse config file: {}", e);
                eprintln!("Using default configuration");
                Ok(Config::default())
            }
        }
    } else {
        // Create default config file
        create_default_config(&config_path)?;
        Ok(Config::default())
    }
}

/// Create a default configuration file with helpful comments
pub fn create_default_config(path: &Path) -> Result<(), io::Error> {
    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    // Add helpful header comments
    let commented_toml = format!(
        "# Pong AI Server Configuration File\n\
         # Edit this file to customize server behavior\n\
         # After editing, restart the server for changes to take effect\n\
         #\n\
         # default_difficulty applies to auto-provisioned games:\n\
         #   \"easy\", \"medium\", \"hard\", \"impossible\"\n\
         #\n\
         # logging levels: \"error\", \"warn\", \"info\", \"debug\", \"trace\"\n\n\
         {}",
        toml_string
    );

    fs::write(path, commented_toml)?;
    println!("Created default config file at: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serialization() {
        let config = Config::default();
        let toml_string = toml::to_string_pretty(&config).unwrap();

        // Should round-trip cleanly - parsed values must match the original defaults
        let parsed: Config = toml::from_str(&toml_string).unwrap();

        assert_eq!(parsed.network.listen_addr, config.network.listen_addr);
        assert_eq!(parsed.ai.default_difficulty, config.ai.default_difficulty);
        assert_eq!(parsed.logging.level, config.logging.level);
    }

    #[test]
    fn test_partial_config_with_defaults() {
        // Should be able to parse partial config with #[serde(default)]
        let partial_toml = r#"
            [network]
            listen_addr = "127.0.0.1:9000"
        "#;

        let config: Config = toml::from_str(partial_toml).unwrap();

        // Custom value
        assert_eq!(config.network.listen_addr, "127.0.0.1:9000");

        // Default values should still be there
        assert_eq!(config.ai.default_difficulty, "medium");
        assert_eq!(config.logging.level, "info");
    }
}
