use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Configuration shipped with the binary: site profile plus the full taxonomy
const BUILTIN_CONFIG: &str = include_str!("../../config/default.toml");

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use longchau_harvest::config::load_config;
///
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// println!("Base URL: {}", config.site.base_url);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Returns the built-in configuration
pub fn builtin_config() -> Result<Config, ConfigError> {
    parse_config(BUILTIN_CONFIG)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so that output files can be traced back to the
/// configuration that produced them.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(hash_content(&content))
}

fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Loads a configuration and returns both the config and its hash
///
/// When `path` is `None` the built-in configuration is used and the hash is
/// computed over its embedded text.
pub fn load_config_with_hash(path: Option<&Path>) -> Result<(Config, String), ConfigError> {
    match path {
        Some(path) => {
            let config = load_config(path)?;
            let hash = compute_config_hash(path)?;
            Ok((config, hash))
        }
        None => Ok((builtin_config()?, hash_content(BUILTIN_CONFIG))),
    }
}
