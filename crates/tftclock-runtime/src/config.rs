//! Configuration file loading.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Where a loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// A path was given but does not exist.
    Missing(PathBuf),
    Defaults,
}

impl ConfigSource {
    /// Reports the source. Call once logging is up.
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded configuration from: {}", path.display()),
            ConfigSource::Missing(path) => warn!("{} not found, using defaults", path.display()),
            ConfigSource::Defaults => info!("No configuration file given, using defaults"),
        }
    }
}

/// A configuration together with its source.
#[derive(Debug)]
pub struct Loaded<T> {
    pub config: T,
    pub source: ConfigSource,
}

/// Loads configuration from a TOML file.
pub fn load<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let content =
        std::fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
    let config: T = toml::from_str(&content).context("Failed to parse configuration")?;
    Ok(config)
}

/// Loads `path` if it exists, otherwise the built-in defaults.
///
/// Nothing is logged here, so this is safe to call before the subscriber
/// is installed; see [`ConfigSource::log`].
pub fn load_or_default<T>(path: Option<&Path>) -> Result<Loaded<T>>
where
    T: DeserializeOwned + Default,
{
    let (config, source) = match path {
        Some(path) if !path.exists() => (T::default(), ConfigSource::Missing(path.to_path_buf())),
        Some(path) => (load(path)?, ConfigSource::File(path.to_path_buf())),
        None => (T::default(), ConfigSource::Defaults),
    };
    Ok(Loaded { config, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        #[serde(default = "default_value")]
        value: u32,
    }

    fn default_value() -> u32 {
        7
    }

    impl Default for Sample {
        fn default() -> Self {
            Self {
                value: default_value(),
            }
        }
    }

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}", std::process::id(), name));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let path = Path::new("/nonexistent/tftclock.toml");
        let loaded: Loaded<Sample> = load_or_default(Some(path)).unwrap();
        assert_eq!(loaded.config, Sample::default());
        assert_eq!(loaded.source, ConfigSource::Missing(path.to_path_buf()));
    }

    #[test]
    fn test_no_path_uses_defaults() {
        let loaded: Loaded<Sample> = load_or_default(None).unwrap();
        assert_eq!(loaded.config.value, 7);
        assert_eq!(loaded.source, ConfigSource::Defaults);
    }

    #[test]
    fn test_existing_file_is_parsed() {
        let path = temp_file("tftclock-config-ok.toml", "value = 3\n");
        let loaded: Loaded<Sample> = load_or_default(Some(&path)).unwrap();
        assert_eq!(loaded.config.value, 3);
        assert_eq!(loaded.source, ConfigSource::File(path.clone()));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let path = temp_file("tftclock-config-bad.toml", "value = \"three\"\n");
        assert!(load_or_default::<Sample>(Some(&path)).is_err());
        std::fs::remove_file(path).unwrap();
    }
}
