use crate::loader::LoadMode;
use crate::LoaderError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Client configuration, read from `~/.config/gantry/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Root directory of the bundle cache. Defaults to the CLI's standard
    /// location when unset.
    #[serde(default)]
    pub cache_root: Option<String>,
    /// Strategy selection policy.
    #[serde(default)]
    pub mode: LoadMode,
    /// Store successfully fetched development bundles into the cache.
    #[serde(default)]
    pub save_to_cache: bool,
}

impl ClientConfig {
    /// Load config from the default path, falling back to defaults when the
    /// file does not exist.
    pub fn load_default() -> Result<Self, LoaderError> {
        let path = default_config_path()?;
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load(path: &Path) -> Result<Self, LoaderError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| LoaderError::Config(format!("invalid config: {e}")))
    }

    pub fn save(&self, path: &Path) -> Result<(), LoaderError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| LoaderError::Config(format!("serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn default_config_path() -> Result<PathBuf, LoaderError> {
    let home =
        std::env::var("HOME").map_err(|_| LoaderError::Config("HOME not set".to_owned()))?;
    Ok(PathBuf::from(home).join(".config/gantry/config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = ClientConfig {
            cache_root: Some("/var/cache/gantry".to_owned()),
            mode: LoadMode::Development,
            save_to_cache: true,
        };
        config.save(&path).unwrap();

        let loaded = ClientConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn empty_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();

        let loaded = ClientConfig::load(&path).unwrap();
        assert_eq!(loaded, ClientConfig::default());
        assert_eq!(loaded.mode, LoadMode::Auto);
        assert!(!loaded.save_to_cache);
    }

    #[test]
    fn mode_uses_kebab_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "mode = \"published\"\n").unwrap();

        let loaded = ClientConfig::load(&path).unwrap();
        assert_eq!(loaded.mode, LoadMode::Published);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "no_such_option = 1\n").unwrap();

        assert!(matches!(
            ClientConfig::load(&path),
            Err(LoaderError::Config(_))
        ));
    }
}
