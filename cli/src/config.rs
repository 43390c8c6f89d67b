//! Aggregated configuration read from a YAML file.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use command_kit_runtime::ConfigReader;
use serde::Deserialize;
use thiserror::Error;

/// Overrides the configuration file location.
pub const CONFIG_PATH_VAR: &str = "CMDKIT_CONFIG";
/// Looked up in the working directory when [`CONFIG_PATH_VAR`] is unset.
pub const DEFAULT_CONFIG_FILE: &str = ".cmdkit.yml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("YAML error in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Flat `key: value` settings such as `defaultusername` or `apiVersion`.
///
/// Non-string scalars are kept in their YAML text form, so `apiVersion: 58.0`
/// reads back as `"58.0"`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct FileConfig {
    values: BTreeMap<String, serde_yaml::Value>,
}

impl FileConfig {
    /// Loads a YAML mapping from `path`. An empty file is an empty
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if it is not a YAML mapping.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let io_error = |source: std::io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(io_error)?;
        if file.metadata().map_err(io_error)?.len() == 0 {
            return Ok(Self::default());
        }
        let reader = BufReader::new(file);
        serde_yaml::from_reader(reader).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the file named by `CMDKIT_CONFIG`, or `.cmdkit.yml` in `dir`.
    /// A missing default file is an empty configuration.
    pub fn discover(dir: &Path, explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = dir.join(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::load(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl ConfigReader for FileConfig {
    fn get(&self, key: &str) -> Option<String> {
        match self.values.get(key)? {
            serde_yaml::Value::String(s) => Some(s.clone()),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            serde_yaml::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_reads_scalars() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yml");
        fs::write(
            &path,
            "defaultusername: ada@example.com\napiVersion: \"58.0\"\nretries: 3\n",
        )
        .unwrap();

        let config = FileConfig::load(&path).unwrap();
        assert_eq!(config.get("defaultusername").as_deref(), Some("ada@example.com"));
        assert_eq!(config.get("apiVersion").as_deref(), Some("58.0"));
        assert_eq!(config.get("retries").as_deref(), Some("3"));
        assert_eq!(config.get("missing"), None);
    }

    #[test]
    fn test_discover_missing_default_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let config = FileConfig::discover(temp_dir.path(), None).unwrap();
        assert_eq!(config.len(), 0);
    }

    #[test]
    fn test_discover_explicit_missing_fails() {
        let temp_dir = TempDir::new().unwrap();
        let err = FileConfig::discover(temp_dir.path(), Some(temp_dir.path().join("nope.yml")))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_empty_file_is_empty_config() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(DEFAULT_CONFIG_FILE), "").unwrap();
        let config = FileConfig::discover(temp_dir.path(), None).unwrap();
        assert_eq!(config.len(), 0);
    }

    #[test]
    fn test_explicit_empty_file_is_empty_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.yml");
        fs::write(&path, "").unwrap();
        let config = FileConfig::discover(temp_dir.path(), Some(path)).unwrap();
        assert_eq!(config.get("defaultusername"), None);
    }

    #[test]
    fn test_non_mapping_is_yaml_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.yml");
        fs::write(&path, "- a\n- b\n").unwrap();
        assert!(matches!(FileConfig::load(&path), Err(ConfigError::Yaml { .. })));
    }
}
