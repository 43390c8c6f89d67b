//! Collaborators that resolve credentials, workspaces and configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_USERNAME_KEY: &str = "defaultusername";
pub const DEFAULT_DEVHUB_USERNAME_KEY: &str = "defaultdevhubusername";
pub const API_VERSION_KEY: &str = "apiVersion";

/// File that marks the root of a project workspace.
pub const PROJECT_MARKER: &str = "cmdkit-project.json";

/// A resolved credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgHandle {
    pub username: String,
    pub api_version: Option<String>,
}

impl OrgHandle {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            api_version: None,
        }
    }
}

/// A resolved project workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectHandle {
    pub root: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrgResolveError {
    /// No username was given and the configuration has no default.
    #[error("no username given and no default set for {0}")]
    NoDefault(String),
    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectResolveError {
    #[error("this command must be run from within a project workspace")]
    NotInWorkspace,
    #[error("{0}")]
    Failed(String),
}

/// Aggregated configuration lookup.
pub trait ConfigReader {
    fn get(&self, key: &str) -> Option<String>;
}

/// Resolves a credential from an explicit username or a configured default.
pub trait OrgResolver {
    fn resolve(
        &self,
        username: Option<&str>,
        default_key: &str,
        config: &dyn ConfigReader,
    ) -> Result<OrgHandle, OrgResolveError>;
}

pub trait ProjectResolver {
    fn resolve(&self) -> Result<ProjectHandle, ProjectResolveError>;
}

impl ConfigReader for BTreeMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        BTreeMap::get(self, key).cloned()
    }
}

/// Configuration with no keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyConfig;

impl ConfigReader for EmptyConfig {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }
}

/// Uses the explicit username when given, else the configured default.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use command_kit_runtime::{ConfiguredOrgResolver, OrgResolver, DEFAULT_USERNAME_KEY};
///
/// let mut config = BTreeMap::new();
/// config.insert(DEFAULT_USERNAME_KEY.to_string(), "ada@example.com".to_string());
///
/// let org = ConfiguredOrgResolver.resolve(None, DEFAULT_USERNAME_KEY, &config).unwrap();
/// assert_eq!(org.username, "ada@example.com");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfiguredOrgResolver;

impl OrgResolver for ConfiguredOrgResolver {
    fn resolve(
        &self,
        username: Option<&str>,
        default_key: &str,
        config: &dyn ConfigReader,
    ) -> Result<OrgHandle, OrgResolveError> {
        let username = match username {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => config
                .get(default_key)
                .filter(|name| !name.trim().is_empty())
                .ok_or_else(|| OrgResolveError::NoDefault(default_key.to_string()))?,
        };
        Ok(OrgHandle {
            username,
            api_version: config.get(API_VERSION_KEY),
        })
    }
}

/// Never finds a workspace.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProjectResolver;

impl ProjectResolver for NoProjectResolver {
    fn resolve(&self) -> Result<ProjectHandle, ProjectResolveError> {
        Err(ProjectResolveError::NotInWorkspace)
    }
}

/// Walks up from a start directory looking for [`PROJECT_MARKER`].
#[derive(Debug, Clone)]
pub struct DirectoryProjectResolver {
    start: PathBuf,
}

impl DirectoryProjectResolver {
    pub fn new(start: impl Into<PathBuf>) -> Self {
        Self {
            start: start.into(),
        }
    }

    /// Starts from the process working directory.
    pub fn from_current_dir() -> Result<Self, ProjectResolveError> {
        std::env::current_dir()
            .map(Self::new)
            .map_err(|e| ProjectResolveError::Failed(format!("cannot read working directory: {e}")))
    }

    fn find_root(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .find(|dir| dir.join(PROJECT_MARKER).is_file())
            .map(Path::to_path_buf)
    }
}

impl ProjectResolver for DirectoryProjectResolver {
    fn resolve(&self) -> Result<ProjectHandle, ProjectResolveError> {
        let root = Self::find_root(&self.start).ok_or(ProjectResolveError::NotInWorkspace)?;
        debug!(root = %root.display(), "resolved project workspace");
        Ok(ProjectHandle { root })
    }
}
