//! `config.toml` in the config directory.
//!
//! ```toml
//! library = "~/jenkins"
//!
//! [cli]
//! java = "/usr/lib/jvm/java-17/bin/java"
//! jar = "~/lib/jenkins-cli.jar"
//!
//! [hosts."https://ci.example/"]
//! auth_env = "CI_TOKEN"
//!
//! [hosts."https://staging.example/"]
//! auth = "admin:11aa22bb"
//! ```

use crate::paths;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use transfer::backend::cli::{CliSettings, JenkinsCliConnector};

pub const FILE_NAME: &str = "config.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Local library root used when `--local-copy` is absent
    pub library: Option<String>,
    pub cli: CliConfig,
    /// Credentials per instance base URL
    pub hosts: BTreeMap<String, HostConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub java: String,
    pub jar: Option<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            java: "java".to_string(),
            jar: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// `user:token` or `@file`
    pub auth: Option<String>,
    /// Environment variable holding `auth`
    pub auth_env: Option<String>,
}

impl HostConfig {
    fn credential(&self, host: &str) -> Option<String> {
        if let Some(auth) = &self.auth {
            return Some(auth.clone());
        }
        let var = self.auth_env.as_ref()?;
        match std::env::var(var) {
            Ok(value) if !value.is_empty() => Some(value),
            _ => {
                log::warn!("{} is not set; connecting to {} anonymously", var, host);
                None
            }
        }
    }
}

impl Config {
    /// Load from the config directory; defaults when the file is absent.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_dir()?.join(FILE_NAME))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid {}", path.display()))
    }

    /// Configured library root, expanded.
    pub fn library_path(&self) -> Option<PathBuf> {
        self.library.as_deref().map(paths::expand)
    }

    pub fn cli_settings(&self) -> CliSettings {
        CliSettings {
            java: self.cli.java.clone(),
            jar: self.cli.jar.as_deref().map(paths::expand),
            ..CliSettings::default()
        }
    }

    /// Jenkins CLI connector carrying every configured credential.
    pub fn connector(&self) -> JenkinsCliConnector {
        self.hosts.iter().fold(
            JenkinsCliConnector::new(self.cli_settings()),
            |connector, (host, cfg)| match cfg.credential(host) {
                Some(auth) => connector.with_credentials(host, auth),
                None => connector,
            },
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join(FILE_NAME)).unwrap();
        assert!(config.library.is_none());
        assert_eq!(config.cli.java, "java");
        assert!(config.hosts.is_empty());
    }

    #[test]
    fn test_full_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(FILE_NAME);
        fs::write(
            &path,
            r#"
library = "/srv/jenkins"

[cli]
jar = "/opt/jenkins-cli.jar"

[hosts."https://ci.example/"]
auth = "admin:token"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.library_path(), Some(PathBuf::from("/srv/jenkins")));
        assert_eq!(config.cli.java, "java");

        let settings = config.cli_settings();
        assert_eq!(settings.jar, Some(PathBuf::from("/opt/jenkins-cli.jar")));
        assert_eq!(
            config.hosts["https://ci.example/"].credential("https://ci.example/"),
            Some("admin:token".to_string())
        );
    }

    #[test]
    fn test_unset_auth_env_is_anonymous() {
        let host = HostConfig {
            auth: None,
            auth_env: Some("CLONER_TEST_SURELY_UNSET_TOKEN".to_string()),
        };
        assert_eq!(host.credential("https://ci.example/"), None);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(FILE_NAME);
        fs::write(&path, "libary = \"typo\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid"));
    }
}
