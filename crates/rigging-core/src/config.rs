use crate::error::{Result, RiggingError};
use crate::paths;
use crate::templater::DuplicatePolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_VERSION: u32 = 1;
pub const DEFAULT_NAMESPACE: &str = "default";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplaterConfig {
    /// What to do when two backends claim the same template type.
    #[serde(default)]
    pub duplicate_types: DuplicatePolicy,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub project: ProjectConfig,
    /// Namespace used when a command does not name one.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub templater: TemplaterConfig,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

impl Config {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            version: CONFIG_VERSION,
            project: ProjectConfig {
                name: project_name.into(),
                description: None,
            },
            namespace: default_namespace(),
            templater: TemplaterConfig::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(RiggingError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Load the config, or defaults when the project was never initialized.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        match Self::load(root) {
            Err(RiggingError::NotInitialized) => {
                let name = root
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Ok(Self::new(name))
            }
            other => other,
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.version > CONFIG_VERSION {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "config version {} is newer than supported version {}",
                    self.version, CONFIG_VERSION
                ),
            });
        }

        if self.project.name.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "project.name must not be empty".to_string(),
            });
        }

        if paths::validate_name(&self.namespace).is_err() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("namespace '{}' is not a valid name", self.namespace),
            });
        }

        if self.templater.duplicate_types == DuplicatePolicy::LastWins {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "templater.duplicateTypes is last_wins: a later backend silently \
                          replaces an earlier one"
                    .to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_from_minimal_yaml() {
        let cfg: Config = serde_yaml::from_str("project:\n  name: demo\n").unwrap();
        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.namespace, "default");
        assert_eq!(cfg.templater.duplicate_types, DuplicatePolicy::Reject);
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn parses_last_wins_policy() {
        let yaml = "project:\n  name: demo\ntemplater:\n  duplicateTypes: last_wins\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.templater.duplicate_types, DuplicatePolicy::LastWins);
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, WarnLevel::Warning);
    }

    #[test]
    fn validate_reports_errors() {
        let mut cfg = Config::new("");
        cfg.namespace = "Not Valid".into();
        cfg.version = 9;
        let levels: Vec<WarnLevel> = cfg.validate().into_iter().map(|w| w.level).collect();
        assert_eq!(
            levels,
            vec![WarnLevel::Warning, WarnLevel::Error, WarnLevel::Error]
        );
    }

    #[test]
    fn load_missing_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(RiggingError::NotInitialized)
        ));
        let cfg = Config::load_or_default(dir.path()).unwrap();
        assert_eq!(cfg.namespace, DEFAULT_NAMESPACE);
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::new("demo");
        cfg.namespace = "staging".into();
        cfg.save(dir.path()).unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), cfg);
    }
}
