use crate::error::{Result, RiggingError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const RIGGING_DIR: &str = ".rigging";
pub const EXECUTIONS_DIR: &str = ".rigging/executions";
pub const DATAOBJECTS_DIR: &str = ".rigging/dataobjects";

pub const CONFIG_FILE: &str = ".rigging/config.yaml";

pub const BLUEPRINT_FILE: &str = "blueprint.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn rigging_dir(root: &Path) -> PathBuf {
    root.join(RIGGING_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn execution_path(root: &Path, namespace: &str, name: &str) -> PathBuf {
    root.join(EXECUTIONS_DIR)
        .join(namespace)
        .join(format!("{name}.yaml"))
}

pub fn dataobject_dir(root: &Path, namespace: &str) -> PathBuf {
    root.join(DATAOBJECTS_DIR).join(namespace)
}

pub fn dataobject_path(root: &Path, namespace: &str, name: &str) -> PathBuf {
    dataobject_dir(root, namespace).join(format!("{name}.yaml"))
}

pub fn blueprint_file(blueprint_dir: &Path) -> PathBuf {
    blueprint_dir.join(BLUEPRINT_FILE)
}

/// File a scaffolded deploy executor reads its template from.
pub fn execution_file_name(executor: &str) -> String {
    format!("deploy-execution-{executor}.yaml")
}

// ---------------------------------------------------------------------------
// Name validation
// ---------------------------------------------------------------------------

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(r"^[a-z0-9]([-_+a-z0-9]*[a-z0-9])?$").unwrap())
}

/// Names of executors, executions and namespaces double as file names.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 63 || !name_re().is_match(name) {
        return Err(RiggingError::InvalidName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
