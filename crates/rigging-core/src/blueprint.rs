use crate::error::{Result, RiggingError};
use crate::paths;
use crate::types::TemplateType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const BLUEPRINT_API_VERSION: &str = "landscaper.gardener.cloud/v1alpha1";
pub const BLUEPRINT_KIND: &str = "Blueprint";
pub const KUBERNETES_CLUSTER_TARGET_TYPE: &str = "landscaper.gardener.cloud/kubernetes-cluster";

// ---------------------------------------------------------------------------
// TemplateExecutor
// ---------------------------------------------------------------------------

/// One unit of rendering work declared by a blueprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateExecutor {
    pub name: String,
    #[serde(rename = "type")]
    pub template_type: TemplateType,
    /// Path of the template inside the blueprint directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Inline template source; wins over `file`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl TemplateExecutor {
    pub fn inline(
        name: impl Into<String>,
        template_type: TemplateType,
        template: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            template_type,
            file: None,
            template: Some(template.into()),
        }
    }

    /// Resolve the template source, reading `file` relative to the blueprint
    /// directory when there is no inline template.
    pub fn source(&self, blueprint: &Blueprint) -> Result<String> {
        if let Some(t) = &self.template {
            return Ok(t.clone());
        }
        let Some(file) = &self.file else {
            return Err(RiggingError::InvalidTemplateSource {
                executor: self.name.clone(),
                reason: "neither 'template' nor 'file' is set".to_string(),
            });
        };
        let Some(base) = blueprint.base_dir() else {
            return Err(RiggingError::InvalidTemplateSource {
                executor: self.name.clone(),
                reason: format!("file '{file}' referenced by an in-memory blueprint"),
            });
        };
        let path = base.join(file.trim_start_matches('/'));
        if !path.starts_with(base) || file.split('/').any(|c| c == "..") {
            return Err(RiggingError::InvalidTemplateSource {
                executor: self.name.clone(),
                reason: format!("file '{file}' escapes the blueprint directory"),
            });
        }
        Ok(std::fs::read_to_string(path)?)
    }
}

// ---------------------------------------------------------------------------
// Import / export declarations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Blueprint
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blueprint {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub imports: Vec<ImportDefinition>,
    #[serde(default)]
    pub exports: Vec<ExportDefinition>,
    #[serde(default)]
    pub subinstallation_executions: Vec<TemplateExecutor>,
    #[serde(default)]
    pub deploy_executions: Vec<TemplateExecutor>,
    #[serde(default)]
    pub export_executions: Vec<TemplateExecutor>,
    #[serde(skip)]
    pub(crate) base_dir: Option<PathBuf>,
}

fn default_api_version() -> String {
    BLUEPRINT_API_VERSION.to_string()
}

fn default_kind() -> String {
    BLUEPRINT_KIND.to_string()
}

impl Default for Blueprint {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            imports: Vec::new(),
            exports: Vec::new(),
            subinstallation_executions: Vec::new(),
            deploy_executions: Vec::new(),
            export_executions: Vec::new(),
            base_dir: None,
        }
    }
}

impl Blueprint {
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    pub fn load(dir: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(paths::blueprint_file(dir))?;
        let mut blueprint: Blueprint = serde_yaml::from_str(&data)?;
        blueprint.base_dir = Some(dir.to_path_buf());
        Ok(blueprint)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&paths::blueprint_file(dir), data.as_bytes())
    }

    pub fn import(&self, name: &str) -> Option<&ImportDefinition> {
        self.imports.iter().find(|i| i.name == name)
    }
}

// ---------------------------------------------------------------------------
// BlueprintBuilder
// ---------------------------------------------------------------------------

/// Incremental edits to a blueprint, as done when scaffolding components.
pub struct BlueprintBuilder<'a> {
    blueprint: &'a mut Blueprint,
}

impl<'a> BlueprintBuilder<'a> {
    pub fn new(blueprint: &'a mut Blueprint) -> Self {
        Self { blueprint }
    }

    /// Add an import unless one with the same name is already declared.
    pub fn add_import(&mut self, import: ImportDefinition) {
        if self.blueprint.import(&import.name).is_some() {
            return;
        }
        self.blueprint.imports.push(import);
    }

    pub fn add_imports(&mut self, imports: impl IntoIterator<Item = ImportDefinition>) {
        for import in imports {
            self.add_import(import);
        }
    }

    pub fn add_import_for_target(&mut self, name: &str) {
        self.add_import(ImportDefinition {
            name: name.to_string(),
            schema: None,
            target_type: Some(KUBERNETES_CLUSTER_TARGET_TYPE.to_string()),
            required: Some(true),
        });
    }

    pub fn add_import_for_elementary_type(&mut self, name: &str, elementary_type: &str) {
        self.add_import(ImportDefinition {
            name: name.to_string(),
            schema: Some(serde_json::json!({ "type": elementary_type })),
            target_type: None,
            required: Some(true),
        });
    }

    pub fn exists_deploy_execution(&self, name: &str) -> bool {
        self.blueprint.deploy_executions.iter().any(|e| e.name == name)
    }

    /// Append a deploy executor reading its template from
    /// [`paths::execution_file_name`].
    pub fn add_deploy_execution(&mut self, name: &str, template_type: TemplateType) {
        self.blueprint.deploy_executions.push(TemplateExecutor {
            name: name.to_string(),
            template_type,
            file: Some(format!("/{}", paths::execution_file_name(name))),
            template: None,
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
