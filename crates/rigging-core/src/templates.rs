//! Rendered outputs: what backends produce and the pipelines aggregate.

use crate::installation::BlueprintDefinition;
use crate::types::ObjectReference;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub type ExportMap = Map<String, Value>;

// ---------------------------------------------------------------------------
// InstallationTemplate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataImport {
    pub name: String,
    pub data_ref: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetImport {
    pub name: String,
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstallationImports {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<DataImport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<TargetImport>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstallationExports {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<DataImport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<TargetImport>,
}

/// A nested installation to be created by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationTemplate {
    pub name: String,
    pub blueprint: BlueprintDefinition,
    #[serde(default)]
    pub imports: InstallationImports,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub import_data_mappings: BTreeMap<String, Value>,
    #[serde(default)]
    pub exports: InstallationExports,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub export_data_mappings: BTreeMap<String, Value>,
}

// ---------------------------------------------------------------------------
// DeployItemTemplate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployItemTemplate {
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ObjectReference>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Provider configuration handed to the deployer untouched.
    #[serde(default)]
    pub config: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl DeployItemTemplate {
    pub fn new(name: impl Into<String>, item_type: impl Into<String>, config: Value) -> Self {
        Self {
            name: name.into(),
            item_type: item_type.into(),
            target: None,
            labels: BTreeMap::new(),
            config,
            depends_on: Vec::new(),
        }
    }

    pub fn with_target(mut self, name: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.target = Some(ObjectReference {
            name: name.into(),
            namespace: namespace.into(),
        });
        self
    }
}

pub type DeployItemTemplateList = Vec<DeployItemTemplate>;

// ---------------------------------------------------------------------------
// Executor outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubinstallationExecutorOutput {
    #[serde(default)]
    pub subinstallations: Option<Vec<InstallationTemplate>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployExecutorOutput {
    #[serde(default)]
    pub deploy_items: Option<DeployItemTemplateList>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportExecutorOutput {
    #[serde(default)]
    pub exports: Option<ExportMap>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deploy_output_parses_camel_case() {
        let yaml = r#"
deployItems:
  - name: nginx
    type: landscaper.gardener.cloud/kubernetes-manifest
    target:
      name: cluster
      namespace: demo
    config:
      updateStrategy: update
    dependsOn: [db]
"#;
        let out: DeployExecutorOutput = serde_yaml::from_str(yaml).unwrap();
        let items = out.deploy_items.unwrap();
        assert_eq!(items[0].item_type, "landscaper.gardener.cloud/kubernetes-manifest");
        assert_eq!(items[0].target.as_ref().unwrap().namespace, "demo");
        assert_eq!(items[0].config, json!({"updateStrategy": "update"}));
        assert_eq!(items[0].depends_on, vec!["db".to_string()]);
    }

    #[test]
    fn absent_lists_stay_none() {
        let out: SubinstallationExecutorOutput = serde_yaml::from_str("{}").unwrap();
        assert!(out.subinstallations.is_none());
        let out: ExportExecutorOutput = serde_yaml::from_str("exports: ~").unwrap();
        assert!(out.exports.is_none());
    }
}
