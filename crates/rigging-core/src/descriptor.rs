//! Resolved component descriptors.
//!
//! These are consumed as already-resolved data: nothing here fetches,
//! verifies or walks references. The render path only serializes them into
//! the value context.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SCHEMA_VERSION: &str = "v2";

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub schema_version: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    #[default]
    Internal,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceRelation {
    #[default]
    Local,
    External,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryContext {
    #[serde(rename = "type")]
    pub context_type: String,
    pub base_url: String,
}

// ---------------------------------------------------------------------------
// Component contents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
    pub access: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub name: String,
    pub version: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub relation: ResourceRelation,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
    pub access: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentReference {
    pub name: String,
    pub component_name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub provider: ProviderType,
    #[serde(default)]
    pub repository_contexts: Vec<RepositoryContext>,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub component_references: Vec<ComponentReference>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
}

// ---------------------------------------------------------------------------
// ComponentDescriptor / ComponentDescriptorList
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    #[serde(default)]
    pub meta: Metadata,
    pub component: ComponentSpec,
}

impl ComponentDescriptor {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            meta: Metadata::default(),
            component: ComponentSpec {
                name: name.into(),
                version: version.into(),
                provider: ProviderType::default(),
                repository_contexts: Vec::new(),
                sources: Vec::new(),
                component_references: Vec::new(),
                resources: Vec::new(),
                labels: Vec::new(),
            },
        }
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.component.resources.iter().find(|r| r.name == name)
    }
}

/// Transitive closure of a resolved descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentDescriptorList {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub components: Vec<ComponentDescriptor>,
}

impl ComponentDescriptorList {
    pub fn get(&self, name: &str, version: &str) -> Option<&ComponentDescriptor> {
        self.components
            .iter()
            .find(|cd| cd.component.name == name && cd.component.version == version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CD_YAML: &str = r#"
meta:
  schemaVersion: v2
component:
  name: github.com/acme/nginx
  version: v1.2.0
  provider: internal
  repositoryContexts:
    - type: ociRegistry
      baseUrl: eu.gcr.io/acme
  sources: []
  componentReferences:
    - name: ingress
      componentName: github.com/acme/ingress
      version: v0.4.1
  resources:
    - name: blueprint
      version: v1.2.0
      type: blueprint
      relation: local
      access:
        type: localFilesystemBlob
        filename: blueprint.tar
"#;

    #[test]
    fn parses_v2_descriptor() {
        let cd: ComponentDescriptor = serde_yaml::from_str(CD_YAML).unwrap();
        assert_eq!(cd.component.name, "github.com/acme/nginx");
        assert_eq!(cd.component.component_references.len(), 1);
        assert_eq!(
            cd.resource("blueprint").unwrap().access["filename"],
            "blueprint.tar"
        );
    }

    #[test]
    fn list_lookup_by_name_and_version() {
        let cd: ComponentDescriptor = serde_yaml::from_str(CD_YAML).unwrap();
        let list = ComponentDescriptorList {
            metadata: Metadata::default(),
            components: vec![cd, ComponentDescriptor::new("github.com/acme/ingress", "v0.4.1")],
        };
        assert!(list.get("github.com/acme/ingress", "v0.4.1").is_some());
        assert!(list.get("github.com/acme/ingress", "v0.5.0").is_none());
    }
}
