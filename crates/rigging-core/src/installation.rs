use crate::types::ObjectMeta;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Blueprint definition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteBlueprintReference {
    pub resource_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintDefinition {
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<RemoteBlueprintReference>,
    /// Inline blueprint file tree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<Value>,
}

impl BlueprintDefinition {
    pub fn from_resource(resource_name: impl Into<String>) -> Self {
        Self {
            reference: Some(RemoteBlueprintReference {
                resource_name: resource_name.into(),
            }),
            filesystem: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Component descriptor definition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDescriptorReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_context: Option<crate::descriptor::RepositoryContext>,
    pub component_name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDescriptorDefinition {
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<ComponentDescriptorReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline: Option<crate::descriptor::ComponentDescriptor>,
}

// ---------------------------------------------------------------------------
// Installation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationSpec {
    pub blueprint: BlueprintDefinition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_descriptor: Option<ComponentDescriptorDefinition>,
}

/// The owning installation of a render, when there is one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Installation {
    pub metadata: ObjectMeta,
    pub spec: InstallationSpec,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installation_yaml_uses_ref_keys() {
        let yaml = r#"
metadata:
  name: nginx
  namespace: demo
spec:
  blueprint:
    ref:
      resourceName: blueprint
  componentDescriptor:
    ref:
      componentName: github.com/acme/nginx
      version: v1.2.0
"#;
        let inst: Installation = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            inst.spec.blueprint,
            BlueprintDefinition::from_resource("blueprint")
        );
        let cd = inst.spec.component_descriptor.unwrap();
        assert_eq!(cd.reference.unwrap().version, "v1.2.0");
    }
}
