//! Read-only input bindings handed to every backend invocation.

use crate::codec::{encode_optional, encode_to_generic_tree};
use crate::descriptor::{ComponentDescriptor, ComponentDescriptorList};
use crate::error::Result;
use crate::installation::Installation;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const IMPORTS_KEY: &str = "imports";
pub const CD_KEY: &str = "cd";
pub const COMPONENTS_KEY: &str = "components";
pub const BLUEPRINT_KEY: &str = "blueprint";
pub const CD_DEF_KEY: &str = "componentDescriptorDef";
pub const VALUES_KEY: &str = "values";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValueContext(BTreeMap<String, Value>);

impl ValueContext {
    /// Assemble the context for the sub-installation and deploy pipelines.
    ///
    /// Descriptors are passed through a serialize/parse round trip so
    /// backends always see plain JSON trees. Any encoding failure aborts;
    /// a partially built context is never returned.
    pub fn build(
        imports: &Map<String, Value>,
        cd: Option<&ComponentDescriptor>,
        components: Option<&ComponentDescriptorList>,
        installation: Option<&Installation>,
    ) -> Result<Self> {
        let mut values = BTreeMap::new();
        values.insert(IMPORTS_KEY.to_string(), Value::Object(imports.clone()));
        values.insert(
            CD_KEY.to_string(),
            encode_optional("resolved component descriptor", cd)?,
        );
        values.insert(
            COMPONENTS_KEY.to_string(),
            encode_optional("component descriptor list", components)?,
        );

        if let Some(inst) = installation {
            values.insert(
                BLUEPRINT_KEY.to_string(),
                encode_to_generic_tree("blueprint definition", &inst.spec.blueprint)?,
            );
            if let Some(cd_def) = &inst.spec.component_descriptor {
                values.insert(
                    CD_DEF_KEY.to_string(),
                    encode_to_generic_tree("component descriptor definition", cd_def)?,
                );
            }
        }

        Ok(Self(values))
    }

    /// Context for the export pipeline. Object keys become entries; any
    /// other value is bound under `values`.
    pub fn for_exports(exports: Value) -> Self {
        match exports {
            Value::Object(map) => Self(map.into_iter().collect()),
            Value::Null => Self::default(),
            other => Self(BTreeMap::from([(VALUES_KEY.to_string(), other)])),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// The whole context as one JSON object.
    pub fn as_value(&self) -> Value {
        Value::Object(self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installation::{
        BlueprintDefinition, ComponentDescriptorDefinition, ComponentDescriptorReference,
        InstallationSpec,
    };
    use serde_json::json;

    fn imports() -> Map<String, Value> {
        json!({"replicas": 3}).as_object().unwrap().clone()
    }

    #[test]
    fn base_keys_always_present() {
        let ctx = ValueContext::build(&imports(), None, None, None).unwrap();
        let keys: Vec<&str> = ctx.keys().collect();
        assert_eq!(keys, vec!["cd", "components", "imports"]);
        assert!(ctx.get(CD_KEY).unwrap().is_null());
        assert!(ctx.get(COMPONENTS_KEY).unwrap().is_null());
        assert_eq!(ctx.get(IMPORTS_KEY).unwrap()["replicas"], 3);
    }

    #[test]
    fn descriptor_reads_back_field_for_field() {
        let cd = ComponentDescriptor::new("github.com/acme/app", "v1.0.0");
        let list = ComponentDescriptorList {
            components: vec![cd.clone()],
            ..Default::default()
        };
        let ctx = ValueContext::build(&imports(), Some(&cd), Some(&list), None).unwrap();

        let back: ComponentDescriptor =
            serde_json::from_value(ctx.get(CD_KEY).unwrap().clone()).unwrap();
        assert_eq!(back, cd);
        let back: ComponentDescriptorList =
            serde_json::from_value(ctx.get(COMPONENTS_KEY).unwrap().clone()).unwrap();
        assert_eq!(back, list);
    }

    #[test]
    fn installation_adds_reference_keys() {
        let mut inst = Installation {
            spec: InstallationSpec {
                blueprint: BlueprintDefinition::from_resource("blueprint"),
                component_descriptor: None,
            },
            ..Default::default()
        };
        let ctx = ValueContext::build(&imports(), None, None, Some(&inst)).unwrap();
        assert_eq!(
            ctx.get(BLUEPRINT_KEY).unwrap(),
            &json!({"ref": {"resourceName": "blueprint"}})
        );
        assert!(!ctx.contains_key(CD_DEF_KEY));

        inst.spec.component_descriptor = Some(ComponentDescriptorDefinition {
            reference: Some(ComponentDescriptorReference {
                repository_context: None,
                component_name: "github.com/acme/app".into(),
                version: "v1.0.0".into(),
            }),
            inline: None,
        });
        let ctx = ValueContext::build(&imports(), None, None, Some(&inst)).unwrap();
        assert_eq!(
            ctx.get(CD_DEF_KEY).unwrap()["ref"]["componentName"],
            "github.com/acme/app"
        );
    }

    #[test]
    fn export_context_from_object_and_scalar() {
        let ctx = ValueContext::for_exports(json!({"deployitems": {"web": {"ip": "10.0.0.1"}}}));
        assert_eq!(ctx.get("deployitems").unwrap()["web"]["ip"], "10.0.0.1");

        let ctx = ValueContext::for_exports(json!([1, 2]));
        assert_eq!(ctx.get(VALUES_KEY).unwrap(), &json!([1, 2]));

        assert!(ValueContext::for_exports(Value::Null).keys().next().is_none());
    }
}
