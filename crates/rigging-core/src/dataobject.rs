//! Data objects: persisted, addressable records of exported values.

use crate::execution::Execution;
use crate::types::ObjectMeta;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

pub const SOURCE_LABEL: &str = "data.landscaper.gardener.cloud/source";
pub const SOURCE_TYPE_LABEL: &str = "data.landscaper.gardener.cloud/sourceType";
pub const CONTEXT_LABEL: &str = "data.landscaper.gardener.cloud/context";
pub const KEY_LABEL: &str = "data.landscaper.gardener.cloud/key";

pub const EXPORT_SOURCE_TYPE: &str = "export";

const MAX_NAME_LEN: usize = 63;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataObject {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub data: Value,
}

/// Source string identifying an execution as the producer of a data object.
pub fn source_from_execution(exec: &Execution) -> String {
    format!("Exec.{}", exec.metadata.name)
}

/// Deterministic object name for a `(context, key)` pair.
pub fn generate_name(context: &str, key: &str) -> String {
    let input = if key.is_empty() {
        context.to_string()
    } else {
        format!("{context}.{key}")
    };
    let digest = Sha256::digest(input.as_bytes());
    let mut name: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    name.truncate(MAX_NAME_LEN);
    name
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct DataObjectBuilder {
    namespace: String,
    source: String,
    context: String,
    key: String,
    data: Value,
}

impl DataObjectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn name(&self) -> String {
        generate_name(&self.context, &self.key)
    }

    pub fn build(&self) -> DataObject {
        let mut obj = DataObject {
            metadata: ObjectMeta::new(self.namespace.clone(), self.name()),
            data: Value::Null,
        };
        self.apply(&mut obj);
        obj
    }

    /// Write labels and payload onto `obj`, leaving other metadata alone.
    pub fn apply(&self, obj: &mut DataObject) {
        let labels = &mut obj.metadata.labels;
        labels.insert(SOURCE_TYPE_LABEL.to_string(), EXPORT_SOURCE_TYPE.to_string());
        if !self.source.is_empty() {
            labels.insert(SOURCE_LABEL.to_string(), self.source.clone());
        }
        if !self.context.is_empty() {
            labels.insert(CONTEXT_LABEL.to_string(), self.context.clone());
        }
        if !self.key.is_empty() {
            labels.insert(KEY_LABEL.to_string(), self.key.clone());
        }
        obj.data = self.data.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn names_are_stable_and_bounded() {
        let a = generate_name("Exec.deploy", "");
        assert_eq!(a, generate_name("Exec.deploy", ""));
        assert_eq!(a.len(), 63);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, generate_name("Exec.deploy", "replicas"));
        assert_ne!(a, generate_name("Exec.other", ""));
    }

    #[test]
    fn builder_sets_labels_and_data() {
        let obj = DataObjectBuilder::new()
            .namespace("demo")
            .source("Exec.web")
            .context("Exec.web")
            .data(json!({"replicas": 3}))
            .build();
        assert_eq!(obj.metadata.namespace, "demo");
        assert_eq!(obj.metadata.name, generate_name("Exec.web", ""));
        assert_eq!(obj.metadata.labels[SOURCE_LABEL], "Exec.web");
        assert_eq!(obj.metadata.labels[SOURCE_TYPE_LABEL], "export");
        assert!(!obj.metadata.labels.contains_key(KEY_LABEL));
        assert_eq!(obj.data["replicas"], 3);
    }

    #[test]
    fn apply_keeps_foreign_metadata() {
        let builder = DataObjectBuilder::new().context("c").key("k").data(json!(1));
        let mut obj = builder.build();
        obj.metadata.labels.insert("team".into(), "infra".into());
        obj.metadata.uid = "123".into();

        DataObjectBuilder::new().context("c").key("k").data(json!(2)).apply(&mut obj);
        assert_eq!(obj.metadata.labels["team"], "infra");
        assert_eq!(obj.metadata.labels[KEY_LABEL], "k");
        assert_eq!(obj.metadata.uid, "123");
        assert_eq!(obj.data, json!(2));
    }
}
