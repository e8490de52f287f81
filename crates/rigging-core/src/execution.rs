//! Execution state controller: status updates and export publication.

use crate::condition::{merge_conditions, Condition};
use crate::dataobject::{source_from_execution, DataObjectBuilder};
use crate::error::Result;
use crate::owner::{set_owner_reference, Owner};
use crate::store::Writer;
use crate::templates::DeployItemTemplateList;
use crate::types::{ExecutionPhase, ObjectMeta, ObjectReference};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const EXECUTION_API_VERSION: &str = "landscaper.gardener.cloud/v1alpha1";
pub const EXECUTION_KIND: &str = "Execution";

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deploy_items: DeployItemTemplateList,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStatus {
    #[serde(default)]
    pub phase: ExecutionPhase,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_ref: Option<ObjectReference>,
    #[serde(default)]
    pub observed_generation: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ExecutionSpec,
    #[serde(default)]
    pub status: ExecutionStatus,
}

fn default_api_version() -> String {
    EXECUTION_API_VERSION.to_string()
}

fn default_kind() -> String {
    EXECUTION_KIND.to_string()
}

impl Execution {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata: ObjectMeta::new(namespace, name),
            spec: ExecutionSpec::default(),
            status: ExecutionStatus::default(),
        }
    }

    pub fn export_reference(&self) -> Option<&ObjectReference> {
        self.status.export_ref.as_ref()
    }

    pub fn condition(&self, condition_type: &str) -> Option<&Condition> {
        self.status
            .conditions
            .iter()
            .find(|c| c.condition_type == condition_type)
    }
}

impl Owner for Execution {
    fn api_version(&self) -> &str {
        &self.api_version
    }

    fn kind(&self) -> &str {
        &self.kind
    }

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }
}

// ---------------------------------------------------------------------------
// ExecutionOperation
// ---------------------------------------------------------------------------

/// Operations on one execution record, persisted through `W`.
pub struct ExecutionOperation<'a, W: Writer + ?Sized> {
    writer: &'a W,
    exec: &'a mut Execution,
}

impl<'a, W: Writer + ?Sized> ExecutionOperation<'a, W> {
    pub fn new(writer: &'a W, exec: &'a mut Execution) -> Self {
        Self { writer, exec }
    }

    pub fn execution(&self) -> &Execution {
        self.exec
    }

    /// Set the phase, merge `conditions` by type and persist the status.
    pub fn update_status(
        &mut self,
        phase: ExecutionPhase,
        conditions: impl IntoIterator<Item = Condition>,
    ) -> Result<()> {
        self.exec.status.phase = phase;
        merge_conditions(&mut self.exec.status.conditions, conditions);
        if let Err(e) = self.writer.update_execution_status(self.exec) {
            tracing::error!(
                execution = %self.exec.metadata.key(),
                error = %e,
                "unable to update execution status"
            );
            return Err(e);
        }
        Ok(())
    }

    /// Publish `values` as the execution's export data object and record the
    /// reference in the status. Re-publishing updates the same object.
    pub fn create_or_update_export_reference(&mut self, values: Value) -> Result<()> {
        let source = source_from_execution(self.exec);
        let builder = DataObjectBuilder::new()
            .namespace(self.exec.metadata.namespace.clone())
            .source(source.clone())
            .context(source)
            .data(values);
        let mut obj = builder.build();

        let owner: &Execution = self.exec;
        let result = self.writer.create_or_update_data_object(&mut obj, &mut |o| {
            set_owner_reference(owner, &mut o.metadata)?;
            builder.apply(o);
            Ok(())
        })?;
        tracing::info!(
            execution = %self.exec.metadata.key(),
            dataobject = %obj.metadata.name,
            result = %result,
            "export reference published"
        );

        self.exec.status.export_ref = Some(ObjectReference {
            name: obj.metadata.name,
            namespace: obj.metadata.namespace,
        });
        let phase = self.exec.status.phase;
        self.update_status(phase, Vec::new())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
