//! Executor registry and the three render pipelines.
//!
//! A [`Templater`] maps template-type tags to backends. Each pipeline walks
//! the blueprint's executor list in declaration order, dispatches every
//! executor to the backend registered for its type, and aggregates the
//! results. The first failure aborts the pipeline; partial aggregates are
//! never returned.

use crate::blueprint::{Blueprint, TemplateExecutor};
use crate::codec::merge_maps;
use crate::descriptor::{ComponentDescriptor, ComponentDescriptorList};
use crate::error::{Result, RiggingError};
use crate::installation::Installation;
use crate::templates::{
    DeployExecutorOutput, DeployItemTemplateList, ExportExecutorOutput, ExportMap,
    InstallationTemplate, SubinstallationExecutorOutput,
};
use crate::types::TemplateType;
use crate::validation::{validate_deploy_item_template_list, FieldPath};
use crate::values::ValueContext;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Field path deploy item violations are reported under.
pub const DEPLOY_EXECUTIONS_FIELD: &str = "deployExecutions";

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Subinstallation,
    Deploy,
    Export,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Subinstallation => "subinstallation",
            Stage::Deploy => "deploy",
            Stage::Export => "export",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Backend seam
// ---------------------------------------------------------------------------

/// Everything a backend sees for one executor invocation.
#[derive(Debug, Clone, Copy)]
pub struct RenderInput<'a> {
    pub executor: &'a TemplateExecutor,
    pub blueprint: &'a Blueprint,
    pub descriptor: Option<&'a ComponentDescriptor>,
    pub descriptors: Option<&'a ComponentDescriptorList>,
    pub values: &'a ValueContext,
}

/// A template engine that can render all three executor kinds.
///
/// Backends must not mutate shared state between calls; one registry is
/// used for many renders, possibly from several threads.
pub trait ExecutionTemplater: Send + Sync {
    fn template_type(&self) -> TemplateType;

    fn template_subinstallation_executions(
        &self,
        input: &RenderInput<'_>,
    ) -> anyhow::Result<SubinstallationExecutorOutput>;

    fn template_deploy_executions(
        &self,
        input: &RenderInput<'_>,
    ) -> anyhow::Result<DeployExecutorOutput>;

    fn template_export_executions(
        &self,
        input: &RenderInput<'_>,
    ) -> anyhow::Result<ExportExecutorOutput>;
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Inputs for the sub-installation and deploy pipelines.
#[derive(Debug, Clone, Copy)]
pub struct DeployExecutionOptions<'a> {
    pub imports: &'a Map<String, Value>,
    pub installation: Option<&'a Installation>,
    pub blueprint: &'a Blueprint,
    pub component_descriptor: Option<&'a ComponentDescriptor>,
    pub component_descriptors: Option<&'a ComponentDescriptorList>,
}

impl<'a> DeployExecutionOptions<'a> {
    pub fn new(blueprint: &'a Blueprint, imports: &'a Map<String, Value>) -> Self {
        Self {
            imports,
            installation: None,
            blueprint,
            component_descriptor: None,
            component_descriptors: None,
        }
    }

    fn scope<'v>(&self, values: &'v ValueContext) -> Scope<'v>
    where
        'a: 'v,
    {
        Scope {
            blueprint: self.blueprint,
            descriptor: self.component_descriptor,
            descriptors: self.component_descriptors,
            values,
        }
    }

    fn values(&self) -> Result<ValueContext> {
        ValueContext::build(
            self.imports,
            self.component_descriptor,
            self.component_descriptors,
            self.installation,
        )
    }
}

/// Shared per-pipeline part of every [`RenderInput`].
#[derive(Clone, Copy)]
struct Scope<'a> {
    blueprint: &'a Blueprint,
    descriptor: Option<&'a ComponentDescriptor>,
    descriptors: Option<&'a ComponentDescriptorList>,
    values: &'a ValueContext,
}

#[derive(Debug, Clone)]
pub struct ExportExecutionOptions<'a> {
    pub blueprint: &'a Blueprint,
    /// Raw exported values of the deployed items, bound as the context.
    pub exports: Value,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    #[default]
    Reject,
    LastWins,
}

/// Registry of backends keyed by template type. Immutable once built.
#[derive(Clone)]
pub struct Templater {
    backends: BTreeMap<TemplateType, Arc<dyn ExecutionTemplater>>,
}

impl fmt::Debug for Templater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Templater")
            .field("types", &self.backends.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Templater {
    /// Build a registry; when two backends share a tag the later one wins.
    pub fn new(backends: Vec<Arc<dyn ExecutionTemplater>>) -> Self {
        let mut map = BTreeMap::new();
        for backend in backends {
            let tag = backend.template_type();
            if map.insert(tag.clone(), backend).is_some() {
                tracing::warn!(
                    template_type = %tag,
                    "backend registered twice, keeping the last one"
                );
            }
        }
        Self { backends: map }
    }

    pub fn with_policy(
        backends: Vec<Arc<dyn ExecutionTemplater>>,
        policy: DuplicatePolicy,
    ) -> Result<Self> {
        if policy == DuplicatePolicy::Reject {
            let mut seen = std::collections::BTreeSet::new();
            for backend in &backends {
                let tag = backend.template_type();
                if !seen.insert(tag.clone()) {
                    return Err(RiggingError::DuplicateExecutorType(tag));
                }
            }
        }
        Ok(Self::new(backends))
    }

    pub fn registered_types(&self) -> impl Iterator<Item = &TemplateType> {
        self.backends.keys()
    }

    fn backend(
        &self,
        stage: Stage,
        executor: &TemplateExecutor,
    ) -> Result<&Arc<dyn ExecutionTemplater>> {
        self.backends
            .get(&executor.template_type)
            .ok_or_else(|| RiggingError::UnknownExecutorType {
                template_type: executor.template_type.clone(),
                executor: executor.name.clone(),
                stage,
            })
    }

    /// Dispatch every executor of one stage, in order, collecting outputs.
    fn dispatch<T>(
        &self,
        stage: Stage,
        executors: &[TemplateExecutor],
        scope: Scope<'_>,
        call: impl Fn(&dyn ExecutionTemplater, &RenderInput<'_>) -> anyhow::Result<T>,
    ) -> Result<Vec<T>> {
        let mut outputs = Vec::with_capacity(executors.len());
        for executor in executors {
            let backend = self.backend(stage, executor)?;
            tracing::debug!(
                stage = %stage,
                executor = %executor.name,
                template_type = %executor.template_type,
                "rendering executor"
            );
            let input = RenderInput {
                executor,
                blueprint: scope.blueprint,
                descriptor: scope.descriptor,
                descriptors: scope.descriptors,
                values: scope.values,
            };
            let out = call(backend.as_ref(), &input).map_err(|source| RiggingError::Backend {
                stage,
                executor: executor.name.clone(),
                template_type: executor.template_type.clone(),
                source,
            })?;
            outputs.push(out);
        }
        Ok(outputs)
    }

    // -----------------------------------------------------------------------
    // Pipelines
    // -----------------------------------------------------------------------

    pub fn template_subinstallation_executions(
        &self,
        opts: &DeployExecutionOptions<'_>,
    ) -> Result<Vec<InstallationTemplate>> {
        let values = opts.values()?;
        let outputs = self.dispatch(
            Stage::Subinstallation,
            &opts.blueprint.subinstallation_executions,
            opts.scope(&values),
            |b, input| b.template_subinstallation_executions(input),
        )?;
        Ok(outputs
            .into_iter()
            .filter_map(|o| o.subinstallations)
            .flatten()
            .collect())
    }

    /// Render, concatenate and validate all deploy items.
    pub fn template_deploy_executions(
        &self,
        opts: &DeployExecutionOptions<'_>,
    ) -> Result<DeployItemTemplateList> {
        let values = opts.values()?;
        let outputs = self.dispatch(
            Stage::Deploy,
            &opts.blueprint.deploy_executions,
            opts.scope(&values),
            |b, input| b.template_deploy_executions(input),
        )?;
        let items: DeployItemTemplateList = outputs
            .into_iter()
            .filter_map(|o| o.deploy_items)
            .flatten()
            .collect();

        validate_deploy_item_template_list(&FieldPath::root(DEPLOY_EXECUTIONS_FIELD), &items)
            .map_err(RiggingError::Validation)?;
        Ok(items)
    }

    /// Render exports and merge them; later executors override earlier keys.
    pub fn template_export_executions(
        &self,
        opts: ExportExecutionOptions<'_>,
    ) -> Result<ExportMap> {
        let values = ValueContext::for_exports(opts.exports);
        let outputs = self.dispatch(
            Stage::Export,
            &opts.blueprint.export_executions,
            Scope {
                blueprint: opts.blueprint,
                descriptor: None,
                descriptors: None,
                values: &values,
            },
            |b, input| b.template_export_executions(input),
        )?;
        Ok(outputs
            .into_iter()
            .filter_map(|o| o.exports)
            .fold(ExportMap::new(), merge_maps))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
