use crate::templater::{ExecutionTemplater, RenderInput};
use crate::templates::{DeployExecutorOutput, ExportExecutorOutput, SubinstallationExecutorOutput};
use crate::types::TemplateType;
use anyhow::Context;
use serde::de::DeserializeOwned;

/// Backend for `Literal` executors: the template source is already the
/// rendered YAML document and is parsed as-is.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiteralTemplater;

impl LiteralTemplater {
    fn parse<T: DeserializeOwned + Default>(input: &RenderInput<'_>) -> anyhow::Result<T> {
        let src = input.executor.source(input.blueprint)?;
        if src.trim().is_empty() {
            return Ok(T::default());
        }
        serde_yaml::from_str(&src)
            .with_context(|| format!("executor '{}' is not a valid document", input.executor.name))
    }
}

impl ExecutionTemplater for LiteralTemplater {
    fn template_type(&self) -> TemplateType {
        TemplateType::literal()
    }

    fn template_subinstallation_executions(
        &self,
        input: &RenderInput<'_>,
    ) -> anyhow::Result<SubinstallationExecutorOutput> {
        Self::parse(input)
    }

    fn template_deploy_executions(
        &self,
        input: &RenderInput<'_>,
    ) -> anyhow::Result<DeployExecutorOutput> {
        Self::parse(input)
    }

    fn template_export_executions(
        &self,
        input: &RenderInput<'_>,
    ) -> anyhow::Result<ExportExecutorOutput> {
        Self::parse(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::{Blueprint, TemplateExecutor};
    use crate::values::ValueContext;

    fn render_deploy(src: &str) -> anyhow::Result<DeployExecutorOutput> {
        let executor = TemplateExecutor::inline("lit", TemplateType::literal(), src);
        let blueprint = Blueprint::default();
        let values = ValueContext::default();
        LiteralTemplater.template_deploy_executions(&RenderInput {
            executor: &executor,
            blueprint: &blueprint,
            descriptor: None,
            descriptors: None,
            values: &values,
        })
    }

    #[test]
    fn parses_deploy_items() {
        let out = render_deploy(concat!(
            "deployItems:\n",
            "  - name: web\n",
            "    type: landscaper.gardener.cloud/kubernetes-manifest\n",
            "    config: {}\n",
        ))
        .unwrap();
        assert_eq!(out.deploy_items.unwrap()[0].name, "web");
    }

    #[test]
    fn blank_source_renders_nothing() {
        assert!(render_deploy("  \n").unwrap().deploy_items.is_none());
    }

    #[test]
    fn malformed_source_names_executor() {
        let err = render_deploy("deployItems: [").unwrap_err();
        assert!(format!("{err:#}").contains("executor 'lit'"));
    }
}
