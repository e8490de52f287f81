use crate::output::print_document;
use anyhow::Context;
use clap::{Args, ValueEnum};
use rigging_core::{
    blueprint::Blueprint,
    config::Config,
    descriptor::{ComponentDescriptor, ComponentDescriptorList},
    installation::Installation,
    literal::LiteralTemplater,
    templater::{DeployExecutionOptions, ExecutionTemplater, ExportExecutionOptions, Templater},
    templates::{DeployItemTemplateList, ExportMap, InstallationTemplate},
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RenderStage {
    Subinstallations,
    Deployitems,
    Exports,
    All,
}

#[derive(Args)]
pub struct RenderArgs {
    /// Blueprint directory (contains blueprint.yaml)
    #[arg(long)]
    blueprint: PathBuf,

    /// YAML mapping of import values
    #[arg(long)]
    imports: Option<PathBuf>,

    /// Resolved component descriptor
    #[arg(long)]
    cd: Option<PathBuf>,

    /// Component descriptor list
    #[arg(long)]
    components: Option<PathBuf>,

    /// Installation the blueprint is rendered for
    #[arg(long)]
    installation: Option<PathBuf>,

    /// Exported values of deployed items, input to export executors
    #[arg(long)]
    exports: Option<PathBuf>,

    /// Which pipelines to run
    #[arg(long, value_enum, default_value = "all")]
    stage: RenderStage,
}

#[derive(Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct Rendered {
    #[serde(skip_serializing_if = "Option::is_none")]
    subinstallations: Option<Vec<InstallationTemplate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deploy_items: Option<DeployItemTemplateList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exports: Option<ExportMap>,
}

fn read_document<T: DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} from {}", path.display()))?;
    serde_yaml::from_str(&data)
        .with_context(|| format!("failed to parse {what} {}", path.display()))
}

fn read_optional<T: DeserializeOwned>(
    path: Option<&Path>,
    what: &str,
) -> anyhow::Result<Option<T>> {
    path.map(|p| read_document(p, what)).transpose()
}

/// Registry with the built-in backends, honoring the configured duplicate policy.
fn build_templater(config: &Config) -> anyhow::Result<Templater> {
    let backends: Vec<Arc<dyn ExecutionTemplater>> = vec![Arc::new(LiteralTemplater)];
    Templater::with_policy(backends, config.templater.duplicate_types)
        .context("failed to build templater")
}

pub fn run(root: &Path, args: RenderArgs, json: bool) -> anyhow::Result<()> {
    let config = Config::load_or_default(root).context("failed to load config")?;
    let templater = build_templater(&config)?;

    let blueprint = Blueprint::load(&args.blueprint)
        .with_context(|| format!("failed to load blueprint from {}", args.blueprint.display()))?;
    let imports: Map<String, Value> =
        read_optional(args.imports.as_deref(), "imports")?.unwrap_or_default();
    let cd: Option<ComponentDescriptor> =
        read_optional(args.cd.as_deref(), "component descriptor")?;
    let components: Option<ComponentDescriptorList> =
        read_optional(args.components.as_deref(), "component descriptor list")?;
    let installation: Option<Installation> =
        read_optional(args.installation.as_deref(), "installation")?;

    let opts = DeployExecutionOptions {
        imports: &imports,
        installation: installation.as_ref(),
        blueprint: &blueprint,
        component_descriptor: cd.as_ref(),
        component_descriptors: components.as_ref(),
    };

    let wants = |stage: RenderStage| args.stage == stage || args.stage == RenderStage::All;
    let mut rendered = Rendered::default();

    if wants(RenderStage::Subinstallations) {
        rendered.subinstallations = Some(
            templater
                .template_subinstallation_executions(&opts)
                .context("failed to render subinstallations")?,
        );
    }
    if wants(RenderStage::Deployitems) {
        rendered.deploy_items = Some(
            templater
                .template_deploy_executions(&opts)
                .context("failed to render deploy items")?,
        );
    }
    if wants(RenderStage::Exports) {
        let exports: Value = read_optional(args.exports.as_deref(), "exports")?.unwrap_or_default();
        rendered.exports = Some(
            templater
                .template_export_executions(ExportExecutionOptions {
                    blueprint: &blueprint,
                    exports,
                })
                .context("failed to render exports")?,
        );
    }

    tracing::debug!(blueprint = %args.blueprint.display(), "render complete");
    print_document(&rendered, json)
}
