use crate::output::print_json;
use anyhow::{bail, Context};
use clap::Subcommand;
use rigging_core::{
    blueprint::{Blueprint, BlueprintBuilder},
    config::Config,
    io, paths,
    templater::DEPLOY_EXECUTIONS_FIELD,
    templates::{DeployExecutorOutput, DeployItemTemplate},
    types::TemplateType,
    validation::{is_dns_label, validate_deploy_item_template_list, FieldPath},
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

pub const MANIFEST_DEPLOY_ITEM_TYPE: &str = "landscaper.gardener.cloud/kubernetes-manifest";
pub const MANIFEST_CONFIG_API_VERSION: &str =
    "manifest.deployer.landscaper.gardener.cloud/v1alpha2";
pub const MANIFEST_CONFIG_KIND: &str = "ProviderConfiguration";

const ELEMENTARY_TYPES: &[&str] = &["string", "boolean", "integer"];

#[derive(Subcommand)]
pub enum BlueprintSubcommand {
    /// Add a manifest deploy item: a deploy executor, its imports and a
    /// literal execution file
    AddDeployitem {
        /// Deploy item name
        name: String,
        /// Blueprint directory (contains blueprint.yaml)
        #[arg(long)]
        blueprint: PathBuf,
        /// Kubernetes manifest to deploy (repeatable)
        #[arg(long = "manifest-file")]
        manifest_files: Vec<PathBuf>,
        /// Import parameter as name:integer|string|boolean (repeatable)
        #[arg(long = "import-param")]
        import_params: Vec<String>,
        /// Import holding the target cluster
        #[arg(long = "cluster-param")]
        cluster_param: String,
        /// Name of the target object (default: the cluster param)
        #[arg(long = "target-name")]
        target_name: Option<String>,
        /// Update strategy of the manifest deployer
        #[arg(long, default_value = "update")]
        update_strategy: String,
        /// Policy applied to every manifest
        #[arg(long, default_value = "manage")]
        policy: String,
    },
}

pub fn run(root: &Path, subcmd: BlueprintSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        BlueprintSubcommand::AddDeployitem {
            name,
            blueprint,
            manifest_files,
            import_params,
            cluster_param,
            target_name,
            update_strategy,
            policy,
        } => add_deployitem(
            root,
            &AddDeployItem {
                name,
                blueprint_dir: blueprint,
                manifest_files,
                import_params,
                cluster_param,
                target_name,
                update_strategy,
                policy,
            },
            json,
        ),
    }
}

struct AddDeployItem {
    name: String,
    blueprint_dir: PathBuf,
    manifest_files: Vec<PathBuf>,
    import_params: Vec<String>,
    cluster_param: String,
    target_name: Option<String>,
    update_strategy: String,
    policy: String,
}

/// Split `name:type` into its parts, checking the type is elementary.
fn parse_import_param(def: &str) -> anyhow::Result<(String, String)> {
    let Some((name, ty)) = def.split_once(':') else {
        bail!("import parameter '{def}' must have the form name:type");
    };
    if name.is_empty() {
        bail!("import parameter '{def}' has an empty name");
    }
    if !ELEMENTARY_TYPES.contains(&ty) {
        bail!(
            "import parameter '{def}' has unsupported type '{ty}' (expected one of: {})",
            ELEMENTARY_TYPES.join(", ")
        );
    }
    Ok((name.to_string(), ty.to_string()))
}

fn read_manifests(files: &[PathBuf], policy: &str) -> anyhow::Result<Vec<Value>> {
    files
        .iter()
        .map(|path| {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("manifest file {} cannot be read", path.display()))?;
            let manifest: Value = serde_yaml::from_str(&data)
                .with_context(|| format!("manifest file {} is not valid YAML", path.display()))?;
            Ok(json!({ "policy": policy, "manifest": manifest }))
        })
        .collect()
}

fn execution_skeleton(opts: &AddDeployItem, namespace: &str) -> anyhow::Result<String> {
    let target_name = opts.target_name.clone().unwrap_or_else(|| opts.cluster_param.clone());
    let manifests = read_manifests(&opts.manifest_files, &opts.policy)?;
    let item = DeployItemTemplate::new(
        opts.name.clone(),
        MANIFEST_DEPLOY_ITEM_TYPE,
        json!({
            "apiVersion": MANIFEST_CONFIG_API_VERSION,
            "kind": MANIFEST_CONFIG_KIND,
            "updateStrategy": opts.update_strategy,
            "manifests": manifests,
        }),
    )
    .with_target(target_name, namespace);
    let items = vec![item];
    validate_deploy_item_template_list(&FieldPath::root(DEPLOY_EXECUTIONS_FIELD), &items)
        .map_err(|errs| anyhow::anyhow!("generated deploy item is invalid: {errs}"))?;
    let output = DeployExecutorOutput {
        deploy_items: Some(items),
    };
    Ok(serde_yaml::to_string(&output)?)
}

fn add_deployitem(root: &Path, opts: &AddDeployItem, json: bool) -> anyhow::Result<()> {
    if !is_dns_label(&opts.name) {
        bail!(
            "invalid deploy item name '{}': it must consist of lower case alphanumeric \
             characters or '-', start and end with an alphanumeric character, and be at \
             most 63 characters long",
            opts.name
        );
    }
    if opts.cluster_param.is_empty() {
        bail!("cluster-param is missing");
    }
    let target_name = opts.target_name.as_deref().unwrap_or(&opts.cluster_param);
    if !is_dns_label(target_name) {
        bail!(
            "target name '{target_name}' is not a lower case alphanumeric name; \
             pass --target-name to name the target object"
        );
    }
    let params = opts
        .import_params
        .iter()
        .map(|p| parse_import_param(p))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let execution_file = opts.blueprint_dir.join(paths::execution_file_name(&opts.name));
    if execution_file.exists() {
        bail!(
            "deploy item '{}' was already added: {} exists",
            opts.name,
            execution_file.display()
        );
    }

    let mut blueprint = Blueprint::load(&opts.blueprint_dir).with_context(|| {
        format!("failed to load blueprint from {}", opts.blueprint_dir.display())
    })?;
    let mut builder = BlueprintBuilder::new(&mut blueprint);
    if builder.exists_deploy_execution(&opts.name) {
        bail!("the blueprint already contains a deploy item '{}'", opts.name);
    }

    let config = Config::load_or_default(root).context("failed to load config")?;
    let skeleton = execution_skeleton(opts, &config.namespace)?;

    builder.add_deploy_execution(&opts.name, TemplateType::literal());
    builder.add_import_for_target(&opts.cluster_param);
    for (name, ty) in &params {
        builder.add_import_for_elementary_type(name, ty);
    }

    io::write_if_missing(&execution_file, skeleton.as_bytes())
        .with_context(|| format!("failed to write {}", execution_file.display()))?;
    blueprint
        .save(&opts.blueprint_dir)
        .context("failed to save blueprint")?;
    tracing::info!(deploy_item = %opts.name, "deploy item added");

    if json {
        print_json(&serde_json::json!({
            "name": opts.name,
            "execution_file": execution_file,
            "imports": blueprint.imports.iter().map(|i| &i.name).collect::<Vec<_>>(),
        }))?;
    } else {
        println!("Added deploy item '{}'.", opts.name);
        println!("  execution: {}", execution_file.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_param_forms() {
        assert_eq!(
            parse_import_param("replicas:integer").unwrap(),
            ("replicas".to_string(), "integer".to_string())
        );
        assert!(parse_import_param("replicas").is_err());
        assert!(parse_import_param(":string").is_err());
        assert!(parse_import_param("replicas:float").is_err());
    }

    #[test]
    fn skeleton_is_a_deploy_output() {
        let opts = AddDeployItem {
            name: "nginx".into(),
            blueprint_dir: PathBuf::from("."),
            manifest_files: Vec::new(),
            import_params: Vec::new(),
            cluster_param: "cluster".into(),
            target_name: None,
            update_strategy: "update".into(),
            policy: "manage".into(),
        };
        let yaml = execution_skeleton(&opts, "default").unwrap();
        let out: DeployExecutorOutput = serde_yaml::from_str(&yaml).unwrap();
        let item = &out.deploy_items.unwrap()[0];
        assert_eq!(item.name, "nginx");
        assert_eq!(item.item_type, MANIFEST_DEPLOY_ITEM_TYPE);
        assert_eq!(item.target.as_ref().unwrap().name, "cluster");
        assert_eq!(item.config["kind"], MANIFEST_CONFIG_KIND);
        assert_eq!(item.config["manifests"], json!([]));
    }

    #[test]
    fn skeleton_rejects_invalid_target_namespace() {
        let opts = AddDeployItem {
            name: "nginx".into(),
            blueprint_dir: PathBuf::from("."),
            manifest_files: Vec::new(),
            import_params: Vec::new(),
            cluster_param: "targetCluster".into(),
            target_name: Some("prod".into()),
            update_strategy: "update".into(),
            policy: "manage".into(),
        };
        let yaml = execution_skeleton(&opts, "default").unwrap();
        assert!(yaml.contains("name: prod"));

        let err = execution_skeleton(&opts, "Bad_NS").unwrap_err();
        assert!(err.to_string().contains("target.namespace"));
    }
}
