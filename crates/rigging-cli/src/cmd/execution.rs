use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use rigging_core::{
    condition::Condition,
    config::Config,
    execution::{Execution, ExecutionOperation},
    paths,
    store::{FileStore, Reader},
    types::ExecutionPhase,
};
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum ExecutionSubcommand {
    /// Create an execution record
    Create {
        name: String,
        /// Namespace (default: from config)
        #[arg(long)]
        namespace: Option<String>,
    },
    /// Show an execution record
    Show {
        name: String,
        #[arg(long)]
        namespace: Option<String>,
    },
    /// Set the phase and merge conditions into an execution's status
    Status {
        name: String,
        #[arg(long)]
        namespace: Option<String>,
        /// New phase (Init, Progressing, Succeeded, Failed, ...)
        #[arg(long)]
        phase: ExecutionPhase,
        /// Condition as type=status[:reason[:message]] (repeatable)
        #[arg(long = "condition")]
        conditions: Vec<String>,
    },
    /// Publish export values as the execution's data object
    Publish {
        name: String,
        #[arg(long)]
        namespace: Option<String>,
        /// YAML or JSON file holding the values
        #[arg(long)]
        values: PathBuf,
    },
}

pub fn run(root: &Path, subcmd: ExecutionSubcommand, json: bool) -> anyhow::Result<()> {
    let config = Config::load_or_default(root).context("failed to load config")?;
    let store = FileStore::new(root);
    let ns = |n: Option<String>| n.unwrap_or_else(|| config.namespace.clone());

    match subcmd {
        ExecutionSubcommand::Create { name, namespace } => {
            create(&store, &ns(namespace), &name, json)
        }
        ExecutionSubcommand::Show { name, namespace } => show(&store, &ns(namespace), &name, json),
        ExecutionSubcommand::Status {
            name,
            namespace,
            phase,
            conditions,
        } => status(&store, &ns(namespace), &name, phase, &conditions, json),
        ExecutionSubcommand::Publish {
            name,
            namespace,
            values,
        } => publish(&store, &ns(namespace), &name, &values, json),
    }
}

fn create(store: &FileStore, namespace: &str, name: &str, json: bool) -> anyhow::Result<()> {
    paths::validate_name(name)?;
    let exec = store
        .create_execution(Execution::new(namespace, name))
        .with_context(|| format!("failed to create execution '{namespace}/{name}'"))?;

    if json {
        print_json(&exec)?;
    } else {
        println!("Created execution '{}' (uid {}).", exec.metadata.key(), exec.metadata.uid);
    }
    Ok(())
}

fn show(store: &FileStore, namespace: &str, name: &str, json: bool) -> anyhow::Result<()> {
    let exec = store.load_execution(namespace, name)?;
    if json {
        return print_json(&exec);
    }

    println!("Execution: {}", exec.metadata.key());
    println!("Phase:     {}", exec.status.phase);
    if let Some(r) = exec.export_reference() {
        println!("Exports:   {}/{}", r.namespace, r.name);
    }
    if !exec.status.conditions.is_empty() {
        println!();
        let rows = exec
            .status
            .conditions
            .iter()
            .map(|c| {
                vec![
                    c.condition_type.clone(),
                    c.status.to_string(),
                    c.reason.clone(),
                    c.last_transition_time.to_rfc3339(),
                ]
            })
            .collect();
        print_table(&["TYPE", "STATUS", "REASON", "SINCE"], rows);
    }
    Ok(())
}

fn status(
    store: &FileStore,
    namespace: &str,
    name: &str,
    phase: ExecutionPhase,
    conditions: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let conditions = conditions
        .iter()
        .map(|c| Condition::parse(c))
        .collect::<rigging_core::Result<Vec<_>>>()?;
    let mut exec = store.load_execution(namespace, name)?;

    ExecutionOperation::new(store, &mut exec)
        .update_status(phase, conditions)
        .context("failed to update execution status")?;

    if json {
        print_json(&exec.status)?;
    } else {
        println!("Execution '{}' is now {}.", exec.metadata.key(), exec.status.phase);
    }
    Ok(())
}

fn publish(
    store: &FileStore,
    namespace: &str,
    name: &str,
    values_file: &Path,
    json: bool,
) -> anyhow::Result<()> {
    let data = std::fs::read_to_string(values_file)
        .with_context(|| format!("failed to read values from {}", values_file.display()))?;
    let values: Value = serde_yaml::from_str(&data)
        .with_context(|| format!("failed to parse values in {}", values_file.display()))?;
    let mut exec = store.load_execution(namespace, name)?;

    ExecutionOperation::new(store, &mut exec)
        .create_or_update_export_reference(values)
        .context("failed to publish exports")?;

    let Some(export_ref) = exec.export_reference() else {
        anyhow::bail!(
            "execution '{}' has no export reference after publishing",
            exec.metadata.key()
        );
    };
    let object = store
        .get_data_object(&export_ref.namespace, &export_ref.name)?
        .context("published data object is missing")?;

    if json {
        print_json(&object)?;
    } else {
        println!(
            "Published exports of '{}' to data object {}/{}.",
            exec.metadata.key(),
            export_ref.namespace,
            export_ref.name
        );
    }
    Ok(())
}
