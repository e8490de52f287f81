mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    blueprint::BlueprintSubcommand, config::ConfigSubcommand, execution::ExecutionSubcommand,
    render::RenderArgs,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "rigging",
    about = "Render blueprint executors and publish execution exports",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .rigging/ or .git/)
    #[arg(long, global = true, env = "RIGGING_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log at debug level
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize rigging in the current project
    Init,

    /// Render a blueprint's executors from YAML inputs
    Render(RenderArgs),

    /// Edit blueprints
    Blueprint {
        #[command(subcommand)]
        subcommand: BlueprintSubcommand,
    },

    /// Manage execution records and their exports
    Execution {
        #[command(subcommand)]
        subcommand: ExecutionSubcommand,
    },

    /// Inspect the project config
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Render(args) => cmd::render::run(&root, args, cli.json),
        Commands::Blueprint { subcommand } => cmd::blueprint::run(&root, subcommand, cli.json),
        Commands::Execution { subcommand } => cmd::execution::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
