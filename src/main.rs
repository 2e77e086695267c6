use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use drive_snapshot::{
    config::{Config, ConfigError, StoreConfig, DEFAULT_CONFIG_PATH},
    context::RunContext,
    logger,
    remote_store::{self, StoreError},
    run_service::{self, init_backup_root, BackupRun, DEFAULT_ROOT_NAME},
    time_provider::CoreTimeProvider,
};
use thiserror::Error;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Dated snapshots of local folders on a cloud drive", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH, global = true)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error), overrides the configuration
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prune expired snapshots, then take today's snapshot (the default)
    Run,
    /// Find or create the backup folder and write a configuration file
    Init(InitArgs),
}

#[derive(clap::Args, Debug)]
struct InitArgs {
    /// Local directory to back up; repeat for several
    #[arg(long = "local-root", value_name = "DIR", required = true)]
    local_roots: Vec<String>,

    /// Days a snapshot is kept
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    days_to_keep: u32,

    /// Name of the backup folder at the top of the store
    #[arg(long, default_value = DEFAULT_ROOT_NAME)]
    root_name: String,

    /// Back up into this directory instead of Google Drive
    #[arg(long, value_name = "DIR")]
    local_store: Option<PathBuf>,

    /// Replace an existing configuration file
    #[arg(long)]
    force: bool,
}

#[derive(Debug, Error)]
enum Fatal {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Run(#[from] run_service::error::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Command::Run) {
        Command::Run => backup(&cli.config, cli.log_level.as_deref()).await,
        Command::Init(args) => {
            logger::init(cli.log_level.as_deref().unwrap_or("info"));
            setup(&cli.config, args).await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", failure_banner(&e));
            ExitCode::FAILURE
        }
    }
}

async fn backup(config_path: &Path, log_level: Option<&str>) -> Result<(), Fatal> {
    let config = Config::from_file(config_path);
    let level = log_level
        .or_else(|| config.as_ref().ok().map(|c| c.log_level.as_str()))
        .unwrap_or("info");
    logger::init(level);

    let config = config?;
    let local_roots = config.local_root_dirs()?;
    info!(roots = local_roots.len(), "configuration OK");

    let store = remote_store::open(&config.store).await?;
    let clock = CoreTimeProvider::new();
    let ctx = RunContext::new(&config, local_roots, store.as_ref(), &clock);

    let report = BackupRun::new(&ctx).run().await?;
    println!("\n{}", report);
    Ok(())
}

async fn setup(config_path: &Path, args: InitArgs) -> Result<(), Fatal> {
    if config_path.exists() && !args.force {
        return Err(ConfigError::AlreadyExists(config_path.to_path_buf()).into());
    }

    let mut config = Config::new(String::new(), args.local_roots, args.days_to_keep);
    if let Some(path) = args.local_store {
        config.store = StoreConfig::Local { path };
    }
    config.local_root_dirs()?;

    let store = remote_store::open(&config.store).await?;
    config.backup_root_id = init_backup_root(store.as_ref(), &args.root_name).await?;
    config.validate()?;
    config.write(config_path, args.force)?;

    println!("\nSETUP COMPLETE: {} written", config_path.display());
    Ok(())
}

fn failure_banner(err: &Fatal) -> String {
    format!("\n_________________\nFAILED: {}", err)
}
