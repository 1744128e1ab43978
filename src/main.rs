use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use relay::config::Config;
use relay::deploy::StackFile;
use relay::proxy::Gateway;
use relay::server;
use relay::service::Responder;

#[derive(Parser, Debug)]
#[command(author, version, about = "Gateway/backend service pair", long_about = None)]
struct Args {
    /// YAML config file; environment variables override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer GET / with a fixed message
    Backend,
    /// Relay GET / to the backend and prefix its answer
    Gateway,
    /// Validate a deployment stack file and exit
    CheckStack {
        /// Path to the stack file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let args = Args::parse();

    if let Command::CheckStack { file } = &args.command {
        return check_stack(file);
    }

    let cfg = Config::load(args.config.as_deref()).context("failed to load configuration")?;

    serve(&args.command, &cfg).await?;
    tracing::info!("Shut down cleanly");

    Ok(())
}

async fn serve(command: &Command, cfg: &Config) -> anyhow::Result<()> {
    match command {
        Command::Backend => {
            let responder = Responder::from_config(&cfg.backend);
            tracing::info!(message = responder.message(), "Starting backend responder");
            server::run(
                &cfg.backend.listen_addr,
                responder,
                server::shutdown_signal(),
            )
            .await
        }
        Command::Gateway => {
            let gateway = Gateway::from_config(&cfg.gateway)?;
            tracing::info!(
                backend = gateway.backend().display_name(),
                prefix = %cfg.gateway.prefix,
                "Starting gateway forwarder"
            );
            server::run(
                &cfg.gateway.listen_addr,
                gateway,
                server::shutdown_signal(),
            )
            .await
        }
        // Handled before the config is loaded
        Command::CheckStack { .. } => Ok(()),
    }
}

fn check_stack(file: &Path) -> anyhow::Result<()> {
    let stack = StackFile::load(file)?;
    stack.validate()?;
    tracing::info!(
        services = stack.services.len(),
        replicas = stack.total_replicas(),
        "Stack file is valid"
    );
    Ok(())
}
