mod args;
mod output;

use args::ReconcileArgs;
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use slflow_cloud::{CloudError, ReconcileRequest, ReconciliationResult, ResourceKind, reconcile};
use slflow_cloud_softlayer::{ClientConfig, SoftLayerClient, provider_for};
use slflow_config::Settings;

#[derive(Parser)]
#[command(name = "slflow")]
#[command(
    about = "Declarative lifecycle for SoftLayer virtual guests and bare metal servers",
    long_about = None
)]
struct Cli {
    /// Log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile virtual guests
    Guest(ReconcileArgs),
    /// Reconcile bare metal servers
    Hardware(ReconcileArgs),
    /// Show version
    Version,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn client_config(settings: &Settings) -> ClientConfig {
    let config = ClientConfig::new(
        settings.username.clone().unwrap_or_default(),
        settings.api_key.clone().unwrap_or_default(),
    );
    match &settings.endpoint {
        Some(endpoint) => config.with_endpoint(endpoint),
        None => config,
    }
}

fn settings_error(err: slflow_config::ConfigError) -> CloudError {
    CloudError::ProviderUnavailable(format!("cannot load settings: {}", err))
}

async fn run(
    kind: ResourceKind,
    args: &ReconcileArgs,
    settings: &Settings,
) -> Result<ReconciliationResult, CloudError> {
    let request: ReconcileRequest = args.to_request(settings)?;
    tracing::debug!(?request, "Built reconcile request");
    let client = SoftLayerClient::new(client_config(settings))?;
    let provider = provider_for(kind, client);
    reconcile(provider.as_ref(), &request).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (kind, args) = match cli.command {
        Commands::Version => {
            println!("slflow {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Commands::Guest(args) => (ResourceKind::VirtualGuest, args),
        Commands::Hardware(args) => (ResourceKind::BareMetal, args),
    };

    let outcome = match slflow_config::load_settings() {
        Ok(settings) => run(kind, &args, &settings).await,
        Err(err) => Err(settings_error(err)),
    };

    match outcome {
        Ok(result) => {
            let status = if result.changed {
                "changed".yellow()
            } else {
                "ok".green()
            };
            eprintln!("{} {} {}: {}", "slflow".bold(), kind, result.state, status);
            println!("{}", output::render_result(&result)?);
            Ok(())
        }
        Err(err) => {
            eprintln!(
                "{} {} {}: {}",
                "slflow".bold(),
                kind,
                args.state,
                "failed".red()
            );
            println!("{}", output::render_failure(&err)?);
            std::process::exit(1);
        }
    }
}
