//! Conveyor CLI tool.

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{ConfigArgs, RunArgs};

#[derive(Parser)]
#[command(name = "conveyor")]
#[command(about = "Build, deploy, and announce configured products", long_about = None)]
struct Cli {
    /// Emit log records as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline for one product
    Run(RunArgs),
    /// Load the configuration and assemble every product without running anything
    Validate(ConfigArgs),
    /// List configured products and their enabled destinations
    Products(ConfigArgs),
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // Exit code 2 is reserved for delivery failures.
            return if e.use_stderr() {
                ExitCode::from(commands::EXIT_CONFIG_ERROR)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing(cli.log_json);

    let outcome = match cli.command {
        Commands::Run(args) => commands::run::run(args).await,
        Commands::Validate(args) => commands::validate::validate(&args),
        Commands::Products(args) => commands::products::list(&args),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(commands::EXIT_CONFIG_ERROR)
        }
    }
}
