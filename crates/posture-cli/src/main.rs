//! posture CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod console;

#[derive(Parser)]
#[command(
    name = "posture",
    version,
    about = "Guided maturity self-assessment with progress recovery"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take (or resume) an assessment interactively
    Run {
        /// Catalog TOML file (defaults to the built-in catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for reports
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, html, markdown, all (comma-separated)
        #[arg(long, default_value = "json")]
        format: String,

        /// Contact name
        #[arg(long)]
        name: Option<String>,

        /// Contact email
        #[arg(long)]
        email: Option<String>,

        /// Company being assessed
        #[arg(long)]
        company: Option<String>,

        /// Cloud provider: gcp, aws, azure, hybrid
        #[arg(long)]
        provider: Option<String>,
    },

    /// Validate catalog TOML files
    Validate {
        /// Catalog file or directory (defaults to the built-in catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Show saved progress
    Status {
        /// Catalog TOML file the progress belongs to
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Delete saved progress
    Reset {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Re-render a saved JSON report
    Report {
        /// Report JSON written by `posture run`
        #[arg(long)]
        input: PathBuf,

        /// Output directory (defaults to the input's directory)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, html, markdown, all (comma-separated)
        #[arg(long, default_value = "html")]
        format: String,
    },

    /// Create a starter config and example catalog
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("posture=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            catalog,
            config,
            output,
            format,
            name,
            email,
            company,
            provider,
        } => {
            commands::run::execute(commands::run::RunOptions {
                catalog,
                config,
                output,
                format,
                name,
                email,
                company,
                provider,
            })
            .await
        }
        Commands::Validate { catalog } => commands::validate::execute(catalog),
        Commands::Status { catalog, config } => commands::status::execute(catalog, config),
        Commands::Reset { config } => commands::reset::execute(config),
        Commands::Report {
            input,
            output,
            format,
        } => commands::report::execute(input, output, format),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
