//! testaudit CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use testaudit_core::model::{SessionId, ValidityStatus};

mod commands;

#[derive(Parser)]
#[command(name = "testaudit", version, about = "Test-session validity analyzer")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory (overrides config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute validity assessments
    Analyze {
        /// Session ids (comma-separated)
        #[arg(long, value_delimiter = ',', required_unless_present = "all")]
        session: Vec<SessionId>,

        /// Analyze every completed session
        #[arg(long, conflicts_with = "session")]
        all: bool,

        /// Recompute even when an assessment exists
        #[arg(long)]
        force: bool,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show the stored assessment of a session
    Show {
        #[arg(long)]
        session: SessionId,

        /// Output format: text, json, html
        #[arg(long, default_value = "text")]
        format: String,

        /// Write output to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Override a session's validity status
    Override {
        #[arg(long)]
        session: SessionId,

        /// New status: valid, suspect, invalid
        #[arg(long)]
        status: ValidityStatus,

        /// Reason for the override (at least 10 characters)
        #[arg(long)]
        reason: String,

        /// Administrator id
        #[arg(long)]
        admin: String,
    },

    /// Aggregate validity report
    Report {
        /// Period in days (default from config)
        #[arg(long)]
        days: Option<u32>,

        /// Only include sessions with this status
        #[arg(long)]
        status: Option<ValidityStatus>,

        /// Output format: text, json, markdown, html
        #[arg(long, default_value = "text")]
        format: String,

        /// Write output to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Exit code 1 if sessions are waiting for review
        #[arg(long)]
        fail_on_pending: bool,
    },

    /// Check the dataset for inconsistencies
    Validate,

    /// Create starter config and sample dataset
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("testaudit=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let ctx = commands::Context {
        config_path: cli.config,
        data_dir: cli.data_dir,
    };

    let result = match cli.command {
        Commands::Analyze {
            session,
            all,
            force,
            format,
        } => commands::analyze::execute(&ctx, session, all, force, format).await,
        Commands::Show {
            session,
            format,
            output,
        } => commands::show::execute(&ctx, session, format, output).await,
        Commands::Override {
            session,
            status,
            reason,
            admin,
        } => commands::override_status::execute(&ctx, session, status, reason, admin).await,
        Commands::Report {
            days,
            status,
            format,
            output,
            fail_on_pending,
        } => commands::report::execute(&ctx, days, status, format, output, fail_on_pending).await,
        Commands::Validate => commands::validate::execute(&ctx),
        Commands::Init => commands::init::execute(&ctx),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
