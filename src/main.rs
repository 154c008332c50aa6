use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use medivault_lib::bootstrap::{self, AppConfig};
use medivault_lib::commands::{self, ErrorBody};
use mv_core::ConsentError;

#[derive(Parser)]
#[command(name = "medivault")]
#[command(version, about = "Patient consent exchange for hospital record access", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path (overrides the configuration file)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue a challenge for a hospital's request to view a patient's records
    Issue {
        #[arg(long)]
        patient: String,
        #[arg(long)]
        hospital: String,
        #[arg(long)]
        staff: String,
    },
    /// Redeem a one-time code into an access grant
    Redeem {
        /// The code the patient received
        code: String,
    },
    /// Check whether a staff member holds a grant for a patient
    HasGrant {
        #[arg(long)]
        patient: String,
        #[arg(long)]
        hospital: String,
        #[arg(long)]
        staff: String,
    },
    /// List a patient's open access requests
    Pending {
        #[arg(long)]
        patient: String,
    },
    /// List grants recorded for a patient
    Grants {
        #[arg(long)]
        patient: String,
    },
    /// Evaluate what a staff member may do with a patient's records
    Access {
        #[arg(long)]
        staff: String,
        #[arg(long)]
        hospital: String,
        /// Numeric role code from the identity provider
        #[arg(long, default_value_t = 0)]
        role: i32,
        #[arg(long)]
        patient: String,
        /// Hospital where the record to amend was written
        #[arg(long)]
        record_hospital: Option<String>,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report<T: Serialize>(result: Result<T, ConsentError>) -> anyhow::Result<ExitCode> {
    match result {
        Ok(value) => {
            print_json(&value)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            print_json(&ErrorBody::from(&err))?;
            Ok(ExitCode::from(commands::exit_status(&err)))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    bootstrap::tracing::init_tracing_subscriber()?;

    let mut config = match &cli.config {
        Some(path) => bootstrap::load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(database) = cli.database {
        config.database_path = database;
    }

    let runtime = bootstrap::wire_consent_runtime(&config)?;

    match cli.command {
        Commands::Issue {
            patient,
            hospital,
            staff,
        } => report(commands::issue(&runtime, &patient, &hospital, &staff).await),
        Commands::Redeem { code } => report(commands::redeem(&runtime, &code).await),
        Commands::HasGrant {
            patient,
            hospital,
            staff,
        } => report(commands::has_grant(&runtime, &patient, &hospital, &staff).await),
        Commands::Pending { patient } => report(commands::pending(&runtime, &patient).await),
        Commands::Grants { patient } => report(commands::grants(&runtime, &patient).await),
        Commands::Access {
            staff,
            hospital,
            role,
            patient,
            record_hospital,
        } => report(
            commands::access(
                &runtime,
                &staff,
                &hospital,
                role,
                &patient,
                record_hospital.as_deref(),
            )
            .await,
        ),
    }
}
