//! fabric: SecureFabric envelope command line.
//!
//! ```bash
//! fabric keygen --out alice.key
//! fabric seal --key alice.key --topic demo.messages --message "hello" > env.json
//! fabric open --envelope env.json
//! fabric conformance --vectors test_vectors.json
//! ```

mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use fabric_telemetry::{init_logging, TelemetryConfig};
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(&TelemetryConfig::from_env().with_service_name("fabric-cli"))?;

    match cli.command {
        Command::Keygen(args) => {
            let public_key = commands::keygen(&args)?;
            println!("{public_key}");
        }
        Command::Seal(args) => {
            let envelope = commands::seal(&args)?;
            let json = serde_json::to_string_pretty(&envelope).context("Failed to encode envelope")?;
            println!("{json}");
        }
        Command::Open(args) => {
            let opened = commands::open(&args)?;
            let json = serde_json::to_string_pretty(&opened).context("Failed to encode result")?;
            println!("{json}");
        }
        Command::Conformance(args) => {
            let report = commands::conformance(&args)?;
            if args.json {
                let json = serde_json::to_string_pretty(&report).context("Failed to encode report")?;
                println!("{json}");
            } else {
                println!("{report}");
            }
            if !report.is_conformant() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
