//! Dealflow report tool
//!
//! Loads the configured backend and prints a JSON snapshot of the dashboard,
//! pipeline and activity analytics.

use std::collections::HashMap;
use std::env;
use std::process;

use chrono::Utc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dealflow::config::{ENV_BACKEND, ENV_FIXTURES};
use dealflow::{CrmConfig, CrmEngine};

/// Command line options.
#[derive(Default)]
struct Args {
    /// Settings that take precedence over the environment.
    overrides: HashMap<&'static str, String>,
    /// Indent the JSON output.
    pretty: bool,
}

fn parse_args() -> Args {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--backend" | "-b" => {
                if i + 1 < args.len() {
                    parsed.overrides.insert(ENV_BACKEND, args[i + 1].clone());
                    i += 2;
                } else {
                    eprintln!("error: --backend requires a value");
                    process::exit(1);
                }
            }
            "--fixtures" | "-f" => {
                if i + 1 < args.len() {
                    parsed.overrides.insert(ENV_FIXTURES, args[i + 1].clone());
                    i += 2;
                } else {
                    eprintln!("error: --fixtures requires a value");
                    process::exit(1);
                }
            }
            "--pretty" => {
                parsed.pretty = true;
                i += 1;
            }
            "--help" | "-h" => {
                println!("dealflow-report - print a CRM analytics snapshot as JSON");
                println!();
                println!("USAGE:");
                println!("    dealflow-report [OPTIONS]");
                println!();
                println!("OPTIONS:");
                println!("    -b, --backend <mock|remote>   Storage backend [default: mock]");
                println!("    -f, --fixtures <FILE>         Fixture file for the mock backend");
                println!("        --pretty                  Indent the JSON output");
                println!("    -h, --help                    Print help information");
                println!();
                println!("Other settings are read from DEALFLOW_* environment variables.");
                process::exit(0);
            }
            arg => {
                eprintln!("error: unknown argument: {arg}");
                process::exit(1);
            }
        }
    }

    parsed
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = CrmConfig::from_lookup(|name| {
        args.overrides
            .get(name)
            .cloned()
            .or_else(|| env::var(name).ok())
    })?;
    let engine = CrmEngine::from_config(&config)?;

    let snapshot = engine.snapshot(Utc::now())?;
    info!(
        contacts = snapshot.dashboard.stats.total_contacts,
        deals = snapshot.dashboard.stats.total_deals,
        "snapshot built"
    );

    let json = if args.pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };
    println!("{json}");
    Ok(())
}
