mod collectors;
mod config;
mod pushover;
mod snapshot;
mod units;

use clap::Parser;
use collectors::system::collect_snapshot;
use config::Config;
use pushover::{Credentials, PushoverClient};
use sysinfo::{System, SystemExt};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pushsnap")]
#[command(version)]
#[command(about = "Collects a host telemetry snapshot and delivers it via Pushover")]
struct Cli {
    #[arg(long, default_value = "./config.yaml")]
    config: String,
    #[arg(long)]
    print_default_config: bool,
    /// Print the flat snapshot as JSON
    #[arg(long)]
    json: bool,
    #[arg(long, conflicts_with = "push_off")]
    push_on: bool,
    #[arg(long, conflicts_with = "push_on")]
    push_off: bool,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    if cli.print_default_config {
        println!("{}", Config::example_yaml());
        return;
    }

    let mut cfg = match Config::load_or_default(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(error = %err, "failed to load the configuration");
            std::process::exit(1);
        }
    };
    if cli.push_on {
        cfg.pushover.enabled = true;
    } else if cli.push_off {
        cfg.pushover.enabled = false;
    }

    // Credentials are a startup precondition; fail before collecting.
    let credentials = if cfg.pushover.enabled {
        match Credentials::resolve(&cfg.pushover) {
            Ok(credentials) => Some(credentials),
            Err(err) => {
                error!(error = %err, "missing Pushover credentials");
                std::process::exit(1);
            }
        }
    } else {
        None
    };

    let mut system = System::new_all();
    let snapshot = match collect_snapshot(&mut system) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            error!(error = %err, "failed to collect the host snapshot");
            std::process::exit(1);
        }
    };

    println!("hello world");
    println!(
        "{} {} {} {}",
        snapshot.hostname, snapshot.os, snapshot.os_version, snapshot.os_release
    );

    if cli.json {
        match serde_json::to_string_pretty(&snapshot.to_flat()) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => error!(error = %err, "failed to render the snapshot as JSON"),
        }
    }

    if let Some(credentials) = credentials {
        let client = PushoverClient::new(credentials, &cfg.pushover);
        let message = pushover::format_summary(&snapshot);
        client.send(&message, &cfg.notification).await;
    } else {
        debug!("push delivery disabled, skipping the notification");
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
