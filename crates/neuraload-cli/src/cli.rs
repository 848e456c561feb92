//! Command-line interface definitions and parsing

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the sensor peripheral until Ctrl-C
    Serve {
        /// Device identity exposed on the Device ID characteristic
        #[arg(long)]
        device_id: Option<String>,
        /// Notification interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,
        /// Seed for reproducible simulated readings
        #[arg(long)]
        seed: Option<u64>,
        /// Do not run the sensor simulator
        #[arg(long)]
        no_simulate: bool,
        /// Bluetooth adapter to use (e.g. hci1)
        #[arg(long)]
        adapter: Option<String>,
    },
    /// Print one simulated snapshot and its encoded payloads
    Sample {
        /// Seed for reproducible readings
        #[arg(long)]
        seed: Option<u64>,
        /// Print the snapshot as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as TOML
    Config,
    /// Scan for a running sensor peripheral and read its characteristics
    Probe {
        /// How long to scan, in seconds
        #[arg(long, default_value_t = 10)]
        timeout_secs: u64,
        /// Notifications to collect after reading
        #[arg(long, default_value_t = 0)]
        notifications: usize,
    },
}
