//! Command handlers for the NeuraLoad CLI

use std::time::Duration;

use neuraload_ble::{describe_payload, probe, ProbeOptions};
use neuraload_core::{SensorSimulator, SensorSnapshot, SENSOR_CHARACTERISTICS};
use tracing::info;

use crate::app::SensorApp;
use crate::cli::{Cli, Commands};
use crate::config::{AppConfig, ServeOverrides};
use crate::error::Result;

/// Device identity shown by `sample` when none is configured
const SAMPLE_DEVICE_ID: &str = "NL-SAMPLE";

/// Command dispatcher for handling CLI commands
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Execute a CLI command
    pub async fn execute(cli: Cli, mut config: AppConfig) -> Result<()> {
        match cli.command {
            Commands::Serve {
                device_id,
                interval_ms,
                seed,
                no_simulate,
                adapter,
            } => {
                config.apply_serve_overrides(ServeOverrides {
                    device_id,
                    interval_ms,
                    seed,
                    no_simulate,
                    adapter,
                })?;
                Self::handle_serve_command(config).await
            }
            Commands::Sample { seed, json } => {
                let seed = seed.or(config.sensors.seed);
                let device_id = config
                    .sensors
                    .device_id
                    .unwrap_or_else(|| SAMPLE_DEVICE_ID.to_string());
                println!("{}", sample_report(seed, device_id, json)?);
                Ok(())
            }
            Commands::Config => {
                print!("{}", config.to_toml()?);
                Ok(())
            }
            Commands::Probe {
                timeout_secs,
                notifications,
            } => Self::handle_probe_command(timeout_secs, notifications).await,
        }
    }

    /// Run the peripheral until Ctrl-C
    async fn handle_serve_command(config: AppConfig) -> Result<()> {
        let mut app = SensorApp::new(config).await?;
        app.start_acquisition().await;

        if let Err(e) = app.start_peripheral().await {
            app.stop().await;
            return Err(e);
        }

        info!("Serving sensor data... Press Ctrl+C to stop");
        let signal = tokio::signal::ctrl_c().await;
        info!("Shutting down sensor peripheral");
        app.stop().await;

        signal?;
        Ok(())
    }

    /// Scan for a peripheral and print what it serves
    async fn handle_probe_command(timeout_secs: u64, notifications: usize) -> Result<()> {
        let options = ProbeOptions::new()
            .with_scan_timeout(Duration::from_secs(timeout_secs))
            .with_notifications(notifications);

        let report = probe(&options).await?;

        println!(
            "Sensor peripheral {} ({})",
            report.local_name.as_deref().unwrap_or("<unnamed>"),
            report.address
        );
        for reading in &report.readings {
            println!("  {}  {}", reading.uuid, reading.describe());
        }
        if !report.notifications.is_empty() {
            println!("Notifications:");
            for notification in &report.notifications {
                println!("  {}  {}", notification.uuid, notification.describe());
            }
        }
        Ok(())
    }
}

/// Render one simulated snapshot and every characteristic payload
pub fn sample_report(seed: Option<u64>, device_id: String, json: bool) -> Result<String> {
    let mut simulator = match seed {
        Some(seed) => SensorSimulator::seeded(seed),
        None => SensorSimulator::from_entropy(),
    };
    let snapshot = SensorSnapshot {
        readings: simulator.next_readings(),
        device_id,
    };

    if json {
        return Ok(serde_json::to_string_pretty(&snapshot)?);
    }

    let mut out = String::new();
    for (uuid, field, access) in SENSOR_CHARACTERISTICS {
        let payload = field.encode(&snapshot);
        out.push_str(&format!(
            "{} {} [{}] {} bytes\n  {}\n  {}\n",
            uuid,
            field.description(),
            access.flags().join(", "),
            payload.len(),
            hex::encode(&payload),
            describe_payload(uuid, &payload)
        ));
    }
    Ok(out.trim_end().to_string())
}
