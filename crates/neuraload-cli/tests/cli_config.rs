//! Configuration file handling and offline commands

use std::io::Write;

use clap::Parser;
use neuraload_cli::{sample_report, AppConfig, Cli, CliError, Commands, SensorApp, ServeOverrides};
use neuraload_core::{PublisherState, SensorSnapshot, WEIGHT_CHARACTERISTIC_UUID};
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_config_file_with_cli_overrides() {
    let file = write_config(
        r#"
        [peripheral]
        local_name = "NeuraLoad-Rack3"
        adapter_name = "hci0"

        [publication]
        interval_ms = 500

        [sensors]
        device_id = "NL-0300"
        "#,
    );
    let path = file.path().to_str().unwrap().to_string();

    let cli = Cli::try_parse_from([
        "neuraload",
        "--config",
        path.as_str(),
        "serve",
        "--adapter",
        "hci1",
        "--seed",
        "9",
    ])
    .unwrap();
    let mut config = AppConfig::load_from_file(cli.config.as_ref().unwrap()).unwrap();

    let Commands::Serve {
        device_id,
        interval_ms,
        seed,
        no_simulate,
        adapter,
    } = cli.command
    else {
        panic!("expected serve");
    };
    config
        .apply_serve_overrides(ServeOverrides {
            device_id,
            interval_ms,
            seed,
            no_simulate,
            adapter,
        })
        .unwrap();

    assert_eq!(config.peripheral.local_name, "NeuraLoad-Rack3");
    assert_eq!(config.peripheral.adapter_name.as_deref(), Some("hci1"));
    assert_eq!(config.publication.interval_ms, 500);
    assert_eq!(config.sensors.seed, Some(9));
    assert_eq!(config.resolve_device_id(), "NL-0300");
}

#[test]
fn test_missing_config_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let result = AppConfig::load_from_file(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(CliError::Config(_))));
}

#[test]
fn test_invalid_peripheral_name_rejected() {
    let file = write_config("[peripheral]\nlocal_name = \"\"\n");
    assert!(AppConfig::load_from_file(file.path()).is_err());
}

#[test]
fn test_sample_json_uses_configured_seed() {
    let file = write_config("[sensors]\nseed = 21\ndevice_id = \"NL-0021\"\n");
    let config = AppConfig::load_from_file(file.path()).unwrap();

    let json = sample_report(config.sensors.seed, config.resolve_device_id(), true).unwrap();
    let snapshot: SensorSnapshot = serde_json::from_str(&json).unwrap();

    assert_eq!(snapshot.device_id, "NL-0021");
    assert!((50.0..100.0).contains(&snapshot.readings.weight));
    assert!(snapshot.readings.ranging.iter().all(|d| (0.5..5.0).contains(d)));
}

#[tokio::test(start_paused = true)]
async fn test_app_from_config_file_serves_weight() {
    let file =
        write_config("[sensors]\nseed = 4\ndevice_id = \"NL-0004\"\nupdate_interval_ms = 100\n");
    let config = AppConfig::load_from_file(file.path()).unwrap();

    let mut app = SensorApp::new(config).await.unwrap();
    app.start_acquisition().await;
    tokio::time::sleep(std::time::Duration::from_millis(250)).await;

    let weight = app
        .handles()
        .iter()
        .find(|h| h.uuid() == WEIGHT_CHARACTERISTIC_UUID)
        .unwrap();
    assert_eq!(weight.read().await.unwrap().len(), 4);
    assert_eq!(weight.state(), PublisherState::Idle);
    assert!(app.store().revision().await > 0);

    app.stop().await;
}
