//! NeuraLoad CLI library
//!
//! Configuration, command parsing and application wiring behind the
//! `neuraload` binary.

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use app::SensorApp;
pub use cli::{Cli, Commands};
pub use commands::{sample_report, CommandDispatcher};
pub use config::{AppConfig, SensorConfig, ServeOverrides};
pub use error::{CliError, Result};
