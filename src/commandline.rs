use crate::mqtt;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::time::Duration;

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum CliCommands {
    /// Show system information: id, name, installer, firmware, console version, temperature
    Info,
    /// Show name, power state and damper percentage for every zone
    Zones,
    /// Show a single zone
    Zone {
        /// Zone index, 0-based
        zone: u8,
    },
    /// Fetch one snapshot and print the raw response as hex
    Snapshot,
    /// Turn a zone on or off
    SetPower {
        /// Zone index, 0-based
        zone: u8,
        /// Turn the zone on. If this flag is not present, it will be turned off.
        #[clap(long, short, action)]
        on: bool,
    },
    /// Set a zone's damper open percentage
    SetPercentage {
        /// Zone index, 0-based
        zone: u8,
        /// Damper open percentage, 0-100
        percentage: u8,
    },
    /// Run in daemon mode, periodically fetching and outputting metrics
    Daemon {
        /// Output destination for metrics
        #[command(subcommand)]
        output: DaemonOutput,
        /// Interval for fetching metrics (e.g., "10s", "1m")
        #[clap(long, short, value_parser = humantime::parse_duration, default_value = "10s")]
        interval: Duration,
        /// Comma-separated list of metrics to fetch (system,zones,temperature or all)
        #[clap(long, short, use_value_delimiter = true, default_value = "zones,temperature")]
        metrics: Vec<String>,
    },
}

#[derive(clap::ValueEnum, Debug, Clone, PartialEq)]
pub enum MqttFormat {
    Simple,
    Json,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum DaemonOutput {
    /// Continuously read metrics and print them to the standard output (console).
    Console,
    /// Continuously read metrics and publish them to an MQTT broker.
    Mqtt {
        /// The configuration file for the MQTT broker
        #[arg(long, default_value_t = mqtt::MqttConfig::DEFAULT_CONFIG_FILE.to_string())]
        config_file: String,
        /// Output format for MQTT messages
        #[arg(long, value_enum, default_value_t = MqttFormat::Simple)]
        format: MqttFormat,
    },
}

const fn about_text() -> &'static str {
    "ZoneTouch 3 command line tool"
}

#[derive(Parser, Debug)]
#[command(version, about=about_text(), long_about = None)]
pub struct CliArgs {
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,

    /// Console IP address or host name
    #[arg(short, long)]
    pub address: String,

    /// Console TCP port
    #[arg(short, long, default_value_t = zonetouch3_lib::protocol::DEFAULT_PORT)]
    pub port: u16,

    #[command(subcommand)]
    pub command: CliCommands,

    /// Timeout for TCP I/O operations (e.g., "500ms", "1s", "2s 500ms")
    #[arg(value_parser = humantime::parse_duration, long, default_value = "5s")]
    pub timeout: Duration,

    /// Number of zones configured on the console
    #[arg(long, short, default_value = "8")]
    pub zones: u8,

    /// Use the per-zone retrieval codec spoken by older console firmware
    #[arg(long, action)]
    pub legacy: bool,
}
