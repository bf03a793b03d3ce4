use anyhow::{Context, Result};
use clap::Parser;
use flexi_logger::{Logger, LoggerHandle};
use log::*;
use std::{ops::Deref, panic};
use zonetouch3_lib::tcp::{ProtocolVariant, ZoneTouch3};

mod commandline;
mod daemon;
mod mqtt;

use commandline::{CliArgs, CliCommands};

fn logging_init(loglevel: LevelFilter) -> LoggerHandle {
    let log_handle = Logger::try_with_env_or_str(loglevel.as_str())
        .expect("Cannot init logging")
        .start()
        .expect("Cannot start logging");

    panic::set_hook(Box::new(|panic_info| {
        let (filename, line, column) = panic_info
            .location()
            .map(|loc| (loc.file(), loc.line(), loc.column()))
            .unwrap_or(("<unknown>", 0, 0));
        let cause = panic_info
            .payload()
            .downcast_ref::<String>()
            .map(String::deref);
        let cause = cause.unwrap_or_else(|| {
            panic_info
                .payload()
                .downcast_ref::<&str>()
                .copied()
                .unwrap_or("<cause unknown>")
        });

        error!(
            "Thread '{}' panicked at {}:{}:{}: {}",
            std::thread::current().name().unwrap_or("<unknown>"),
            filename,
            line,
            column,
            cause
        );
    }));
    log_handle
}

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let _log_handle = logging_init(args.verbose.log_level_filter());

    let mut client = ZoneTouch3::new(&args.address, args.port)
        .with_context(|| format!("Cannot resolve console address '{}'", args.address))?;
    client.set_timeout(args.timeout);
    if args.legacy {
        client.set_variant(ProtocolVariant::PerZone);
    }

    match args.command {
        CliCommands::Info => {
            let info = client
                .get_system_info()
                .with_context(|| "Cannot get system information")?;
            println!("System: {info:?}");
        }
        CliCommands::Zones => {
            for status in client
                .get_zones(args.zones)
                .with_context(|| "Cannot get zones")?
            {
                println!(
                    "Zone {} ({}): {} at {}%",
                    status.zone, status.name, status.power, status.percentage
                );
            }
        }
        CliCommands::Zone { zone } => {
            if args.legacy {
                let power = client
                    .get_zone_power(zone)
                    .with_context(|| "Cannot get zone power")?;
                let percentage = client
                    .get_zone_percentage(zone)
                    .with_context(|| "Cannot get zone percentage")?;
                println!("Zone {zone}: {power} at {percentage}%");
            } else {
                let status = client
                    .get_zone(zone)
                    .with_context(|| "Cannot get zone")?;
                println!(
                    "Zone {} ({}): {} at {}%",
                    status.zone, status.name, status.power, status.percentage
                );
            }
        }
        CliCommands::Snapshot => {
            let snapshot = client
                .fetch_snapshot()
                .with_context(|| "Cannot fetch snapshot")?;
            println!("{}", snapshot.as_hex());
        }
        CliCommands::SetPower { zone, on } => client
            .set_zone_power(zone, on)
            .with_context(|| format!("Cannot set power for zone {zone}"))?,
        CliCommands::SetPercentage { zone, percentage } => client
            .set_zone_percentage(zone, percentage)
            .with_context(|| format!("Cannot set percentage for zone {zone}"))?,
        CliCommands::Daemon {
            output,
            interval,
            metrics,
        } => daemon::run(client, args.zones, output, interval, metrics)?,
    }

    Ok(())
}
