use anyhow::{bail, Context, Result};
use log::{error, info, warn};
use serde_json::json;
use std::collections::HashMap;
use zonetouch3_lib::protocol::{Snapshot, SystemInfo, ZoneStatus};
use zonetouch3_lib::tcp::ZoneTouch3;

use crate::{commandline, mqtt};

#[derive(Debug)]
enum FetchedData {
    System(SystemInfo),
    Zones(Vec<ZoneStatus>),
    Temperature(i32),
}

impl FetchedData {
    fn to_json_value(&self) -> Result<serde_json::Value> {
        match self {
            FetchedData::System(s) => serde_json::to_value(s).map_err(Into::into),
            FetchedData::Zones(s) => serde_json::to_value(s).map_err(Into::into),
            FetchedData::Temperature(s) => serde_json::to_value(s).map_err(Into::into),
        }
    }

    fn as_debug_string(&self) -> String {
        match self {
            FetchedData::System(s) => format!("{s:?}"),
            FetchedData::Zones(s) => format!("{s:?}"),
            FetchedData::Temperature(s) => format!("{s:?}"),
        }
    }
}

struct Metric {
    decode: Box<dyn Fn(&Snapshot, u8) -> Result<FetchedData>>,
}

/// All metrics decode from the one snapshot fetched per cycle; no metric
/// triggers its own exchange.
fn get_metrics<'a>() -> HashMap<&'a str, Metric> {
    let mut metrics: HashMap<&'a str, Metric> = HashMap::new();
    metrics.insert(
        "system",
        Metric {
            decode: Box::new(|snapshot, _| {
                Ok(SystemInfo::decode(snapshot).map(FetchedData::System)?)
            }),
        },
    );
    metrics.insert(
        "zones",
        Metric {
            decode: Box::new(|snapshot, zones| {
                Ok((0..zones)
                    .map(|zone| ZoneStatus::decode(snapshot, zone))
                    .collect::<Result<Vec<_>, _>>()
                    .map(FetchedData::Zones)?)
            }),
        },
    );
    metrics.insert(
        "temperature",
        Metric {
            decode: Box::new(|snapshot, _| {
                Ok(snapshot
                    .console_temperature()
                    .map(FetchedData::Temperature)?)
            }),
        },
    );
    metrics
}

fn publish_simple_format(
    publisher: &mut mqtt::MqttPublisher,
    base_topic: &str,
    metric_name: &str,
    value: &serde_json::Value,
) {
    fn publish_recursive(
        publisher: &mut mqtt::MqttPublisher,
        topic: &str,
        val: &serde_json::Value,
    ) {
        match val {
            serde_json::Value::Object(map) => {
                for (k, v) in map {
                    let sub_topic = format!("{topic}/{k}");
                    publish_recursive(publisher, &sub_topic, v);
                }
            }
            serde_json::Value::Array(arr) => {
                for (i, v) in arr.iter().enumerate() {
                    let sub_topic = format!("{topic}/{i}");
                    publish_recursive(publisher, &sub_topic, v);
                }
            }
            serde_json::Value::String(s) => {
                if let Err(e) = publisher.publish(topic, s) {
                    error!("Failed to publish message to topic {topic}: {e}");
                }
            }
            serde_json::Value::Number(n) => {
                if let Err(e) = publisher.publish(topic, &n.to_string()) {
                    error!("Failed to publish message to topic {topic}: {e}");
                }
            }
            serde_json::Value::Bool(b) => {
                if let Err(e) = publisher.publish(topic, &b.to_string()) {
                    error!("Failed to publish message to topic {topic}: {e}");
                }
            }
            serde_json::Value::Null => {
                // Do not publish null values
            }
        }
    }
    let root_topic = format!("{base_topic}/{metric_name}");
    publish_recursive(publisher, &root_topic, value);
}

pub fn run(
    client: ZoneTouch3,
    zones: u8,
    output: commandline::DaemonOutput,
    interval: std::time::Duration,
    metrics_to_fetch: Vec<String>,
) -> Result<()> {
    info!(
        "Starting daemon mode: output={output:?}, interval={interval:?}, metrics={metrics_to_fetch:?}"
    );
    let available_metrics = get_metrics();

    let mut mqtt_publisher: Option<mqtt::MqttPublisher> = None;

    if let commandline::DaemonOutput::Mqtt { config_file, .. } = &output {
        let config = mqtt::MqttConfig::load(config_file)
            .with_context(|| format!("Failed to open MQTT config file at '{config_file}'"))?;
        info!("Successfully loaded MQTT config from {config_file}: {config:?}");
        let publisher =
            mqtt::MqttPublisher::new(config).with_context(|| "Failed to create MQTT publisher")?;
        info!("MQTT Publisher created successfully.");
        mqtt_publisher = Some(publisher);
    }

    loop {
        let mut metrics_to_process = metrics_to_fetch.clone();
        if metrics_to_process.iter().any(|m| m == "all") {
            info!("Fetching all metrics due to 'all' flag.");
            metrics_to_process = available_metrics.keys().map(|s| s.to_string()).collect();
        }
        for metric_name in &metrics_to_process {
            if !available_metrics.contains_key(metric_name.as_str()) {
                bail!("Unknown metric name '{}'", metric_name);
            }
        }

        // One exchange per cycle; every selected metric decodes from the
        // same snapshot. A failed fetch skips the cycle, values from the
        // previous cycle simply stay unpublished (no retry here).
        let mut fetched_data: HashMap<String, FetchedData> = HashMap::new();
        match client.fetch_snapshot() {
            Ok(snapshot) => {
                for metric_name in &metrics_to_process {
                    let metric = &available_metrics[metric_name.as_str()];
                    match (metric.decode)(&snapshot, zones) {
                        Ok(data) => {
                            fetched_data.insert(metric_name.to_string(), data);
                        }
                        Err(e) => error!("Error decoding metric '{metric_name}': {e}"),
                    }
                }
            }
            Err(e) => error!("Error fetching snapshot: {e}"),
        }

        match &output {
            commandline::DaemonOutput::Console => {
                println!("--- Data at {} ---", chrono::Local::now().to_rfc3339());
                for (name, data) in &fetched_data {
                    println!("{}: {}", name, data.as_debug_string());
                }
                println!("--------------------------");
            }
            commandline::DaemonOutput::Mqtt { format, .. } => {
                if let Some(publisher) = &mut mqtt_publisher {
                    match format {
                        commandline::MqttFormat::Json => {
                            let mut data_to_publish = serde_json::Map::new();
                            data_to_publish.insert(
                                "timestamp".to_string(),
                                json!(chrono::Utc::now().to_rfc3339()),
                            );

                            for (name, data) in &fetched_data {
                                match data.to_json_value() {
                                    Ok(val) => {
                                        data_to_publish.insert(name.clone(), val);
                                    }
                                    Err(e) => error!("Failed to serialize '{name}': {e}"),
                                }
                            }

                            if data_to_publish.len() > 1 {
                                match serde_json::to_string(&data_to_publish) {
                                    Ok(json_payload) => {
                                        let topic = publisher.topic().to_string();
                                        if let Err(e) = publisher.publish(&topic, &json_payload) {
                                            error!("Failed to publish data to MQTT: {e:?}");
                                        } else {
                                            info!("Successfully published data to MQTT.");
                                        }
                                    }
                                    Err(e) => {
                                        error!("Failed to serialize data to JSON string: {e}");
                                    }
                                }
                            } else {
                                info!("No data fetched in this cycle to publish via MQTT.");
                            }
                        }
                        commandline::MqttFormat::Simple => {
                            let base_topic = publisher.topic().to_string();
                            for (name, data) in &fetched_data {
                                match data.to_json_value() {
                                    Ok(value) => {
                                        publish_simple_format(publisher, &base_topic, name, &value);
                                    }
                                    Err(e) => error!("Failed to serialize '{name}': {e}"),
                                }
                            }
                        }
                    }
                } else {
                    warn!(
                        "MQTT output selected, but publisher is not initialized. Skipping publish."
                    );
                }
            }
        }
        std::thread::sleep(interval);
    }
}
