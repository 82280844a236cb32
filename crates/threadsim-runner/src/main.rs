//! The `threadsim` binary: loads a [`threadsim_config::SimulationConfig`],
//! starts a per-node TCP transport, drives the simulation for a fixed
//! wall/virtual-time budget, and reports counters on exit. Grounded on
//! this codebase's runner entry point (config load, `ctrlc` wiring,
//! `tracing-subscriber` init) generalized to the new dispatcher core.

mod transport;

use clap::Parser;
use std::collections::HashMap;
use std::sync::Arc;
use threadsim_config::SimulationConfig;
use threadsim_core::NodeId;
use threadsim_dispatch::core::NodeConfig as DispatchNodeConfig;
use threadsim_dispatch::{Dispatcher, DispatchDriver, Speed};
use threadsim_radio::{Position, RadioModelConfig, RadioModelKind};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "threadsim", about = "Discrete-event low-power wireless mesh simulator")]
struct Cli {
    /// Path to a SimulationConfig YAML file.
    #[arg(long)]
    config: String,

    /// Overrides the config's seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Replay/advance speed: a factor (e.g. "2.0"), or "max".
    #[arg(long, default_value = "1.0")]
    speed: String,

    /// Virtual microseconds to advance before exiting; 0 runs until Ctrl-C.
    #[arg(long, default_value_t = 0)]
    duration_us: u64,

    /// Base TCP port; node `i` (0-indexed in config order) listens on
    /// `base_port + i`.
    #[arg(long, default_value_t = 9000)]
    base_port: u16,
}

fn parse_speed(s: &str) -> Speed {
    match s.to_ascii_lowercase().as_str() {
        "max" => Speed::Max,
        other => other.parse::<f64>().map(Speed::Factor).unwrap_or(Speed::Factor(1.0)),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    threadsim_metrics::describe_metrics();

    let cli = Cli::parse();
    let config = match SimulationConfig::load_yaml(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to load config");
            std::process::exit(1);
        }
    };

    let seed = cli.seed.unwrap_or(config.seed);
    let radio_kind = match RadioModelKind::parse(&config.radio_model) {
        Ok(k) => k,
        Err(e) => {
            tracing::error!(error = %e, "unknown radio model");
            std::process::exit(1);
        }
    };
    let radio_config = RadioModelConfig {
        shadow_fading_sigma_db: config.radio.shadow_fading_sigma_db,
        cca_ed_threshold_dbm: config.radio.cca_ed_threshold_dbm as i8,
        min_sir_db: config.radio.min_sir_db,
        global_packet_loss_ratio: config.radio.global_packet_loss_ratio,
        ideal_rssi_dbm: config.radio.ideal_rssi_dbm as i8,
    };

    let mut dispatcher = Dispatcher::new(radio_kind, radio_config, seed);
    let mut endpoints = Vec::with_capacity(config.nodes.len());
    let mut outgoing = Vec::with_capacity(config.nodes.len());

    for (idx, node) in config.nodes.iter().enumerate() {
        let id = NodeId(node.id as i32);
        let (tx, rx) = crossbeam_channel::unbounded();
        let node_config = DispatchNodeConfig {
            position: Position { x: node.x, y: node.y, z: node.z },
            radio_range_units: node.radio_range_units,
            tx_power_dbm: node.tx_power_dbm,
            rx_sensitivity_dbm: node.rx_sensitivity_dbm,
        };
        if let Err(e) = dispatcher.add_node(id, node_config, tx) {
            tracing::error!(error = %e, node = %id, "failed to add node");
            std::process::exit(1);
        }
        if node.fail_duration_us != 0 {
            if let Ok(ft) = threadsim_node::FailTime::new(node.fail_duration_us, node.fail_interval_us) {
                let _ = dispatcher.set_fail_time(id, ft);
            }
        }
        let port = cli.base_port + idx as u16;
        endpoints.push(transport::NodeEndpoint { node: id, port });
        outgoing.push((id, rx));
    }

    let driver = Arc::new(DispatchDriver::spawn(dispatcher));
    if let Err(e) = driver.install_ctrlc_handler() {
        tracing::warn!(error = %e, "failed to install ctrlc handler");
    }

    let node_count = endpoints.len();
    if let Err(e) = transport::start_listeners(driver.clone(), endpoints, outgoing).await {
        tracing::error!(error = %e, "failed to start transport");
        std::process::exit(1);
    }

    let speed = parse_speed(&cli.speed);
    let duration_us = if cli.duration_us == 0 { u64::MAX } else { cli.duration_us };
    info!(seed, radio_model = %radio_kind, nodes = node_count, "starting");

    let done = driver.go_at_speed(duration_us, speed);
    let outcome = tokio::task::spawn_blocking(move || done.recv())
        .await
        .ok()
        .and_then(|r| r.ok());

    if let Some(outcome) = outcome {
        let counters: HashMap<_, _> = driver.query(|d| d.counters()).unwrap_or_default().into_iter().collect();
        info!(reached_us = outcome.reached.as_micros(), interrupted = outcome.interrupted, "stopped");
        for name in threadsim_core::CounterName::ALL {
            if let Some(count) = counters.get(name) {
                info!(counter = name.as_str(), count, "counter");
            }
        }
    }
}
