//! Sniffer Replay
//!
//! Drives recorded blocks through the streaming service and prints every
//! snapshot it would send as one JSON line on stdout. Logs go to stderr.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use cosmos_streaming::replay::{parse_fixtures, replay_block};
use cosmos_streaming::{
    DeliveryMode, JsonLinesClient, Sniffer, StreamingConfig, StreamingService,
};
use sniffer_telemetry::{init_logging, TelemetryConfig};

/// Replay ABCI block fixtures through the Cosmos sniffer pipeline
#[derive(Parser, Debug)]
#[command(name = "sniffer-replay")]
#[command(about = "Replay ABCI block fixtures and print the resulting snapshots")]
struct Args {
    /// JSON file holding an array of block fixtures
    fixtures: PathBuf,

    /// Tracer id under which each transaction's call frames are seeded
    #[arg(long, default_value = "replay")]
    tracer_id: String,

    /// Bech32 prefix for validator addresses (overrides SNIFFER_VALOPER_PREFIX)
    #[arg(long)]
    valoper_prefix: Option<String>,

    /// Log filter (overrides SNIFFER_LOG_LEVEL / RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON logs
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut telemetry = TelemetryConfig::from_env();
    if let Some(level) = &args.log_level {
        telemetry = telemetry.with_log_level(level.clone());
    }
    if args.json_logs {
        telemetry = telemetry.with_json_logs(true);
    }
    init_logging(&telemetry).context("failed to initialize logging")?;

    let mut config = StreamingConfig::from_env().context("invalid sniffer configuration")?;
    config.enabled = true;
    config.delivery = DeliveryMode::Inline;
    if let Some(prefix) = args.valoper_prefix {
        config.validator_address_prefix = prefix;
    }
    config.validate().context("invalid sniffer configuration")?;

    let raw = fs::read_to_string(&args.fixtures)
        .with_context(|| format!("failed to read {}", args.fixtures.display()))?;
    let blocks = parse_fixtures(&raw)
        .with_context(|| format!("failed to parse {}", args.fixtures.display()))?;

    info!(blocks = blocks.len(), path = %args.fixtures.display(), "Replaying fixtures");

    let sniffer = Sniffer::with_client(Arc::new(JsonLinesClient::stdout()));
    let mut service = StreamingService::new(config, Some(Arc::new(sniffer)));

    for block in blocks {
        let height = block.begin_request.header.height;
        replay_block(&mut service, block, args.tracer_id.as_bytes())
            .with_context(|| format!("replay failed at height {height}"))?;
    }

    let metrics = service.metrics();
    info!(
        observed = metrics.blocks_observed,
        skipped = metrics.commits_skipped_incomplete + metrics.commits_skipped_duplicate,
        txs = metrics.txs_delivered,
        call_frames = metrics.call_frames_ingested,
        "Replay finished"
    );
    Ok(())
}
