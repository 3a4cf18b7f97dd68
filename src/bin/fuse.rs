//! fuse - fuse one spatial and one temporal verdict from JSON files
//!
//! Prints the fused result as JSON on stdout. Malformed verdicts still print a
//! result (the fixed fallback), so callers always get a parseable answer.

use anyhow::{anyhow, Result};
use clap::Parser;
use serde_json::Value;
use std::path::{Path, PathBuf};

use anomaly_fusion::{FusionConfig, FusionEngine};

#[derive(Parser, Debug)]
#[command(
    name = "fuse",
    about = "Fuse a spatial and a temporal anomaly verdict"
)]
struct Args {
    /// Path to the spatial detector verdict (JSON)
    #[arg(long, value_name = "PATH")]
    spatial: PathBuf,

    /// Path to the temporal detector verdict (JSON)
    #[arg(long, value_name = "PATH")]
    temporal: PathBuf,

    /// Optional frame metadata (JSON)
    #[arg(long, value_name = "PATH")]
    metadata: Option<PathBuf>,

    /// Engine config file (JSON or TOML)
    #[arg(long, env = "FUSION_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Pretty-print the result
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => FusionConfig::from_path(path)?,
        None => FusionConfig::default(),
    };
    let engine = FusionEngine::new(config)?;

    let spatial = read_json(&args.spatial)?;
    let temporal = read_json(&args.temporal)?;
    let metadata = args.metadata.as_deref().map(read_json).transpose()?;

    let result = engine.fuse_payloads(&spatial, &temporal, metadata.as_ref());
    let out = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{}", out);
    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&raw).map_err(|e| anyhow!("invalid JSON in {}: {}", path.display(), e))
}
