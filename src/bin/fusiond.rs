//! fusiond - fusion engine HTTP service
//!
//! This daemon:
//! 1. Loads the service config (file named by FUSION_CONFIG, then env overrides)
//! 2. Builds one shared fusion engine
//! 3. Serves GET /health and POST /fuse until Ctrl-C

use anyhow::{anyhow, Result};
use std::sync::mpsc;
use std::sync::Arc;

use anomaly_fusion::{
    api::{ApiConfig, ApiServer},
    FusionEngine, ServiceConfig,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServiceConfig::load()?;
    let engine = Arc::new(FusionEngine::new(config.fusion.clone())?);
    log::info!(
        "fusion engine ready: {} (weights spatial={} temporal={})",
        engine.config().model_label,
        engine.config().weights.spatial,
        engine.config().weights.temporal
    );

    let api_config = ApiConfig {
        addr: config.api_addr.clone(),
        api_key: config.api_key.clone(),
        key_path: config.api_key_path.clone(),
        ..ApiConfig::default()
    };
    let api_handle = ApiServer::new(api_config, engine).spawn()?;

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .map_err(|e| anyhow!("error setting Ctrl-C handler: {}", e))?;

    log::info!("fusiond waiting for shutdown signal (Ctrl-C)...");
    let _ = rx.recv();
    log::info!("shutdown signal received, stopping API server...");
    api_handle.stop()?;

    Ok(())
}
