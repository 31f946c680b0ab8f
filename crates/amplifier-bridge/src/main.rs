// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Amplifier bridge binary: stdin/stdout JSON loop over a persistent session.

use amplifier_bridge::{logging, server, Args, Bridge, BridgeConfig};
use amplifier_bridge_core::ProcessEngine;
use clap::Parser;
use tokio::io::BufReader;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();
	let config = BridgeConfig::from_args(&args);
	logging::init(&config);

	let engine = ProcessEngine::new(args.engine_command());
	info!(
		engine = %engine.command().program,
		log_level = %config.log_level,
		"starting amplifier-bridge"
	);

	let mut bridge = Bridge::new(engine, config);
	let stdin = BufReader::new(tokio::io::stdin());
	let stdout = tokio::io::stdout();

	let result = server::run(&mut bridge, stdin, stdout).await;

	// End of input leaves the session alive; release it before exiting.
	bridge.close().await;

	if let Err(e) = &result {
		error!(error = %e, "bridge transport failed");
	}
	info!("amplifier-bridge exiting");
	Ok(result?)
}
