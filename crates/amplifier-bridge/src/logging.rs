// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tracing setup.
//!
//! Stdout carries the response stream, so logs only ever go to stderr or the
//! configured log file.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing::warn;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use crate::config::BridgeConfig;

fn open_log_file(path: &Path) -> io::Result<File> {
	OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init(config: &BridgeConfig) {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(config.log_level.as_directive()));

	let mut open_error = None;
	let (writer, ansi) = match &config.log_file {
		Some(path) => match open_log_file(path) {
			Ok(file) => (BoxMakeWriter::new(Mutex::new(file)), false),
			Err(e) => {
				open_error = Some((path.clone(), e));
				(BoxMakeWriter::new(io::stderr), true)
			}
		},
		None => (BoxMakeWriter::new(io::stderr), true),
	};

	// A subscriber may already be installed (tests); keep it.
	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(writer)
		.with_ansi(ansi)
		.try_init();

	if let Some((path, e)) = open_error {
		warn!(path = %path.display(), error = %e, "failed to open log file, logging to stderr");
	}

	if let Some(raw) = &config.rejected_log_level {
		warn!(level = %raw, fallback = %config.log_level, "unrecognized log level");
	}
}
