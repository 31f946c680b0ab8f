// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Startup configuration.
//!
//! Everything comes from the process environment (or the matching flag).
//! Workspace and bundle are not configured here; the first `initialize`
//! request supplies them.

use std::fmt;
use std::path::PathBuf;

use amplifier_bridge_core::{EngineCommand, DEFAULT_ENGINE_COMMAND};
use clap::Parser;

/// Amplifier bridge - persistent session over newline-delimited JSON
#[derive(Parser, Debug)]
#[command(name = "amplifier-bridge", version)]
pub struct Args {
	/// Log severity (error, warn, info, debug, trace; WARNING/CRITICAL accepted)
	#[arg(long, env = "AMPLIFIER_LOG_LEVEL", default_value = "WARNING")]
	pub log_level: String,

	/// Write logs to this file instead of stderr
	#[arg(long, env = "AMPLIFIER_BRIDGE_LOG")]
	pub log_file: Option<PathBuf>,

	/// Engine host program
	#[arg(long, env = "AMPLIFIER_ENGINE_COMMAND", default_value = DEFAULT_ENGINE_COMMAND)]
	pub engine: String,

	/// Extra argument passed to the engine host (repeatable)
	#[arg(long = "engine-arg", allow_hyphen_values = true)]
	pub engine_args: Vec<String>,
}

impl Args {
	pub fn engine_command(&self) -> EngineCommand {
		EngineCommand::new(&self.engine).with_args(self.engine_args.iter().cloned())
	}
}

/// Log severity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogLevel {
	Error,
	#[default]
	Warn,
	Info,
	Debug,
	Trace,
}

impl LogLevel {
	/// Parse a severity name, case-insensitively. Python logging names
	/// (`WARNING`, `CRITICAL`, `NOTSET`) map onto the nearest tracing level.
	pub fn from_name(name: &str) -> Option<Self> {
		match name.trim().to_ascii_lowercase().as_str() {
			"error" | "critical" | "fatal" => Some(Self::Error),
			"warn" | "warning" => Some(Self::Warn),
			"info" => Some(Self::Info),
			"debug" => Some(Self::Debug),
			"trace" | "notset" => Some(Self::Trace),
			_ => None,
		}
	}

	/// Filter directive for `tracing_subscriber::EnvFilter`.
	pub fn as_directive(&self) -> &'static str {
		match self {
			Self::Error => "error",
			Self::Warn => "warn",
			Self::Info => "info",
			Self::Debug => "debug",
			Self::Trace => "trace",
		}
	}
}

impl fmt::Display for LogLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_directive())
	}
}

/// Bridge run parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BridgeConfig {
	/// Set by the last successful `initialize`.
	pub workspace_root: Option<PathBuf>,
	/// Set by the last successful `initialize`; reused when a later one omits it.
	pub bundle_path: Option<PathBuf>,
	pub log_level: LogLevel,
	pub log_file: Option<PathBuf>,
	/// The raw level name when it was not recognized and the default was used.
	pub rejected_log_level: Option<String>,
}

impl BridgeConfig {
	pub fn from_args(args: &Args) -> Self {
		let (log_level, rejected_log_level) = match LogLevel::from_name(&args.log_level) {
			Some(level) => (level, None),
			None => (LogLevel::default(), Some(args.log_level.clone())),
		};

		Self {
			workspace_root: None,
			bundle_path: None,
			log_level,
			log_file: args.log_file.clone().filter(|p| !p.as_os_str().is_empty()),
			rejected_log_level,
		}
	}
}
