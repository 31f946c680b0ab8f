// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bridge error types.
//!
//! Every variant's display text is what ends up in the `error` field of the
//! JSON object sent back to the editor.

use std::any::Any;
use std::path::PathBuf;
use std::string::FromUtf8Error;

use amplifier_bridge_core::EngineError;
use thiserror::Error;

/// Result type alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

#[derive(Debug, Error)]
pub enum BridgeError {
	#[error("invalid JSON: {0}")]
	InvalidJson(#[source] serde_json::Error),

	#[error("invalid JSON: {0}")]
	InvalidUtf8(#[source] FromUtf8Error),

	#[error("invalid request: {0}")]
	InvalidRequest(#[source] serde_json::Error),

	#[error("missing command")]
	MissingCommand,

	#[error("unknown command: {0}")]
	UnknownCommand(String),

	#[error("no bundle path provided")]
	NoBundlePath,

	#[error("{} not found", .0.display())]
	BundleNotFound(PathBuf),

	#[error("session not initialized")]
	SessionNotInitialized,

	#[error("failed to change directory to {}: {source}", .path.display())]
	Workspace {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error(transparent)]
	Engine(#[from] EngineError),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("failed to encode response: {0}")]
	Serialize(#[source] serde_json::Error),
}

/// Text of a caught panic payload.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
	if let Some(s) = panic.downcast_ref::<&str>() {
		(*s).to_string()
	} else if let Some(s) = panic.downcast_ref::<String>() {
		s.clone()
	} else {
		"request handler panicked".to_string()
	}
}
