// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire types for the editor-facing protocol.
//!
//! One JSON object per line in each direction. Requests carry a `command`;
//! `initialize`/`shutdown` answer with a `status`-tagged object and `execute`
//! answers with `type`-tagged events ending in `{"type":"done"}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BridgeError, BridgeResult};

// Command names
pub const COMMAND_INITIALIZE: &str = "initialize";
pub const COMMAND_EXECUTE: &str = "execute";
pub const COMMAND_SHUTDOWN: &str = "shutdown";

/// Command from the editor.
#[derive(Debug, Default, Deserialize)]
pub struct Request {
	#[serde(default)]
	pub command: Option<String>,
	#[serde(default)]
	pub workspace_root: Option<String>,
	#[serde(default)]
	pub bundle_path: Option<String>,
	#[serde(default)]
	pub prompt: Option<String>,
}

impl Request {
	/// Parse one input line.
	pub fn parse(line: &str) -> BridgeResult<Self> {
		let value: Value = serde_json::from_str(line).map_err(BridgeError::InvalidJson)?;
		if !value.is_object() {
			return Err(BridgeError::InvalidRequest(serde::de::Error::custom(
				"expected a JSON object",
			)));
		}
		serde_json::from_value(value).map_err(BridgeError::InvalidRequest)
	}
}

/// Reply to `initialize` and `shutdown`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatusResponse {
	Initialized {
		workspace_root: String,
		bundle: String,
	},
	Error {
		error: String,
	},
	Shutdown,
}

impl StatusResponse {
	pub fn error(error: impl ToString) -> Self {
		Self::Error {
			error: error.to_string(),
		}
	}

	pub fn is_error(&self) -> bool {
		matches!(self, Self::Error { .. })
	}
}

/// Output of `execute`, and loop-level errors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
	Response { content: String },
	Error { error: String },
	Done,
}

impl Event {
	pub fn response(content: impl Into<String>) -> Self {
		Self::Response {
			content: content.into(),
		}
	}

	pub fn error(error: impl ToString) -> Self {
		Self::Error {
			error: error.to_string(),
		}
	}

	pub fn is_error(&self) -> bool {
		matches!(self, Self::Error { .. })
	}
}
