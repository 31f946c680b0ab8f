// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Engine host process adapter.
//!
//! [`ProcessEngine`] spawns an external engine host and talks to it over
//! newline-delimited JSON on the child's stdin/stdout. The child's stderr is
//! inherited so host diagnostics land next to the bridge's own logs and never
//! on the bridge's response stream.
//!
//! Wire format, one object per line:
//! - request: `{"id": 1, "method": "prepare", "params": {...}}`
//! - success: `{"id": 1, "result": ...}`
//! - failure: `{"id": 1, "error": {"code": "...", "message": "..."}}`

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::engine::{Engine, Session};
use crate::error::{EngineError, EngineResult};

pub const DEFAULT_ENGINE_COMMAND: &str = "amplifier-engine";

/// How long a host gets to exit after its stdin closes before it is killed.
const HOST_EXIT_GRACE: Duration = Duration::from_secs(5);

// Host method names
const METHOD_PREPARE: &str = "prepare";
const METHOD_CREATE_SESSION: &str = "create_session";
const METHOD_EXECUTE: &str = "execute";
const METHOD_CLEANUP: &str = "cleanup";

/// Program and arguments used to launch an engine host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineCommand {
	pub program: String,
	pub args: Vec<String>,
}

impl EngineCommand {
	pub fn new(program: impl Into<String>) -> Self {
		Self {
			program: program.into(),
			args: Vec::new(),
		}
	}

	pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
		self.args = args.into_iter().map(Into::into).collect();
		self
	}
}

impl Default for EngineCommand {
	fn default() -> Self {
		Self::new(DEFAULT_ENGINE_COMMAND)
	}
}

#[derive(Debug, Serialize)]
struct HostRequest<'a> {
	id: u64,
	method: &'a str,
	params: Value,
}

#[derive(Debug, Deserialize)]
struct HostResponse {
	#[serde(default)]
	id: Option<u64>,
	#[serde(default)]
	result: Value,
	#[serde(default)]
	error: Option<HostError>,
}

#[derive(Debug, Deserialize)]
struct HostError {
	code: String,
	message: String,
}

impl HostResponse {
	fn into_result(self) -> EngineResult<Value> {
		match self.error {
			Some(err) => Err(EngineError::Host {
				code: err.code,
				message: err.message,
			}),
			None => Ok(self.result),
		}
	}
}

/// A running engine host process.
struct EngineHost {
	program: String,
	child: Child,
	stdin: Option<ChildStdin>,
	stdout: BufReader<ChildStdout>,
	next_id: u64,
}

impl EngineHost {
	fn spawn(command: &EngineCommand) -> EngineResult<Self> {
		let mut child = Command::new(&command.program)
			.args(&command.args)
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::inherit())
			.kill_on_drop(true)
			.spawn()
			.map_err(|e| {
				EngineError::prepare(format!(
					"failed to spawn engine host `{}`: {e}",
					command.program
				))
			})?;

		let stdin = child
			.stdin
			.take()
			.ok_or_else(|| EngineError::Protocol("engine host stdin unavailable".to_string()))?;
		let stdout = child
			.stdout
			.take()
			.ok_or_else(|| EngineError::Protocol("engine host stdout unavailable".to_string()))?;

		info!(program = %command.program, pid = ?child.id(), "engine host started");

		Ok(Self {
			program: command.program.clone(),
			child,
			stdin: Some(stdin),
			stdout: BufReader::new(stdout),
			next_id: 1,
		})
	}

	/// Send one request and wait for the response carrying the same id.
	#[instrument(skip(self, params))]
	async fn call(&mut self, method: &str, params: Value) -> EngineResult<Value> {
		let id = self.next_id;
		self.next_id += 1;

		let request = HostRequest { id, method, params };
		let mut line = serde_json::to_string(&request)
			.map_err(|e| EngineError::Protocol(format!("failed to encode request: {e}")))?;
		line.push('\n');

		let stdin = self.stdin.as_mut().ok_or(EngineError::HostExited)?;
		stdin.write_all(line.as_bytes()).await?;
		stdin.flush().await?;
		debug!(id, method, "sent engine host request");

		let mut buf = String::new();
		loop {
			buf.clear();
			if self.stdout.read_line(&mut buf).await? == 0 {
				warn!(id, method, "engine host closed stdout");
				return Err(EngineError::HostExited);
			}

			let trimmed = buf.trim();
			if trimmed.is_empty() {
				continue;
			}

			let response: HostResponse = match serde_json::from_str(trimmed) {
				Ok(r) => r,
				Err(e) => {
					debug!(error = %e, "skipping unparseable engine host line");
					continue;
				}
			};

			if response.id != Some(id) {
				debug!(expected = id, got = ?response.id, "skipping engine host line for another request");
				continue;
			}

			return response.into_result();
		}
	}

	/// Close stdin and wait for the host to exit, killing it after the grace period.
	async fn shutdown(&mut self) {
		drop(self.stdin.take());

		match timeout(HOST_EXIT_GRACE, self.child.wait()).await {
			Ok(Ok(status)) => debug!(%status, "engine host exited"),
			Ok(Err(e)) => warn!(error = %e, "failed to wait for engine host"),
			Err(_) => {
				warn!(program = %self.program, "engine host did not exit in time, killing");
				if let Err(e) = self.child.kill().await {
					warn!(error = %e, "failed to kill engine host");
				}
			}
		}
	}
}

/// A bundle the engine host has not seen yet.
#[derive(Debug)]
pub struct ProcessBundle {
	path: PathBuf,
}

/// An engine host that has prepared a bundle.
pub struct PreparedHost {
	host: EngineHost,
}

/// [`Engine`] backed by an external engine host process.
///
/// Each prepared bundle owns its own host process; the session created from
/// it keeps the host alive until [`Session::cleanup`].
#[derive(Clone, Debug, Default)]
pub struct ProcessEngine {
	command: EngineCommand,
}

impl ProcessEngine {
	pub fn new(command: EngineCommand) -> Self {
		Self { command }
	}

	pub fn command(&self) -> &EngineCommand {
		&self.command
	}
}

#[async_trait]
impl Engine for ProcessEngine {
	type Bundle = ProcessBundle;
	type Prepared = PreparedHost;
	type Session = ProcessSession;

	async fn load_configuration(&self, bundle_path: &Path) -> EngineResult<ProcessBundle> {
		// Read up front so an unreadable bundle fails before a host is spawned.
		// The host re-reads the file during prepare.
		let source = tokio::fs::read_to_string(bundle_path)
			.await
			.map_err(|e| EngineError::load(bundle_path, e.to_string()))?;
		debug!(path = %bundle_path.display(), bytes = source.len(), "bundle loaded");

		Ok(ProcessBundle {
			path: bundle_path.to_path_buf(),
		})
	}

	async fn prepare(&self, bundle: ProcessBundle) -> EngineResult<PreparedHost> {
		let mut host = EngineHost::spawn(&self.command)?;

		let params = json!({ "bundle_path": bundle.path.to_string_lossy() });
		if let Err(e) = host.call(METHOD_PREPARE, params).await {
			host.shutdown().await;
			return Err(EngineError::prepare(e.to_string()));
		}

		info!(bundle = %bundle.path.display(), "bundle prepared");
		Ok(PreparedHost { host })
	}

	async fn create_session(&self, prepared: PreparedHost) -> EngineResult<ProcessSession> {
		let mut host = prepared.host;

		let session_id = match host.call(METHOD_CREATE_SESSION, json!({})).await {
			Ok(result) => match result.get("session_id").and_then(Value::as_str) {
				Some(id) => id.to_string(),
				None => {
					host.shutdown().await;
					return Err(EngineError::create_session(
						"engine host response is missing session_id",
					));
				}
			},
			Err(e) => {
				host.shutdown().await;
				return Err(EngineError::create_session(e.to_string()));
			}
		};

		info!(%session_id, "engine session created");
		Ok(ProcessSession { host, session_id })
	}
}

/// A session living inside an engine host process.
pub struct ProcessSession {
	host: EngineHost,
	session_id: String,
}

/// Pull the response text out of an `execute` result.
fn content_from_result(result: Value) -> String {
	match result {
		Value::String(text) => text,
		Value::Object(ref map) => match map.get("content") {
			Some(Value::String(text)) => text.clone(),
			_ => result.to_string(),
		},
		other => other.to_string(),
	}
}

#[async_trait]
impl Session for ProcessSession {
	fn id(&self) -> &str {
		&self.session_id
	}

	async fn execute(&mut self, prompt: &str) -> EngineResult<String> {
		let params = json!({ "session_id": self.session_id, "prompt": prompt });
		let result = self.host.call(METHOD_EXECUTE, params).await?;
		Ok(content_from_result(result))
	}

	async fn cleanup(&mut self) -> EngineResult<()> {
		let params = json!({ "session_id": self.session_id });
		let result = self.host.call(METHOD_CLEANUP, params).await;
		self.host.shutdown().await;

		result
			.map(|_| ())
			.map_err(|e| EngineError::cleanup(e.to_string()))
	}
}
