// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session lifecycle state machine.
//!
//! `Uninitialized` → `Ready` (successful initialize) → `Shutdown` (terminal).
//! The bridge owns at most one session. Handlers never fail: every error is
//! folded into the response or event the editor receives.

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};

use amplifier_bridge_core::{Engine, EngineResult, Session};
use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use futures::FutureExt;
use tracing::{error, info, warn};

use crate::config::BridgeConfig;
use crate::error::{panic_message, BridgeError, BridgeResult};
use crate::protocol::{Event, StatusResponse};

/// Prompts are truncated to this many characters in logs.
const PROMPT_LOG_CHARS: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BridgeState {
	Uninitialized,
	Ready,
	Shutdown,
}

pub struct Bridge<E: Engine> {
	engine: E,
	config: BridgeConfig,
	session: Option<E::Session>,
	shut_down: bool,
}

impl<E: Engine> Bridge<E> {
	pub fn new(engine: E, config: BridgeConfig) -> Self {
		Self {
			engine,
			config,
			session: None,
			shut_down: false,
		}
	}

	pub fn state(&self) -> BridgeState {
		if self.shut_down {
			BridgeState::Shutdown
		} else if self.session.is_some() {
			BridgeState::Ready
		} else {
			BridgeState::Uninitialized
		}
	}

	pub fn config(&self) -> &BridgeConfig {
		&self.config
	}

	pub fn session(&self) -> Option<&E::Session> {
		self.session.as_ref()
	}

	/// Build a session from a bundle and make `workspace_root` the working directory.
	///
	/// A non-empty `bundle_path` overrides the one remembered from the last
	/// successful initialize. On any failure the bridge is left exactly as it
	/// was, including a previously installed session.
	pub async fn initialize(
		&mut self,
		workspace_root: &str,
		bundle_path: Option<&str>,
	) -> StatusResponse {
		info!(workspace_root, "initializing bridge");

		match self.try_initialize(workspace_root, bundle_path).await {
			Ok(bundle) => {
				info!(workspace_root, bundle = %bundle.display(), "session initialized");
				StatusResponse::Initialized {
					workspace_root: workspace_root.to_string(),
					bundle: bundle.display().to_string(),
				}
			}
			Err(e) => {
				error!(workspace_root, error = %e, "initialization failed");
				StatusResponse::error(e)
			}
		}
	}

	async fn try_initialize(
		&mut self,
		workspace_root: &str,
		bundle_path: Option<&str>,
	) -> BridgeResult<PathBuf> {
		let bundle = bundle_path
			.filter(|p| !p.is_empty())
			.map(PathBuf::from)
			.or_else(|| self.config.bundle_path.clone())
			.ok_or(BridgeError::NoBundlePath)?;

		if !tokio::fs::try_exists(&bundle).await? {
			return Err(BridgeError::BundleNotFound(bundle));
		}

		let session = self.open_session(&bundle).await?;

		if !workspace_root.is_empty() {
			if let Err(source) = std::env::set_current_dir(workspace_root) {
				release(session).await;
				return Err(BridgeError::Workspace {
					path: PathBuf::from(workspace_root),
					source,
				});
			}
			info!(workspace_root, "changed working directory");
		}

		if let Some(previous) = self.session.take() {
			info!(session_id = previous.id(), "replacing existing session");
			release(previous).await;
		}

		self.session = Some(session);
		self.config.workspace_root = Some(PathBuf::from(workspace_root));
		self.config.bundle_path = Some(bundle.clone());
		Ok(bundle)
	}

	async fn open_session(&self, bundle: &Path) -> EngineResult<E::Session> {
		info!(bundle = %bundle.display(), "loading bundle");
		let loaded = self.engine.load_configuration(bundle).await?;

		info!("preparing bundle (may download modules)");
		let prepared = self.engine.prepare(loaded).await?;

		info!("creating session");
		self.engine.create_session(prepared).await
	}

	/// Run a prompt on the current session.
	///
	/// Yields one `response` event per content chunk, or a single `error`
	/// event that ends the stream. The caller appends the `done` marker.
	pub fn execute_prompt<'a>(&'a mut self, prompt: &'a str) -> BoxStream<'a, Event> {
		let Some(session) = self.session.as_mut() else {
			warn!("execute before initialize");
			return stream::once(future::ready(Event::error(
				BridgeError::SessionNotInitialized,
			)))
			.boxed();
		};

		let preview: String = prompt.chars().take(PROMPT_LOG_CHARS).collect();
		info!(session_id = session.id(), prompt = %preview, "executing prompt");

		AssertUnwindSafe(session.execute_stream(prompt))
			.catch_unwind()
			.map(|chunk| match chunk {
				Ok(Ok(content)) => Event::response(content),
				Ok(Err(e)) => {
					error!(error = %e, "execution failed");
					Event::error(e)
				}
				Err(panic) => {
					let message = panic_message(panic.as_ref());
					error!(%message, "engine panicked during execution");
					Event::error(message)
				}
			})
			.scan(false, |failed, event| {
				if *failed {
					return future::ready(None);
				}
				*failed = event.is_error();
				future::ready(Some(event))
			})
			.boxed()
	}

	/// Release the session and enter the terminal state.
	///
	/// Always reports `shutdown`; cleanup failures and panics are only logged.
	pub async fn shutdown(&mut self) -> StatusResponse {
		info!("shutting down bridge");
		self.close().await;
		self.shut_down = true;
		StatusResponse::Shutdown
	}

	/// Release any live session. Used at end of input, where no reply is sent.
	pub async fn close(&mut self) {
		if let Some(session) = self.session.take() {
			release(session).await;
		}
	}
}

/// Best-effort cleanup. Errors and panics are logged, never propagated.
async fn release<S: Session>(mut session: S) {
	let outcome = AssertUnwindSafe(session.cleanup()).catch_unwind().await;
	match outcome {
		Ok(Ok(())) => info!(session_id = session.id(), "session cleaned up"),
		Ok(Err(e)) => error!(session_id = session.id(), error = %e, "session cleanup failed"),
		Err(panic) => error!(
			session_id = session.id(),
			message = %panic_message(panic.as_ref()),
			"session cleanup panicked"
		),
	}
}
