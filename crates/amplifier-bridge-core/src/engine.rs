// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Engine and session traits.
//!
//! These traits are the only seam between the bridge and whatever actually
//! answers prompts. Tests drive the bridge with scripted implementations;
//! the binary wires in [`crate::ProcessEngine`].

use std::path::Path;

use async_trait::async_trait;
use futures::stream::{self, BoxStream};

use crate::error::EngineResult;

/// Builds sessions from configuration bundles.
///
/// Session construction happens in three delegated steps, each of which may
/// fail independently:
/// 1. [`Engine::load_configuration`] reads the bundle at a path
/// 2. [`Engine::prepare`] resolves it (may hit the network or filesystem and
///    take arbitrary time)
/// 3. [`Engine::create_session`] turns the prepared bundle into a live session
#[async_trait]
pub trait Engine: Send + Sync {
	/// A loaded but unprepared bundle.
	type Bundle: Send;

	/// A bundle ready to create sessions from.
	type Prepared: Send;

	/// The live conversation handle.
	type Session: Session;

	/// Load the configuration bundle at `bundle_path`.
	async fn load_configuration(&self, bundle_path: &Path) -> EngineResult<Self::Bundle>;

	/// Prepare a loaded bundle.
	async fn prepare(&self, bundle: Self::Bundle) -> EngineResult<Self::Prepared>;

	/// Create a persistent session from a prepared bundle.
	async fn create_session(&self, prepared: Self::Prepared) -> EngineResult<Self::Session>;
}

/// One persistent, context-preserving conversation.
#[async_trait]
pub trait Session: Send {
	/// Identifier used in logs.
	fn id(&self) -> &str;

	/// Execute a prompt and return the complete response.
	///
	/// Conversation history carries over between calls on the same session.
	async fn execute(&mut self, prompt: &str) -> EngineResult<String>;

	/// Execute a prompt as a stream of content chunks.
	///
	/// The default yields exactly one item: the result of [`Session::execute`].
	/// Engines that produce partial output override this. Consumers stop at the
	/// first `Err`.
	fn execute_stream<'a>(&'a mut self, prompt: &'a str) -> BoxStream<'a, EngineResult<String>> {
		Box::pin(stream::once(self.execute(prompt)))
	}

	/// Release the engine resources held by this session.
	async fn cleanup(&mut self) -> EngineResult<()>;
}
