// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for engine operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by an engine while building or driving a session.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("failed to load bundle {path}: {message}")]
	Load { path: PathBuf, message: String },

	#[error("failed to prepare bundle: {0}")]
	Prepare(String),

	#[error("failed to create session: {0}")]
	CreateSession(String),

	#[error("{0}")]
	Execute(String),

	#[error("cleanup failed: {0}")]
	Cleanup(String),

	#[error("engine host error [{code}]: {message}")]
	Host { code: String, message: String },

	#[error("engine host exited unexpectedly")]
	HostExited,

	#[error("engine host protocol error: {0}")]
	Protocol(String),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

impl EngineError {
	pub fn load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
		Self::Load {
			path: path.into(),
			message: message.into(),
		}
	}

	pub fn prepare(message: impl Into<String>) -> Self {
		Self::Prepare(message.into())
	}

	pub fn create_session(message: impl Into<String>) -> Self {
		Self::CreateSession(message.into())
	}

	pub fn execute(message: impl Into<String>) -> Self {
		Self::Execute(message.into())
	}

	pub fn cleanup(message: impl Into<String>) -> Self {
		Self::Cleanup(message.into())
	}
}
