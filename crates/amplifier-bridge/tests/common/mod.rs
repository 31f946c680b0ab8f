// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Scripted engine for driving the bridge in tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use amplifier_bridge::{run, Bridge, BridgeConfig};
use amplifier_bridge_core::{Engine, EngineError, EngineResult, Session};
use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use serde_json::Value;

/// Engine step to fail at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailAt {
	Load,
	Prepare,
	CreateSession,
}

/// Records every call made through it, in order.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
	pub fn push(&self, entry: impl Into<String>) {
		self.0.lock().unwrap().push(entry.into());
	}

	pub fn entries(&self) -> Vec<String> {
		self.0.lock().unwrap().clone()
	}

	pub fn with_prefix(&self, prefix: &str) -> Vec<String> {
		self.entries()
			.into_iter()
			.filter(|e| e.starts_with(prefix))
			.collect()
	}
}

/// Echo engine.
///
/// Sessions answer `echo: <prompt>`. The prompts `fail` and `panic` make
/// execute return an error or panic; `stream` yields three chunks and
/// `stream-fail` yields one chunk, then an error, then a chunk that must
/// never be seen.
#[derive(Clone, Default)]
pub struct FakeEngine {
	pub log: CallLog,
	pub fail_at: Option<FailAt>,
	pub fail_cleanup: bool,
	pub panic_cleanup: bool,
	next_session: Arc<AtomicUsize>,
}

impl FakeEngine {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn failing_at(step: FailAt) -> Self {
		Self {
			fail_at: Some(step),
			..Self::default()
		}
	}

	pub fn failing_cleanup() -> Self {
		Self {
			fail_cleanup: true,
			..Self::default()
		}
	}

	pub fn panicking_cleanup() -> Self {
		Self {
			panic_cleanup: true,
			..Self::default()
		}
	}
}

pub struct FakeBundle(PathBuf);
pub struct FakePrepared(PathBuf);

#[async_trait]
impl Engine for FakeEngine {
	type Bundle = FakeBundle;
	type Prepared = FakePrepared;
	type Session = EchoSession;

	async fn load_configuration(&self, bundle_path: &Path) -> EngineResult<FakeBundle> {
		self.log.push(format!("load:{}", bundle_path.display()));
		if self.fail_at == Some(FailAt::Load) {
			return Err(EngineError::load(bundle_path, "unsupported bundle version"));
		}
		Ok(FakeBundle(bundle_path.to_path_buf()))
	}

	async fn prepare(&self, bundle: FakeBundle) -> EngineResult<FakePrepared> {
		self.log.push("prepare");
		if self.fail_at == Some(FailAt::Prepare) {
			return Err(EngineError::prepare("module download failed"));
		}
		Ok(FakePrepared(bundle.0))
	}

	async fn create_session(&self, _prepared: FakePrepared) -> EngineResult<EchoSession> {
		self.log.push("create_session");
		if self.fail_at == Some(FailAt::CreateSession) {
			return Err(EngineError::create_session("provider unavailable"));
		}
		let n = self.next_session.fetch_add(1, Ordering::SeqCst) + 1;
		Ok(EchoSession {
			id: format!("session-{n}"),
			log: self.log.clone(),
			fail_cleanup: self.fail_cleanup,
			panic_cleanup: self.panic_cleanup,
		})
	}
}

pub struct EchoSession {
	id: String,
	log: CallLog,
	fail_cleanup: bool,
	panic_cleanup: bool,
}

#[async_trait]
impl Session for EchoSession {
	fn id(&self) -> &str {
		&self.id
	}

	async fn execute(&mut self, prompt: &str) -> EngineResult<String> {
		self.log.push(format!("execute:{}:{prompt}", self.id));
		match prompt {
			"fail" => Err(EngineError::execute("engine exploded")),
			"panic" => panic!("engine panicked on purpose"),
			_ => Ok(format!("echo: {prompt}")),
		}
	}

	fn execute_stream<'a>(&'a mut self, prompt: &'a str) -> BoxStream<'a, EngineResult<String>> {
		match prompt {
			"stream" => {
				self.log.push(format!("execute:{}:{prompt}", self.id));
				Box::pin(stream::iter(vec![
					Ok("one".to_string()),
					Ok("two".to_string()),
					Ok("three".to_string()),
				]))
			}
			"stream-fail" => {
				self.log.push(format!("execute:{}:{prompt}", self.id));
				Box::pin(stream::iter(vec![
					Ok("partial".to_string()),
					Err(EngineError::execute("stream broke")),
					Ok("unreachable".to_string()),
				]))
			}
			_ => Box::pin(stream::once(self.execute(prompt))),
		}
	}

	async fn cleanup(&mut self) -> EngineResult<()> {
		self.log.push(format!("cleanup:{}", self.id));
		if self.panic_cleanup {
			panic!("cleanup blew up");
		}
		if self.fail_cleanup {
			return Err(EngineError::cleanup("resource busy"));
		}
		Ok(())
	}
}

/// A workspace directory holding a `bundle.yaml`.
pub struct Workspace {
	pub dir: tempfile::TempDir,
}

impl Workspace {
	pub fn new() -> Self {
		let dir = tempfile::tempdir().expect("tempdir");
		std::fs::write(dir.path().join("bundle.yaml"), "bundle:\n  name: test\n")
			.expect("write bundle");
		Self { dir }
	}

	pub fn root(&self) -> String {
		self.dir.path().display().to_string()
	}

	pub fn bundle(&self) -> String {
		self.dir.path().join("bundle.yaml").display().to_string()
	}

	pub fn initialize_line(&self) -> String {
		serde_json::json!({
			"command": "initialize",
			"workspace_root": self.root(),
			"bundle_path": self.bundle(),
		})
		.to_string()
	}
}

pub fn bridge(engine: FakeEngine) -> Bridge<FakeEngine> {
	Bridge::new(engine, BridgeConfig::default())
}

/// Feed `lines` through the loop and return every output line as JSON.
pub async fn drive(bridge: &mut Bridge<FakeEngine>, lines: &[&str]) -> Vec<Value> {
	let mut input = lines.join("\n");
	input.push('\n');
	drive_bytes(bridge, input.as_bytes()).await
}

/// Like [`drive`], but with raw input bytes.
pub async fn drive_bytes(bridge: &mut Bridge<FakeEngine>, input: &[u8]) -> Vec<Value> {
	let mut output = Vec::new();
	run(bridge, input, &mut output)
		.await
		.expect("loop to finish");

	String::from_utf8(output)
		.expect("utf-8 output")
		.lines()
		.map(|line| serde_json::from_str(line).expect("each output line is JSON"))
		.collect()
}
