// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request loop.
//!
//! Reads one line at a time, dispatches it to the [`Bridge`], and writes every
//! reply as its own flushed line before reading the next request. A bad line
//! or a panicking handler produces an error event; only `shutdown` or end of
//! input stops the loop.

use std::panic::AssertUnwindSafe;
use std::time::Instant;

use amplifier_bridge_core::Engine;
use futures::{FutureExt, StreamExt};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::bridge::Bridge;
use crate::error::{panic_message, BridgeError, BridgeResult};
use crate::protocol::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
	Continue,
	Exit,
}

/// Writes one JSON object per line, flushing after each.
struct LineWriter<W> {
	inner: W,
}

impl<W: AsyncWrite + Unpin> LineWriter<W> {
	async fn send<T: Serialize>(&mut self, message: &T) -> BridgeResult<()> {
		let mut line = serde_json::to_vec(message).map_err(BridgeError::Serialize)?;
		line.push(b'\n');
		self.inner.write_all(&line).await?;
		self.inner.flush().await?;
		Ok(())
	}
}

/// Serve requests from `reader` until `shutdown` or end of input.
///
/// Returns an error only when the transport itself fails.
pub async fn run<E, R, W>(bridge: &mut Bridge<E>, mut reader: R, writer: W) -> BridgeResult<()>
where
	E: Engine,
	R: AsyncBufRead + Unpin,
	W: AsyncWrite + Unpin,
{
	let mut out = LineWriter { inner: writer };
	let mut buf = Vec::new();

	loop {
		buf.clear();
		if reader.read_until(b'\n', &mut buf).await? == 0 {
			info!("end of input");
			break;
		}

		let request = match decode_line(std::mem::take(&mut buf)) {
			Ok(r) => r,
			Err(e) => {
				warn!(error = %e, "rejecting input line");
				out.send(&Event::error(e)).await?;
				continue;
			}
		};

		let is_execute = request.command.as_deref() == Some(COMMAND_EXECUTE);
		let flow = match AssertUnwindSafe(dispatch(bridge, request, &mut out))
			.catch_unwind()
			.await
		{
			Ok(flow) => flow?,
			Err(panic) => {
				let message = panic_message(panic.as_ref());
				error!(%message, "request handler panicked");
				out.send(&Event::error(message)).await?;
				if is_execute {
					out.send(&Event::Done).await?;
				}
				Flow::Continue
			}
		};

		if flow == Flow::Exit {
			break;
		}
	}

	Ok(())
}

async fn dispatch<E, W>(
	bridge: &mut Bridge<E>,
	request: Request,
	out: &mut LineWriter<W>,
) -> BridgeResult<Flow>
where
	E: Engine,
	W: AsyncWrite + Unpin,
{
	let Some(command) = request.command else {
		out.send(&Event::error(BridgeError::MissingCommand)).await?;
		return Ok(Flow::Continue);
	};

	let start = Instant::now();
	debug!(%command, "[dispatch] →");

	let flow = match command.as_str() {
		COMMAND_INITIALIZE => {
			let workspace_root = request.workspace_root.unwrap_or_default();
			let response = bridge
				.initialize(&workspace_root, request.bundle_path.as_deref())
				.await;
			out.send(&response).await?;
			Flow::Continue
		}
		COMMAND_EXECUTE => {
			let prompt = request.prompt.unwrap_or_default();
			let mut events = bridge.execute_prompt(&prompt);
			while let Some(event) = events.next().await {
				out.send(&event).await?;
			}
			drop(events);
			out.send(&Event::Done).await?;
			Flow::Continue
		}
		COMMAND_SHUTDOWN => {
			let response = bridge.shutdown().await;
			out.send(&response).await?;
			Flow::Exit
		}
		other => {
			warn!(command = other, "[dispatch] unknown command");
			out.send(&Event::error(BridgeError::UnknownCommand(other.to_string())))
				.await?;
			Flow::Continue
		}
	};

	debug!(%command, elapsed = ?start.elapsed(), "[dispatch] ←");
	Ok(flow)
}

/// Lines must be UTF-8; anything else is reported like malformed JSON.
fn decode_line(bytes: Vec<u8>) -> BridgeResult<Request> {
	let line = String::from_utf8(bytes).map_err(BridgeError::InvalidUtf8)?;
	Request::parse(line.trim())
}
