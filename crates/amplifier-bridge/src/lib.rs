// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Newline-delimited JSON bridge between an editor and one persistent
//! Amplifier session.
//!
//! The editor writes one command object per line on stdin (`initialize`,
//! `execute`, `shutdown`) and reads one response or event object per line on
//! stdout. All real work is delegated to an [`amplifier_bridge_core::Engine`].

pub mod bridge;
pub mod config;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod server;

pub use bridge::{Bridge, BridgeState};
pub use config::{Args, BridgeConfig, LogLevel};
pub use error::{BridgeError, BridgeResult};
pub use protocol::{Event, Request, StatusResponse};
pub use server::run;
