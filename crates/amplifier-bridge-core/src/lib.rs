// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session engine abstractions for the Amplifier bridge.
//!
//! The bridge never parses bundles or answers prompts itself. Everything
//! behind a session lives behind the [`Engine`] and [`Session`] traits:
//! - [`Engine`] turns a bundle path into a live session in three steps
//!   (load, prepare, create)
//! - [`Session`] executes prompts against one persistent conversation
//! - [`ProcessEngine`] is the production adapter that drives an external
//!   engine host over newline-delimited JSON

pub mod engine;
pub mod error;
pub mod process;

pub use engine::{Engine, Session};
pub use error::{EngineError, EngineResult};
pub use process::{EngineCommand, ProcessEngine, ProcessSession, DEFAULT_ENGINE_COMMAND};
