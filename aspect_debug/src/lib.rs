// Copyright 2026 the Aspect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for aspect
//! diagnostics.
//!
//! This crate provides [`TraceSink`](aspect_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from recorded
//!   bytes.
//!
//! Core events carry no timestamps; sinks stamp them on arrival with a
//! [`clock::Clock`].

pub mod chrome;
pub mod clock;
pub mod pretty;
pub mod recorder;
