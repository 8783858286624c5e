// Copyright 2026 the Aspect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Breakpoint resolution and coordinated resize fan-out for responsive
//! aspect ratios.
//!
//! `aspect_core` picks one value out of a set of width-keyed candidates for
//! the current viewport, and re-runs that choice across many registered
//! containers whenever the viewport is resized. It is `no_std` compatible
//! (with `alloc`) and knows nothing about the DOM: hosts plug in through the
//! [`ViewportSource`](viewport::ViewportSource) and
//! [`RatioHost`](ratio::RatioHost) traits.
//!
//! # Architecture
//!
//! ```text
//!   Backend (resize signal)
//!       │
//!       ▼
//!   ViewportSource ──► ViewportMetrics::capture() ──► ResizeCoordinator::dispatch()
//!                                                          │   (one snapshot, one Tick)
//!                 ┌────────────────────────────────────────┘
//!                 ▼
//!   per-element callback ──► resolve(dataset, query) ──► RatioLayer::apply_ratio()
//!                                                          │
//!                                                          ▼
//!                                   RatioHost::set_padding_bottom() / uniform broadcast
//! ```
//!
//! **[`viewport`]** — Host metric readings with fallback chains, composed into
//! an immutable [`ViewportMetrics`](viewport::ViewportMetrics) snapshot.
//!
//! **[`dataset`]** — [`BreakpointDataset`](dataset::BreakpointDataset), an
//! ordered width → value map, with JSON parsing that degrades to empty.
//!
//! **[`resolve`]** — The mobile-first / desktop-first breakpoint resolver.
//!
//! **[`coordinator`]** — [`ResizeCoordinator`](coordinator::ResizeCoordinator),
//! the registry that turns one resize signal into one tick delivered to every
//! registered callback.
//!
//! **[`debounce`]** — Timer-fallback coalescing for hosts without native
//! resize observation.
//!
//! **[`ratio`]** — The ratio application layer: element side table, padding
//! writes, and one-shot uniform broadcasts to a group.
//! [`ratio_callback`](ratio::ratio_callback) wires a layer into a coordinator.
//!
//! **[`runtime`]** — [`RatioRuntime`](runtime::RatioRuntime), one coordinator,
//! layer and host behind a viewport: change filtering, detached-element
//! pruning, and tick reports for backends.
//!
//! **[`element`]** — Generational element handles and group identifiers.
//!
//! **[`time`]** — Monotonic host time used by the debouncer.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types, with
//! a zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod coordinator;
pub mod dataset;
pub mod debounce;
pub mod element;
pub mod ratio;
pub mod resolve;
pub mod runtime;
pub mod time;
pub mod trace;
pub mod viewport;
