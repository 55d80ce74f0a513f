// Copyright 2026 the Fieldmix Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and frame-tree dumps for fieldmix
//! diagnostics.
//!
//! This crate provides [`TraceSink`](fieldmix_transfer::trace::TraceSink)
//! implementations for development and post-mortem analysis, plus a tree
//! inspector:
//!
//! - [`pretty::PrettyPrintSink`] — human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`] — compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`tree::dump`] — a JSON snapshot of a frame tree.

pub mod pretty;
pub mod recorder;
pub mod tree;
