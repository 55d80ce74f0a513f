// Copyright 2026 the Fieldmix Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable composite frame tree for real-time compositing.
//!
//! `fieldmix_core` describes, per output frame, how any number of source
//! images and audio streams are combined before rendering and mixing. It is
//! `no_std` compatible (with `alloc`). Nodes are reference-shared and never
//! change shape after construction, so one subtree can appear in many parent
//! trees and be walked by several consumers at once.
//!
//! # Architecture
//!
//! ```text
//!   producers (decoders, generators)
//!       │  FrameNode::leaf(SourceId)
//!       ▼
//!   Frame ──► FrameNode::from_pair / from_children ──► Frame (root)
//!                                                         │
//!                 Frame::interlace(a, b, FieldMode) ◄─────┤
//!                                                         ▼
//!   Frame::accept(&mut visitor) ──► enter / leave ──► image mixer, audio mixer
//! ```
//!
//! **[`frame`]** — [`FrameNode`](frame::FrameNode) data, the shared
//! [`Frame`](frame::Frame) handle with identity equality, the
//! [`FrameVisitor`](frame::FrameVisitor) traversal protocol, and field
//! interlacing.
//!
//! **[`transform`]** — Per-node image and audio transforms. Accumulating them
//! along a traversal is the consumer's job; [`Mul`](core::ops::Mul) gives the
//! standard parent-times-child composition.
//!
//! **[`field`]** — [`FieldMode`](field::FieldMode): progressive, upper, or
//! lower field.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

pub mod field;
pub mod frame;
pub mod transform;
