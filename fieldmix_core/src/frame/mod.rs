// Copyright 2026 the Fieldmix Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composite frame tree.
//!
//! A *frame* is a node in an immutable composition tree. Each node has:
//!
//! - Ordered children, shared by reference. An empty node with a
//!   [`SourceId`] is a leaf that presents that source; an empty node without
//!   one is the identity frame.
//! - **Local properties**: an [`ImageTransform`](crate::transform::ImageTransform),
//!   an [`AudioTransform`](crate::transform::AudioTransform), and an optional
//!   layer index naming the layer the frame came from.
//!
//! Nodes are handed around as [`Frame`] handles. Cloning a handle shares the
//! node; comparing two handles compares identity, never contents. Cloning a
//! [`FrameNode`] makes a shallow copy: a new node with the same child handles.
//!
//! # Traversal
//!
//! [`Frame::accept`] drives a [`FrameVisitor`] depth-first: `enter` for the
//! node, each child in order, then `leave`. Calls are strictly nested, so a
//! visitor accumulates transforms by pushing on `enter` and popping on
//! `leave`.
//!
//! # Sharing
//!
//! A node is only ever mutated through `&mut FrameNode` before it is wrapped
//! in a [`Frame`], or through [`Frame::make_mut`], which copies the node first
//! when any other handle exists. Children are never reached by either path.

mod id;
mod interlace;
mod node;
mod visit;

pub use id::SourceId;
pub use node::{Frame, FrameNode};
pub use visit::FrameVisitor;
