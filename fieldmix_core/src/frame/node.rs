// Copyright 2026 the Fieldmix Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame node data and the shared [`Frame`] handle.

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::hash::{Hash, Hasher};
use core::ops::Deref;

use crate::transform::{AudioTransform, ImageTransform};

use super::id::SourceId;

/// One node of a composite frame tree.
///
/// Build a node, adjust its own transforms and layer index, then publish it
/// with [`Frame::new`] (or `.into()`). `Clone` is a shallow structural copy:
/// the new node shares every child with the original.
#[derive(Clone, Debug, Default)]
pub struct FrameNode {
    children: Vec<Frame>,
    image_transform: ImageTransform,
    audio_transform: AudioTransform,
    layer_index: Option<i32>,
    source: Option<SourceId>,
}

impl FrameNode {
    /// Creates an empty node with identity transforms.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a leaf node presenting `source`.
    #[must_use]
    pub fn leaf(source: SourceId) -> Self {
        Self {
            source: Some(source),
            ..Self::default()
        }
    }

    /// Creates a node that takes ownership of `children`.
    #[must_use]
    pub fn from_children(children: Vec<Frame>) -> Self {
        Self {
            children,
            ..Self::default()
        }
    }

    /// Creates a node whose children are copies of the handles in `children`.
    #[must_use]
    pub fn from_slice(children: &[Frame]) -> Self {
        Self::from_children(children.to_vec())
    }

    /// Creates a node wrapping a single child.
    #[must_use]
    pub fn from_child(child: Frame) -> Self {
        Self::from_children(vec![child])
    }

    /// Creates a node composing two children, `first` below `second`.
    #[must_use]
    pub fn from_pair(first: Frame, second: Frame) -> Self {
        Self::from_children(vec![first, second])
    }

    /// Returns the children in composition order.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[Frame] {
        &self.children
    }

    /// Returns `true` if the node has no children.
    #[inline]
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns the source presented by this node, if it is a source leaf.
    #[inline]
    #[must_use]
    pub fn source(&self) -> Option<SourceId> {
        self.source
    }

    /// Returns the node's own image transform.
    #[inline]
    #[must_use]
    pub fn image_transform(&self) -> &ImageTransform {
        &self.image_transform
    }

    /// Returns the node's own image transform for modification.
    #[inline]
    pub fn image_transform_mut(&mut self) -> &mut ImageTransform {
        &mut self.image_transform
    }

    /// Returns the node's own audio transform.
    #[inline]
    #[must_use]
    pub fn audio_transform(&self) -> &AudioTransform {
        &self.audio_transform
    }

    /// Returns the node's own audio transform for modification.
    #[inline]
    pub fn audio_transform_mut(&mut self) -> &mut AudioTransform {
        &mut self.audio_transform
    }

    /// Tags the node with the layer it originates from.
    pub fn set_layer_index(&mut self, index: i32) {
        self.layer_index = Some(index);
    }

    /// Removes the layer tag.
    pub fn clear_layer_index(&mut self) {
        self.layer_index = None;
    }

    /// Returns the layer tag, or `None` if the node is not attached to a layer.
    #[inline]
    #[must_use]
    pub fn layer_index(&self) -> Option<i32> {
        self.layer_index
    }

    /// Publishes the node as a shared [`Frame`].
    #[inline]
    #[must_use]
    pub fn into_frame(self) -> Frame {
        Frame::new(self)
    }
}

impl From<Vec<Frame>> for FrameNode {
    fn from(children: Vec<Frame>) -> Self {
        Self::from_children(children)
    }
}

impl FromIterator<Frame> for FrameNode {
    fn from_iter<I: IntoIterator<Item = Frame>>(iter: I) -> Self {
        Self::from_children(iter.into_iter().collect())
    }
}

/// A shared, immutable handle to a [`FrameNode`].
///
/// Cloning the handle is cheap and shares the node. Equality and hashing are
/// by identity: two handles are equal only if they point at the same node,
/// even when two distinct nodes have equal contents.
#[derive(Clone, Debug)]
pub struct Frame(Arc<FrameNode>);

impl Frame {
    /// Publishes `node` behind a new handle.
    #[inline]
    #[must_use]
    pub fn new(node: FrameNode) -> Self {
        Self(Arc::new(node))
    }

    /// Creates a new empty frame.
    ///
    /// Each call allocates a distinct node, so two empty frames are never
    /// equal to each other.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(FrameNode::new())
    }

    /// Returns `true` if both handles point at the same node.
    #[inline]
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Returns the node for modification of its own fields.
    ///
    /// If any other handle shares the node, this handle is first repointed at
    /// a shallow copy, leaving the other holders untouched. Children are
    /// shared either way.
    pub fn make_mut(&mut self) -> &mut FrameNode {
        Arc::make_mut(&mut self.0)
    }
}

impl Deref for Frame {
    type Target = FrameNode;

    #[inline]
    fn deref(&self) -> &FrameNode {
        &self.0
    }
}

impl AsRef<FrameNode> for Frame {
    #[inline]
    fn as_ref(&self) -> &FrameNode {
        &self.0
    }
}

impl From<FrameNode> for Frame {
    #[inline]
    fn from(node: FrameNode) -> Self {
        Self::new(node)
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for Frame {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

impl Eq for Frame {}

impl Hash for Frame {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}
