// Copyright 2026 the Fieldmix Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composite plan: the source leaves of one frame tree, flattened.

use alloc::vec::Vec;

use fieldmix_core::field::FieldMode;
use fieldmix_core::frame::{Frame, FrameVisitor, SourceId};
use fieldmix_core::transform::{AudioTransform, ImageTransform};

/// A single source leaf in the composite plan.
///
/// Items are produced in back-to-front order, matching the frame tree's
/// traversal order.
#[derive(Clone, Debug)]
pub struct CompositeItem {
    /// The leaf frame this item originates from.
    pub frame: Frame,
    /// The source the leaf presents.
    pub source: SourceId,
    /// Product of every ancestor's image transform and the leaf's own.
    pub image_transform: ImageTransform,
    /// Product of every ancestor's audio transform and the leaf's own.
    pub audio_transform: AudioTransform,
    /// Layer index of the nearest tagged ancestor-or-self.
    pub layer_index: Option<i32>,
    /// Distance from the root (the root is depth 0).
    pub depth: usize,
}

impl CompositeItem {
    /// Returns `true` if the item is drawn in the given field.
    ///
    /// Progressive items are drawn in every field; field-tagged items only in
    /// their own.
    #[must_use]
    pub fn in_field(&self, field: FieldMode) -> bool {
        match self.image_transform.field_mode() {
            FieldMode::Progressive => true,
            mode => mode == field,
        }
    }
}

/// An ordered list of source leaves for a single output frame.
///
/// Image mixers draw the items in order; audio mixers sum the audible ones.
/// Empty nodes without a source contribute nothing and produce no item.
#[derive(Clone, Debug, Default)]
pub struct CompositePlan {
    /// Items in back-to-front order.
    pub items: Vec<CompositeItem>,
}

impl CompositePlan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattens `root` into a new plan.
    #[must_use]
    pub fn build(root: &Frame) -> Self {
        let mut plan = Self::new();
        plan.rebuild(root);
        plan
    }

    /// Clears the plan and flattens `root` into it, reusing the allocation.
    pub fn rebuild(&mut self, root: &Frame) {
        self.items.clear();
        let mut builder = PlanBuilder {
            stack: Vec::new(),
            items: &mut self.items,
        };
        root.accept(&mut builder);
        debug_assert!(builder.stack.is_empty(), "unbalanced traversal");
    }

    /// Clears the plan for reuse.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Returns the items drawn in `field`.
    pub fn field_items(&self, field: FieldMode) -> impl Iterator<Item = &CompositeItem> + '_ {
        self.items.iter().filter(move |item| item.in_field(field))
    }

    /// Returns the items that contribute audio.
    pub fn audible_items(&self) -> impl Iterator<Item = &CompositeItem> + '_ {
        self.items
            .iter()
            .filter(|item| !item.audio_transform.is_silent())
    }
}

/// Accumulated state at one level of the traversal.
#[derive(Clone, Copy)]
struct Level {
    image: ImageTransform,
    audio: AudioTransform,
    layer_index: Option<i32>,
}

/// Visitor that pushes accumulated transforms on enter and pops on leave.
struct PlanBuilder<'a> {
    stack: Vec<Level>,
    items: &'a mut Vec<CompositeItem>,
}

impl FrameVisitor for PlanBuilder<'_> {
    fn enter(&mut self, frame: &Frame) {
        let level = match self.stack.last() {
            Some(parent) => Level {
                image: parent.image * *frame.image_transform(),
                audio: parent.audio * *frame.audio_transform(),
                layer_index: frame.layer_index().or(parent.layer_index),
            },
            None => Level {
                image: *frame.image_transform(),
                audio: *frame.audio_transform(),
                layer_index: frame.layer_index(),
            },
        };

        if let (true, Some(source)) = (frame.is_leaf(), frame.source()) {
            self.items.push(CompositeItem {
                frame: frame.clone(),
                source,
                image_transform: level.image,
                audio_transform: level.audio,
                layer_index: level.layer_index,
                depth: self.stack.len(),
            });
        }

        self.stack.push(level);
    }

    fn leave(&mut self) {
        self.stack.pop();
    }
}
