// Copyright 2026 the Fieldmix Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Field interlacing of two frames.

use crate::field::FieldMode;

use super::node::{Frame, FrameNode};

impl Frame {
    /// Combines the frames for two successive fields of one video cycle.
    ///
    /// Returns `second` unchanged, without allocating, when both handles are
    /// the same frame or `mode` is [`FieldMode::Progressive`].
    ///
    /// Otherwise each input is wrapped in a new single-child node whose image
    /// transform carries its field, and a node holding the two wrappers is
    /// returned. With [`FieldMode::Upper`], `first` becomes the upper field and
    /// `second` the lower; with [`FieldMode::Lower`] the tags are swapped. The
    /// wrapper around `first` is always the first child: child order follows
    /// input order, not field order, so in `Lower` mode the lower-field wrapper
    /// comes first. Neither input is modified.
    #[must_use]
    pub fn interlace(first: &Self, second: &Self, mode: FieldMode) -> Self {
        if Self::ptr_eq(first, second) || !mode.is_interlaced() {
            return second.clone();
        }

        let mut first_field = FrameNode::from_child(first.clone());
        first_field.image_transform_mut().set_field_mode(mode);

        let mut second_field = FrameNode::from_child(second.clone());
        second_field
            .image_transform_mut()
            .set_field_mode(mode.opposite());

        FrameNode::from_pair(first_field.into_frame(), second_field.into_frame()).into_frame()
    }
}
