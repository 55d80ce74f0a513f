// Copyright 2026 the Fieldmix Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node image and audio transforms.
//!
//! A [`FrameNode`](crate::frame::FrameNode) carries one of each. The values are
//! *local*: the effective transform of a leaf is the product of every
//! ancestor's transform along the traversal path, computed by the consumer
//! with [`Mul`] as `parent * child`.
//!
//! Fill and clip rectangles are expressed in normalized output space, where
//! `(0, 0)` is the top-left corner and `(1, 1)` the bottom-right.

use core::ops::Mul;

use kurbo::Vec2;

use crate::field::FieldMode;

/// Image-side transform of a frame node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageTransform {
    /// Opacity multiplier (0.0–1.0).
    pub opacity: f64,
    /// Brightness gain multiplier.
    pub gain: f64,
    /// Offset of the fill rectangle.
    pub fill_translation: Vec2,
    /// Size of the fill rectangle.
    pub fill_scale: Vec2,
    /// Offset of the clip rectangle.
    pub clip_translation: Vec2,
    /// Size of the clip rectangle.
    pub clip_scale: Vec2,
    /// Which field, if any, this node contributes to.
    pub field_mode: FieldMode,
    /// Whether the image is used as a key (alpha matte) for its next sibling.
    pub is_key: bool,
}

impl ImageTransform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        opacity: 1.0,
        gain: 1.0,
        fill_translation: Vec2::ZERO,
        fill_scale: Vec2::new(1.0, 1.0),
        clip_translation: Vec2::ZERO,
        clip_scale: Vec2::new(1.0, 1.0),
        field_mode: FieldMode::Progressive,
        is_key: false,
    };

    /// Sets the field mode.
    pub fn set_field_mode(&mut self, mode: FieldMode) {
        self.field_mode = mode;
    }

    /// Returns the field mode.
    #[inline]
    #[must_use]
    pub const fn field_mode(&self) -> FieldMode {
        self.field_mode
    }

    /// Sets the fill rectangle.
    pub fn set_fill(&mut self, translation: Vec2, scale: Vec2) {
        self.fill_translation = translation;
        self.fill_scale = scale;
    }

    /// Sets the clip rectangle.
    pub fn set_clip(&mut self, translation: Vec2, scale: Vec2) {
        self.clip_translation = translation;
        self.clip_scale = scale;
    }

    /// Is every numeric component finite?
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.opacity.is_finite()
            && self.gain.is_finite()
            && self.fill_translation.is_finite()
            && self.fill_scale.is_finite()
            && self.clip_translation.is_finite()
            && self.clip_scale.is_finite()
    }
}

impl Default for ImageTransform {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for ImageTransform {
    type Output = Self;

    /// Composes `self` (parent) with `rhs` (child).
    ///
    /// A non-progressive child field mode overrides the parent's.
    fn mul(self, rhs: Self) -> Self {
        Self {
            opacity: self.opacity * rhs.opacity,
            gain: self.gain * rhs.gain,
            fill_translation: self.fill_translation + scale2(self.fill_scale, rhs.fill_translation),
            fill_scale: scale2(self.fill_scale, rhs.fill_scale),
            clip_translation: self.clip_translation + scale2(self.clip_scale, rhs.clip_translation),
            clip_scale: scale2(self.clip_scale, rhs.clip_scale),
            field_mode: if rhs.field_mode.is_interlaced() {
                rhs.field_mode
            } else {
                self.field_mode
            },
            is_key: self.is_key || rhs.is_key,
        }
    }
}

/// Component-wise product.
#[inline]
fn scale2(a: Vec2, b: Vec2) -> Vec2 {
    Vec2::new(a.x * b.x, a.y * b.y)
}

/// Audio-side transform of a frame node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AudioTransform {
    /// Linear gain multiplier.
    pub gain: f64,
    /// Whether this node contributes audio at all.
    pub has_audio: bool,
}

impl AudioTransform {
    /// The identity transform: unity gain, audio enabled.
    pub const IDENTITY: Self = Self {
        gain: 1.0,
        has_audio: true,
    };

    /// Returns `true` if this node contributes no audible signal.
    #[inline]
    #[must_use]
    pub fn is_silent(&self) -> bool {
        !self.has_audio || self.gain == 0.0
    }
}

impl Default for AudioTransform {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for AudioTransform {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self {
            gain: self.gain * rhs.gain,
            has_audio: self.has_audio && rhs.has_audio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_identity() {
        assert_eq!(ImageTransform::default(), ImageTransform::IDENTITY);
        assert_eq!(AudioTransform::default(), AudioTransform::IDENTITY);
    }

    #[test]
    fn identity_multiply() {
        let mut t = ImageTransform::IDENTITY;
        t.opacity = 0.5;
        t.set_fill(Vec2::new(0.25, 0.0), Vec2::new(0.5, 0.5));
        assert_eq!(ImageTransform::IDENTITY * t, t);
        assert_eq!(t * ImageTransform::IDENTITY, t);
    }

    #[test]
    fn fill_composition_nests_rectangles() {
        // Parent occupies the right half; child occupies the bottom half of that.
        let mut parent = ImageTransform::IDENTITY;
        parent.set_fill(Vec2::new(0.5, 0.0), Vec2::new(0.5, 1.0));
        let mut child = ImageTransform::IDENTITY;
        child.set_fill(Vec2::new(0.0, 0.5), Vec2::new(1.0, 0.5));

        let combined = parent * child;
        assert_eq!(combined.fill_translation, Vec2::new(0.5, 0.5));
        assert_eq!(combined.fill_scale, Vec2::new(0.5, 0.5));
    }

    #[test]
    fn opacity_and_gain_multiply() {
        let mut a = ImageTransform::IDENTITY;
        a.opacity = 0.5;
        a.gain = 2.0;
        let mut b = ImageTransform::IDENTITY;
        b.opacity = 0.5;
        b.gain = 0.25;
        let c = a * b;
        assert_eq!(c.opacity, 0.25);
        assert_eq!(c.gain, 0.5);
    }

    #[test]
    fn interlaced_child_field_mode_wins() {
        let mut parent = ImageTransform::IDENTITY;
        parent.set_field_mode(FieldMode::Upper);
        let progressive_child = ImageTransform::IDENTITY;
        assert_eq!((parent * progressive_child).field_mode(), FieldMode::Upper);

        let mut lower_child = ImageTransform::IDENTITY;
        lower_child.set_field_mode(FieldMode::Lower);
        assert_eq!((parent * lower_child).field_mode(), FieldMode::Lower);
    }

    #[test]
    fn key_flag_is_sticky() {
        let mut key = ImageTransform::IDENTITY;
        key.is_key = true;
        assert!((key * ImageTransform::IDENTITY).is_key);
        assert!((ImageTransform::IDENTITY * key).is_key);
    }

    #[test]
    fn nan_is_not_finite() {
        let mut t = ImageTransform::IDENTITY;
        assert!(t.is_finite());
        t.clip_scale.y = f64::NAN;
        assert!(!t.is_finite());
    }

    #[test]
    fn audio_composition() {
        let half = AudioTransform {
            gain: 0.5,
            has_audio: true,
        };
        let muted = AudioTransform {
            gain: 1.0,
            has_audio: false,
        };
        assert_eq!((half * half).gain, 0.25);
        assert!((half * muted).is_silent());
        assert!(!(half * half).is_silent());
    }
}
