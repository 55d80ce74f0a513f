// Copyright 2026 the Fieldmix Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Video field modes.

use core::fmt;

/// How a frame is split into fields for one video cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FieldMode {
    /// Whole frames; no field splitting.
    #[default]
    Progressive,
    /// Upper (top) field first.
    Upper,
    /// Lower (bottom) field first.
    Lower,
}

impl FieldMode {
    /// Returns `true` for [`Upper`](Self::Upper) and [`Lower`](Self::Lower).
    #[inline]
    #[must_use]
    pub const fn is_interlaced(self) -> bool {
        !matches!(self, Self::Progressive)
    }

    /// Returns the opposite field. `Progressive` maps to itself.
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Progressive => Self::Progressive,
            Self::Upper => Self::Lower,
            Self::Lower => Self::Upper,
        }
    }

    /// Returns a short lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Progressive => "progressive",
            Self::Upper => "upper",
            Self::Lower => "lower",
        }
    }
}

impl fmt::Display for FieldMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
