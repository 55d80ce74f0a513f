// Copyright 2026 the Fieldmix Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Source identity type.

use core::fmt;

/// An opaque reference to the external source a leaf frame renders.
///
/// Sources (decoded video frames, generated images, audio blocks) are created
/// and managed outside the tree. Core code passes them through without
/// interpreting the value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(pub u64);

impl fmt::Debug for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceId({})", self.0)
    }
}
