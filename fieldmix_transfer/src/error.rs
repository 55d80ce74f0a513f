// Copyright 2026 the Fieldmix Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transfer buffer errors.

use thiserror::Error;

use crate::usage::BufferUsage;

/// Failures reported by [`TransferBuffer`](crate::TransferBuffer).
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum TransferError {
    /// The device could not create the buffer object. The buffer was never
    /// constructed and there is nothing to retry on.
    #[error("failed to allocate {size}-byte {usage} transfer buffer")]
    Allocation {
        /// Requested size in bytes.
        size: usize,
        /// Requested usage.
        usage: BufferUsage,
    },

    /// The device refused to map the buffer. The buffer stays unmapped and
    /// usable; drop the current frame and try again next cycle.
    #[error("failed to map {usage} transfer buffer of {size} bytes")]
    Mapping {
        /// Buffer size in bytes.
        size: usize,
        /// Buffer usage.
        usage: BufferUsage,
    },
}

impl TransferError {
    /// Returns `true` if the buffer that reported this error can be reused.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Mapping { .. })
    }
}
