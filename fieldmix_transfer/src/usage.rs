// Copyright 2026 the Fieldmix Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transfer direction types.

use core::fmt;

/// Direction a transfer buffer is used in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Host writes, device reads (upload).
    WriteOnly,
    /// Device writes, host reads (download).
    ReadOnly,
}

impl BufferUsage {
    /// Returns the device binding point used for this direction.
    #[inline]
    #[must_use]
    pub const fn target(self) -> TransferTarget {
        match self {
            Self::WriteOnly => TransferTarget::Unpack,
            Self::ReadOnly => TransferTarget::Pack,
        }
    }

    /// Returns the host access requested when mapping.
    #[inline]
    #[must_use]
    pub const fn access(self) -> MapAccess {
        match self {
            Self::WriteOnly => MapAccess::WriteOnly,
            Self::ReadOnly => MapAccess::ReadOnly,
        }
    }

    /// Returns a short name, e.g. for log lines.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WriteOnly => "write_only",
            Self::ReadOnly => "read_only",
        }
    }
}

impl fmt::Display for BufferUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device binding point for streaming pixel transfers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransferTarget {
    /// Source of host-to-device copies (e.g. texture uploads).
    Unpack,
    /// Destination of device-to-host copies (e.g. framebuffer readback).
    Pack,
}

impl TransferTarget {
    /// Array index for per-target tables.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Unpack => 0,
            Self::Pack => 1,
        }
    }
}

/// Host access granted by a mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MapAccess {
    /// The host may only write the mapped bytes.
    WriteOnly,
    /// The host may only read the mapped bytes.
    ReadOnly,
}
