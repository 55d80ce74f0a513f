// Copyright 2026 the Fieldmix Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Instrumentation for transfer buffer lifecycles.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! [`TransferBuffer`](crate::TransferBuffer) calls as buffers are allocated,
//! mapped, unmapped and released. All method bodies default to no-ops, so
//! implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! [`AllocationCounter`] is a ready-made sink keeping per-usage allocation
//! totals, so allocation churn can be observed without global state.
//!
//! # Crate features
//!
//! - `trace` — enables the `Tracer` method bodies (one branch per call).

use crate::device::{BufferObject, MappedRange};
use crate::usage::BufferUsage;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted after a buffer object was created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferAllocatedEvent {
    /// The new device object.
    pub buffer: BufferObject,
    /// Transfer direction.
    pub usage: BufferUsage,
    /// Size in bytes.
    pub size: usize,
}

/// Emitted after a buffer object was deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferReleasedEvent {
    /// The deleted device object.
    pub buffer: BufferObject,
    /// Transfer direction.
    pub usage: BufferUsage,
    /// Size in bytes.
    pub size: usize,
}

/// Emitted when a buffer becomes host-visible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferMappedEvent {
    /// The mapped device object.
    pub buffer: BufferObject,
    /// Transfer direction.
    pub usage: BufferUsage,
    /// The new mapping.
    pub range: MappedRange,
    /// Whether storage was orphaned before mapping.
    pub orphaned: bool,
}

/// Emitted when a buffer's mapping is released.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferUnmappedEvent {
    /// The unmapped device object.
    pub buffer: BufferObject,
    /// Transfer direction.
    pub usage: BufferUsage,
    /// Whether storage was orphaned after unmapping.
    pub orphaned: bool,
}

/// Which device request failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Buffer object creation.
    Allocation,
    /// Host mapping.
    Mapping,
}

/// Emitted when the device refuses a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferFailureEvent {
    /// Which request failed.
    pub kind: FailureKind,
    /// Transfer direction.
    pub usage: BufferUsage,
    /// Size in bytes.
    pub size: usize,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives transfer buffer events.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called after a buffer object is created.
    fn on_buffer_allocated(&mut self, e: &BufferAllocatedEvent) {
        _ = e;
    }

    /// Called after a buffer object is deleted.
    fn on_buffer_released(&mut self, e: &BufferReleasedEvent) {
        _ = e;
    }

    /// Called after a buffer is mapped.
    fn on_buffer_mapped(&mut self, e: &BufferMappedEvent) {
        _ = e;
    }

    /// Called after a buffer is unmapped.
    fn on_buffer_unmapped(&mut self, e: &BufferUnmappedEvent) {
        _ = e;
    }

    /// Called when allocation or mapping fails.
    fn on_transfer_failure(&mut self, e: &TransferFailureEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// AllocationCounter
// ---------------------------------------------------------------------------

/// Per-usage running totals of buffer allocations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocationCounter {
    allocated: [u64; 2],
    released: [u64; 2],
    bytes_live: [usize; 2],
    failures: u64,
}

impl AllocationCounter {
    /// Creates a counter with all totals at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total buffers ever allocated with `usage`.
    #[must_use]
    pub fn allocated(&self, usage: BufferUsage) -> u64 {
        self.allocated[usage_index(usage)]
    }

    /// Total buffers released with `usage`.
    #[must_use]
    pub fn released(&self, usage: BufferUsage) -> u64 {
        self.released[usage_index(usage)]
    }

    /// Buffers with `usage` currently alive.
    #[must_use]
    pub fn live(&self, usage: BufferUsage) -> u64 {
        self.allocated(usage).saturating_sub(self.released(usage))
    }

    /// Bytes held by live buffers with `usage`.
    #[must_use]
    pub fn live_bytes(&self, usage: BufferUsage) -> usize {
        self.bytes_live[usage_index(usage)]
    }

    /// Allocation and mapping failures seen.
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.failures
    }
}

impl TraceSink for AllocationCounter {
    fn on_buffer_allocated(&mut self, e: &BufferAllocatedEvent) {
        let i = usage_index(e.usage);
        self.allocated[i] += 1;
        self.bytes_live[i] = self.bytes_live[i].saturating_add(e.size);
    }

    fn on_buffer_released(&mut self, e: &BufferReleasedEvent) {
        let i = usage_index(e.usage);
        self.released[i] += 1;
        self.bytes_live[i] = self.bytes_live[i].saturating_sub(e.size);
    }

    fn on_transfer_failure(&mut self, _e: &TransferFailureEvent) {
        self.failures += 1;
    }
}

const fn usage_index(usage: BufferUsage) -> usize {
    match usage {
        BufferUsage::WriteOnly => 0,
        BufferUsage::ReadOnly => 1,
    }
}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`BufferAllocatedEvent`].
    #[inline]
    pub fn buffer_allocated(&mut self, e: &BufferAllocatedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_buffer_allocated(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`BufferReleasedEvent`].
    #[inline]
    pub fn buffer_released(&mut self, e: &BufferReleasedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_buffer_released(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`BufferMappedEvent`].
    #[inline]
    pub fn buffer_mapped(&mut self, e: &BufferMappedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_buffer_mapped(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`BufferUnmappedEvent`].
    #[inline]
    pub fn buffer_unmapped(&mut self, e: &BufferUnmappedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_buffer_unmapped(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`TransferFailureEvent`].
    #[inline]
    pub fn transfer_failure(&mut self, e: &TransferFailureEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_transfer_failure(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
