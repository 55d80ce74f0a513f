// Copyright 2026 the Fieldmix Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes transfer events into
//! a `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! A mapping's range is stored as its epoch and length; the buffer is shared
//! with the enclosing event.

use fieldmix_transfer::trace::{
    BufferAllocatedEvent, BufferMappedEvent, BufferReleasedEvent, BufferUnmappedEvent,
    FailureKind, TraceSink, TransferFailureEvent,
};
use fieldmix_transfer::{BufferObject, BufferUsage, MappedRange};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_ALLOCATED: u8 = 1;
const TAG_RELEASED: u8 = 2;
const TAG_MAPPED: u8 = 3;
const TAG_UNMAPPED: u8 = 4;
const TAG_FAILURE: u8 = 5;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_size(&mut self, v: usize) {
        self.write_u64(v as u64);
    }

    fn write_buffer(&mut self, b: BufferObject) {
        self.write_u32(b.index());
        self.write_u32(b.generation());
    }

    fn write_usage(&mut self, u: BufferUsage) {
        self.write_u8(match u {
            BufferUsage::WriteOnly => 0,
            BufferUsage::ReadOnly => 1,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_buffer_allocated(&mut self, e: &BufferAllocatedEvent) {
        self.write_u8(TAG_ALLOCATED);
        self.write_buffer(e.buffer);
        self.write_usage(e.usage);
        self.write_size(e.size);
    }

    fn on_buffer_released(&mut self, e: &BufferReleasedEvent) {
        self.write_u8(TAG_RELEASED);
        self.write_buffer(e.buffer);
        self.write_usage(e.usage);
        self.write_size(e.size);
    }

    fn on_buffer_mapped(&mut self, e: &BufferMappedEvent) {
        self.write_u8(TAG_MAPPED);
        self.write_buffer(e.buffer);
        self.write_usage(e.usage);
        self.write_u64(e.range.epoch());
        self.write_size(e.range.len());
        self.write_u8(u8::from(e.orphaned));
    }

    fn on_buffer_unmapped(&mut self, e: &BufferUnmappedEvent) {
        self.write_u8(TAG_UNMAPPED);
        self.write_buffer(e.buffer);
        self.write_usage(e.usage);
        self.write_u8(u8::from(e.orphaned));
    }

    fn on_transfer_failure(&mut self, e: &TransferFailureEvent) {
        self.write_u8(TAG_FAILURE);
        self.write_u8(match e.kind {
            FailureKind::Allocation => 0,
            FailureKind::Mapping => 1,
        });
        self.write_usage(e.usage);
        self.write_size(e.size);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`BufferAllocatedEvent`].
    Allocated(BufferAllocatedEvent),
    /// A [`BufferReleasedEvent`].
    Released(BufferReleasedEvent),
    /// A [`BufferMappedEvent`].
    Mapped(BufferMappedEvent),
    /// A [`BufferUnmappedEvent`].
    Unmapped(BufferUnmappedEvent),
    /// A [`TransferFailureEvent`].
    Failure(TransferFailureEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first unknown tag or truncated record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let end = self.pos.checked_add(N)?;
        let bytes = self.data.get(self.pos..end)?.try_into().ok()?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[v]| v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_size(&mut self) -> Option<usize> {
        usize::try_from(self.read_u64()?).ok()
    }

    fn read_bool(&mut self) -> Option<bool> {
        Some(self.read_u8()? != 0)
    }

    fn read_buffer(&mut self) -> Option<BufferObject> {
        let index = self.read_u32()?;
        let generation = self.read_u32()?;
        Some(BufferObject::new(index, generation))
    }

    fn read_usage(&mut self) -> Option<BufferUsage> {
        match self.read_u8()? {
            0 => Some(BufferUsage::WriteOnly),
            1 => Some(BufferUsage::ReadOnly),
            _ => None,
        }
    }

    fn decode_allocated(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Allocated(BufferAllocatedEvent {
            buffer: self.read_buffer()?,
            usage: self.read_usage()?,
            size: self.read_size()?,
        }))
    }

    fn decode_released(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Released(BufferReleasedEvent {
            buffer: self.read_buffer()?,
            usage: self.read_usage()?,
            size: self.read_size()?,
        }))
    }

    fn decode_mapped(&mut self) -> Option<RecordedEvent> {
        let buffer = self.read_buffer()?;
        let usage = self.read_usage()?;
        let epoch = self.read_u64()?;
        let len = self.read_size()?;
        Some(RecordedEvent::Mapped(BufferMappedEvent {
            buffer,
            usage,
            range: MappedRange::new(buffer, epoch, len),
            orphaned: self.read_bool()?,
        }))
    }

    fn decode_unmapped(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Unmapped(BufferUnmappedEvent {
            buffer: self.read_buffer()?,
            usage: self.read_usage()?,
            orphaned: self.read_bool()?,
        }))
    }

    fn decode_failure(&mut self) -> Option<RecordedEvent> {
        let kind = match self.read_u8()? {
            0 => FailureKind::Allocation,
            1 => FailureKind::Mapping,
            _ => return None,
        };
        Some(RecordedEvent::Failure(TransferFailureEvent {
            kind,
            usage: self.read_usage()?,
            size: self.read_size()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_ALLOCATED => self.decode_allocated(),
            TAG_RELEASED => self.decode_released(),
            TAG_MAPPED => self.decode_mapped(),
            TAG_UNMAPPED => self.decode_unmapped(),
            TAG_FAILURE => self.decode_failure(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
