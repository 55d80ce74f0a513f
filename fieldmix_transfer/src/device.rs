// Copyright 2026 the Fieldmix Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Device contract for transfer buffers.
//!
//! A graphics backend implements [`TransferDevice`] once for its context
//! (OpenGL pixel buffer objects, a Vulkan staging allocator, or the in-memory
//! [`HostDevice`](crate::HostDevice)). [`TransferBuffer`](crate::TransferBuffer)
//! drives it in a fixed order:
//!
//! ```text
//!   new:     create_buffer, bind, [buffer_storage if ReadOnly], unbind
//!   map:     bind, [buffer_storage if WriteOnly], map_buffer, unbind
//!   unmap:   bind, unmap_buffer, [buffer_storage if ReadOnly], unbind
//!   destroy: [unmap], delete_buffer
//!   drop:    post the object to the device's ReleaseQueue
//! ```
//!
//! Device calls are issued from a single thread in program order. The
//! device is free to run transfers asynchronously as long as a
//! `buffer_storage` call lets the host continue without waiting for work
//! still in flight on the previous storage.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use crate::usage::{BufferUsage, MapAccess, TransferTarget};

/// A handle to a buffer object owned by a [`TransferDevice`].
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after the object is deleted and the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferObject {
    idx: u32,
    generation: u32,
}

impl BufferObject {
    /// Creates a handle. Called by device implementations.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self {
            idx: index,
            generation,
        }
    }

    /// Returns the raw slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for BufferObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BufferObject({}@gen{})", self.idx, self.generation)
    }
}

/// Opaque handle to a live host-visible mapping.
///
/// Stands in for the raw mapped pointer: two ranges compare equal exactly when
/// they denote the same mapping of the same storage. The bytes are reached
/// through [`TransferDevice::mapped_bytes`] and
/// [`TransferDevice::mapped_bytes_mut`], which refuse ranges that are no
/// longer mapped.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MappedRange {
    buffer: BufferObject,
    epoch: u64,
    len: usize,
}

impl MappedRange {
    /// Creates a range handle. Called by device implementations.
    ///
    /// `epoch` identifies the storage that was mapped; it must change every
    /// time the buffer's storage is reallocated.
    #[inline]
    #[must_use]
    pub const fn new(buffer: BufferObject, epoch: u64, len: usize) -> Self {
        Self { buffer, epoch, len }
    }

    /// Returns the buffer object the mapping belongs to.
    #[inline]
    #[must_use]
    pub const fn buffer(self) -> BufferObject {
        self.buffer
    }

    /// Returns the storage epoch.
    #[inline]
    #[must_use]
    pub const fn epoch(self) -> u64 {
        self.epoch
    }

    /// Returns the mapped length in bytes.
    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        self.len
    }

    /// Returns `true` for a zero-length mapping.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for MappedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MappedRange({:?} epoch={} len={})",
            self.buffer, self.epoch, self.len
        )
    }
}

/// Objects whose [`TransferBuffer`](crate::TransferBuffer) was dropped without
/// [`destroy`](crate::TransferBuffer::destroy).
///
/// A device that supports deferred release hands a clone of its queue to each
/// buffer through [`TransferDevice::release_queue`], and deletes the queued
/// objects on its own schedule, usually at the start of its next call. Device
/// objects belong to the thread that owns the context, so the queue is not
/// shared across threads.
#[derive(Clone, Debug, Default)]
pub struct ReleaseQueue(Rc<RefCell<Vec<BufferObject>>>);

impl ReleaseQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `buffer` for deletion.
    pub fn push(&self, buffer: BufferObject) {
        self.0.borrow_mut().push(buffer);
    }

    /// Removes and returns every queued object, oldest first.
    #[must_use]
    pub fn take(&self) -> Vec<BufferObject> {
        core::mem::take(&mut *self.0.borrow_mut())
    }

    /// Returns the number of queued objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

/// Buffer-object operations a graphics context must provide.
///
/// Methods that take a [`TransferTarget`] act on whatever buffer object is
/// currently bound to it, mirroring bind-to-edit graphics APIs.
pub trait TransferDevice {
    /// Creates a buffer object without storage. Returns `None` if the device
    /// cannot create one.
    fn create_buffer(&mut self) -> Option<BufferObject>;

    /// Deletes a buffer object, releasing its storage and any mapping.
    fn delete_buffer(&mut self, buffer: BufferObject);

    /// Binds `buffer` to `target`, or clears the binding with `None`.
    fn bind_buffer(&mut self, target: TransferTarget, buffer: Option<BufferObject>);

    /// Allocates fresh, uninitialized storage of `size` bytes for the bound
    /// buffer.
    ///
    /// Any previous storage is orphaned: the device may keep it alive for
    /// transfers already in flight, but its contents are no longer reachable.
    fn buffer_storage(&mut self, target: TransferTarget, size: usize, usage: BufferUsage);

    /// Maps the bound buffer's storage into host memory. Returns `None` if the
    /// device refuses to produce a mapping.
    fn map_buffer(&mut self, target: TransferTarget, access: MapAccess) -> Option<MappedRange>;

    /// Releases the bound buffer's mapping.
    fn unmap_buffer(&mut self, target: TransferTarget);

    /// Returns the bytes of a live mapping.
    fn mapped_bytes(&self, range: MappedRange) -> Option<&[u8]>;

    /// Returns the bytes of a live mapping for writing. Returns `None` for
    /// read-only mappings.
    fn mapped_bytes_mut(&mut self, range: MappedRange) -> Option<&mut [u8]>;

    /// Returns the queue that dropped buffers post their objects to.
    ///
    /// The default is `None`: the device has no deferred release, and a buffer
    /// dropped without [`destroy`](crate::TransferBuffer::destroy) leaks its
    /// object.
    fn release_queue(&self) -> Option<ReleaseQueue> {
        None
    }
}

impl<D: TransferDevice + ?Sized> TransferDevice for &mut D {
    fn create_buffer(&mut self) -> Option<BufferObject> {
        (**self).create_buffer()
    }

    fn delete_buffer(&mut self, buffer: BufferObject) {
        (**self).delete_buffer(buffer);
    }

    fn bind_buffer(&mut self, target: TransferTarget, buffer: Option<BufferObject>) {
        (**self).bind_buffer(target, buffer);
    }

    fn buffer_storage(&mut self, target: TransferTarget, size: usize, usage: BufferUsage) {
        (**self).buffer_storage(target, size, usage);
    }

    fn map_buffer(&mut self, target: TransferTarget, access: MapAccess) -> Option<MappedRange> {
        (**self).map_buffer(target, access)
    }

    fn unmap_buffer(&mut self, target: TransferTarget) {
        (**self).unmap_buffer(target);
    }

    fn mapped_bytes(&self, range: MappedRange) -> Option<&[u8]> {
        (**self).mapped_bytes(range)
    }

    fn mapped_bytes_mut(&mut self, range: MappedRange) -> Option<&mut [u8]> {
        (**self).mapped_bytes_mut(range)
    }

    fn release_queue(&self) -> Option<ReleaseQueue> {
        (**self).release_queue()
    }
}
