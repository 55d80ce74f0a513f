// Copyright 2026 the Fieldmix Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory [`TransferDevice`].
//!
//! [`HostDevice`] keeps buffer storage in host vectors and follows the same
//! rules a streaming-buffer driver does: storage is reallocated (orphaned) on
//! every `buffer_storage` call, a buffer cannot be mapped twice, and a mapped
//! buffer cannot be used by device-side copies. Objects of buffers dropped
//! without `destroy` are deleted at the start of the next device call.
//!
//! Built with [`HostDevice::with_call_log`] it records every call it receives,
//! and it can be told to fail the next creation or mapping, which makes it the
//! test double for code built on [`TransferBuffer`](crate::TransferBuffer).
//! Headless pipelines can use [`HostDevice::new`] directly as a software
//! device; it keeps no log.

use alloc::vec;
use alloc::vec::Vec;

use crate::device::{BufferObject, MappedRange, ReleaseQueue, TransferDevice};
use crate::usage::{BufferUsage, MapAccess, TransferTarget};

/// One device call, as recorded by [`HostDevice`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceCall {
    /// [`TransferDevice::create_buffer`].
    Create,
    /// [`TransferDevice::delete_buffer`].
    Delete(BufferObject),
    /// [`TransferDevice::bind_buffer`].
    Bind(TransferTarget, Option<BufferObject>),
    /// [`TransferDevice::buffer_storage`].
    Storage {
        /// Binding point.
        target: TransferTarget,
        /// Requested size.
        size: usize,
        /// Usage hint.
        usage: BufferUsage,
    },
    /// [`TransferDevice::map_buffer`].
    Map(TransferTarget, MapAccess),
    /// [`TransferDevice::unmap_buffer`].
    Unmap(TransferTarget),
}

#[derive(Debug)]
struct Storage {
    bytes: Vec<u8>,
    epoch: u64,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    live: bool,
    storage: Option<Storage>,
    mapping: Option<MapAccess>,
}

/// A software transfer device backed by host memory.
#[derive(Debug, Default)]
pub struct HostDevice {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    bound: [Option<BufferObject>; 2],
    next_epoch: u64,
    fail_create: u32,
    fail_map: u32,
    log_calls: bool,
    calls: Vec<DeviceCall>,
    releases: ReleaseQueue,
}

impl HostDevice {
    /// Creates a device with no buffer objects and no call log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a device that records every call in [`calls`](Self::calls).
    #[must_use]
    pub fn with_call_log() -> Self {
        Self {
            log_calls: true,
            ..Self::default()
        }
    }

    /// Turns call recording on or off. Turning it off keeps the entries
    /// recorded so far.
    pub fn set_call_log(&mut self, enabled: bool) {
        self.log_calls = enabled;
    }

    // -- Fault injection --

    /// Makes the next `count` calls to `create_buffer` fail.
    pub fn fail_next_create(&mut self, count: u32) {
        self.fail_create = count;
    }

    /// Makes the next `count` calls to `map_buffer` fail.
    pub fn fail_next_map(&mut self, count: u32) {
        self.fail_map = count;
    }

    // -- Inspection --

    /// Returns every call received while recording was on, since creation or
    /// the last [`clear_calls`](Self::clear_calls).
    #[must_use]
    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    /// Forgets the recorded calls.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Returns the buffer bound to `target`.
    #[must_use]
    pub fn bound(&self, target: TransferTarget) -> Option<BufferObject> {
        self.bound[target.index()]
    }

    /// Returns the number of live buffer objects.
    #[must_use]
    pub fn live_buffers(&self) -> usize {
        self.slots.iter().filter(|s| s.live).count()
    }

    /// Returns whether `buffer` refers to a live object.
    #[must_use]
    pub fn is_alive(&self, buffer: BufferObject) -> bool {
        self.slot(buffer).is_some()
    }

    /// Returns the storage size of `buffer`, or `None` if it has no storage.
    #[must_use]
    pub fn storage_len(&self, buffer: BufferObject) -> Option<usize> {
        self.slot(buffer)?.storage.as_ref().map(|s| s.bytes.len())
    }

    /// Returns whether `buffer` is currently mapped.
    #[must_use]
    pub fn is_mapped(&self, buffer: BufferObject) -> bool {
        self.slot(buffer).is_some_and(|s| s.mapping.is_some())
    }

    /// Deletes the objects of buffers dropped without `destroy` and returns
    /// how many there were. Every device call does this first.
    pub fn collect_released(&mut self) -> usize {
        let pending = self.releases.take();
        for &buffer in &pending {
            self.release(buffer);
        }
        pending.len()
    }

    // -- Device-side transfers --

    /// Writes `data` into the buffer bound to `target` at `offset`, the way a
    /// framebuffer readback fills a pack buffer.
    ///
    /// Returns `false` if nothing is bound, the buffer has no storage, is
    /// mapped, or the write does not fit.
    pub fn device_write(&mut self, target: TransferTarget, offset: usize, data: &[u8]) -> bool {
        let Some(buffer) = self.bound(target) else {
            return false;
        };
        let Some(slot) = self.slot_mut(buffer) else {
            return false;
        };
        if slot.mapping.is_some() {
            return false;
        }
        let Some(storage) = slot.storage.as_mut() else {
            return false;
        };
        let Some(end) = offset.checked_add(data.len()) else {
            return false;
        };
        match storage.bytes.get_mut(offset..end) {
            Some(dst) => {
                dst.copy_from_slice(data);
                true
            }
            None => false,
        }
    }

    /// Returns the contents of the buffer bound to `target`, the way a texture
    /// upload reads an unpack buffer.
    ///
    /// Returns `None` if nothing is bound, the buffer has no storage, or is
    /// mapped.
    #[must_use]
    pub fn device_read(&self, target: TransferTarget) -> Option<&[u8]> {
        let slot = self.slot(self.bound(target)?)?;
        if slot.mapping.is_some() {
            return None;
        }
        slot.storage.as_ref().map(|s| s.bytes.as_slice())
    }

    // -- Internals --

    fn log(&mut self, call: DeviceCall) {
        self.collect_released();
        if self.log_calls {
            self.calls.push(call);
        }
    }

    fn release(&mut self, buffer: BufferObject) {
        let Some(slot) = self.slot_mut(buffer) else {
            return;
        };
        slot.live = false;
        slot.storage = None;
        slot.mapping = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(buffer.index());

        // Deleting a bound object unbinds it.
        for bound in &mut self.bound {
            if *bound == Some(buffer) {
                *bound = None;
            }
        }
    }

    fn slot(&self, buffer: BufferObject) -> Option<&Slot> {
        self.slots
            .get(buffer.index() as usize)
            .filter(|s| s.live && s.generation == buffer.generation())
    }

    fn slot_mut(&mut self, buffer: BufferObject) -> Option<&mut Slot> {
        self.slots
            .get_mut(buffer.index() as usize)
            .filter(|s| s.live && s.generation == buffer.generation())
    }

    fn bound_slot_mut(&mut self, target: TransferTarget) -> Option<(BufferObject, &mut Slot)> {
        let buffer = self.bound(target)?;
        self.slot_mut(buffer).map(|slot| (buffer, slot))
    }

    fn live_mapping(&self, range: MappedRange) -> Option<(&Slot, MapAccess)> {
        let slot = self.slot(range.buffer())?;
        let access = slot.mapping?;
        let storage = slot.storage.as_ref()?;
        (storage.epoch == range.epoch()).then_some((slot, access))
    }
}

impl TransferDevice for HostDevice {
    fn create_buffer(&mut self) -> Option<BufferObject> {
        self.log(DeviceCall::Create);
        if self.fail_create > 0 {
            self.fail_create -= 1;
            return None;
        }

        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot; the generation was bumped on delete.
            idx
        } else {
            let idx = u32::try_from(self.slots.len()).ok()?;
            self.slots.push(Slot::default());
            idx
        };

        let slot = &mut self.slots[idx as usize];
        slot.live = true;
        slot.storage = None;
        slot.mapping = None;
        Some(BufferObject::new(idx, slot.generation))
    }

    fn delete_buffer(&mut self, buffer: BufferObject) {
        self.log(DeviceCall::Delete(buffer));
        self.release(buffer);
    }

    fn bind_buffer(&mut self, target: TransferTarget, buffer: Option<BufferObject>) {
        self.log(DeviceCall::Bind(target, buffer));
        debug_assert!(
            buffer.is_none_or(|b| self.is_alive(b)),
            "binding a deleted buffer object"
        );
        self.bound[target.index()] = buffer;
    }

    fn buffer_storage(&mut self, target: TransferTarget, size: usize, usage: BufferUsage) {
        self.log(DeviceCall::Storage {
            target,
            size,
            usage,
        });
        let epoch = self.next_epoch;
        let Some((_, slot)) = self.bound_slot_mut(target) else {
            return;
        };
        // Respecifying storage drops any mapping of the old storage.
        slot.mapping = None;
        slot.storage = Some(Storage {
            bytes: vec![0; size],
            epoch,
        });
        self.next_epoch += 1;
    }

    fn map_buffer(&mut self, target: TransferTarget, access: MapAccess) -> Option<MappedRange> {
        self.log(DeviceCall::Map(target, access));
        if self.fail_map > 0 {
            self.fail_map -= 1;
            return None;
        }
        let (buffer, slot) = self.bound_slot_mut(target)?;
        if slot.mapping.is_some() {
            return None;
        }
        let storage = slot.storage.as_ref()?;
        let range = MappedRange::new(buffer, storage.epoch, storage.bytes.len());
        slot.mapping = Some(access);
        Some(range)
    }

    fn unmap_buffer(&mut self, target: TransferTarget) {
        self.log(DeviceCall::Unmap(target));
        if let Some((_, slot)) = self.bound_slot_mut(target) {
            slot.mapping = None;
        }
    }

    fn mapped_bytes(&self, range: MappedRange) -> Option<&[u8]> {
        let (slot, _) = self.live_mapping(range)?;
        slot.storage.as_ref().map(|s| s.bytes.as_slice())
    }

    fn mapped_bytes_mut(&mut self, range: MappedRange) -> Option<&mut [u8]> {
        let (_, access) = self.live_mapping(range)?;
        if access != MapAccess::WriteOnly {
            return None;
        }
        self.slot_mut(range.buffer())?
            .storage
            .as_mut()
            .map(|s| s.bytes.as_mut_slice())
    }

    fn release_queue(&self) -> Option<ReleaseQueue> {
        Some(self.releases.clone())
    }
}
