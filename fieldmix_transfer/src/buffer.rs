// Copyright 2026 the Fieldmix Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Streaming transfer buffer with orphaning.

use bytemuck::{NoUninit, Pod};

use crate::device::{BufferObject, MappedRange, ReleaseQueue, TransferDevice};
use crate::error::TransferError;
use crate::trace::{
    BufferAllocatedEvent, BufferMappedEvent, BufferReleasedEvent, BufferUnmappedEvent,
    FailureKind, TransferFailureEvent, Tracer,
};
use crate::usage::BufferUsage;

/// Mapping state of a [`TransferBuffer`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MapState {
    /// No host-visible mapping exists.
    #[default]
    Unmapped,
    /// The buffer is mapped; the range stays valid until the next unmap.
    Mapped(MappedRange),
}

/// A fixed-size device buffer for streaming pixels to or from the device.
///
/// Storage is orphaned on the side of each direction where the host would
/// otherwise wait for the device: before mapping a
/// [`WriteOnly`](BufferUsage::WriteOnly) buffer and after unmapping a
/// [`ReadOnly`](BufferUsage::ReadOnly) one. The host never blocks on a
/// transfer the device has not finished, at the cost of extra storage churn.
///
/// The buffer does not hold its device; every device-facing operation takes
/// it as an argument. Calls must come from one thread in program order. To
/// overlap host and device work, keep a few buffers and rotate between them.
///
/// Release the device object with [`destroy`](Self::destroy). A buffer dropped
/// without it (an early return, an unwind) posts its object to the device's
/// [`ReleaseQueue`], and the device deletes it later; no release event is
/// traced for it. On a device without a queue the object leaks.
#[derive(Debug)]
pub struct TransferBuffer {
    object: BufferObject,
    size: usize,
    usage: BufferUsage,
    state: MapState,
    releases: Option<ReleaseQueue>,
    released: bool,
}

impl TransferBuffer {
    /// Creates a buffer object of `size` bytes for `usage`.
    ///
    /// `ReadOnly` buffers get storage immediately, so the device can write
    /// into them before the first map. `WriteOnly` storage is left to the
    /// first [`map`](Self::map).
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Allocation`] if the device cannot create the
    /// buffer object.
    pub fn new<D: TransferDevice + ?Sized>(
        device: &mut D,
        size: usize,
        usage: BufferUsage,
        tracer: &mut Tracer<'_>,
    ) -> Result<Self, TransferError> {
        let Some(object) = device.create_buffer() else {
            tracer.transfer_failure(&TransferFailureEvent {
                kind: FailureKind::Allocation,
                usage,
                size,
            });
            return Err(TransferError::Allocation { size, usage });
        };

        let target = usage.target();
        device.bind_buffer(target, Some(object));
        if usage == BufferUsage::ReadOnly {
            device.buffer_storage(target, size, usage);
        }
        device.bind_buffer(target, None);

        tracer.buffer_allocated(&BufferAllocatedEvent {
            buffer: object,
            usage,
            size,
        });

        Ok(Self {
            object,
            size,
            usage,
            state: MapState::Unmapped,
            releases: device.release_queue(),
            released: false,
        })
    }

    /// Maps the buffer into host memory and returns the mapping.
    ///
    /// If the buffer is already mapped, the existing mapping is returned and
    /// the device is not touched.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Mapping`] if the device refuses. The buffer
    /// stays unmapped and can be mapped again later.
    pub fn map<D: TransferDevice + ?Sized>(
        &mut self,
        device: &mut D,
        tracer: &mut Tracer<'_>,
    ) -> Result<MappedRange, TransferError> {
        if let MapState::Mapped(range) = self.state {
            return Ok(range);
        }

        let target = self.usage.target();
        let orphaned = self.usage == BufferUsage::WriteOnly;
        device.bind_buffer(target, Some(self.object));
        if orphaned {
            device.buffer_storage(target, self.size, self.usage);
        }
        let mapped = device.map_buffer(target, self.usage.access());
        device.bind_buffer(target, None);

        let Some(range) = mapped else {
            tracer.transfer_failure(&TransferFailureEvent {
                kind: FailureKind::Mapping,
                usage: self.usage,
                size: self.size,
            });
            return Err(TransferError::Mapping {
                size: self.size,
                usage: self.usage,
            });
        };

        self.state = MapState::Mapped(range);
        tracer.buffer_mapped(&BufferMappedEvent {
            buffer: self.object,
            usage: self.usage,
            range,
            orphaned,
        });
        Ok(range)
    }

    /// Releases the host mapping. Does nothing if the buffer is not mapped.
    pub fn unmap<D: TransferDevice + ?Sized>(&mut self, device: &mut D, tracer: &mut Tracer<'_>) {
        if self.state == MapState::Unmapped {
            return;
        }

        let target = self.usage.target();
        let orphaned = self.usage == BufferUsage::ReadOnly;
        device.bind_buffer(target, Some(self.object));
        device.unmap_buffer(target);
        if orphaned {
            device.buffer_storage(target, self.size, self.usage);
        }
        self.state = MapState::Unmapped;
        device.bind_buffer(target, None);

        tracer.buffer_unmapped(&BufferUnmappedEvent {
            buffer: self.object,
            usage: self.usage,
            orphaned,
        });
    }

    /// Binds the buffer to its transfer target, for device-side copies into
    /// or out of it. The mapping state is not affected.
    pub fn bind<D: TransferDevice + ?Sized>(&self, device: &mut D) {
        device.bind_buffer(self.usage.target(), Some(self.object));
    }

    /// Clears the transfer target binding.
    pub fn unbind<D: TransferDevice + ?Sized>(&self, device: &mut D) {
        device.bind_buffer(self.usage.target(), None);
    }

    /// Unmaps the buffer if needed and deletes the device object.
    pub fn destroy<D: TransferDevice + ?Sized>(mut self, device: &mut D, tracer: &mut Tracer<'_>) {
        self.unmap(device, tracer);
        device.delete_buffer(self.object);
        self.released = true;
        tracer.buffer_released(&BufferReleasedEvent {
            buffer: self.object,
            usage: self.usage,
            size: self.size,
        });
    }

    /// Returns the current mapping, or `None` if unmapped.
    #[inline]
    #[must_use]
    pub fn data(&self) -> Option<MappedRange> {
        match self.state {
            MapState::Mapped(range) => Some(range),
            MapState::Unmapped => None,
        }
    }

    /// Returns the mapping state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> MapState {
        self.state
    }

    /// Returns `true` while the buffer is mapped.
    #[inline]
    #[must_use]
    pub fn is_mapped(&self) -> bool {
        matches!(self.state, MapState::Mapped(_))
    }

    /// Returns the size in bytes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the transfer direction.
    #[inline]
    #[must_use]
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// Returns the underlying device object.
    #[inline]
    #[must_use]
    pub fn object(&self) -> BufferObject {
        self.object
    }

    /// Returns the mapped bytes, or `None` if unmapped.
    #[must_use]
    pub fn bytes<'d, D: TransferDevice + ?Sized>(&self, device: &'d D) -> Option<&'d [u8]> {
        device.mapped_bytes(self.data()?)
    }

    /// Returns the mapped bytes for writing, or `None` if unmapped or the
    /// buffer is `ReadOnly`.
    #[must_use]
    pub fn bytes_mut<'d, D: TransferDevice + ?Sized>(
        &self,
        device: &'d mut D,
    ) -> Option<&'d mut [u8]> {
        device.mapped_bytes_mut(self.data()?)
    }

    /// Copies `src` into the start of the mapping.
    ///
    /// Copies as many whole bytes as fit and returns the count, or `None` if
    /// the buffer is not mapped for writing.
    pub fn write_pod<D, T>(&self, device: &mut D, src: &[T]) -> Option<usize>
    where
        D: TransferDevice + ?Sized,
        T: NoUninit,
    {
        let dst = self.bytes_mut(device)?;
        let src: &[u8] = bytemuck::cast_slice(src);
        let n = src.len().min(dst.len());
        dst[..n].copy_from_slice(&src[..n]);
        Some(n)
    }

    /// Copies the start of the mapping into `dst`.
    ///
    /// Fills as many bytes of `dst` as the mapping holds and returns the
    /// count, or `None` if the buffer is not mapped.
    pub fn read_pod<D, T>(&self, device: &D, dst: &mut [T]) -> Option<usize>
    where
        D: TransferDevice + ?Sized,
        T: Pod,
    {
        let src = self.bytes(device)?;
        let dst: &mut [u8] = bytemuck::cast_slice_mut(dst);
        let n = src.len().min(dst.len());
        dst[..n].copy_from_slice(&src[..n]);
        Some(n)
    }
}

impl Drop for TransferBuffer {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Some(queue) = &self.releases {
            queue.push(self.object);
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::host::{DeviceCall, HostDevice};
    use crate::usage::{MapAccess, TransferTarget};

    fn buffer(dev: &mut HostDevice, size: usize, usage: BufferUsage) -> TransferBuffer {
        TransferBuffer::new(dev, size, usage, &mut Tracer::none()).expect("allocation")
    }

    #[test]
    fn read_only_reserves_storage_at_construction() {
        let mut dev = HostDevice::with_call_log();
        let buf = buffer(&mut dev, 16, BufferUsage::ReadOnly);

        assert_eq!(dev.storage_len(buf.object()), Some(16));
        assert_eq!(
            dev.calls(),
            [
                DeviceCall::Create,
                DeviceCall::Bind(TransferTarget::Pack, Some(buf.object())),
                DeviceCall::Storage {
                    target: TransferTarget::Pack,
                    size: 16,
                    usage: BufferUsage::ReadOnly,
                },
                DeviceCall::Bind(TransferTarget::Pack, None),
            ]
        );
    }

    #[test]
    fn write_only_defers_storage_to_first_map() {
        let mut dev = HostDevice::with_call_log();
        let buf = buffer(&mut dev, 16, BufferUsage::WriteOnly);
        assert_eq!(dev.storage_len(buf.object()), None);
        assert!(!dev.calls().iter().any(|c| matches!(c, DeviceCall::Storage { .. })));
    }

    #[test]
    fn device_write_before_first_map_is_visible() {
        let mut dev = HostDevice::new();
        let mut buf = buffer(&mut dev, 4, BufferUsage::ReadOnly);

        // Simulated readback into the pack buffer.
        buf.bind(&mut dev);
        assert!(dev.device_write(TransferTarget::Pack, 0, &[1, 2, 3, 4]));
        buf.unbind(&mut dev);

        let range = buf.map(&mut dev, &mut Tracer::none()).expect("map");
        assert_eq!(range.len(), 4);
        assert_eq!(buf.bytes(&dev), Some(&[1, 2, 3, 4][..]));
    }

    #[test]
    fn write_only_map_orphans_before_mapping() {
        let mut dev = HostDevice::with_call_log();
        let mut buf = buffer(&mut dev, 8, BufferUsage::WriteOnly);
        dev.clear_calls();

        buf.map(&mut dev, &mut Tracer::none()).expect("map");
        assert_eq!(
            dev.calls(),
            [
                DeviceCall::Bind(TransferTarget::Unpack, Some(buf.object())),
                DeviceCall::Storage {
                    target: TransferTarget::Unpack,
                    size: 8,
                    usage: BufferUsage::WriteOnly,
                },
                DeviceCall::Map(TransferTarget::Unpack, MapAccess::WriteOnly),
                DeviceCall::Bind(TransferTarget::Unpack, None),
            ]
        );
    }

    #[test]
    fn read_only_unmap_orphans_after_unmapping() {
        let mut dev = HostDevice::with_call_log();
        let mut buf = buffer(&mut dev, 8, BufferUsage::ReadOnly);
        buf.map(&mut dev, &mut Tracer::none()).expect("map");
        dev.clear_calls();

        buf.unmap(&mut dev, &mut Tracer::none());
        assert_eq!(
            dev.calls(),
            [
                DeviceCall::Bind(TransferTarget::Pack, Some(buf.object())),
                DeviceCall::Unmap(TransferTarget::Pack),
                DeviceCall::Storage {
                    target: TransferTarget::Pack,
                    size: 8,
                    usage: BufferUsage::ReadOnly,
                },
                DeviceCall::Bind(TransferTarget::Pack, None),
            ]
        );
        assert!(!buf.is_mapped());
        assert_eq!(buf.data(), None);
    }

    #[test]
    fn map_is_idempotent() {
        let mut dev = HostDevice::with_call_log();
        for usage in [BufferUsage::WriteOnly, BufferUsage::ReadOnly] {
            let mut buf = buffer(&mut dev, 32, usage);
            let first = buf.map(&mut dev, &mut Tracer::none()).expect("map");
            dev.clear_calls();
            let second = buf.map(&mut dev, &mut Tracer::none()).expect("map");
            assert_eq!(first, second, "{usage}: repeated map must return the same range");
            assert!(dev.calls().is_empty(), "{usage}: repeated map must not touch the device");
            assert_eq!(buf.data(), Some(first));
        }
    }

    #[test]
    fn unmap_when_unmapped_is_noop() {
        let mut dev = HostDevice::with_call_log();
        let mut buf = buffer(&mut dev, 4, BufferUsage::WriteOnly);
        dev.clear_calls();

        buf.unmap(&mut dev, &mut Tracer::none());
        buf.unmap(&mut dev, &mut Tracer::none());
        assert!(dev.calls().is_empty());
        assert_eq!(buf.data(), None);
        assert_eq!(buf.state(), MapState::Unmapped);
    }

    #[test]
    fn write_cycle_remaps_fresh_writable_storage() {
        let mut dev = HostDevice::new();
        let mut buf = buffer(&mut dev, 16, BufferUsage::WriteOnly);
        let pixels: [u32; 4] = [0xFF00_00FF, 0xFF00_FF00, 0xFFFF_0000, 0xFFFF_FFFF];

        let first = buf.map(&mut dev, &mut Tracer::none()).expect("map");
        assert_eq!(buf.write_pod(&mut dev, &pixels), Some(16));
        buf.unmap(&mut dev, &mut Tracer::none());

        // The upload side sees what was written.
        buf.bind(&mut dev);
        let uploaded: Vec<u8> = dev.device_read(TransferTarget::Unpack).expect("storage").to_vec();
        buf.unbind(&mut dev);
        assert_eq!(uploaded, bytemuck::cast_slice::<u32, u8>(&pixels));

        let second = buf.map(&mut dev, &mut Tracer::none()).expect("remap");
        assert_ne!(first, second, "remap should target orphaned storage");
        let bytes = buf.bytes_mut(&mut dev).expect("writable");
        assert_eq!(bytes.len(), 16);
        bytes.fill(0x11);
    }

    #[test]
    fn read_only_mapping_is_not_writable() {
        let mut dev = HostDevice::new();
        let mut buf = buffer(&mut dev, 4, BufferUsage::ReadOnly);
        buf.map(&mut dev, &mut Tracer::none()).expect("map");
        assert!(buf.bytes_mut(&mut dev).is_none());
        assert_eq!(buf.write_pod(&mut dev, &[1_u8][..]), None);
    }

    #[test]
    fn read_pod_copies_typed_pixels() {
        let mut dev = HostDevice::new();
        let mut buf = buffer(&mut dev, 8, BufferUsage::ReadOnly);
        let src: [u16; 4] = [1, 2, 3, 4];

        buf.bind(&mut dev);
        assert!(dev.device_write(TransferTarget::Pack, 0, bytemuck::cast_slice(&src)));
        buf.unbind(&mut dev);

        buf.map(&mut dev, &mut Tracer::none()).expect("map");
        let mut dst = [0_u16; 4];
        assert_eq!(buf.read_pod(&dev, &mut dst), Some(8));
        assert_eq!(dst, src);
    }

    #[test]
    fn unmapped_buffer_has_no_bytes() {
        let mut dev = HostDevice::new();
        let buf = buffer(&mut dev, 4, BufferUsage::ReadOnly);
        assert!(buf.bytes(&dev).is_none());
        let mut dst = [0_u8; 4];
        assert_eq!(buf.read_pod(&dev, &mut dst), None);
    }

    #[test]
    fn allocation_failure_is_reported() {
        let mut dev = HostDevice::new();
        dev.fail_next_create(1);
        let err = TransferBuffer::new(&mut dev, 64, BufferUsage::WriteOnly, &mut Tracer::none())
            .expect_err("allocation must fail");
        assert_eq!(
            err,
            TransferError::Allocation {
                size: 64,
                usage: BufferUsage::WriteOnly
            }
        );
        assert!(!err.is_recoverable());
        assert_eq!(dev.live_buffers(), 0);
    }

    #[test]
    fn mapping_failure_leaves_buffer_reusable() {
        let mut dev = HostDevice::new();
        let mut buf = buffer(&mut dev, 4, BufferUsage::WriteOnly);
        dev.fail_next_map(1);

        let err = buf.map(&mut dev, &mut Tracer::none()).expect_err("map must fail");
        assert!(err.is_recoverable());
        assert!(!buf.is_mapped());
        assert_eq!(buf.data(), None);
        assert_eq!(dev.bound(TransferTarget::Unpack), None, "map must unbind on failure");

        let range = buf.map(&mut dev, &mut Tracer::none()).expect("retry");
        assert_eq!(buf.data(), Some(range));
    }

    #[test]
    fn bind_does_not_change_mapping() {
        let mut dev = HostDevice::new();
        let mut buf = buffer(&mut dev, 4, BufferUsage::ReadOnly);
        let range = buf.map(&mut dev, &mut Tracer::none()).expect("map");

        buf.bind(&mut dev);
        assert_eq!(dev.bound(TransferTarget::Pack), Some(buf.object()));
        buf.unbind(&mut dev);
        assert_eq!(dev.bound(TransferTarget::Pack), None);
        assert_eq!(buf.data(), Some(range));
        assert!(dev.is_mapped(buf.object()));
    }

    #[test]
    fn destroy_unmaps_and_deletes() {
        let mut dev = HostDevice::with_call_log();
        let mut buf = buffer(&mut dev, 4, BufferUsage::ReadOnly);
        buf.map(&mut dev, &mut Tracer::none()).expect("map");
        let object = buf.object();

        buf.destroy(&mut dev, &mut Tracer::none());
        assert!(!dev.is_alive(object));
        assert_eq!(dev.live_buffers(), 0);
        assert_eq!(dev.calls().last(), Some(&DeviceCall::Delete(object)));
    }

    #[test]
    fn size_is_fixed() {
        let mut dev = HostDevice::new();
        let mut buf = buffer(&mut dev, 12, BufferUsage::WriteOnly);
        for _ in 0..3 {
            buf.map(&mut dev, &mut Tracer::none()).expect("map");
            buf.unmap(&mut dev, &mut Tracer::none());
        }
        assert_eq!(buf.size(), 12);
        assert_eq!(buf.usage(), BufferUsage::WriteOnly);
    }

    #[test]
    fn works_through_dyn_device() {
        let mut host = HostDevice::new();
        let dev: &mut dyn TransferDevice = &mut host;
        let mut buf = TransferBuffer::new(dev, 4, BufferUsage::WriteOnly, &mut Tracer::none())
            .expect("allocation");
        let range = buf.map(dev, &mut Tracer::none()).expect("map");
        assert_eq!(range.len(), 4);
    }

    #[test]
    fn dropped_buffer_is_released_by_device() {
        let mut dev = HostDevice::new();
        let object = {
            let mut buf = buffer(&mut dev, 16, BufferUsage::ReadOnly);
            buf.map(&mut dev, &mut Tracer::none()).expect("map");
            buf.object()
        };

        assert_eq!(dev.collect_released(), 1);
        assert!(!dev.is_alive(object), "dropped buffer must not stay alive");
        assert_eq!(dev.live_buffers(), 0);
        assert_eq!(dev.collect_released(), 0);
    }

    #[test]
    fn dropped_buffer_is_released_on_next_device_call() {
        let mut dev = HostDevice::new();
        drop(buffer(&mut dev, 8, BufferUsage::WriteOnly));

        let kept = buffer(&mut dev, 8, BufferUsage::WriteOnly);
        assert_eq!(dev.live_buffers(), 1);
        assert!(dev.is_alive(kept.object()));
    }

    #[test]
    fn early_return_on_map_failure_does_not_leak() {
        fn upload(dev: &mut HostDevice) -> Result<(), TransferError> {
            let mut buf = TransferBuffer::new(dev, 4, BufferUsage::WriteOnly, &mut Tracer::none())?;
            dev.fail_next_map(1);
            buf.map(dev, &mut Tracer::none())?;
            buf.destroy(dev, &mut Tracer::none());
            Ok(())
        }

        let mut dev = HostDevice::new();
        assert!(upload(&mut dev).is_err());
        dev.collect_released();
        assert_eq!(dev.live_buffers(), 0);
    }

    #[test]
    fn destroyed_buffer_is_deleted_once() {
        let mut dev = HostDevice::with_call_log();
        let buf = buffer(&mut dev, 4, BufferUsage::WriteOnly);
        buf.destroy(&mut dev, &mut Tracer::none());

        assert_eq!(dev.collect_released(), 0, "destroy must not queue a release");
        let deletes = dev
            .calls()
            .iter()
            .filter(|c| matches!(c, DeviceCall::Delete(_)))
            .count();
        assert_eq!(deletes, 1);
    }

    #[test]
    fn long_running_device_keeps_no_call_log() {
        let mut dev = HostDevice::new();
        let mut buf = buffer(&mut dev, 4, BufferUsage::WriteOnly);
        for _ in 0..10_000 {
            buf.map(&mut dev, &mut Tracer::none()).expect("map");
            buf.unmap(&mut dev, &mut Tracer::none());
        }
        assert!(dev.calls().is_empty(), "call log must be opt-in");
        buf.destroy(&mut dev, &mut Tracer::none());
    }

    #[cfg(feature = "trace")]
    #[test]
    fn lifecycle_is_traced() {
        use crate::trace::AllocationCounter;

        let mut dev = HostDevice::new();
        let mut counter = AllocationCounter::new();
        {
            let mut tracer = Tracer::new(&mut counter);
            let a = TransferBuffer::new(&mut dev, 10, BufferUsage::WriteOnly, &mut tracer)
                .expect("allocation");
            let _b = TransferBuffer::new(&mut dev, 20, BufferUsage::ReadOnly, &mut tracer)
                .expect("allocation");
            dev.fail_next_create(1);
            let _ = TransferBuffer::new(&mut dev, 30, BufferUsage::ReadOnly, &mut tracer);
            a.destroy(&mut dev, &mut tracer);
        }

        assert_eq!(counter.allocated(BufferUsage::WriteOnly), 1);
        assert_eq!(counter.live(BufferUsage::WriteOnly), 0);
        assert_eq!(counter.allocated(BufferUsage::ReadOnly), 1);
        assert_eq!(counter.live_bytes(BufferUsage::ReadOnly), 20);
        assert_eq!(counter.failures(), 1);
    }
}
