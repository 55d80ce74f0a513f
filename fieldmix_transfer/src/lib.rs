// Copyright 2026 the Fieldmix Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host/device transfer buffers for streaming pixels without pipeline stalls.
//!
//! `fieldmix_transfer` wraps one fixed-size streaming buffer object per
//! [`TransferBuffer`] and gives the caller exact control over when a
//! host-visible mapping exists. It is `no_std` compatible (with `alloc`).
//!
//! # Architecture
//!
//! ```text
//!   upload (WriteOnly)                       download (ReadOnly)
//!
//!   map ── orphan + map ──► host writes      device readback ──► bind / copy / unbind
//!    │                                          │
//!   unmap ──► bind / copy to texture          map ──► host reads
//!                                               │
//!                                             unmap ── unmap + orphan
//! ```
//!
//! **[`TransferBuffer`]** — The buffer itself: map, unmap, bind, unbind, and
//! safe byte and [`bytemuck`] views of the mapping.
//!
//! **[`TransferDevice`]** — The graphics-context operations a backend must
//! provide. [`HostDevice`] implements it in host memory for tests and
//! headless use. Buffers dropped without `destroy` hand their objects back
//! through the device's [`ReleaseQueue`].
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! buffer lifecycle instrumentation, with a zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod buffer;
mod device;
mod error;
mod host;
pub mod trace;
mod usage;

pub use buffer::{MapState, TransferBuffer};
pub use device::{BufferObject, MappedRange, ReleaseQueue, TransferDevice};
pub use error::TransferError;
pub use host::{DeviceCall, HostDevice};
pub use usage::{BufferUsage, MapAccess, TransferTarget};
