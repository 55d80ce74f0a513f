// Copyright 2026 the Fieldmix Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per
//! transfer event to a [`Write`](std::io::Write) destination (default:
//! stderr).

use std::io::Write;

use fieldmix_transfer::trace::{
    BufferAllocatedEvent, BufferMappedEvent, BufferReleasedEvent, BufferUnmappedEvent,
    FailureKind, TraceSink, TransferFailureEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn failure_name(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::Allocation => "alloc",
        FailureKind::Mapping => "map",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_buffer_allocated(&mut self, e: &BufferAllocatedEvent) {
        let _ = writeln!(
            self.writer,
            "[alloc] {:?} usage={} size={}",
            e.buffer, e.usage, e.size,
        );
    }

    fn on_buffer_released(&mut self, e: &BufferReleasedEvent) {
        let _ = writeln!(
            self.writer,
            "[release] {:?} usage={} size={}",
            e.buffer, e.usage, e.size,
        );
    }

    fn on_buffer_mapped(&mut self, e: &BufferMappedEvent) {
        let _ = writeln!(
            self.writer,
            "[map] {:?} usage={} len={} epoch={} orphaned={}",
            e.buffer,
            e.usage,
            e.range.len(),
            e.range.epoch(),
            e.orphaned,
        );
    }

    fn on_buffer_unmapped(&mut self, e: &BufferUnmappedEvent) {
        let _ = writeln!(
            self.writer,
            "[unmap] {:?} usage={} orphaned={}",
            e.buffer, e.usage, e.orphaned,
        );
    }

    fn on_transfer_failure(&mut self, e: &TransferFailureEvent) {
        let _ = writeln!(
            self.writer,
            "[FAILED:{}] usage={} size={}",
            failure_name(e.kind),
            e.usage,
            e.size,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldmix_transfer::{BufferObject, BufferUsage, MappedRange};

    #[test]
    fn pretty_print_map() {
        let buffer = BufferObject::new(3, 1);
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_buffer_mapped(&BufferMappedEvent {
            buffer,
            usage: BufferUsage::WriteOnly,
            range: MappedRange::new(buffer, 9, 64),
            orphaned: true,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.starts_with("[map]"), "got: {output}");
        assert!(output.contains("usage=write_only"), "got: {output}");
        assert!(output.contains("len=64"), "got: {output}");
        assert!(output.contains("orphaned=true"), "got: {output}");
    }

    #[test]
    fn pretty_print_failure() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_transfer_failure(&TransferFailureEvent {
            kind: FailureKind::Allocation,
            usage: BufferUsage::ReadOnly,
            size: 1024,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(output, "[FAILED:alloc] usage=read_only size=1024\n");
    }
}
