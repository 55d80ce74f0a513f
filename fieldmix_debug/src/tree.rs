// Copyright 2026 the Fieldmix Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON dumps of frame trees.
//!
//! [`dump`] walks a [`Frame`] with a [`FrameVisitor`] and returns a nested
//! [`serde_json::Value`] mirroring the tree. Each node records its *local*
//! transforms, layer index and source; a shared subtree is dumped once per
//! path that reaches it.

use std::io::{self, Write};

use fieldmix_core::frame::{Frame, FrameVisitor};
use fieldmix_core::transform::{AudioTransform, ImageTransform};
use serde_json::{Map, Value, json};

/// Returns a JSON description of `root` and all of its descendants.
#[must_use]
pub fn dump(root: &Frame) -> Value {
    let mut builder = TreeBuilder::default();
    root.accept(&mut builder);
    builder.root.unwrap_or(Value::Null)
}

/// Writes the pretty-printed dump of `root` to `writer`.
///
/// # Errors
///
/// Returns any I/O error from `writer`.
pub fn write(root: &Frame, writer: &mut dyn Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, &dump(root))?;
    writeln!(writer)
}

fn image_json(t: &ImageTransform) -> Value {
    json!({
        "opacity": t.opacity,
        "gain": t.gain,
        "fill": [t.fill_translation.x, t.fill_translation.y, t.fill_scale.x, t.fill_scale.y],
        "clip": [t.clip_translation.x, t.clip_translation.y, t.clip_scale.x, t.clip_scale.y],
        "field_mode": t.field_mode.as_str(),
        "is_key": t.is_key,
    })
}

fn audio_json(t: &AudioTransform) -> Value {
    json!({
        "gain": t.gain,
        "has_audio": t.has_audio,
    })
}

/// Builds nested objects: a node is pushed on enter and attached to its
/// parent's `children` on leave.
#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Map<String, Value>>,
    root: Option<Value>,
}

impl FrameVisitor for TreeBuilder {
    fn enter(&mut self, frame: &Frame) {
        let mut node = Map::new();
        node.insert("source".into(), json!(frame.source().map(|s| s.0)));
        node.insert("layer_index".into(), json!(frame.layer_index()));
        node.insert("image".into(), image_json(frame.image_transform()));
        node.insert("audio".into(), audio_json(frame.audio_transform()));
        node.insert("children".into(), Value::Array(Vec::new()));
        self.stack.push(node);
    }

    fn leave(&mut self) {
        let Some(node) = self.stack.pop() else {
            return;
        };
        let node = Value::Object(node);
        match self.stack.last_mut() {
            Some(parent) => {
                if let Some(Value::Array(children)) = parent.get_mut("children") {
                    children.push(node);
                }
            }
            None => self.root = Some(node),
        }
    }
}
