// Copyright 2026 the Fieldmix Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visitor-based traversal.

use super::node::Frame;

/// Receives the depth-first walk of a frame tree.
///
/// Image mixers, audio mixers and diagnostics implement this to observe a
/// tree without knowing its shape. For every node, [`enter`](Self::enter) is
/// called before any of its children are visited and [`leave`](Self::leave)
/// after the last one, so calls are strictly balanced and nested.
pub trait FrameVisitor {
    /// Called when the traversal reaches `frame`.
    fn enter(&mut self, frame: &Frame);

    /// Called when the traversal is done with the most recently entered frame.
    fn leave(&mut self);
}

impl<V: FrameVisitor + ?Sized> FrameVisitor for &mut V {
    #[inline]
    fn enter(&mut self, frame: &Frame) {
        (**self).enter(frame);
    }

    #[inline]
    fn leave(&mut self) {
        (**self).leave();
    }
}

impl Frame {
    /// Walks this frame and its descendants depth-first.
    ///
    /// Calls `visitor.enter(self)`, then `accept` on each child in order, then
    /// `visitor.leave()`. One call is one complete traversal.
    pub fn accept<V: FrameVisitor + ?Sized>(&self, visitor: &mut V) {
        visitor.enter(self);
        for child in self.children() {
            child.accept(visitor);
        }
        visitor.leave();
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::frame::{FrameNode, SourceId};

    #[derive(Debug, PartialEq, Eq)]
    enum Step {
        Enter(Option<SourceId>, usize),
        Leave(usize),
    }

    /// Records every callback together with the depth it happened at.
    #[derive(Default)]
    struct Recorder {
        steps: Vec<Step>,
        depth: usize,
        max_depth: usize,
    }

    impl FrameVisitor for Recorder {
        fn enter(&mut self, frame: &Frame) {
            self.steps.push(Step::Enter(frame.source(), self.depth));
            self.depth += 1;
            self.max_depth = self.max_depth.max(self.depth);
        }

        fn leave(&mut self) {
            assert!(self.depth > 0, "leave without matching enter");
            self.depth -= 1;
            self.steps.push(Step::Leave(self.depth));
        }
    }

    fn leaf(id: u64) -> Frame {
        FrameNode::leaf(SourceId(id)).into_frame()
    }

    #[test]
    fn children_are_visited_in_order() {
        let root: Frame = FrameNode::from_children([leaf(1), leaf(2), leaf(3)].into()).into();
        let mut rec = Recorder::default();
        root.accept(&mut rec);

        assert_eq!(
            rec.steps,
            [
                Step::Enter(None, 0),
                Step::Enter(Some(SourceId(1)), 1),
                Step::Leave(1),
                Step::Enter(Some(SourceId(2)), 1),
                Step::Leave(1),
                Step::Enter(Some(SourceId(3)), 1),
                Step::Leave(1),
                Step::Leave(0),
            ]
        );
        assert_eq!(rec.depth, 0, "traversal must end balanced");
    }

    #[test]
    fn nested_traversal_is_depth_first() {
        // root -> [inner -> [a, b], c]
        let inner = FrameNode::from_pair(leaf(1), leaf(2)).into_frame();
        let root = FrameNode::from_pair(inner, leaf(3)).into_frame();

        let mut rec = Recorder::default();
        root.accept(&mut rec);

        let entered: Vec<_> = rec
            .steps
            .iter()
            .filter_map(|s| match s {
                Step::Enter(src, depth) => Some((*src, *depth)),
                Step::Leave(_) => None,
            })
            .collect();
        assert_eq!(
            entered,
            [
                (None, 0),
                (None, 1),
                (Some(SourceId(1)), 2),
                (Some(SourceId(2)), 2),
                (Some(SourceId(3)), 1),
            ]
        );
        assert_eq!(rec.max_depth, 3);

        let enters = rec.steps.iter().filter(|s| matches!(s, Step::Enter(..))).count();
        let leaves = rec.steps.iter().filter(|s| matches!(s, Step::Leave(_))).count();
        assert_eq!(enters, leaves);
    }

    #[test]
    fn shared_subtree_is_visited_once_per_reference() {
        let shared = leaf(7);
        let root = FrameNode::from_pair(shared.clone(), shared).into_frame();
        let mut rec = Recorder::default();
        root.accept(&mut rec);

        let hits = rec
            .steps
            .iter()
            .filter(|s| matches!(s, Step::Enter(Some(SourceId(7)), _)))
            .count();
        assert_eq!(hits, 2);
    }

    #[test]
    fn empty_frame_is_single_enter_leave() {
        let mut rec = Recorder::default();
        Frame::empty().accept(&mut rec);
        assert_eq!(rec.steps, [Step::Enter(None, 0), Step::Leave(0)]);
    }

    #[test]
    fn visitor_through_dyn_reference() {
        let mut rec = Recorder::default();
        let visitor: &mut dyn FrameVisitor = &mut rec;
        leaf(1).accept(visitor);
        assert_eq!(rec.steps.len(), 2);
    }
}
