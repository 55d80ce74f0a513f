// Copyright 2026 the Fieldmix Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composite plans for fieldmix frame trees.
//!
//! This crate provides the intermediate representation between a
//! [`fieldmix_core`] frame tree and backend-specific mixing. It defines:
//!
//! - [`CompositeItem`] — one source leaf with its accumulated transforms
//! - [`CompositePlan`] — the leaves of one frame in back-to-front order

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod plan;

pub use plan::{CompositeItem, CompositePlan};
