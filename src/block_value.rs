// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Implements a generic ORAM value `BlockValue` consisting of unstructured bytes.

use crate::{BlockSize, OramBlock};
use rand::{
    distributions::{Distribution, Standard},
    Rng,
};

impl OramBlock for u8 {}
impl OramBlock for u16 {}
impl OramBlock for u32 {}
impl OramBlock for u64 {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// An `OramBlock` consisting of unstructured bytes.
pub struct BlockValue<const B: BlockSize>([u8; B]);

impl<const B: BlockSize> BlockValue<B> {
    /// Instantiates a `BlockValue` from an array of `B` bytes.
    pub fn new(data: [u8; B]) -> Self {
        Self(data)
    }

    /// Returns a `BlockValue` with every byte set to `byte`.
    pub fn filled(byte: u8) -> Self {
        Self([byte; B])
    }

    /// The bytes of the block.
    pub fn into_bytes(self) -> [u8; B] {
        self.0
    }
}

impl<const B: BlockSize> Default for BlockValue<B> {
    fn default() -> Self {
        BlockValue::<B>([0u8; B])
    }
}

impl<const B: BlockSize> From<[u8; B]> for BlockValue<B> {
    fn from(data: [u8; B]) -> Self {
        Self(data)
    }
}

impl<const B: BlockSize> AsRef<[u8]> for BlockValue<B> {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl<const B: BlockSize> OramBlock for BlockValue<B> {}

impl<const B: BlockSize> Distribution<BlockValue<B>> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> BlockValue<B> {
        let mut result = BlockValue::default();
        for i in 0..B {
            result.0[i] = rng.gen();
        }
        result
    }
}
