// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Block and bucket structures for Path ORAM.

use crate::{Address, BucketSize, OramBlock};
use subtle::{Choice, ConstantTimeEq};

#[derive(Clone, Copy, PartialEq)]
/// A bucket slot: an `OramBlock` together with the logical address it belongs to.
/// A slot whose address is the reserved sentinel `Address::MAX` is empty.
pub struct IdentifiedBlock<V> {
    /// The logical address of the block, or the sentinel if the slot is empty.
    pub address: Address,
    /// The payload.
    pub value: V,
}

impl<V: OramBlock> IdentifiedBlock<V> {
    /// The address marking an empty slot. It lies outside the address range of any constructible ORAM.
    pub const EMPTY_ADDRESS: Address = Address::MAX;

    /// Returns an empty slot.
    pub fn empty() -> Self {
        Self {
            address: Self::EMPTY_ADDRESS,
            value: V::default(),
        }
    }

    pub(crate) fn ct_is_empty(&self) -> Choice {
        self.address.ct_eq(&Self::EMPTY_ADDRESS)
    }

    /// Whether the slot holds no block.
    pub fn is_empty(&self) -> bool {
        self.ct_is_empty().into()
    }
}

impl<V: OramBlock> Default for IdentifiedBlock<V> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<V: OramBlock> std::fmt::Debug for IdentifiedBlock<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "IdentifiedBlock::Empty")
        } else {
            f.debug_struct("IdentifiedBlock")
                .field("address", &self.address)
                .field("value", &self.value)
                .finish()
        }
    }
}

impl<V: OramBlock> OramBlock for IdentifiedBlock<V> {}

#[derive(Clone, Copy, PartialEq)]
/// A Path ORAM bucket: `Z` block slots stored at one node of the tree.
pub struct Bucket<V: OramBlock, const Z: BucketSize> {
    /// The slots of this bucket.
    pub blocks: [IdentifiedBlock<V>; Z],
}

impl<V: OramBlock, const Z: BucketSize> Bucket<V, Z> {
    /// The number of non-empty slots.
    pub fn occupancy(&self) -> usize {
        self.blocks.iter().filter(|block| !block.is_empty()).count()
    }
}

impl<V: OramBlock, const Z: BucketSize> std::fmt::Debug for Bucket<V, Z> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.occupancy() == 0 {
            write!(f, "Bucket::Empty")
        } else {
            f.debug_struct("Bucket")
                .field("blocks", &self.blocks)
                .finish()
        }
    }
}

impl<V: OramBlock, const Z: BucketSize> Default for Bucket<V, Z> {
    fn default() -> Self {
        Self {
            blocks: [IdentifiedBlock::<V>::empty(); Z],
        }
    }
}

impl<V: OramBlock, const Z: BucketSize> OramBlock for Bucket<V, Z> {}
