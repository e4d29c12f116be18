// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! The Path ORAM stash, held by the client, together with the path read and eviction routines.

use crate::{
    bucket::{Bucket, IdentifiedBlock},
    database::Database,
    position_map::PositionMap,
    utils::{CompleteBinaryTreeIndex, TreeHeight, TreeIndex},
    Address, BucketSize, OramBlock, OramError, StashSize,
};
use std::collections::BTreeMap;

#[derive(Debug)]
/// A client-side stash mapping addresses to the blocks currently not resident in the tree.
///
/// Blocks are kept ordered by address. Eviction relies on that order:
/// when more blocks fit a bucket than it has slots, the lowest addresses win.
pub(crate) struct Stash<V: OramBlock> {
    blocks: BTreeMap<Address, V>,
}

impl<V: OramBlock> Stash<V> {
    pub fn new() -> Self {
        Self {
            blocks: BTreeMap::new(),
        }
    }

    /// Copies every real block of `bucket` into the stash, overwriting any entry with the same address.
    pub fn absorb<const Z: BucketSize>(&mut self, bucket: &Bucket<V, Z>) {
        for block in &bucket.blocks {
            if !block.is_empty() {
                self.blocks.insert(block.address, block.value);
            }
        }
    }

    /// Returns the block stored under `address`.
    /// If there is none, a default block is inserted and returned.
    pub fn get(&mut self, address: Address) -> V {
        *self.blocks.entry(address).or_default()
    }

    pub fn put(&mut self, address: Address, value: V) {
        self.blocks.insert(address, value);
    }

    pub fn remove(&mut self, address: Address) -> Option<V> {
        self.blocks.remove(&address)
    }

    /// Returns, in ascending order, the addresses of all stashed blocks
    /// whose assigned path passes through the node at `depth` on the path to `leaf`.
    pub fn candidates_for_node(
        &self,
        leaf: TreeIndex,
        depth: TreeHeight,
        height: TreeHeight,
        position_map: &PositionMap,
    ) -> Result<Vec<Address>, OramError> {
        let node = leaf.node_on_path(depth, height);

        let mut candidates = Vec::new();
        for address in self.blocks.keys() {
            let assigned_node = position_map.get(*address)?.node_on_path(depth, height);
            if assigned_node == node {
                candidates.push(*address);
            }
        }
        Ok(candidates)
    }

    /// The number of blocks in the stash.
    pub fn occupancy(&self) -> Result<StashSize, OramError> {
        Ok(self.blocks.len().try_into()?)
    }

    #[cfg(test)]
    pub fn contains(&self, address: Address) -> bool {
        self.blocks.contains_key(&address)
    }

    #[cfg(test)]
    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.blocks.keys()
    }

    /// Reads every bucket on the path to `leaf`, root first, into the stash.
    pub fn read_from_path<const Z: BucketSize, T: Database<Bucket<V, Z>>>(
        &mut self,
        physical_memory: &mut T,
        leaf: TreeIndex,
        height: TreeHeight,
    ) -> Result<(), OramError> {
        for depth in 0..=height {
            let bucket = physical_memory.read_db(leaf.node_on_path(depth, height))?;
            self.absorb(&bucket);
        }
        Ok(())
    }

    /// Evicts blocks from the stash into the path to `leaf`, deepest bucket first.
    /// Every bucket on the path is rewritten; slots that receive no block are emptied.
    pub fn write_to_path<const Z: BucketSize, T: Database<Bucket<V, Z>>>(
        &mut self,
        physical_memory: &mut T,
        leaf: TreeIndex,
        height: TreeHeight,
        position_map: &PositionMap,
    ) -> Result<(), OramError> {
        for depth in (0..=height).rev() {
            let candidates = self.candidates_for_node(leaf, depth, height, position_map)?;

            let mut new_bucket = Bucket::<V, Z>::default();
            for (slot, address) in new_bucket.blocks.iter_mut().zip(candidates) {
                if let Some(value) = self.remove(address) {
                    *slot = IdentifiedBlock { address, value };
                }
            }

            log::trace!(
                "Evicted {} blocks to depth {}, {} remain stashed",
                new_bucket.occupancy(),
                depth,
                self.blocks.len()
            );

            physical_memory.write_db(leaf.node_on_path(depth, height), new_bucket)?;
        }

        Ok(())
    }
}
