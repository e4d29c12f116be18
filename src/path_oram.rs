// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! An implementation of Path ORAM with a client-side stash and (non-recursive) position map.

use crate::{
    bucket::Bucket,
    database::{CountAccessesDatabase, Database},
    position_map::PositionMap,
    stash::Stash,
    utils::{self, RandomLeafGenerator, TreeHeight},
    Address, BucketSize, Oram, OramBlock, OramError,
};
use rand::{rngs::StdRng, CryptoRng, RngCore, SeedableRng};
use std::mem;

/// The parameter "Z" from the Path ORAM literature that sets the number of blocks per bucket; typical values are 3 or 4.
/// Here we adopt the more conservative setting of 4.
pub const DEFAULT_BLOCKS_PER_BUCKET: BucketSize = 4;

/// A Path ORAM over a tree of configurable height.
///
/// ## Parameters
///
/// - Block type `V`: the type of elements stored by the ORAM, typically [`BlockValue<B>`](crate::BlockValue)
///     for blocks of `B` bytes.
/// - Bucket size `Z`: the number of blocks per bucket. Must be at least 1.
/// - Height `L` (a constructor argument): the tree has `2^(L+1) - 1` buckets and `2^L` leaves,
///     and the ORAM supports the addresses `0 <= address < Z * (2^(L+1) - 1)`.
/// - Randomness source `R`: draws the leaf each block is assigned to.
///     Obliviousness rests on these draws, so `R` must be a cryptographically secure generator.
///
/// ## Security
///
/// Every access reads and then rewrites exactly the `L + 1` buckets on one root-to-leaf path.
/// That path was drawn uniformly at random when the requested address was last accessed,
/// so the sequence of paths reveals nothing about the requested addresses or the kind of operation.
///
/// The stash is not bounded. Its size is not observable through the storage,
/// but a client that runs out of memory reveals that it has grown.
/// Buckets of size 4 with the tree well below full occupancy keep the stash small in practice.
/// Instances must not be shared between concurrent callers without external synchronization;
/// the `&mut self` receivers of [`Oram`] enforce this.
#[derive(Debug)]
pub struct PathOram<V: OramBlock, const Z: BucketSize, R = StdRng> {
    /// The underlying untrusted memory that the ORAM is obliviously accessing on behalf of its client.
    pub(crate) physical_memory: CountAccessesDatabase<Bucket<V, Z>>,
    /// The Path ORAM stash.
    pub(crate) stash: Stash<V>,
    /// The Path ORAM position map.
    pub(crate) position_map: PositionMap,
    /// Source of fresh leaves.
    leaves: RandomLeafGenerator<R>,
    /// The height of the Path ORAM tree data structure.
    pub(crate) height: TreeHeight,
    block_capacity: Address,
    bucket_count: Address,
}

impl<V: OramBlock, const Z: BucketSize> PathOram<V, Z, StdRng> {
    /// Returns a new `PathOram` of height `height` whose randomness is seeded from the operating system.
    ///
    /// # Errors
    ///
    /// See [`PathOram::with_rng`].
    pub fn new(height: TreeHeight) -> Result<Self, OramError> {
        Self::with_rng(height, StdRng::from_entropy())
    }
}

impl<V: OramBlock, const Z: BucketSize, R: RngCore + CryptoRng> PathOram<V, Z, R> {
    /// Returns a new `PathOram` of height `height` mapping every supported address to `V::default()`,
    /// drawing leaves from `rng`.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidConfigurationError` if `Z` is 0,
    /// if the number of buckets or addresses does not fit in an `Address`,
    /// or if the tree cannot be allocated.
    pub fn with_rng(height: TreeHeight, rng: R) -> Result<Self, OramError> {
        log::info!(
            "PathOram::new(height = {}, B = {}, Z = {})",
            height,
            mem::size_of::<V>(),
            Z
        );

        if Z == 0 {
            return Err(OramError::InvalidConfigurationError);
        }

        let bucket_count = utils::bucket_count(height)?;
        let block_capacity = utils::address_count(height, Z)?;

        // Every bucket starts out with only empty slots; blocks enter the tree on first access.
        let physical_memory: CountAccessesDatabase<Bucket<V, Z>> = Database::new(bucket_count)?;

        let mut leaves = RandomLeafGenerator::new(height, rng)?;
        let position_map = PositionMap::new(block_capacity, &mut leaves)?;

        log::info!(
            "PathOram initialized with {} buckets and capacity {}",
            bucket_count,
            block_capacity
        );

        Ok(Self {
            physical_memory,
            stash: Stash::new(),
            position_map,
            leaves,
            height,
            block_capacity,
            bucket_count,
        })
    }
}

impl<V: OramBlock, const Z: BucketSize, R> PathOram<V, Z, R> {
    /// The height `L` of the tree.
    pub fn height(&self) -> TreeHeight {
        self.height
    }

    /// The number of buckets `2^(L+1) - 1` in the tree.
    pub fn bucket_count(&self) -> Address {
        self.bucket_count
    }

    /// The number of leaves `2^L` in the tree.
    pub fn leaf_count(&self) -> Address {
        (self.bucket_count + 1) / 2
    }

    /// The untrusted storage holding the bucket tree, as seen by its holder.
    pub fn physical_memory(&self) -> &CountAccessesDatabase<Bucket<V, Z>> {
        &self.physical_memory
    }

    #[cfg(test)]
    pub(crate) fn stash_occupancy(&self) -> Result<crate::StashSize, OramError> {
        self.stash.occupancy()
    }
}

impl<V: OramBlock, const Z: BucketSize, R: RngCore + CryptoRng> Oram for PathOram<V, Z, R> {
    type V = V;

    fn block_capacity(&self) -> Result<Address, OramError> {
        Ok(self.block_capacity)
    }

    fn access(&mut self, address: Address, optional_new_value: Option<V>) -> Result<V, OramError> {
        // This check is not oblivious, but only leaks whether the address is well-formed or not.
        if address >= self.block_capacity {
            return Err(OramError::AddressOutOfBoundsError {
                address,
                capacity: self.block_capacity,
            });
        }

        // Remember the path the target block currently lives on,
        // and assign the block a fresh random path before touching the tree.
        let position = self.position_map.get(address)?;
        let new_position = self.leaves.random_leaf();
        self.position_map.set(address, new_position)?;

        log::debug!("PathOram access to address {} on leaf {}", address, position);

        self.stash
            .read_from_path(&mut self.physical_memory, position, self.height)?;

        let result = self.stash.get(address);
        if let Some(new_value) = optional_new_value {
            self.stash.put(address, new_value);
        }

        // Evict blocks from the stash into the path that was just read.
        self.stash.write_to_path(
            &mut self.physical_memory,
            position,
            self.height,
            &self.position_map,
        )?;

        Ok(result)
    }
}
