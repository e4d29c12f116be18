// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Utilities: complete binary tree addressing and random leaf generation.
//!
//! The tree is stored in array form: index 0 is the root, the parent of index `i` is `(i + 1) / 2 - 1`,
//! and the `2^height` leaves occupy the second half of the array.
//! Leaves are named by their leaf number in `[0, 2^height)`.

use crate::{Address, BucketSize, OramError};
use rand::distributions::{Distribution, Uniform};
use rand::{CryptoRng, RngCore};

pub(crate) type TreeIndex = u64;
pub(crate) type TreeHeight = u64;

pub(crate) trait CompleteBinaryTreeIndex
where
    Self: Sized,
{
    fn node_on_path(&self, depth: TreeHeight, height: TreeHeight) -> Self;
    fn parent(&self) -> Self;
    fn is_leaf(&self, height: TreeHeight) -> bool;
}

impl CompleteBinaryTreeIndex for TreeIndex {
    /// The receiver is a leaf number. Returns the array index of the node at `depth` (0 = root, `height` = leaf level)
    /// on the path from the root to that leaf.
    fn node_on_path(&self, depth: TreeHeight, height: TreeHeight) -> Self {
        // We only call this method when the receiver is a leaf, and on depths along its path.
        debug_assert!(self.is_leaf(height));
        debug_assert!(depth <= height);

        let number_of_leaves: TreeIndex = 1u64 << height;
        let mut node = self + number_of_leaves - 1;
        for _ in depth..height {
            node = node.parent();
        }
        node
    }

    fn parent(&self) -> Self {
        (self + 1) / 2 - 1
    }

    fn is_leaf(&self, height: TreeHeight) -> bool {
        *self < (1u64 << height)
    }
}

/// The number of buckets `2^(height + 1) - 1` in a tree of the given height.
pub(crate) fn bucket_count(height: TreeHeight) -> Result<Address, OramError> {
    let shift: u32 = (height + 1).try_into()?;
    let nodes = 1u64
        .checked_shl(shift)
        .ok_or(OramError::InvalidConfigurationError)?;
    Ok(nodes - 1)
}

/// The number of leaves `2^height` in a tree of the given height.
pub(crate) fn leaf_count(height: TreeHeight) -> Result<TreeIndex, OramError> {
    Ok((bucket_count(height)? + 1) / 2)
}

/// The number of addresses `Z * bucket_count(height)` supported by a tree of the given height.
pub(crate) fn address_count(height: TreeHeight, z: BucketSize) -> Result<Address, OramError> {
    let z: Address = z.try_into()?;
    bucket_count(height)?
        .checked_mul(z)
        .ok_or(OramError::InvalidConfigurationError)
}

/// Draws leaf numbers uniformly and independently from `[0, 2^height)`.
/// The underlying generator is owned and never exposed.
pub(crate) struct RandomLeafGenerator<R> {
    rng: R,
    leaves: Uniform<TreeIndex>,
}

impl<R: RngCore + CryptoRng> RandomLeafGenerator<R> {
    pub fn new(height: TreeHeight, rng: R) -> Result<Self, OramError> {
        let leaves = Uniform::new(0, leaf_count(height)?);
        Ok(Self { rng, leaves })
    }

    pub fn random_leaf(&mut self) -> TreeIndex {
        self.leaves.sample(&mut self.rng)
    }
}

impl<R> std::fmt::Debug for RandomLeafGenerator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomLeafGenerator").finish_non_exhaustive()
    }
}
