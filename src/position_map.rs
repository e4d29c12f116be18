// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! A non-recursive Path ORAM position map, held by the client.

use crate::utils::{RandomLeafGenerator, TreeIndex};
use crate::{Address, OramError};
use rand::{CryptoRng, RngCore};

/// Maps every address in `[0, capacity)` to the leaf whose path currently owns that address.
/// Addresses are validated by the caller.
#[derive(Debug)]
pub(crate) struct PositionMap {
    positions: Vec<TreeIndex>,
}

impl PositionMap {
    /// Assigns an independent uniformly random leaf to every address.
    pub fn new<R: RngCore + CryptoRng>(
        capacity: Address,
        leaves: &mut RandomLeafGenerator<R>,
    ) -> Result<Self, OramError> {
        let capacity: usize = capacity.try_into()?;
        let mut positions = Vec::new();
        positions
            .try_reserve_exact(capacity)
            .map_err(|_| OramError::InvalidConfigurationError)?;
        positions.extend((0..capacity).map(|_| leaves.random_leaf()));
        Ok(Self { positions })
    }

    pub fn get(&self, address: Address) -> Result<TreeIndex, OramError> {
        Ok(self.positions[usize::try_from(address)?])
    }

    pub fn set(&mut self, address: Address, leaf: TreeIndex) -> Result<(), OramError> {
        self.positions[usize::try_from(address)?] = leaf;
        Ok(())
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.positions.len()
    }
}
