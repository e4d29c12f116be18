// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Memory abstractions for Oblivious RAM.
//!
//! A `Database` models the untrusted storage holding the Path ORAM bucket tree.

use crate::{Address, Oram, OramBlock, OramError};
use duplicate::duplicate_item;

/// A simple Memory trait to model the storage the ORAM client is interacting with.
pub trait Database<V: OramBlock>
where
    Self: Sized,
{
    /// Returns a new `Database` filled with default values.
    fn new(number_of_addresses: Address) -> Result<Self, OramError>;
    /// Returns the number of values stored by `self`.
    fn capacity(&self) -> Result<Address, OramError>;
    /// Reads the value stored at `index`.
    fn read_db(&mut self, index: Address) -> Result<V, OramError>;
    /// Writes the value stored at `index`. Returns the value previously stored.
    fn write_db(&mut self, index: Address, value: V) -> Result<V, OramError>;
}

/// Allocates `length` copies of `value`, or fails if the allocation is impossible.
fn filled_vec<T: Clone>(length: Address, value: T) -> Result<Vec<T>, OramError> {
    let length: usize = length.try_into()?;
    let mut result = Vec::new();
    result
        .try_reserve_exact(length)
        .map_err(|_| OramError::InvalidConfigurationError)?;
    result.resize(length, value);
    Ok(result)
}

/// A simple Database that stores its data as a Vec.
#[derive(Debug)]
pub struct SimpleDatabase<V>(Vec<V>);

impl<V> SimpleDatabase<V> {
    /// Iterates over the stored values without counting as an access.
    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.0.iter()
    }
}

impl<V: OramBlock> Database<V> for SimpleDatabase<V> {
    fn new(number_of_addresses: Address) -> Result<Self, OramError> {
        Ok(Self(filled_vec(number_of_addresses, V::default())?))
    }

    fn capacity(&self) -> Result<Address, OramError> {
        Ok(self.0.len().try_into()?)
    }

    fn read_db(&mut self, index: Address) -> Result<V, OramError> {
        let index: usize = index.try_into()?;
        Ok(self.0[index])
    }

    fn write_db(&mut self, index: Address, value: V) -> Result<V, OramError> {
        let index: usize = index.try_into()?;
        let result = self.0[index];
        self.0[index] = value;
        Ok(result)
    }
}

/// A Database that counts reads and writes.
#[derive(Debug)]
pub struct CountAccessesDatabase<V> {
    data: SimpleDatabase<V>,
    /// `reads[i]` tracks the total number of reads made to index `i`.
    pub reads: Vec<u64>,
    /// `writes[i]` tracks the total number of writes made to index `i`.
    pub writes: Vec<u64>,
}

impl<V> CountAccessesDatabase<V> {
    /// Returns the total number of reads to the database.
    pub fn get_read_count(&self) -> u64 {
        self.reads.iter().sum()
    }

    /// Returns the total number of writes to the database.
    pub fn get_write_count(&self) -> u64 {
        self.writes.iter().sum()
    }

    /// Iterates over the stored values without counting as an access.
    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.data.iter()
    }
}

impl<V: OramBlock> Database<V> for CountAccessesDatabase<V> {
    fn new(number_of_addresses: Address) -> Result<Self, OramError> {
        Ok(Self {
            data: Database::new(number_of_addresses)?,
            reads: filled_vec(number_of_addresses, 0u64)?,
            writes: filled_vec(number_of_addresses, 0u64)?,
        })
    }

    fn read_db(&mut self, index: Address) -> Result<V, OramError> {
        log::debug!("Physical read -- {}", index);

        self.reads[usize::try_from(index)?] += 1;
        self.data.read_db(index)
    }

    fn write_db(&mut self, index: Address, value: V) -> Result<V, OramError> {
        log::debug!("Physical write -- {}", index);

        self.writes[usize::try_from(index)?] += 1;
        self.data.write_db(index, value)
    }

    fn capacity(&self) -> Result<Address, OramError> {
        self.data.capacity()
    }
}

// Implements `Oram` for each `T: Database` so that the same correctness tests can be used for both.
#[duplicate_item(
    database_type;
    [SimpleDatabase];
    [CountAccessesDatabase];
)]
impl<V: OramBlock> Oram for database_type<V> {
    type V = V;

    fn block_capacity(&self) -> Result<Address, OramError> {
        Database::capacity(self)
    }

    fn access(
        &mut self,
        index: Address,
        optional_new_value: Option<V>,
    ) -> Result<V, OramError> {
        let capacity = Database::capacity(self)?;
        if index >= capacity {
            return Err(OramError::AddressOutOfBoundsError {
                address: index,
                capacity,
            });
        }

        let value = self.read_db(index)?;
        if let Some(new_value) = optional_new_value {
            self.write_db(index, new_value)?;
        }
        Ok(value)
    }
}
