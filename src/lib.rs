// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! An implementation of tree-based Oblivious RAM.
//!
//! The main type is [`PathOram`], which stores fixed-size blocks in a complete binary tree of buckets
//! so that every logical access touches exactly one uniformly random root-to-leaf path.
//!
//! ```
//! use tree_oram::{BlockValue, Oram, PathOram};
//!
//! # fn main() -> Result<(), tree_oram::OramError> {
//! let mut oram = PathOram::<BlockValue<1>, 2>::new(3)?;
//! oram.write(5, BlockValue::new([0xAB]))?;
//! assert_eq!(oram.read(5)?, BlockValue::new([0xAB]));
//! assert_eq!(oram.read(0)?, BlockValue::default());
//! assert!(oram.write(40, BlockValue::default()).is_err());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::cargo, clippy::doc_markdown, missing_docs, rustdoc::all)]

use std::num::TryFromIntError;
use thiserror::Error;

pub mod block_value;
pub mod bucket;
pub mod database;
pub mod path_oram;
mod position_map;
mod stash;
#[cfg(test)]
mod test_utils;
mod utils;

pub use crate::block_value::BlockValue;
pub use crate::path_oram::{PathOram, DEFAULT_BLOCKS_PER_BUCKET};

/// The numeric type used to specify the size of an ORAM block in bytes.
pub type BlockSize = usize;
/// The numeric type used to specify the size of an ORAM in blocks, and to index into the ORAM.
pub type Address = u64;
/// The numeric type used to specify the size of an ORAM bucket in blocks.
pub type BucketSize = usize;
/// Numeric type used to represent the size of a Path ORAM stash in blocks.
pub type StashSize = u64;

/// "Trait alias" for ORAM blocks: the values read and written by ORAMs.
pub trait OramBlock: Copy + Clone + std::fmt::Debug + Default + PartialEq {}

/// A list of error types which are produced during ORAM protocol execution.
#[derive(Error, Debug)]
pub enum OramError {
    /// Errors arising from conversions between integer types.
    #[error("Arithmetic error encountered.")]
    IntegerConversionError(#[from] TryFromIntError),
    /// Errors arising from attempting to make an ORAM access to an invalid address.
    #[error("Attempted to access address {address}, but the ORAM capacity is {capacity}.")]
    AddressOutOfBoundsError {
        /// The rejected address.
        address: Address,
        /// The number of addresses the ORAM supports.
        capacity: Address,
    },
    /// Errors arising from invalid parameters or configuration.
    #[error("Invalid configuration.")]
    InvalidConfigurationError,
}

/// Represents an oblivious RAM (ORAM) mapping addresses of type `Address` to values of type `V: OramBlock`.
pub trait Oram {
    /// The type of the values stored by the ORAM.
    type V: OramBlock;

    /// Returns the number of values stored by `self`.
    fn block_capacity(&self) -> Result<Address, OramError>;

    /// Performs a (oblivious) ORAM access.
    /// Returns the value `v` previously stored at `index`.
    /// If `optional_new_value` is `Some(new_value)`, `new_value` is stored at `index` afterwards.
    ///
    /// Reading or writing an address that has never been written behaves as if it held `Self::V::default()`.
    fn access(
        &mut self,
        index: Address,
        optional_new_value: Option<Self::V>,
    ) -> Result<Self::V, OramError>;

    /// Obliviously reads the value stored at `index`.
    fn read(&mut self, index: Address) -> Result<Self::V, OramError> {
        log::debug!("ORAM read: {}", index);
        self.access(index, None)
    }

    /// Obliviously writes `new_value` to `index`.
    fn write(&mut self, index: Address, new_value: Self::V) -> Result<(), OramError> {
        log::debug!("ORAM write: {}", index);
        self.access(index, Some(new_value))?;
        Ok(())
    }
}
