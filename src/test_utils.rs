// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Common test utilities: workloads, monitors wrapping a `PathOram`, and test-generating macros.

use crate::database::{CountAccessesDatabase, SimpleDatabase};
use crate::path_oram::PathOram;
use crate::utils::CompleteBinaryTreeIndex;
use crate::{Address, BucketSize, Oram, OramBlock, OramError, StashSize};
use duplicate::duplicate_item;
use rand::{
    distributions::{Distribution, Standard},
    rngs::StdRng,
    Rng, SeedableRng,
};
use simplelog::{Config, WriteLogger};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Once;

static INIT: Once = Once::new();

// For use in manual testing and inspection.
pub(crate) fn init_logger() {
    INIT.call_once(|| {
        WriteLogger::init(log::LevelFilter::Info, Config::default(), std::io::stdout()).unwrap()
    })
}

pub(crate) trait Testable {
    fn test_hook(&self) {}
}

#[duplicate_item(
    database_type;
    [SimpleDatabase];
    [CountAccessesDatabase];
)]
impl<V: OramBlock> Testable for database_type<V> {}

impl<V: OramBlock, const Z: BucketSize> Testable for PathOram<V, Z> {}

/// Tests the correctness of an `Oram` on a workload of random reads and writes over its whole address range.
pub(crate) fn test_correctness_random_workload<T: Oram + Testable>(mut oram: T, num_operations: u32)
where
    Standard: Distribution<T::V>,
{
    init_logger();
    let mut rng = StdRng::seed_from_u64(0);

    let capacity = oram.block_capacity().unwrap();
    let mut mirror_array = vec![T::V::default(); capacity as usize];

    for _ in 0..num_operations {
        let random_index = rng.gen_range(0..capacity);
        let random_block_value = rng.gen::<T::V>();

        let read_versus_write = rng.gen::<bool>();

        if read_versus_write {
            assert_eq!(
                oram.read(random_index).unwrap(),
                mirror_array[random_index as usize]
            );
        } else {
            oram.write(random_index, random_block_value).unwrap();
            mirror_array[random_index as usize] = random_block_value;
        }
    }

    for index in 0..capacity {
        assert_eq!(
            oram.read(index).unwrap(),
            mirror_array[index as usize],
            "{index}"
        )
    }

    oram.test_hook();
}

/// Tests the correctness of an `Oram` on repeated passes of sequential accesses 0, 1, ..., `capacity - 1`.
pub(crate) fn test_correctness_linear_workload<T: Oram + Testable>(mut oram: T, num_operations: u32)
where
    Standard: Distribution<T::V>,
{
    init_logger();
    let mut rng = StdRng::seed_from_u64(0);

    let capacity = oram.block_capacity().unwrap();
    let mut mirror_array = vec![T::V::default(); capacity as usize];

    let num_passes = u64::from(num_operations) / capacity;

    for _ in 0..num_passes {
        for index in 0..capacity {
            let random_block_value = rng.gen::<T::V>();

            let read_versus_write: bool = rng.gen::<bool>();

            if read_versus_write {
                assert_eq!(oram.read(index).unwrap(), mirror_array[index as usize]);
            } else {
                oram.write(index, random_block_value).unwrap();
                mirror_array[index as usize] = random_block_value;
            }
        }
    }

    for index in 0..capacity {
        assert_eq!(
            oram.read(index).unwrap(),
            mirror_array[index as usize],
            "{index}"
        )
    }

    oram.test_hook();
}

macro_rules! monitor_boilerplate {
    () => {
        type V = V;

        fn block_capacity(&self) -> Result<Address, OramError> {
            self.oram.block_capacity()
        }
    };
}

/// Records the largest stash seen after any access, and checks it against `bound` in the test hook.
#[derive(Debug)]
pub(crate) struct StashSizeMonitor<V: OramBlock, const Z: BucketSize> {
    oram: PathOram<V, Z>,
    bound: StashSize,
    max_stash_size: StashSize,
}

impl<V: OramBlock, const Z: BucketSize> StashSizeMonitor<V, Z> {
    pub fn new(oram: PathOram<V, Z>, bound: StashSize) -> Self {
        Self {
            oram,
            bound,
            max_stash_size: 0,
        }
    }
}

impl<V: OramBlock, const Z: BucketSize> Oram for StashSizeMonitor<V, Z> {
    monitor_boilerplate!();

    fn access(&mut self, index: Address, optional_new_value: Option<V>) -> Result<V, OramError> {
        let result = self.oram.access(index, optional_new_value)?;
        self.max_stash_size = self.max_stash_size.max(self.oram.stash_occupancy()?);
        Ok(result)
    }
}

impl<V: OramBlock, const Z: BucketSize> Testable for StashSizeMonitor<V, Z> {
    fn test_hook(&self) {
        log::info!(
            "Maximum stash size {} (height {}, Z = {})",
            self.max_stash_size,
            self.oram.height(),
            Z
        );
        assert!(self.max_stash_size <= self.bound);
    }
}

/// Checks after every access that each address accessed so far is stored exactly once,
/// either in the stash or in a bucket on the path to its assigned leaf.
#[derive(Debug)]
pub(crate) struct ResidenceMonitor<V: OramBlock, const Z: BucketSize> {
    oram: PathOram<V, Z>,
    accessed: BTreeSet<Address>,
}

impl<V: OramBlock, const Z: BucketSize> ResidenceMonitor<V, Z> {
    pub fn new(oram: PathOram<V, Z>) -> Self {
        Self {
            oram,
            accessed: BTreeSet::new(),
        }
    }

    fn check_residence(&self) {
        let oram = &self.oram;
        let height = oram.height();

        let mut tree_locations: BTreeMap<Address, Vec<Address>> = BTreeMap::new();
        for (node, bucket) in oram.physical_memory().iter().enumerate() {
            for block in bucket.blocks.iter().filter(|block| !block.is_empty()) {
                tree_locations
                    .entry(block.address)
                    .or_default()
                    .push(node as Address);
            }
        }

        for address in oram.stash.addresses() {
            assert!(
                !tree_locations.contains_key(address),
                "{address} is in both the stash and the tree"
            );
            assert!(self.accessed.contains(address));
        }

        for (address, nodes) in &tree_locations {
            assert!(self.accessed.contains(address));
            assert_eq!(nodes.len(), 1, "{address} is stored {} times", nodes.len());
            let leaf = oram.position_map.get(*address).unwrap();
            let on_path = (0..=height).any(|depth| leaf.node_on_path(depth, height) == nodes[0]);
            assert!(on_path, "{address} is off the path to leaf {leaf}");
        }

        let stored = tree_locations.len() as StashSize + oram.stash_occupancy().unwrap();
        assert_eq!(stored, self.accessed.len() as StashSize);
    }
}

impl<V: OramBlock, const Z: BucketSize> Oram for ResidenceMonitor<V, Z> {
    monitor_boilerplate!();

    fn access(&mut self, index: Address, optional_new_value: Option<V>) -> Result<V, OramError> {
        let result = self.oram.access(index, optional_new_value)?;
        self.accessed.insert(index);
        self.check_residence();
        Ok(result)
    }
}

impl<V: OramBlock, const Z: BucketSize> Testable for ResidenceMonitor<V, Z> {}

/// Checks that every access reads and writes exactly the `height + 1` buckets of a single root-to-leaf path.
#[derive(Debug)]
pub(crate) struct PhysicalAccessCountMonitor<V: OramBlock, const Z: BucketSize> {
    oram: PathOram<V, Z>,
}

impl<V: OramBlock, const Z: BucketSize> PhysicalAccessCountMonitor<V, Z> {
    pub fn new(oram: PathOram<V, Z>) -> Self {
        Self { oram }
    }
}

impl<V: OramBlock, const Z: BucketSize> Oram for PhysicalAccessCountMonitor<V, Z> {
    monitor_boilerplate!();

    fn access(&mut self, index: Address, optional_new_value: Option<V>) -> Result<V, OramError> {
        let pre_reads = self.oram.physical_memory().reads.clone();
        let pre_writes = self.oram.physical_memory().writes.clone();

        let result = self.oram.access(index, optional_new_value);

        let memory = self.oram.physical_memory();
        let path_length = self.oram.height() + 1;

        let mut touched = Vec::new();
        for node in 0..pre_reads.len() {
            let reads = memory.reads[node] - pre_reads[node];
            let writes = memory.writes[node] - pre_writes[node];
            assert_eq!(reads, writes);
            assert!(reads <= 1);
            if reads == 1 {
                touched.push(node as Address);
            }
        }
        assert_eq!(touched.len() as u64, path_length);

        // The touched nodes form a chain from a leaf up to the root.
        for pair in touched.windows(2) {
            assert_eq!(pair[1].parent(), pair[0]);
        }
        assert_eq!(touched[0], 0);

        result
    }
}

impl<V: OramBlock, const Z: BucketSize> Testable for PhysicalAccessCountMonitor<V, Z> {
    fn test_hook(&self) {
        let memory = self.oram.physical_memory();
        assert_eq!(memory.get_read_count(), memory.get_write_count());
    }
}

macro_rules! create_path_oram_correctness_tests {
    ($bucket_size: literal, $height: literal, $block_size: literal, $iterations_to_test: literal) => {
        paste::paste! {
            #[test]
            fn [<test_correctness_random_workload_z $bucket_size _height $height _block $block_size _ $iterations_to_test>]() {
                let oram = PathOram::<BlockValue<$block_size>, $bucket_size>::with_rng(
                    $height,
                    StdRng::seed_from_u64(0),
                )
                .unwrap();
                test_correctness_random_workload(oram, $iterations_to_test);
            }

            #[test]
            fn [<test_correctness_linear_workload_z $bucket_size _height $height _block $block_size _ $iterations_to_test>]() {
                let oram = PathOram::<BlockValue<$block_size>, $bucket_size>::with_rng(
                    $height,
                    StdRng::seed_from_u64(0),
                )
                .unwrap();
                test_correctness_linear_workload(oram, $iterations_to_test);
            }
        }
    };
}

macro_rules! create_database_correctness_test {
    ($function_name: ident, $database_type: ident, $block_size: literal, $block_capacity: literal, $iterations_to_test: literal) => {
        paste::paste! {
            #[test]
            fn [<$function_name _ $database_type:snake _ $block_capacity _ $block_size _ $iterations_to_test>]() {
                let database =
                    <$database_type<$block_size, BlockValue<$block_size>> as Database<BlockValue<$block_size>>>::new(
                        $block_capacity,
                    )
                    .unwrap();
                $function_name(database, $iterations_to_test);
            }
        }
    };
}

macro_rules! create_database_correctness_tests {
    ($database_type: ident) => {
        create_database_correctness_test!(test_correctness_random_workload, $database_type, 2, 8, 100);
        create_database_correctness_test!(test_correctness_random_workload, $database_type, 16, 64, 1000);
        create_database_correctness_test!(test_correctness_linear_workload, $database_type, 2, 8, 100);
        create_database_correctness_test!(test_correctness_linear_workload, $database_type, 16, 64, 1000);
    };
}

pub(crate) use create_database_correctness_test;
pub(crate) use create_database_correctness_tests;
pub(crate) use create_path_oram_correctness_tests;
