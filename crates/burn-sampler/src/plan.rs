use alloc::vec::Vec;
use hashbrown::HashMap;

use crate::{DistributedSampler, SamplerError, TailPolicy};

/// The shards of every replica of a group for one epoch.
///
/// A replica only ever needs its own shard, but the plan is useful to inspect how a
/// dataset is partitioned: which indices are iterated twice because of padding and which
/// ones are never iterated because the tail was dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShardPlan {
    shards: Vec<Vec<usize>>,
}

impl ShardPlan {
    /// Computes the shards of all the ranks of the sampler's group at its current epoch.
    pub fn new(sampler: &DistributedSampler) -> Self {
        let num_replicas = sampler.group().num_replicas();
        let mut shards = vec_of_shards(num_replicas, sampler.num_samples());

        for (position, index) in sampler.global_order().into_iter().enumerate() {
            shards[position % num_replicas].push(index);
        }

        Self { shards }
    }

    /// Number of replicas of the plan.
    pub fn num_replicas(&self) -> usize {
        self.shards.len()
    }

    /// The shard of a rank.
    pub fn shard(&self, rank: usize) -> Result<&[usize], SamplerError> {
        self.shards
            .get(rank)
            .map(Vec::as_slice)
            .ok_or(SamplerError::InvalidShard {
                rank,
                num_replicas: self.num_replicas(),
            })
    }

    /// All the shards, indexed by rank.
    pub fn shards(&self) -> &[Vec<usize>] {
        &self.shards
    }

    /// Dataset indices iterated more than once across the group, sorted.
    pub fn duplicates(&self) -> Vec<usize> {
        let mut duplicates: Vec<usize> = self
            .occurrences()
            .into_iter()
            .filter_map(|(index, count)| (count > 1).then_some(index))
            .collect();

        duplicates.sort_unstable();
        duplicates
    }

    /// Number of extra iterations caused by padding.
    pub fn num_duplicated(&self) -> usize {
        self.occurrences().values().map(|count| count - 1).sum()
    }

    /// Dataset indices never iterated by the group, sorted.
    pub fn missing(&self, dataset_len: usize) -> Vec<usize> {
        let occurrences = self.occurrences();

        (0..dataset_len)
            .filter(|index| !occurrences.contains_key(index))
            .collect()
    }

    /// Checks the coverage of the dataset against the tail policy.
    ///
    /// Padding must iterate every index at least once, dropping must never iterate an
    /// index twice.
    pub fn check_coverage(&self, dataset_len: usize, tail: TailPolicy) -> Result<(), SamplerError> {
        let missing = self.missing(dataset_len).len();
        let duplicated = self.num_duplicated();

        let valid = match tail {
            TailPolicy::Wrap | TailPolicy::DuplicateLast => missing == 0,
            TailPolicy::Drop => duplicated == 0,
        };

        if !valid {
            return Err(SamplerError::InvalidCoverage {
                tail,
                missing,
                duplicated,
            });
        }

        Ok(())
    }

    fn occurrences(&self) -> HashMap<usize, usize> {
        let mut occurrences = HashMap::new();

        for index in self.shards.iter().flatten() {
            *occurrences.entry(*index).or_insert(0) += 1;
        }

        occurrences
    }
}

fn vec_of_shards(num_replicas: usize, num_samples: usize) -> Vec<Vec<usize>> {
    (0..num_replicas)
        .map(|_| Vec::with_capacity(num_samples))
        .collect()
}
