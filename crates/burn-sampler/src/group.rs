use core::ops::Range;

use crate::SamplerError;

/// Environment variable holding the total number of replicas.
pub const WORLD_SIZE_ENV: &str = "WORLD_SIZE";
/// Environment variable holding the rank of the current replica.
pub const RANK_ENV: &str = "RANK";

/// Represents the set of cooperating replicas a dataset is partitioned across.
///
/// A `ReplicaGroup` is the number of worker processes taking part in data parallel
/// training, together with the rank of the current process. Every replica builds its
/// own sampler from the same dataset length and group size; only the rank differs,
/// which is what makes the resulting shards line up across processes.
///
/// The group is always valid once built: there is at least one replica and the rank
/// is in `[0, num_replicas)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ReplicaGroup {
    num_replicas: usize,
    rank: usize,
}

impl ReplicaGroup {
    /// A group with a single replica, which owns the whole dataset.
    pub fn single() -> Self {
        Self {
            num_replicas: 1,
            rank: 0,
        }
    }

    /// Reads the group from the `WORLD_SIZE` and `RANK` environment variables.
    ///
    /// Missing variables fall back to a single replica and rank 0, which is what a
    /// process launched without a distributed launcher expects.
    #[cfg(feature = "std")]
    pub fn from_env() -> Result<Self, SamplerError> {
        let num_replicas = read_env_var(WORLD_SIZE_ENV)?.unwrap_or(1);
        let rank = read_env_var(RANK_ENV)?.unwrap_or(0);

        ReplicaGroupBuilder::new(num_replicas)
            .with_rank(rank)
            .build()
    }

    /// Total number of replicas in the group.
    pub fn num_replicas(&self) -> usize {
        self.num_replicas
    }

    /// Rank of the current replica.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Whether the current replica is rank 0.
    pub fn is_primary(&self) -> bool {
        self.rank == 0
    }

    /// All the ranks of the group.
    pub fn ranks(&self) -> Range<usize> {
        0..self.num_replicas
    }

    /// The same group seen from another rank.
    pub fn with_rank(self, rank: usize) -> Result<Self, SamplerError> {
        ReplicaGroupBuilder::new(self.num_replicas)
            .with_rank(rank)
            .build()
    }
}

impl Default for ReplicaGroup {
    fn default() -> Self {
        Self::single()
    }
}

#[cfg(feature = "std")]
fn read_env_var(name: &str) -> Result<Option<usize>, SamplerError> {
    match std::env::var(name) {
        Ok(value) => value.trim().parse::<usize>().map(Some).map_err(|err| {
            SamplerError::Environment(format!("{name}={value:?} is not a valid count: {err}"))
        }),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(SamplerError::Environment(format!("{name}: {err}"))),
    }
}

/// A builder for constructing a [`ReplicaGroup`].
///
/// The rank defaults to 0. Validation happens in [`build`](ReplicaGroupBuilder::build).
#[derive(Clone, Debug)]
pub struct ReplicaGroupBuilder {
    num_replicas: usize,
    rank: usize,
}

impl ReplicaGroupBuilder {
    /// Creates a new [`ReplicaGroupBuilder`] for the given number of replicas.
    ///
    /// # Arguments
    /// * `num_replicas` - The number of processes taking part in the group.
    pub fn new(num_replicas: usize) -> Self {
        Self {
            num_replicas,
            rank: 0,
        }
    }

    /// Sets the rank of the current replica.
    ///
    /// # Example
    ///
    /// ```rust
    /// use burn_sampler::ReplicaGroupBuilder;
    ///
    /// let group = ReplicaGroupBuilder::new(8)
    ///     .with_rank(3)
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(group.rank(), 3);
    /// ```
    pub fn with_rank(mut self, rank: usize) -> Self {
        self.rank = rank;
        self
    }

    /// Builds a [`ReplicaGroup`] from the current configuration.
    ///
    /// # Returns
    /// A `ReplicaGroup` if the configuration is valid, or a `SamplerError` if the
    /// replica count is zero or the rank is out of range.
    pub fn build(self) -> Result<ReplicaGroup, SamplerError> {
        if self.num_replicas == 0 {
            return Err(SamplerError::InvalidReplicaCount(self.num_replicas));
        }

        if self.rank >= self.num_replicas {
            return Err(SamplerError::InvalidRank {
                rank: self.rank,
                num_replicas: self.num_replicas,
            });
        }

        Ok(ReplicaGroup {
            num_replicas: self.num_replicas,
            rank: self.rank,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn test_replica_group_8() {
        let group = ReplicaGroupBuilder::new(8).build();

        assert_eq!(
            group,
            Ok(ReplicaGroup {
                num_replicas: 8,
                rank: 0
            })
        );
    }

    #[test]
    fn test_replica_group_ranks() {
        let group = ReplicaGroupBuilder::new(4).with_rank(2).build().unwrap();

        assert!(!group.is_primary());
        assert_eq!(group.ranks().collect::<Vec<_>>(), [0, 1, 2, 3]);
    }

    #[test]
    fn test_replica_group_with_rank_keeps_size() {
        let group = ReplicaGroup::single();

        assert_eq!(
            group.with_rank(1),
            Err(SamplerError::InvalidRank {
                rank: 1,
                num_replicas: 1
            })
        );
    }

    #[test]
    #[should_panic = "InvalidReplicaCount(0)"]
    fn test_replica_group_should_have_replicas() {
        let _group = ReplicaGroupBuilder::new(0).build().unwrap();
    }

    #[test]
    #[should_panic = "InvalidRank { rank: 8, num_replicas: 8 }"]
    fn test_replica_group_rank_should_be_in_bound() {
        let _group = ReplicaGroupBuilder::new(8)
            .with_rank(8) // out of bounds
            .build()
            .unwrap();
    }
}
