use alloc::string::String;

use crate::TailPolicy;

/// Represents errors that can occur when building or querying a sampler.
///
/// These errors are typically related to an invalid replica layout, or to a
/// configuration that could not be read.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SamplerError {
    /// The number of replicas must be at least one.
    #[error("Invalid replica count {0}, expected at least 1")]
    InvalidReplicaCount(usize),
    /// The rank is not part of the replica group.
    #[error("Invalid rank {rank}, expected a value in [0, {num_replicas})")]
    InvalidRank {
        /// The requested rank.
        rank: usize,
        /// The number of replicas in the group.
        num_replicas: usize,
    },
    /// The dataset is too large to be evened out across the replicas.
    #[error("Dataset of {dataset_len} items can't be split across {num_replicas} replicas")]
    DatasetTooLarge {
        /// The length of the dataset.
        dataset_len: usize,
        /// The number of replicas in the group.
        num_replicas: usize,
    },
    /// A shard was requested for a rank outside of the plan.
    #[error("No shard for rank {rank} in a plan of {num_replicas} replicas")]
    InvalidShard {
        /// The requested rank.
        rank: usize,
        /// The number of replicas in the plan.
        num_replicas: usize,
    },
    /// A shard plan doesn't cover the dataset the way its tail policy requires.
    #[error("Shard plan for {tail:?} has {missing} missing and {duplicated} duplicated samples")]
    InvalidCoverage {
        /// The tail policy of the plan.
        tail: TailPolicy,
        /// Dataset indices never iterated.
        missing: usize,
        /// Extra iterations of already iterated indices.
        duplicated: usize,
    },
    /// The replica layout could not be read from the environment.
    #[error("Environment error: {0}")]
    Environment(String),
    /// The sampler configuration could not be saved or loaded.
    #[error("Config error: {0}")]
    Config(String),
}
