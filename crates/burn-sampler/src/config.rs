use serde::{Deserialize, Serialize};

use crate::{ReplicaGroup, ReplicaGroupBuilder, SamplerError, TailPolicy};

/// Configuration to create a [distributed sampler](crate::DistributedSampler).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Number of replicas the dataset is partitioned across.
    pub num_replicas: usize,
    /// Rank of the current replica.
    #[serde(default)]
    pub rank: usize,
    /// Whether the order is shuffled at every epoch.
    #[serde(default = "default_shuffle")]
    pub shuffle: bool,
    /// Seed of the shuffle, must be the same on every replica.
    #[serde(default)]
    pub seed: u64,
    /// How the tail of the dataset is evened out across replicas.
    #[serde(default)]
    pub tail: TailPolicy,
}

fn default_shuffle() -> bool {
    true
}

impl SamplerConfig {
    /// Create a new config for the given number of replicas.
    ///
    /// Rank 0, shuffled with seed 0, padded by wrapping around.
    pub fn new(num_replicas: usize) -> Self {
        Self {
            num_replicas,
            rank: 0,
            shuffle: default_shuffle(),
            seed: 0,
            tail: TailPolicy::default(),
        }
    }

    /// Set the rank.
    pub fn with_rank(mut self, rank: usize) -> Self {
        self.rank = rank;
        self
    }

    /// Set whether the order is shuffled.
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Set the shuffle seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the tail policy.
    pub fn with_tail(mut self, tail: TailPolicy) -> Self {
        self.tail = tail;
        self
    }

    /// Pad with the last index instead of wrapping around.
    ///
    /// Has no effect when the tail is dropped.
    pub fn with_duplicate_last(mut self, duplicate_last: bool) -> Self {
        self.tail = TailPolicy::from_flags(self.tail == TailPolicy::Drop, duplicate_last);
        self
    }

    /// Drop the tail instead of padding.
    pub fn with_drop_last(mut self, drop_last: bool) -> Self {
        self.tail = TailPolicy::from_flags(drop_last, self.tail == TailPolicy::DuplicateLast);
        self
    }

    /// Validates the replica layout of the config.
    pub fn group(&self) -> Result<ReplicaGroup, SamplerError> {
        ReplicaGroupBuilder::new(self.num_replicas)
            .with_rank(self.rank)
            .build()
    }

    /// Save the config as pretty JSON.
    #[cfg(feature = "std")]
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), SamplerError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .map_err(|err| SamplerError::Config(format!("Can't serialize config: {err}")))?;

        std::fs::write(path, json).map_err(|err| {
            SamplerError::Config(format!("Can't write config to {}: {err}", path.display()))
        })?;
        log::debug!("Saved sampler config to {}", path.display());

        Ok(())
    }

    /// Load the config from a JSON file.
    #[cfg(feature = "std")]
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self, SamplerError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            SamplerError::Config(format!("Can't read config from {}: {err}", path.display()))
        })?;

        Self::load_binary(content.as_bytes())
    }

    /// Load the config from JSON bytes.
    pub fn load_binary(data: &[u8]) -> Result<Self, SamplerError> {
        serde_json::from_slice(data).map_err(|err| {
            SamplerError::Config(alloc::format!("Can't deserialize config: {err}"))
        })
    }
}
