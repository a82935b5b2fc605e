use alloc::vec::{IntoIter, Vec};

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::{ReplicaGroup, SamplerConfig, SamplerError, TailPolicy};

/// Produces the indices of a dataset to iterate during an epoch.
pub trait Sampler {
    /// Number of indices produced per epoch.
    fn len(&self) -> usize;

    /// Indices to iterate, in order.
    fn indices(&self) -> Vec<usize>;

    /// Returns true if no index is produced.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over the indices.
    fn iter(&self) -> IntoIter<usize> {
        self.indices().into_iter()
    }
}

/// Iterates over a dataset in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequentialSampler {
    dataset_len: usize,
}

impl SequentialSampler {
    /// Creates a sampler over a dataset of `dataset_len` items.
    pub fn new(dataset_len: usize) -> Self {
        Self { dataset_len }
    }
}

impl Sampler for SequentialSampler {
    fn len(&self) -> usize {
        self.dataset_len
    }

    fn indices(&self) -> Vec<usize> {
        (0..self.dataset_len).collect()
    }
}

/// Restricts data loading to the shard of one replica.
///
/// Each replica of a data parallel run constructs a `DistributedSampler` with the same
/// dataset length, group size, seed and epoch. The sampler builds the global order of
/// the epoch, shuffled or not, evens it out with its [tail policy](TailPolicy), and keeps
/// every `num_replicas`-th index starting at its rank. The shards of the different ranks
/// are therefore the same size and, up to padding, disjoint.
///
/// The dataset itself is never touched; only its length matters.
///
/// # Example
///
/// ```rust
/// use burn_sampler::{DistributedSampler, Sampler, SamplerConfig};
///
/// let dataset: Vec<usize> = (0..12345).collect();
/// let config = SamplerConfig::new(8)
///     .with_shuffle(false)
///     .with_duplicate_last(true);
///
/// let sampler = DistributedSampler::from_config(dataset.len(), &config).unwrap();
///
/// assert_eq!(sampler.len(), 1544);
/// assert_eq!(sampler.total_size(), 12352);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistributedSampler {
    dataset_len: usize,
    group: ReplicaGroup,
    shuffle: bool,
    seed: u64,
    tail: TailPolicy,
    epoch: u64,
    num_samples: usize,
    total_size: usize,
}

impl DistributedSampler {
    /// Creates a sampler for the shard of `group`'s rank.
    ///
    /// Fails when the padded dataset length doesn't fit in a `usize`.
    pub fn new(
        dataset_len: usize,
        group: ReplicaGroup,
        shuffle: bool,
        seed: u64,
        tail: TailPolicy,
    ) -> Result<Self, SamplerError> {
        let num_replicas = group.num_replicas();
        let num_samples = tail.num_samples(dataset_len, num_replicas);
        let total_size = tail
            .total_size(dataset_len, num_replicas)
            .ok_or(SamplerError::DatasetTooLarge {
                dataset_len,
                num_replicas,
            })?;

        log::debug!(
            "Sampler for rank {}/{}: {} samples, {} in total, dataset of {} ({:?}, shuffle: {})",
            group.rank(),
            num_replicas,
            num_samples,
            total_size,
            dataset_len,
            tail,
            shuffle,
        );

        Ok(Self {
            dataset_len,
            group,
            shuffle,
            seed,
            tail,
            epoch: 0,
            num_samples,
            total_size,
        })
    }

    /// Creates a sampler from a config, validating its replica layout.
    pub fn from_config(dataset_len: usize, config: &SamplerConfig) -> Result<Self, SamplerError> {
        let group = config.group()?;

        Self::new(
            dataset_len,
            group,
            config.shuffle,
            config.seed,
            config.tail,
        )
    }

    /// Sets the epoch, which changes the shuffled order.
    ///
    /// Must be called with the same value on every replica before each epoch, otherwise
    /// all epochs iterate the same order.
    pub fn set_epoch(&mut self, epoch: u64) {
        self.epoch = epoch;
    }

    /// The current epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Length of the sampled dataset.
    pub fn dataset_len(&self) -> usize {
        self.dataset_len
    }

    /// Number of samples iterated by this replica per epoch.
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Number of samples iterated by the whole group per epoch.
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// The replica group.
    pub fn group(&self) -> ReplicaGroup {
        self.group
    }

    /// The tail policy.
    pub fn tail(&self) -> TailPolicy {
        self.tail
    }

    /// Whether the order is shuffled.
    pub fn is_shuffled(&self) -> bool {
        self.shuffle
    }

    /// The shuffle seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The same sampler seen from another rank of the group.
    pub fn for_rank(&self, rank: usize) -> Result<Self, SamplerError> {
        let mut sampler = self.clone();
        sampler.group = self.group.with_rank(rank)?;

        Ok(sampler)
    }

    /// Global order of the current epoch, evened out to the total size.
    ///
    /// Identical on every rank.
    pub fn global_order(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.dataset_len).collect();

        if self.shuffle {
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(self.epoch));
            indices.shuffle(&mut rng);
        }

        self.tail.apply(&mut indices, self.total_size);
        indices
    }
}

impl Sampler for DistributedSampler {
    fn len(&self) -> usize {
        self.num_samples
    }

    fn indices(&self) -> Vec<usize> {
        let indices: Vec<usize> = self
            .global_order()
            .into_iter()
            .skip(self.group.rank())
            .step_by(self.group.num_replicas())
            .collect();

        debug_assert_eq!(indices.len(), self.num_samples);
        indices
    }
}
