use std::path::PathBuf;

use burn_sampler::{
    DistributedSampler, ReplicaGroup, SamplerConfig, SamplerError, ShardPlan, TailPolicy,
};
use clap::{Parser, ValueEnum};

/// Builds a distributed sampler with a fixed configuration.
///
/// Without arguments the sampler covers a dataset of 12345 items split across 8
/// replicas, seen from rank 0, unshuffled and padded by duplicating the last index.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct SmokeArgs {
    /// Number of items in the fake dataset.
    #[arg(long, default_value_t = 12345)]
    pub dataset_len: usize,
    /// Number of replicas.
    #[arg(long, default_value_t = 8)]
    pub num_replicas: usize,
    /// Rank of the replica.
    #[arg(long, default_value_t = 0)]
    pub rank: usize,
    /// Shuffle the order at every epoch.
    #[arg(long)]
    pub shuffle: bool,
    /// How the tail of the dataset is evened out.
    #[arg(long, value_enum, default_value_t = TailArg::DuplicateLast)]
    pub tail: TailArg,
    /// Shuffle seed.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
    /// Epoch of the sampler.
    #[arg(long, default_value_t = 0)]
    pub epoch: u64,
    /// Read the sampler config from a JSON file instead of the flags above.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Write the effective sampler config to a JSON file.
    #[arg(long)]
    pub save_config: Option<PathBuf>,
    /// Take the replica count and rank from WORLD_SIZE and RANK.
    #[arg(long)]
    pub from_env: bool,
    /// Also build the shards of every rank and check their coverage.
    #[arg(long)]
    pub verify: bool,
    /// Log at debug level.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Tail policy as accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailArg {
    /// Pad with indices from the start of the order.
    Wrap,
    /// Pad by repeating the last index.
    DuplicateLast,
    /// Drop the tail.
    Drop,
}

impl From<TailArg> for TailPolicy {
    fn from(value: TailArg) -> Self {
        match value {
            TailArg::Wrap => TailPolicy::Wrap,
            TailArg::DuplicateLast => TailPolicy::DuplicateLast,
            TailArg::Drop => TailPolicy::Drop,
        }
    }
}

impl SmokeArgs {
    /// The sampler config described by the arguments.
    pub fn sampler_config(&self) -> Result<SamplerConfig, SamplerError> {
        let mut config = match &self.config {
            Some(path) => SamplerConfig::load(path)?,
            None => SamplerConfig::new(self.num_replicas)
                .with_rank(self.rank)
                .with_shuffle(self.shuffle)
                .with_seed(self.seed)
                .with_tail(self.tail.into()),
        };

        if self.from_env {
            let group = ReplicaGroup::from_env()?;
            config.num_replicas = group.num_replicas();
            config.rank = group.rank();
        }

        Ok(config)
    }
}

/// What the smoke test built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeReport {
    /// Samples iterated by the replica per epoch.
    pub num_samples: usize,
    /// Samples iterated by the group per epoch.
    pub total_size: usize,
    /// Extra iterations caused by padding, when verified.
    pub num_duplicated: Option<usize>,
}

/// Builds the sampler, failing on any construction error.
pub fn run(args: &SmokeArgs) -> Result<SmokeReport, SamplerError> {
    let config = args.sampler_config()?;

    if let Some(path) = &args.save_config {
        config.save(path)?;
    }

    let mut sampler = DistributedSampler::from_config(args.dataset_len, &config)?;
    sampler.set_epoch(args.epoch);

    log::debug!(
        "Built sampler for rank {}/{}: {} samples per replica, {} in total",
        sampler.group().rank(),
        sampler.group().num_replicas(),
        sampler.num_samples(),
        sampler.total_size(),
    );

    let num_duplicated = if args.verify {
        Some(verify(&sampler)?)
    } else {
        None
    };

    Ok(SmokeReport {
        num_samples: sampler.num_samples(),
        total_size: sampler.total_size(),
        num_duplicated,
    })
}

fn verify(sampler: &DistributedSampler) -> Result<usize, SamplerError> {
    let plan = ShardPlan::new(sampler);

    for rank in sampler.group().ranks() {
        let shard = plan.shard(rank)?;
        if shard.len() != sampler.num_samples() {
            return Err(SamplerError::InvalidShard {
                rank,
                num_replicas: plan.num_replicas(),
            });
        }
    }

    plan.check_coverage(sampler.dataset_len(), sampler.tail())?;
    let num_duplicated = plan.num_duplicated();

    log::info!(
        "Verified {} shards: {} duplicated",
        plan.num_replicas(),
        num_duplicated,
    );

    Ok(num_duplicated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_sampler::{RANK_ENV, WORLD_SIZE_ENV};
    use serial_test::serial;

    fn parse(args: &[&str]) -> SmokeArgs {
        let argv = std::iter::once("burn-sampler-smoke").chain(args.iter().copied());
        SmokeArgs::parse_from(argv)
    }

    #[test]
    fn test_defaults_match_fixed_arguments() {
        let args = parse(&[]);
        let config = args.sampler_config().unwrap();

        assert_eq!(args.dataset_len, 12345);
        assert_eq!(
            config,
            SamplerConfig::new(8)
                .with_shuffle(false)
                .with_duplicate_last(true)
        );
    }

    #[test]
    fn test_run_defaults() {
        let report = run(&parse(&["--verify"])).unwrap();

        assert_eq!(
            report,
            SmokeReport {
                num_samples: 1544,
                total_size: 12352,
                num_duplicated: Some(7),
            }
        );
    }

    #[test]
    fn test_run_drop() {
        let args = parse(&["--tail", "drop", "--shuffle", "--epoch", "3"]);
        let report = run(&args).unwrap();

        assert_eq!(report.num_samples, 1543);
        assert_eq!(report.num_duplicated, None);
    }

    #[test]
    fn test_run_rejects_rank() {
        let result = run(&parse(&["--rank", "8"]));

        assert_eq!(
            result,
            Err(SamplerError::InvalidRank {
                rank: 8,
                num_replicas: 8
            })
        );
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sampler.json");
        let path_arg = path.to_str().unwrap();

        let save = parse(&["--num-replicas", "3", "--save-config", path_arg]);
        let load = parse(&["--config", path_arg, "--num-replicas", "5"]);
        let saved = run(&save).unwrap();
        let loaded = run(&load).unwrap();

        assert_eq!(saved, loaded);
        assert_eq!(loaded.num_samples, 4115);
    }

    #[test]
    #[serial]
    fn test_from_env_overrides_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sampler.json");
        SamplerConfig::new(8)
            .with_shuffle(false)
            .save(&path)
            .unwrap();
        let path_arg = path.to_str().unwrap();

        unsafe {
            std::env::set_var(WORLD_SIZE_ENV, "4");
            std::env::set_var(RANK_ENV, "3");
        }
        let from_flags = parse(&["--num-replicas", "8", "--rank", "1", "--from-env"]);
        let config = from_flags.sampler_config();
        let report = run(&from_flags);
        let from_file = parse(&["--config", path_arg, "--from-env"]);
        let from_file = from_file.sampler_config();

        unsafe {
            std::env::set_var(RANK_ENV, "4");
        }
        let invalid = run(&parse(&["--from-env"]));

        unsafe {
            std::env::remove_var(WORLD_SIZE_ENV);
            std::env::remove_var(RANK_ENV);
        }

        let config = config.unwrap();
        assert_eq!((config.num_replicas, config.rank), (4, 3));
        assert_eq!(report.unwrap().num_samples, 3087);

        let from_file = from_file.unwrap();
        assert_eq!((from_file.num_replicas, from_file.rank), (4, 3));
        assert!(!from_file.shuffle);

        assert_eq!(
            invalid,
            Err(SamplerError::InvalidRank {
                rank: 4,
                num_replicas: 4
            })
        );
    }
}
