use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

/// Specifies how a dataset that does not divide evenly across replicas is handled.
///
/// Every replica must iterate the same number of samples per epoch, otherwise the
/// collective operations of data parallel training would wait on a replica that has
/// already finished. The tail policy decides how the global order is evened out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TailPolicy {
    /// Pad the order with indices taken again from its start.
    #[default]
    Wrap,
    /// Pad the order by repeating its last index.
    DuplicateLast,
    /// Drop the tail of the order so that it divides evenly.
    Drop,
}

impl TailPolicy {
    /// Selects the policy matching the usual `drop_last` and `duplicate_last` flags.
    ///
    /// Dropping takes precedence over padding.
    pub fn from_flags(drop_last: bool, duplicate_last: bool) -> Self {
        match (drop_last, duplicate_last) {
            (true, _) => Self::Drop,
            (false, true) => Self::DuplicateLast,
            (false, false) => Self::Wrap,
        }
    }

    /// Whether the policy adds indices to the order.
    pub fn pads(&self) -> bool {
        !matches!(self, Self::Drop)
    }

    /// Number of samples each replica iterates per epoch.
    pub fn num_samples(&self, dataset_len: usize, num_replicas: usize) -> usize {
        match self {
            Self::Drop => dataset_len / num_replicas,
            Self::Wrap | Self::DuplicateLast => dataset_len.div_ceil(num_replicas),
        }
    }

    /// Number of samples iterated by the whole group per epoch.
    ///
    /// Returns `None` when padding the dataset would overflow `usize`.
    pub fn total_size(&self, dataset_len: usize, num_replicas: usize) -> Option<usize> {
        self.num_samples(dataset_len, num_replicas)
            .checked_mul(num_replicas)
    }

    /// Evens out `indices` to exactly `total_size` entries.
    ///
    /// An empty order is left untouched, there is nothing to pad it with.
    pub fn apply(&self, indices: &mut Vec<usize>, total_size: usize) {
        let len = indices.len();

        if len >= total_size {
            indices.truncate(total_size);
            return;
        }

        let padding = total_size - len;

        match self {
            Self::Wrap => {
                let head: Vec<usize> = indices.iter().copied().cycle().take(padding).collect();
                indices.extend(head);
            }
            Self::DuplicateLast => {
                if let Some(&last) = indices.last() {
                    indices.resize(total_size, last);
                }
            }
            // The total size for `Drop` never exceeds the length.
            Self::Drop => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use rstest::rstest;

    #[rstest]
    #[case(TailPolicy::Wrap, 12345, 8, 1544)]
    #[case(TailPolicy::DuplicateLast, 12345, 8, 1544)]
    #[case(TailPolicy::Drop, 12345, 8, 1543)]
    #[case(TailPolicy::Wrap, 16, 8, 2)]
    #[case(TailPolicy::Drop, 16, 8, 2)]
    #[case(TailPolicy::Wrap, 3, 8, 1)]
    #[case(TailPolicy::Drop, 3, 8, 0)]
    #[case(TailPolicy::Wrap, 0, 8, 0)]
    fn test_num_samples(
        #[case] policy: TailPolicy,
        #[case] dataset_len: usize,
        #[case] num_replicas: usize,
        #[case] expected: usize,
    ) {
        assert_eq!(policy.num_samples(dataset_len, num_replicas), expected);
        assert_eq!(
            policy.total_size(dataset_len, num_replicas),
            Some(expected * num_replicas)
        );
    }

    #[test]
    fn test_wrap_pads_from_start() {
        let mut indices = vec![0, 1, 2, 3, 4];
        TailPolicy::Wrap.apply(&mut indices, 8);

        assert_eq!(indices, [0, 1, 2, 3, 4, 0, 1, 2]);
    }

    #[test]
    fn test_wrap_repeats_when_padding_exceeds_len() {
        let mut indices = vec![7, 9];
        TailPolicy::Wrap.apply(&mut indices, 7);

        assert_eq!(indices, [7, 9, 7, 9, 7, 9, 7]);
    }

    #[test]
    fn test_duplicate_last_repeats_last() {
        let mut indices = vec![4, 2, 0, 3, 1];
        TailPolicy::DuplicateLast.apply(&mut indices, 8);

        assert_eq!(indices, [4, 2, 0, 3, 1, 1, 1, 1]);
    }

    #[test]
    fn test_drop_truncates() {
        let mut indices = vec![0, 1, 2, 3, 4];
        TailPolicy::Drop.apply(&mut indices, TailPolicy::Drop.total_size(5, 2).unwrap());

        assert_eq!(indices, [0, 1, 2, 3]);
    }

    #[test]
    fn test_empty_order_is_not_padded() {
        for policy in [TailPolicy::Wrap, TailPolicy::DuplicateLast, TailPolicy::Drop] {
            let mut indices = vec![];
            policy.apply(&mut indices, 8);

            assert!(indices.is_empty());
        }
    }

    #[test]
    fn test_total_size_overflow() {
        assert_eq!(TailPolicy::Wrap.total_size(usize::MAX, 2), None);
        assert_eq!(TailPolicy::DuplicateLast.total_size(usize::MAX, 2), None);
        assert_eq!(
            TailPolicy::Drop.total_size(usize::MAX, 2),
            Some(usize::MAX - 1)
        );
    }

    #[test]
    fn test_from_flags() {
        assert_eq!(TailPolicy::from_flags(false, false), TailPolicy::Wrap);
        assert_eq!(TailPolicy::from_flags(false, true), TailPolicy::DuplicateLast);
        assert_eq!(TailPolicy::from_flags(true, true), TailPolicy::Drop);
        assert!(!TailPolicy::Drop.pads());
    }
}
