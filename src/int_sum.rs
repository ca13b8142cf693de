//! Summing counts, shared by the combiner and the reducer.

use wcbench_mr::task::Reducer;

/// Sums counts one by one. Overflow is not checked.
pub fn sum_counts(values: impl IntoIterator<Item = u64>) -> u64 {
    values.into_iter().fold(0, |total, count| total.wrapping_add(count))
}

/// Reduces all counts of a word to their sum. Used as both the combiner and the reducer.
#[derive(Clone, Copy, Debug, Default)]
pub struct IntSumReducer;

impl Reducer for IntSumReducer {
    type Value = u64;

    fn reduce<I>(&self, _key: &[u8], values: I) -> u64
    where
        I: Iterator<Item = u64>,
    {
        sum_counts(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums() {
        assert_eq!(sum_counts([1, 1, 1]), 3);
        assert_eq!(sum_counts(Vec::new()), 0);
        assert_eq!(IntSumReducer.reduce(b"cat", [2, 5, 1].into_iter()), 8);
    }

    #[test]
    fn combined_partial_sums_reduce_to_same_total() {
        let ones = vec![1u64; 10];
        let partial = ones.chunks(3).map(|chunk| sum_counts(chunk.iter().copied())).collect::<Vec<_>>();
        assert_eq!(sum_counts(partial), sum_counts(ones));
    }
}
