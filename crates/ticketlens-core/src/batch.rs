//! Lazy fixed-size batching of an item stream.

/// Maximum number of texts the annotation service accepts per batch call.
pub const MAX_BATCH_SIZE: usize = 25;

/// Iterator adapter yielding `Vec`s of exactly `size` items, except possibly
/// the last, which holds the remainder. Never yields an empty batch.
///
/// Pulls from the inner iterator only as each batch is requested.
#[derive(Debug, Clone)]
pub struct Batches<I> {
    inner: I,
    size: usize,
}

impl<I: Iterator> Iterator for Batches<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut batch = Vec::with_capacity(self.size);
        for item in self.inner.by_ref() {
            batch.push(item);
            if batch.len() == self.size {
                break;
            }
        }
        if batch.is_empty() { None } else { Some(batch) }
    }
}

pub trait BatchExt: Iterator + Sized {
    /// Group items into batches of `size`.
    ///
    /// # Panics
    ///
    /// Panics if `size` is 0.
    fn batches(self, size: usize) -> Batches<Self> {
        assert!(size > 0, "batch size must be non-zero");
        Batches { inner: self, size }
    }
}

impl<I: Iterator> BatchExt for I {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(n: usize, size: usize) -> Vec<usize> {
        (0..n).batches(size).map(|b| b.len()).collect()
    }

    #[test]
    fn empty_input_yields_no_batches() {
        assert!(sizes(0, MAX_BATCH_SIZE).is_empty());
    }

    #[test]
    fn batch_counts_and_sizes() {
        for n in 1..=80 {
            let got = sizes(n, MAX_BATCH_SIZE);
            assert_eq!(got.len(), n.div_ceil(MAX_BATCH_SIZE), "n = {n}");
            let (last, full) = got.split_last().unwrap();
            assert!(full.iter().all(|&s| s == MAX_BATCH_SIZE), "n = {n}");
            let expected_last = match n % MAX_BATCH_SIZE {
                0 => MAX_BATCH_SIZE,
                rem => rem,
            };
            assert_eq!(*last, expected_last, "n = {n}");
        }
    }

    #[test]
    fn order_is_preserved() {
        let flat: Vec<usize> = (0..60).batches(25).flatten().collect();
        assert_eq!(flat, (0..60).collect::<Vec<_>>());
    }

    #[test]
    fn pulls_lazily() {
        let mut pulled = 0;
        let mut batches = (0..100)
            .inspect(|_| pulled += 1)
            .batches(MAX_BATCH_SIZE);
        let first = batches.next().unwrap();
        assert_eq!(first.len(), MAX_BATCH_SIZE);
        drop(batches);
        assert_eq!(pulled, MAX_BATCH_SIZE);
    }

    #[test]
    #[should_panic(expected = "batch size must be non-zero")]
    fn zero_size_panics() {
        let _ = (0..3).batches(0);
    }
}
