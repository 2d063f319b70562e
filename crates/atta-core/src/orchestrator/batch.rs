//! Splits a request slice into fixed-size contiguous batches.

use crate::error::PipelineError;
use crate::observer::PipelineObserver;

/// Position of one batch within a partition run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchInfo {
    /// Zero-based batch index.
    pub index: usize,
    /// Total number of batches (`ceil(n / batch_size)`).
    pub total: usize,
    /// Offset of the first element in the original sequence.
    pub start: usize,
    /// Offset of the last element in the original sequence (inclusive).
    pub end: usize,
}

#[allow(clippy::len_without_is_empty)]
impl BatchInfo {
    /// Number of items in the batch (always at least 1).
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }
}

/// A batch handed out by [`Batches`]: its position plus mutable access to its items.
#[derive(Debug)]
pub struct Batch<'a, T> {
    pub info: BatchInfo,
    pub items: &'a mut [T],
}

/// Lazy, finite iterator over contiguous batches of a mutable slice.
///
/// Every batch has `batch_size` items except possibly the last. The observer is
/// notified once per batch, before the batch is returned.
pub struct Batches<'a, T> {
    rest: &'a mut [T],
    batch_size: usize,
    next_index: usize,
    next_start: usize,
    total: usize,
    observer: &'a dyn PipelineObserver,
}

/// Partitions `items` into batches of `batch_size`. Empty input yields no batches.
pub fn partition<'a, T>(
    items: &'a mut [T],
    batch_size: usize,
    observer: &'a dyn PipelineObserver,
) -> Result<Batches<'a, T>, PipelineError> {
    if batch_size == 0 {
        return Err(PipelineError::InvalidBatchSize);
    }
    let total = items.len().div_ceil(batch_size);
    Ok(Batches {
        rest: items,
        batch_size,
        next_index: 0,
        next_start: 0,
        total,
        observer,
    })
}

impl<'a, T> Batches<'a, T> {
    /// Total number of batches this iterator produces.
    pub fn total(&self) -> usize {
        self.total
    }
}

impl<'a, T> Iterator for Batches<'a, T> {
    type Item = Batch<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let take = self.batch_size.min(self.rest.len());
        let (head, tail) = std::mem::take(&mut self.rest).split_at_mut(take);
        self.rest = tail;

        let info = BatchInfo {
            index: self.next_index,
            total: self.total,
            start: self.next_start,
            end: self.next_start + take - 1,
        };
        self.next_index += 1;
        self.next_start += take;

        self.observer.on_batch_start(&info);
        Some(Batch { info, items: head })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.next_index;
        (remaining, Some(remaining))
    }
}

impl<T> ExactSizeIterator for Batches<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NoopObserver;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StartRecorder {
        seen: Mutex<Vec<BatchInfo>>,
    }

    impl PipelineObserver for StartRecorder {
        fn on_batch_start(&self, batch: &BatchInfo) {
            self.seen.lock().unwrap().push(*batch);
        }
    }

    #[test]
    fn test_partition_sizes_and_offsets() {
        let mut items: Vec<u32> = (0..7).collect();
        let batches: Vec<(BatchInfo, Vec<u32>)> = partition(&mut items, 3, &NoopObserver)
            .unwrap()
            .map(|b| (b.info, b.items.to_vec()))
            .collect();

        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].0, BatchInfo { index: 0, total: 3, start: 0, end: 2 });
        assert_eq!(batches[1].0, BatchInfo { index: 1, total: 3, start: 3, end: 5 });
        assert_eq!(batches[2].0, BatchInfo { index: 2, total: 3, start: 6, end: 6 });
        assert_eq!(batches[0].1, vec![0, 1, 2]);
        assert_eq!(batches[2].1, vec![6]);
        assert_eq!(batches[2].0.len(), 1);
    }

    #[test]
    fn test_exact_multiple_has_no_short_batch() {
        let mut items: Vec<u32> = (0..4).collect();
        let infos: Vec<BatchInfo> = partition(&mut items, 2, &NoopObserver)
            .unwrap()
            .map(|b| b.info)
            .collect();
        assert_eq!(infos.len(), 2);
        assert!(infos.iter().all(|i| i.len() == 2 && i.total == 2));
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        let mut items: Vec<u32> = Vec::new();
        let recorder = StartRecorder::default();
        let batches = partition(&mut items, 5, &recorder).unwrap();
        assert_eq!(batches.total(), 0);
        assert_eq!(batches.count(), 0);
        assert!(recorder.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let mut items = vec![1, 2, 3];
        assert_eq!(
            partition(&mut items, 0, &NoopObserver).err(),
            Some(PipelineError::InvalidBatchSize)
        );
    }

    #[test]
    fn test_observer_notified_lazily_once_per_batch() {
        let mut items: Vec<u32> = (0..5).collect();
        let recorder = StartRecorder::default();
        let mut batches = partition(&mut items, 2, &recorder).unwrap();
        assert!(recorder.seen.lock().unwrap().is_empty());

        let first = batches.next().unwrap();
        assert_eq!(first.info.index, 0);
        assert_eq!(recorder.seen.lock().unwrap().len(), 1);

        let rest: Vec<_> = batches.map(|b| b.info.index).collect();
        assert_eq!(rest, vec![1, 2]);
        assert_eq!(recorder.seen.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_batches_allow_in_place_mutation() {
        let mut items: Vec<u32> = (0..5).collect();
        for batch in partition(&mut items, 2, &NoopObserver).unwrap() {
            for item in batch.items.iter_mut() {
                *item += batch.info.index as u32 * 100;
            }
        }
        assert_eq!(items, vec![0, 1, 102, 103, 204]);
    }
}
