//! Mini-batch index sequencing for epoch-based training loops.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::ops::Range;

/// Partitions `num_items` dataset items into consecutive batches.
///
/// Batch `i` (0-indexed) covers the half-open range
/// `[i * batch_size, min((i + 1) * batch_size, num_items))`, so every batch
/// is full except possibly the last.
#[derive(Debug, Clone)]
pub struct DataSequence {
    num_items: usize,
    batch_size: usize,
}

impl DataSequence {
    pub fn new(num_items: usize, batch_size: usize) -> Self {
        assert!(batch_size >= 1, "batch_size must be at least 1");
        Self {
            num_items,
            batch_size,
        }
    }

    /// Number of batches in one epoch.
    pub fn len(&self) -> usize {
        self.num_items.div_ceil(self.batch_size)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_items(&self) -> usize {
        self.num_items
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Item range of batch `index`.
    pub fn get(&self, index: usize) -> Range<usize> {
        assert!(
            index < self.len(),
            "batch index {index} out of range for {} batches",
            self.len()
        );
        let low = self.batch_size * index;
        // Capped at `num_items`; the last batch may be smaller when
        // `num_items` is not a multiple of `batch_size`.
        let high = usize::min(low + self.batch_size, self.num_items);
        low..high
    }

    /// Iterates over the batch ranges of one epoch.
    pub fn iter(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.len()).map(|index| self.get(index))
    }
}

/// Permutation source for [`ShuffledDataSequence`].
///
/// Alternate numeric backends can supply both the initial index arrangement
/// and the in-place shuffle.
pub trait ShuffleStrategy {
    /// Initial `0..num_items` index arrangement.
    fn arrange(&mut self, num_items: usize) -> Vec<usize> {
        (0..num_items).collect()
    }

    /// Permutes `indexes` in place, uniformly at random.
    fn shuffle(&mut self, indexes: &mut [usize]);
}

/// Default [`ShuffleStrategy`]: Fisher-Yates over a [`StdRng`].
#[derive(Debug, Clone)]
pub struct RandStrategy {
    rng: StdRng,
}

impl RandStrategy {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible shuffles from a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ShuffleStrategy for RandStrategy {
    fn shuffle(&mut self, indexes: &mut [usize]) {
        indexes.shuffle(&mut self.rng);
    }
}

/// A [`DataSequence`] plus an index permutation, re-shuffled between epochs.
///
/// Each batch pairs its item range with the corresponding slice of the
/// permutation: the dataset positions to load for that batch. Across one
/// epoch the slices cover every position exactly once.
#[derive(Debug, Clone)]
pub struct ShuffledDataSequence<S: ShuffleStrategy = RandStrategy> {
    sequence: DataSequence,
    shuffle: bool,
    strategy: S,
    indexes: Vec<usize>,
}

impl ShuffledDataSequence<RandStrategy> {
    pub fn new(num_items: usize, batch_size: usize, shuffle: bool) -> Self {
        Self::with_strategy(num_items, batch_size, shuffle, RandStrategy::new())
    }
}

impl<S: ShuffleStrategy> ShuffledDataSequence<S> {
    pub fn with_strategy(num_items: usize, batch_size: usize, shuffle: bool, mut strategy: S) -> Self {
        let indexes = strategy.arrange(num_items);
        assert_eq!(num_items, indexes.len());

        let mut this = Self {
            sequence: DataSequence::new(num_items, batch_size),
            shuffle,
            strategy,
            indexes,
        };
        // The first epoch is served shuffled as well.
        this.on_epoch_end();
        this
    }

    /// Number of batches in one epoch.
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn num_items(&self) -> usize {
        self.sequence.num_items()
    }

    pub fn batch_size(&self) -> usize {
        self.sequence.batch_size()
    }

    /// Item range of batch `index`, plus the dataset positions to load for it.
    pub fn get(&self, index: usize) -> (Range<usize>, &[usize]) {
        let range = self.sequence.get(index);
        let positions = &self.indexes[range.clone()];
        (range, positions)
    }

    /// Re-permutes the index list; call between epochs.
    ///
    /// No-op when shuffling is disabled.
    pub fn on_epoch_end(&mut self) {
        if self.shuffle {
            self.strategy.shuffle(&mut self.indexes);
        }
    }
}
