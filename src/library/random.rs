//! Random track selection with a small prefetch pool.
//!
//! Picking a random track means counting the eligible tracks and then
//! reading one row at a random position. Counting is the expensive part on a
//! large index, so [`RandomSelectionBuffer`] counts once and reads a batch
//! of random positions, then serves the batch until it runs dry.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::MediaIndex;
use crate::model::{TrackFlags, TrackRecord};

/// Number of random picks fetched per refill.
pub const DEFAULT_POOL_SIZE: usize = 5;

struct Pool {
    slots: Vec<Option<TrackRecord>>,
    rng: StdRng,
}

impl Pool {
    /// Remove the most recently filled record.
    fn take_last(&mut self) -> Option<TrackRecord> {
        self.slots.iter_mut().rev().find_map(Option::take)
    }

    fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

/// Serves random tracks from a pool refilled in batches.
///
/// The pool lock is held for the whole refill, so a concurrent caller
/// either waits for the refill or sees the completed pool.
pub struct RandomSelectionBuffer {
    index: Arc<dyn MediaIndex>,
    pool: Mutex<Pool>,
}

impl RandomSelectionBuffer {
    /// Create an empty buffer holding up to `capacity` picks.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(index: Arc<dyn MediaIndex>, capacity: usize) -> Self {
        Self::with_rng(index, capacity, StdRng::from_os_rng())
    }

    /// Create a buffer with a deterministic random source.
    pub fn with_seed(index: Arc<dyn MediaIndex>, capacity: usize, seed: u64) -> Self {
        Self::with_rng(index, capacity, StdRng::seed_from_u64(seed))
    }

    fn with_rng(index: Arc<dyn MediaIndex>, capacity: usize, rng: StdRng) -> Self {
        assert!(capacity > 0, "random pool capacity must be at least 1");
        Self {
            index,
            pool: Mutex::new(Pool {
                slots: vec![None; capacity],
                rng,
            }),
        }
    }

    /// Maximum number of buffered picks.
    pub async fn capacity(&self) -> usize {
        self.pool.lock().await.slots.len()
    }

    /// Number of picks currently buffered.
    pub async fn len(&self) -> usize {
        self.pool.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every buffered pick, e.g. after the library changed.
    pub async fn clear(&self) {
        self.pool.lock().await.slots.fill(None);
    }

    /// Take a random track, refilling the pool if it is empty.
    ///
    /// Returns `None` when the index has no eligible tracks or every read
    /// of the refill failed.
    pub async fn next(&self) -> Option<TrackRecord> {
        let mut pool = self.pool.lock().await;
        if let Some(track) = pool.take_last() {
            return Some(track);
        }

        self.refill(&mut pool).await;
        pool.take_last()
    }

    /// One count query, then one positioned read per slot. A slot whose read
    /// fails stays empty until the next refill.
    async fn refill(&self, pool: &mut Pool) {
        let count = match self.index.count_eligible().await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "Failed to count tracks for random selection");
                return;
            }
        };

        if count == 0 {
            debug!("No eligible tracks for random selection");
            return;
        }

        for slot in 0..pool.slots.len() {
            let position = pool.rng.random_range(0..count);
            match self.index.eligible_at(position).await {
                Ok(Some(row)) => {
                    let mut track = TrackRecord::with_flags(row.id, TrackFlags::RANDOM);
                    track.populate(row);
                    pool.slots[slot] = Some(track);
                }
                Ok(None) => debug!(position, "Random pick vanished from index"),
                Err(e) => debug!(position, error = %e, "Random pick failed"),
            }
        }

        debug!(count, filled = pool.len(), "Refilled random pool");
    }
}
