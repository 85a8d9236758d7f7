//! Positioning data cache
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use hifitime::{Duration, Epoch};
use log::{debug, trace, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::source::{EmitterId, FetchError, PositioningData, PositioningDataSource};

const fn default_capacity() -> usize {
    1000
}

const fn default_max_response_size() -> usize {
    100
}

fn default_sweep_interval() -> Duration {
    Duration::from_seconds(15.0 * 60.0)
}

/// [PositioningCache] options
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CacheOpts {
    /// Maximal number of entries. Least recently used entries
    /// are evicted past this point.
    #[cfg_attr(feature = "serde", serde(default = "default_capacity"))]
    pub capacity: usize,
    /// Maximal number of entries retained from a single source response
    #[cfg_attr(feature = "serde", serde(default = "default_max_response_size"))]
    pub max_response_size: usize,
    /// Entries that were not accessed during this interval are evicted
    #[cfg_attr(feature = "serde", serde(default = "default_sweep_interval"))]
    pub sweep_interval: Duration,
}

impl Default for CacheOpts {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            max_response_size: default_max_response_size(),
            sweep_interval: default_sweep_interval(),
        }
    }
}

impl CacheOpts {
    /// Copies and returns [CacheOpts] with updated capacity
    pub fn with_capacity(&self, capacity: usize) -> Self {
        let mut s = *self;
        s.capacity = capacity;
        s
    }

    /// Copies and returns [CacheOpts] with updated sweep interval
    pub fn with_sweep_interval(&self, interval: Duration) -> Self {
        let mut s = *self;
        s.sweep_interval = interval;
        s
    }
}

#[derive(Debug, Clone)]
struct Entry {
    /// None when the source does not know this emitter
    data: Option<PositioningData>,
    last_access: Epoch,
    /// Recency stamp: the least recent entry has the smallest stamp
    stamp: u64,
}

#[derive(Debug, Default)]
struct Entries {
    entries: HashMap<EmitterId, Entry>,
    clock: u64,
    last_sweep: Option<Epoch>,
}

impl Entries {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn lookup(&mut self, id: &EmitterId, now: Epoch) -> Option<Option<PositioningData>> {
        let stamp = self.tick();
        let entry = self.entries.get_mut(id)?;
        entry.last_access = now;
        entry.stamp = stamp;
        Some(entry.data)
    }

    fn insert(&mut self, id: EmitterId, data: Option<PositioningData>, now: Epoch, capacity: usize) {
        let stamp = self.tick();
        self.entries.insert(
            id,
            Entry {
                data,
                last_access: now,
                stamp,
            },
        );

        while self.entries.len() > capacity {
            let lru = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.stamp)
                .map(|(id, _)| *id);

            match lru {
                Some(lru) => {
                    trace!("evicted {}", lru);
                    self.entries.remove(&lru);
                },
                None => break,
            }
        }
    }

    fn sweep(&mut self, now: Epoch, interval: Duration) -> usize {
        let oldest = now - interval;
        let size = self.entries.len();
        self.entries.retain(|_, entry| entry.last_access >= oldest);
        self.last_sweep = Some(now);
        size - self.entries.len()
    }
}

/// [PositioningCache] is a bounded (LRU) cache in front of a [PositioningDataSource].
/// Negative responses (emitters unknown to the source) are cached as well.
/// Entries that were not accessed for a while are periodically swept: the sweep
/// runs lazily, on access, once the sweep interval has elapsed.
///
/// The cache may be shared between threads: the source is never invoked
/// while the cache is locked.
pub struct PositioningCache<S: PositioningDataSource> {
    source: S,
    opts: CacheOpts,
    entries: Mutex<Entries>,
}

impl<S: PositioningDataSource> PositioningCache<S> {
    /// Builds new [PositioningCache] with default [CacheOpts]
    pub fn new(source: S) -> Self {
        Self::with_opts(source, CacheOpts::default())
    }

    /// Builds new [PositioningCache] with these [CacheOpts]
    pub fn with_opts(source: S, opts: CacheOpts) -> Self {
        Self {
            source,
            opts,
            entries: Mutex::new(Entries::default()),
        }
    }

    /// Locks the cache. A poisoned lock is recovered: entries are
    /// plain data and remain valid.
    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Sweeps the cache if the sweep interval has elapsed
    fn maybe_sweep(&self, entries: &mut Entries, now: Epoch) {
        match entries.last_sweep {
            Some(last) => {
                if now - last >= self.opts.sweep_interval {
                    let removed = entries.sweep(now, self.opts.sweep_interval);
                    debug!("sweep: removed {} entries", removed);
                }
            },
            None => entries.last_sweep = Some(now),
        }
    }

    /// Returns [PositioningData] of this emitter.
    /// ## Input
    /// - id: [EmitterId]
    /// - only_cached: do not query the source on cache miss
    /// - now: current [Epoch]
    /// ## Returns
    /// - Ok(None) when the emitter is unknown (or not cached, when `only_cached`)
    /// - [FetchError] when the source could not be queried
    pub fn get(
        &self,
        id: &EmitterId,
        only_cached: bool,
        now: Epoch,
    ) -> Result<Option<PositioningData>, FetchError> {
        {
            let mut entries = self.lock();
            self.maybe_sweep(&mut entries, now);

            if let Some(data) = entries.lookup(id, now) {
                trace!("cache hit {}", id);
                return Ok(data);
            }
        }

        if only_cached {
            return Ok(None);
        }

        trace!("querying positioning data of {}", id);
        let response = self.source.fetch(&[*id])?;

        if response.len() > self.opts.max_response_size {
            warn!(
                "response size ({}) exceeds maximal response size ({})",
                response.len(),
                self.opts.max_response_size
            );
        }

        // the requested emitter is always retained, and inserted last
        let (requested, neighbors): (Vec<_>, Vec<_>) =
            response.into_iter().partition(|(emitter, _)| emitter == id);

        let requested = requested.into_iter().next();
        let neighbors_size = self
            .opts
            .max_response_size
            .saturating_sub(requested.iter().count());

        let mut entries = self.lock();

        for (emitter, data) in neighbors.into_iter().take(neighbors_size) {
            entries.insert(emitter, data, now, self.opts.capacity);
        }

        match requested {
            Some((emitter, data)) => {
                entries.insert(emitter, data, now, self.opts.capacity);
                Ok(data)
            },
            None => {
                warn!("{} is missing from the response", id);
                Ok(None)
            },
        }
    }

    /// Evicts entries that were not accessed during the last sweep interval,
    /// returns the number of evicted entries.
    pub fn sweep(&self, now: Epoch) -> usize {
        let removed = self.lock().sweep(now, self.opts.sweep_interval);
        debug!("sweep: removed {} entries", removed);
        removed
    }

    /// [PositioningDataSource] behind this cache
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Drops all entries
    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
