//! Short-lived snapshot cache keyed by date.
//!
//! The cache is an ordinary value owned by whoever serves menus. Time comes from an
//! injected [`Clock`], so expiry can be tested without sleeping.
mod multithreaded_cache;

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::menu::MenuSnapshot;

pub use multithreaded_cache::MultithreadedCache as Multithreaded;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

#[derive(Debug)]
struct Entry {
    cached_at: DateTime<Utc>,
    snapshot: Arc<MenuSnapshot>,
}

#[derive(Debug)]
pub struct MenuCache<C = SystemClock> {
    entries: HashMap<NaiveDate, Entry>,
    ttl: Duration,
    capacity: NonZeroUsize,
    clock: C,
}

impl MenuCache {
    pub fn new(ttl: Duration, capacity: NonZeroUsize) -> Self {
        Self::with_clock(ttl, capacity, SystemClock)
    }
}

impl<C: Clock> MenuCache<C> {
    pub fn with_clock(ttl: Duration, capacity: NonZeroUsize, clock: C) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity.get()),
            ttl,
            capacity,
            clock,
        }
    }

    #[inline]
    fn is_fresh(&self, entry: &Entry, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(entry.cached_at) <= self.ttl
    }

    /// The cached snapshot for `date`, unless it is older than the ttl.
    pub fn get(&self, date: NaiveDate) -> Option<Arc<MenuSnapshot>> {
        let now = self.clock.now();
        self.entries
            .get(&date)
            .filter(|entry| self.is_fresh(entry, now))
            .map(|entry| Arc::clone(&entry.snapshot))
    }

    /// Stores `snapshot`, dropping expired entries first and the oldest one if still full.
    pub fn insert(&mut self, date: NaiveDate, snapshot: MenuSnapshot) -> Arc<MenuSnapshot> {
        let now = self.clock.now();
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| now.signed_duration_since(entry.cached_at) <= ttl);

        if !self.entries.contains_key(&date) && self.entries.len() >= self.capacity.get() {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.cached_at)
                .map(|(date, _)| *date);
            if let Some(oldest) = oldest {
                log::debug!("cache full, evicting {oldest}");
                self.entries.remove(&oldest);
            }
        }

        let snapshot = Arc::new(snapshot);
        self.entries.insert(
            date,
            Entry {
                cached_at: now,
                snapshot: Arc::clone(&snapshot),
            },
        );
        snapshot
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}
