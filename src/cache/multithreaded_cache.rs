use super::{Clock, MenuCache, SystemClock};
use crate::error::Result;
use crate::fetch::{fetch_menus, MenuUrls, Transport};
use crate::menu::MenuSnapshot;
use chrono::NaiveDate;
use std::sync::Arc;

use futures_locks::RwLock;

/// Cache shared between request handlers and the refresh task, in front of the orchestrator.
pub struct MultithreadedCache<T, C = SystemClock> {
    cache: RwLock<MenuCache<C>>,
    transport: T,
    urls: MenuUrls,
}

impl<T: Transport, C: Clock> MultithreadedCache<T, C> {
    pub fn new(cache: MenuCache<C>, transport: T, urls: MenuUrls) -> Self {
        Self {
            cache: RwLock::new(cache),
            transport,
            urls,
        }
    }

    /// Cached snapshot for `date`, fetching it on a miss.
    pub async fn get(&self, date: NaiveDate) -> Result<Arc<MenuSnapshot>> {
        let hit = self.cache.read().await.get(date);
        match hit {
            Some(snapshot) => Ok(snapshot),
            None => self.refresh(date).await,
        }
    }

    /// Fetches `date` regardless of what is cached and stores the result.
    /// The lock is only taken once the fetch is done.
    pub async fn refresh(&self, date: NaiveDate) -> Result<Arc<MenuSnapshot>> {
        let snapshot = fetch_menus(&self.transport, &self.urls, date).await?;
        let mut guard = self.cache.write().await;
        let snapshot = guard.insert(date, snapshot);
        log::debug!("cached menus for {date}, {} days held", guard.entry_count());
        Ok(snapshot)
    }
}
