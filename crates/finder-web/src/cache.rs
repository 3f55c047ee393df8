//! Fetched result pages, kept so that filter, sort and section-page links re-render
//! from the page already loaded instead of searching again.
//!
//! Entries are keyed by the full server query `(location, healthIssue, page, per_page)`.
//! Only successful responses are stored.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

use finder_common::model::HospitalSearchResponse;
use finder_common::search_api::HospitalQuery;

pub const PAGE_CACHE_CAPACITY: usize = 64;
pub const PAGE_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Clone)]
pub struct PageCache {
    capacity: usize,
    ttl: Duration,
    entries: Arc<Mutex<VecDeque<Entry>>>,
}

struct Entry {
    query: HospitalQuery,
    response: HospitalSearchResponse,
    stored_at: Instant,
}

impl Default for PageCache {
    fn default() -> Self {
        Self::new(PAGE_CACHE_CAPACITY, PAGE_CACHE_TTL)
    }
}

impl PageCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl,
            entries: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub async fn get(&self, query: &HospitalQuery) -> Option<HospitalSearchResponse> {
        let mut entries = self.entries.lock().await;
        let ttl = self.ttl;
        entries.retain(|e| e.stored_at.elapsed() < ttl);
        let hit = entries
            .iter()
            .find(|e| &e.query == query)
            .map(|e| e.response.clone());
        if hit.is_some() {
            debug!(location = %query.location, page = query.page, "result page cache hit");
        }
        hit
    }

    pub async fn insert(&self, query: HospitalQuery, response: HospitalSearchResponse) {
        let mut entries = self.entries.lock().await;
        entries.retain(|e| e.query != query);
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(Entry {
            query,
            response,
            stored_at: Instant::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use finder_common::model::{Availability, GroupedHospitals};

    use super::*;

    fn query(page: u32) -> HospitalQuery {
        HospitalQuery {
            location: "Dothan, AL".to_string(),
            health_issue: "flu".to_string(),
            page,
            per_page: 10,
        }
    }

    fn response(total_pages: u32) -> HospitalSearchResponse {
        HospitalSearchResponse {
            hospitals: GroupedHospitals::default(),
            availability: Availability::default(),
            total: 0,
            page: 1,
            per_page: 10,
            total_pages,
        }
    }

    #[tokio::test]
    async fn pages_are_keyed_by_the_whole_query() {
        let cache = PageCache::default();
        cache.insert(query(1), response(4)).await;

        assert_eq!(cache.get(&query(1)).await.map(|r| r.total_pages), Some(4));
        assert!(cache.get(&query(2)).await.is_none());
    }

    #[tokio::test]
    async fn oldest_page_is_evicted_at_capacity() {
        let cache = PageCache::new(2, PAGE_CACHE_TTL);
        cache.insert(query(1), response(1)).await;
        cache.insert(query(2), response(2)).await;
        cache.insert(query(3), response(3)).await;

        assert!(cache.get(&query(1)).await.is_none());
        assert!(cache.get(&query(2)).await.is_some());
        assert!(cache.get(&query(3)).await.is_some());
    }

    #[tokio::test]
    async fn expired_pages_are_dropped() {
        let cache = PageCache::new(4, Duration::ZERO);
        cache.insert(query(1), response(1)).await;
        assert!(cache.get(&query(1)).await.is_none());
    }
}
