//! Typeahead state for the location and condition pickers.
//!
//! Every keystroke may issue a query. Responses can resolve out of order; each query
//! takes a generation ticket and only the response to the latest one is applied.

use std::future::Future;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::generation::GenerationGate;
use crate::model::{Location, LocationField};
use crate::notify::Notification;
use crate::search_api::{ApiError, HospitalSearchApi};

pub const LOCATION_MIN_QUERY_LEN: usize = 2;

/// Anything a picker can show and store once selected.
pub trait Suggestion: Clone + Send {
    fn display_value(&self) -> &str;
}

impl Suggestion for Location {
    fn display_value(&self) -> &str {
        &self.display_string
    }
}

impl Suggestion for String {
    fn display_value(&self) -> &str {
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutocompletePolicy {
    /// Trimmed queries shorter than this issue no request and clear results.
    pub min_query_len: usize,
    /// Whether a failed lookup surfaces a notification or fails silently.
    pub notify_on_error: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AutocompleteSnapshot<T> {
    pub query: String,
    pub results: Vec<T>,
    pub loading: bool,
    pub open: bool,
    pub selected: Option<String>,
}

impl<T> Default for AutocompleteSnapshot<T> {
    fn default() -> Self {
        Self {
            query: String::new(),
            results: Vec::new(),
            loading: false,
            open: false,
            selected: None,
        }
    }
}

pub struct Autocomplete<T> {
    policy: AutocompletePolicy,
    gate: GenerationGate,
    state: Mutex<AutocompleteSnapshot<T>>,
}

pub type LocationAutocomplete = Autocomplete<Location>;
pub type ConditionAutocomplete = Autocomplete<String>;

impl Autocomplete<Location> {
    pub fn locations() -> Self {
        Self::new(AutocompletePolicy {
            min_query_len: LOCATION_MIN_QUERY_LEN,
            notify_on_error: true,
        })
    }

    pub async fn search_locations<A: HospitalSearchApi>(
        &self,
        api: &A,
        field: LocationField,
        query: &str,
    ) -> Option<Notification> {
        self.search_with(query, |q| async move { api.search_locations(&q, field).await })
            .await
    }
}

impl Autocomplete<String> {
    pub fn conditions() -> Self {
        Self::new(AutocompletePolicy {
            min_query_len: 1,
            notify_on_error: false,
        })
    }

    pub async fn search_conditions<A: HospitalSearchApi>(
        &self,
        api: &A,
        query: &str,
    ) -> Option<Notification> {
        self.search_with(query, |q| async move { api.search_conditions(&q).await })
            .await
    }
}

impl<T: Suggestion> Autocomplete<T> {
    pub fn new(policy: AutocompletePolicy) -> Self {
        Self {
            policy,
            gate: GenerationGate::new(),
            state: Mutex::new(AutocompleteSnapshot::default()),
        }
    }

    pub async fn snapshot(&self) -> AutocompleteSnapshot<T> {
        self.state.lock().await.clone()
    }

    /// Run one keystroke's lookup. `fetch` receives the trimmed query.
    ///
    /// Returns a notification when the lookup failed and the policy surfaces errors.
    pub async fn search_with<F, Fut>(&self, query: &str, fetch: F) -> Option<Notification>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<Vec<T>, ApiError>>,
    {
        let trimmed = query.trim().to_string();
        let ticket = {
            let mut state = self.state.lock().await;
            state.query = query.to_string();
            if trimmed.chars().count() < self.policy.min_query_len {
                self.gate.invalidate();
                state.results.clear();
                state.loading = false;
                state.open = false;
                return None;
            }
            state.loading = true;
            self.gate.issue()
        };

        let result = fetch(trimmed).await;

        let mut state = self.state.lock().await;
        if !self.gate.is_current(ticket) {
            debug!(query, "discarding superseded autocomplete response");
            return None;
        }
        state.loading = false;
        match result {
            Ok(items) => {
                state.open = !items.is_empty();
                state.results = items;
                None
            }
            Err(e) => {
                warn!(error = %e, query, "autocomplete lookup failed");
                state.results.clear();
                state.open = false;
                self.policy
                    .notify_on_error
                    .then(|| Notification::error("Error", e.to_string()))
            }
        }
    }

    /// Pick the `index`th result: store its display value and close the popover.
    pub async fn select(&self, index: usize) -> Option<String> {
        let mut state = self.state.lock().await;
        let value = state.results.get(index)?.display_value().to_string();
        state.selected = Some(value.clone());
        state.open = false;
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use reqwest::StatusCode;
    use tokio::sync::oneshot;

    use super::*;

    #[tokio::test]
    async fn short_location_query_issues_no_request() {
        let calls = AtomicUsize::new(0);
        let ac = LocationAutocomplete::locations();
        let note = ac
            .search_with("D", |_| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![Location::from_display("Dothan, AL")])
            })
            .await;
        assert!(note.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let snapshot = ac.snapshot().await;
        assert!(snapshot.results.is_empty());
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn empty_query_clears_previous_results() {
        let ac = ConditionAutocomplete::conditions();
        ac.search_with("heart", |_| async { Ok(vec!["Heart attack".to_string()]) })
            .await;
        assert_eq!(ac.snapshot().await.results.len(), 1);

        ac.search_with("", |_| async { Ok(vec!["unexpected".to_string()]) })
            .await;
        assert!(ac.snapshot().await.results.is_empty());
    }

    #[tokio::test]
    async fn stale_response_does_not_overwrite_newer_one() {
        let ac = Arc::new(ConditionAutocomplete::conditions());
        let (slow_tx, slow_rx) = oneshot::channel::<Vec<String>>();

        let slow = {
            let ac = Arc::clone(&ac);
            tokio::spawn(async move {
                ac.search_with("he", |_| async move { Ok(slow_rx.await.unwrap_or_default()) })
                    .await
            })
        };
        tokio::task::yield_now().await;
        while !ac.snapshot().await.loading {
            tokio::task::yield_now().await;
        }

        ac.search_with("heart", |_| async { Ok(vec!["Heart failure".to_string()]) })
            .await;
        slow_tx.send(vec!["Headache".to_string()]).unwrap();
        slow.await.unwrap();

        let snapshot = ac.snapshot().await;
        assert_eq!(snapshot.results, vec!["Heart failure".to_string()]);
        assert_eq!(snapshot.query, "heart");
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn location_errors_notify_and_condition_errors_stay_silent() {
        let failing = || async {
            Err::<Vec<Location>, _>(ApiError::Upstream {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Dataset not available".to_string(),
            })
        };
        let locations = LocationAutocomplete::locations();
        let note = locations.search_with("Dothan", |_| failing()).await.unwrap();
        assert_eq!(note.description.as_deref(), Some("Dataset not available"));
        assert!(locations.snapshot().await.results.is_empty());

        let conditions = ConditionAutocomplete::conditions();
        let note = conditions
            .search_with("heart", |_| async {
                Err(ApiError::InvalidResponse {
                    detail: "not an array".to_string(),
                })
            })
            .await;
        assert!(note.is_none());
    }

    #[tokio::test]
    async fn selecting_stores_display_value_and_closes() {
        let ac = LocationAutocomplete::locations();
        ac.search_with("Dot", |q| async move {
            assert_eq!(q, "Dot");
            Ok(vec![Location::from_display("Dothan, AL")])
        })
        .await;
        assert!(ac.snapshot().await.open);
        assert_eq!(ac.select(0).await.as_deref(), Some("Dothan, AL"));
        let snapshot = ac.snapshot().await;
        assert!(!snapshot.open);
        assert_eq!(snapshot.selected.as_deref(), Some("Dothan, AL"));
        assert_eq!(ac.select(5).await, None);
    }
}
