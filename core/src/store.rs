//! The character list state machine.
//!
//! # Design
//! `CharacterStore` is an explicitly owned state container: the host creates
//! it, passes it around by `&mut`, and drops it. Network I/O happens between
//! `begin_*` (which hands out a `PageRequest`) and `complete_fetch` (which
//! merges the outcome). Every reset of the list (`set_filters`, `clear`,
//! `refresh`) starts a new epoch; a `PageRequest` issued under an older epoch
//! is discarded on completion, so a late response for a stale filter can never
//! merge into the current list.
//!
//! Only the offline cache is persisted. Everything else starts from
//! `ListState::default()` on a cold start.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ApiError, ErrorKind};
use crate::service::CatalogService;
use crate::storage::{load_json, save_json, KeyValueStore, CHARACTERS_KEY};
use crate::transport::Transport;
use crate::types::{Character, CharacterFilters, CharacterPage, FilterUpdate};

/// Number of most recent characters kept for offline use.
pub const DEFAULT_CACHE_LIMIT: usize = 20;

/// Renderable snapshot of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListState {
    pub items: Vec<Character>,
    /// Tail of `items` after the last successful merge, persisted.
    pub cache: Vec<Character>,
    pub current_page: u32,
    pub total_pages: u32,
    pub has_next_page: bool,
    /// A first page is in flight.
    pub loading: bool,
    /// A follow-up page is in flight.
    pub loading_more: bool,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub filters: CharacterFilters,
    pub selected: Option<Character>,
    pub epoch: u64,
}

impl Default for ListState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            cache: Vec::new(),
            current_page: 1,
            total_pages: 0,
            has_next_page: true,
            loading: false,
            loading_more: false,
            error: None,
            error_kind: None,
            filters: CharacterFilters::default(),
            selected: None,
            epoch: 0,
        }
    }
}

/// A page load issued by the store, tagged with the epoch it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub epoch: u64,
    pub page: u32,
    pub filters: CharacterFilters,
}

/// What `complete_fetch` did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page was merged into `items`.
    Applied,
    /// The failure was recorded on `error`; `items` kept.
    Failed,
    /// The request belonged to an earlier epoch and was ignored.
    Stale,
}

pub struct CharacterStore {
    state: ListState,
    cache_limit: usize,
    storage: Box<dyn KeyValueStore>,
}

impl std::fmt::Debug for CharacterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CharacterStore")
            .field("state", &self.state)
            .field("cache_limit", &self.cache_limit)
            .finish_non_exhaustive()
    }
}

impl CharacterStore {
    pub fn new(storage: impl KeyValueStore + 'static) -> Self {
        Self::with_cache_limit(storage, DEFAULT_CACHE_LIMIT)
    }

    /// Create a store and restore the offline cache from `storage`.
    pub fn with_cache_limit(storage: impl KeyValueStore + 'static, cache_limit: usize) -> Self {
        let storage: Box<dyn KeyValueStore> = Box::new(storage);
        let mut cache: Vec<Character> = match load_json(storage.as_ref(), CHARACTERS_KEY) {
            Ok(Some(cache)) => cache,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "discarding unreadable offline cache");
                Vec::new()
            }
        };
        let excess = cache.len().saturating_sub(cache_limit);
        cache.drain(..excess);

        Self {
            state: ListState {
                cache,
                ..ListState::default()
            },
            cache_limit,
            storage,
        }
    }

    pub fn storage(&self) -> &dyn KeyValueStore {
        self.storage.as_ref()
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    pub fn snapshot(&self) -> ListState {
        self.state.clone()
    }

    pub fn items(&self) -> &[Character] {
        &self.state.items
    }

    pub fn cache(&self) -> &[Character] {
        &self.state.cache
    }

    pub fn filters(&self) -> &CharacterFilters {
        &self.state.filters
    }

    pub fn current_page(&self) -> u32 {
        self.state.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.state.total_pages
    }

    pub fn has_next_page(&self) -> bool {
        self.state.has_next_page
    }

    pub fn is_loading(&self) -> bool {
        self.state.loading
    }

    pub fn is_loading_more(&self) -> bool {
        self.state.loading_more
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.state.error_kind
    }

    pub fn selected(&self) -> Option<&Character> {
        self.state.selected.as_ref()
    }

    pub fn epoch(&self) -> u64 {
        self.state.epoch
    }

    fn in_flight(&self) -> bool {
        self.state.loading || self.state.loading_more
    }

    /// Mark `page` as in flight and hand out the request to execute.
    ///
    /// Does not check whether another fetch is outstanding; use
    /// `begin_load_more` for gated pagination.
    pub fn begin_fetch(&mut self, page: u32) -> PageRequest {
        let first = page <= 1;
        self.state.loading = first;
        self.state.loading_more = !first;
        self.clear_error();
        debug!(page, epoch = self.state.epoch, "fetch started");
        PageRequest {
            epoch: self.state.epoch,
            page,
            filters: self.state.filters.clone(),
        }
    }

    /// Request the next page, if there is one and nothing is in flight.
    pub fn begin_load_more(&mut self) -> Option<PageRequest> {
        if !self.state.has_next_page || self.in_flight() {
            return None;
        }
        let next = self.state.current_page + 1;
        Some(self.begin_fetch(next))
    }

    /// Merge the outcome of `request` into the list.
    pub fn complete_fetch(
        &mut self,
        request: &PageRequest,
        result: Result<CharacterPage, ApiError>,
    ) -> FetchOutcome {
        if request.epoch != self.state.epoch {
            warn!(
                page = request.page,
                request_epoch = request.epoch,
                current_epoch = self.state.epoch,
                "discarding response for a superseded list"
            );
            return FetchOutcome::Stale;
        }

        self.state.loading = false;
        self.state.loading_more = false;

        match result {
            Ok(page) => {
                self.merge(request.page, page);
                FetchOutcome::Applied
            }
            Err(err) => {
                warn!(page = request.page, error = %err, "fetch failed");
                self.set_error(&err);
                FetchOutcome::Failed
            }
        }
    }

    fn merge(&mut self, page_number: u32, page: CharacterPage) {
        let CharacterPage { info, results } = page;
        let received = results.len();
        if page_number <= 1 {
            self.state.items = results;
        } else {
            self.state.items.extend(results);
        }
        self.state.has_next_page = info.has_next();
        self.state.current_page = page_number.max(1);
        self.state.total_pages = info.pages;
        self.clear_error();
        debug!(
            page = page_number,
            received,
            total = self.state.items.len(),
            has_next = self.state.has_next_page,
            "page merged"
        );
        self.refresh_cache();
    }

    fn refresh_cache(&mut self) {
        let start = self.state.items.len().saturating_sub(self.cache_limit);
        self.state.cache = self.state.items[start..].to_vec();
        if let Err(e) = save_json(self.storage.as_ref(), CHARACTERS_KEY, &self.state.cache) {
            warn!(error = %e, "failed to persist offline cache");
        }
    }

    /// Replace some or all filters and empty the list.
    ///
    /// The caller is expected to follow up with `begin_fetch(1)`.
    pub fn set_filters(&mut self, update: FilterUpdate) {
        self.state.filters.apply(update);
        self.reset();
    }

    /// Empty the list without touching the filters.
    pub fn clear(&mut self) {
        self.reset();
    }

    pub fn clear_error(&mut self) {
        self.state.error = None;
        self.state.error_kind = None;
    }

    /// Start over from page 1.
    ///
    /// Offline, nothing is cleared: the error is recorded and the currently
    /// shown list survives.
    pub fn refresh(&mut self, connected: bool) -> Result<PageRequest, ApiError> {
        if !connected {
            let err = ApiError::ConnectivityUnavailable;
            self.set_error(&err);
            return Err(err);
        }
        self.reset();
        Ok(self.begin_fetch(1))
    }

    pub fn select(&mut self, character: Option<Character>) {
        self.state.selected = character;
    }

    fn reset(&mut self) {
        self.state.epoch += 1;
        self.state.items.clear();
        self.state.current_page = 1;
        self.state.has_next_page = true;
        self.state.loading = false;
        self.state.loading_more = false;
        self.clear_error();
    }

    fn set_error(&mut self, err: &ApiError) {
        self.state.error = Some(err.to_string());
        self.state.error_kind = Some(err.kind());
    }

    /// Fetch `page` through `service` and merge the result.
    pub fn fetch<T: Transport>(&mut self, service: &CatalogService<T>, page: u32) -> FetchOutcome {
        let request = self.begin_fetch(page);
        let result = service.list_characters(request.page, &request.filters);
        self.complete_fetch(&request, result)
    }

    /// Fetch the next page, or `None` when pagination is gated.
    pub fn load_more<T: Transport>(&mut self, service: &CatalogService<T>) -> Option<FetchOutcome> {
        let request = self.begin_load_more()?;
        let result = service.list_characters(request.page, &request.filters);
        Some(self.complete_fetch(&request, result))
    }

    pub fn refresh_with<T: Transport>(
        &mut self,
        service: &CatalogService<T>,
        connected: bool,
    ) -> Result<FetchOutcome, ApiError> {
        let request = self.refresh(connected)?;
        let result = service.list_characters(request.page, &request.filters);
        Ok(self.complete_fetch(&request, result))
    }

    /// Fetch one character for the detail view and remember it as selected.
    pub fn load_character<T: Transport>(
        &mut self,
        service: &CatalogService<T>,
        id: u32,
    ) -> Result<Character, ApiError> {
        let character = service.get_character(id)?;
        self.select(Some(character.clone()));
        Ok(character)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::MemoryStore;
    use crate::types::{CharacterStatus, Gender, LocationRef, PageInfo};

    fn character(id: u32) -> Character {
        Character {
            id,
            name: format!("Character {id}"),
            status: CharacterStatus::Alive,
            species: "Human".to_string(),
            kind: String::new(),
            gender: Gender::Female,
            origin: LocationRef {
                name: "Earth (C-137)".to_string(),
                url: String::new(),
            },
            location: LocationRef {
                name: "Earth (C-137)".to_string(),
                url: String::new(),
            },
            image: format!("https://example.test/avatar/{id}.jpeg"),
            episode: vec![],
            url: format!("https://example.test/character/{id}"),
            created: "2017-11-04T18:48:46.250Z".to_string(),
        }
    }

    fn page(ids: std::ops::RangeInclusive<u32>, next: Option<&str>, pages: u32) -> CharacterPage {
        let results: Vec<Character> = ids.map(character).collect();
        CharacterPage {
            info: PageInfo {
                count: results.len() as u32,
                pages,
                next: next.map(str::to_string),
                prev: None,
            },
            results,
        }
    }

    fn ids(items: &[Character]) -> Vec<u32> {
        items.iter().map(|c| c.id).collect()
    }

    fn store() -> CharacterStore {
        CharacterStore::new(MemoryStore::new())
    }

    #[test]
    fn starts_with_defaults() {
        let store = store();
        assert!(store.items().is_empty());
        assert_eq!(store.current_page(), 1);
        assert!(store.has_next_page());
        assert!(!store.is_loading());
        assert!(store.error().is_none());
    }

    #[test]
    fn first_page_then_second_page() {
        let mut store = store();
        store.set_filters(FilterUpdate::status("alive"));

        let req = store.begin_fetch(1);
        assert!(store.is_loading());
        assert!(!store.is_loading_more());
        assert_eq!(req.filters.status, "alive");
        let outcome = store.complete_fetch(
            &req,
            Ok(page(1..=3, Some("https://example.test/character?page=2&status=alive"), 2)),
        );
        assert_eq!(outcome, FetchOutcome::Applied);
        assert!(store.has_next_page());
        assert_eq!(store.current_page(), 1);
        assert_eq!(ids(store.cache()), vec![1, 2, 3]);

        let req = store.begin_load_more().unwrap();
        assert_eq!(req.page, 2);
        assert!(store.is_loading_more());
        store.complete_fetch(&req, Ok(page(4..=5, None, 2)));
        assert_eq!(ids(store.items()), vec![1, 2, 3, 4, 5]);
        assert!(!store.has_next_page());
        assert_eq!(store.current_page(), 2);
        assert_eq!(store.total_pages(), 2);
        assert_eq!(ids(store.cache()), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn appends_in_server_order_without_dedup() {
        let mut store = store();
        let req = store.begin_fetch(1);
        store.complete_fetch(&req, Ok(page(5..=6, Some("next"), 3)));
        let req = store.begin_fetch(2);
        store.complete_fetch(&req, Ok(page(6..=6, Some("next"), 3)));
        assert_eq!(ids(store.items()), vec![5, 6, 6]);
    }

    #[test]
    fn cache_keeps_last_twenty() {
        let mut store = store();
        let req = store.begin_fetch(1);
        store.complete_fetch(&req, Ok(page(1..=20, Some("next"), 2)));
        let req = store.begin_fetch(2);
        store.complete_fetch(&req, Ok(page(21..=35, None, 2)));
        assert_eq!(store.items().len(), 35);
        assert_eq!(ids(store.cache()), (16..=35).collect::<Vec<_>>());
    }

    #[test]
    fn set_filters_resets_immediately_and_drops_stale_response() {
        let mut store = store();
        let req = store.begin_fetch(1);
        store.complete_fetch(&req, Ok(page(1..=5, Some("next"), 2)));

        let pending = store.begin_load_more().unwrap();
        store.set_filters(FilterUpdate::species("human"));
        assert!(store.items().is_empty());
        assert_eq!(store.current_page(), 1);
        assert!(store.has_next_page());
        assert!(!store.is_loading_more());
        assert_eq!(store.filters(), &CharacterFilters::new("", "human"));

        let outcome = store.complete_fetch(&pending, Ok(page(6..=10, None, 2)));
        assert_eq!(outcome, FetchOutcome::Stale);
        assert!(store.items().is_empty());
        assert!(store.has_next_page());
    }

    #[test]
    fn set_filters_clears_error() {
        let mut store = store();
        let req = store.begin_fetch(1);
        store.complete_fetch(&req, Err(ApiError::Timeout));
        assert!(store.error().is_some());
        store.set_filters(FilterUpdate::status("dead"));
        assert!(store.error().is_none());
        assert!(store.error_kind().is_none());
    }

    #[test]
    fn not_found_page_is_empty_success() {
        let mut store = store();
        let req = store.begin_fetch(1);
        let outcome = store.complete_fetch(&req, Ok(CharacterPage::empty()));
        assert_eq!(outcome, FetchOutcome::Applied);
        assert!(store.items().is_empty());
        assert!(!store.has_next_page());
        assert!(store.error().is_none());
    }

    #[test]
    fn failed_load_more_keeps_items() {
        let mut store = store();
        let req = store.begin_fetch(1);
        store.complete_fetch(&req, Ok(page(1..=3, Some("next"), 2)));

        let req = store.begin_load_more().unwrap();
        let outcome = store.complete_fetch(&req, Err(ApiError::Timeout));
        assert_eq!(outcome, FetchOutcome::Failed);
        assert_eq!(ids(store.items()), vec![1, 2, 3]);
        assert_eq!(store.current_page(), 1);
        assert_eq!(store.error_kind(), Some(ErrorKind::Timeout));
        assert_eq!(
            store.error(),
            Some("Network error. Please check your internet connection.")
        );
        assert!(!store.is_loading_more());
    }

    #[test]
    fn load_more_is_gated() {
        let mut store = store();
        let first = store.begin_fetch(1);
        assert!(store.begin_load_more().is_none(), "first page still in flight");
        store.complete_fetch(&first, Ok(page(1..=2, None, 1)));
        assert!(store.begin_load_more().is_none(), "no next page");
    }

    #[test]
    fn refresh_offline_keeps_list() {
        let mut store = store();
        let req = store.begin_fetch(1);
        store.complete_fetch(&req, Ok(page(1..=3, None, 1)));
        let epoch = store.epoch();

        let err = store.refresh(false).unwrap_err();
        assert_eq!(err, ApiError::ConnectivityUnavailable);
        assert_eq!(ids(store.items()), vec![1, 2, 3]);
        assert_eq!(store.epoch(), epoch);
        assert_eq!(store.error_kind(), Some(ErrorKind::ConnectivityUnavailable));
    }

    #[test]
    fn refresh_online_clears_and_restarts() {
        let mut store = store();
        store.set_filters(FilterUpdate::status("alive"));
        let req = store.begin_fetch(1);
        store.complete_fetch(&req, Ok(page(1..=3, Some("next"), 2)));
        let stale = store.begin_load_more().unwrap();

        let req = store.refresh(true).unwrap();
        assert!(store.items().is_empty());
        assert!(store.is_loading());
        assert_eq!(req.page, 1);
        assert_eq!(req.filters.status, "alive");

        assert_eq!(
            store.complete_fetch(&stale, Ok(page(4..=6, None, 2))),
            FetchOutcome::Stale
        );
        store.complete_fetch(&req, Ok(page(7..=8, None, 1)));
        assert_eq!(ids(store.items()), vec![7, 8]);
    }

    #[test]
    fn clear_keeps_filters() {
        let mut store = store();
        store.set_filters(FilterUpdate::species("alien"));
        let req = store.begin_fetch(1);
        store.complete_fetch(&req, Ok(page(1..=2, None, 1)));
        store.clear();
        assert!(store.items().is_empty());
        assert_eq!(store.filters().species, "alien");
        assert_eq!(ids(store.cache()), vec![1, 2], "cache is only rewritten on merge");
    }

    #[test]
    fn cache_survives_restart() {
        let storage = Arc::new(MemoryStore::new());
        {
            let mut store = CharacterStore::new(storage.clone());
            let req = store.begin_fetch(1);
            store.complete_fetch(&req, Ok(page(1..=4, None, 1)));
        }
        let store = CharacterStore::new(storage);
        assert!(store.items().is_empty());
        assert_eq!(ids(store.cache()), vec![1, 2, 3, 4]);
        assert_eq!(store.current_page(), 1);
    }

    #[test]
    fn restored_cache_is_trimmed_to_limit() {
        let storage = Arc::new(MemoryStore::new());
        let saved: Vec<Character> = (1..=6).map(character).collect();
        save_json(storage.as_ref(), CHARACTERS_KEY, &saved).unwrap();

        let store = CharacterStore::with_cache_limit(storage, 4);
        assert_eq!(ids(store.cache()), vec![3, 4, 5, 6]);
    }

    #[test]
    fn corrupt_cache_starts_empty() {
        let storage = MemoryStore::new();
        storage.save(CHARACTERS_KEY, "{oops").unwrap();
        let store = CharacterStore::new(storage);
        assert!(store.cache().is_empty());
    }

    #[test]
    fn select_survives_list_reset() {
        let mut store = store();
        store.select(Some(character(7)));
        assert_eq!(store.selected().map(|c| c.id), Some(7));

        store.set_filters(FilterUpdate::status("dead"));
        assert_eq!(store.selected().map(|c| c.id), Some(7));

        store.select(None);
        assert!(store.selected().is_none());
    }

    #[test]
    fn snapshot_serializes_for_hosts() {
        let mut store = store();
        let req = store.begin_fetch(1);
        store.complete_fetch(&req, Err(ApiError::NotFound));
        let json = serde_json::to_value(store.snapshot()).unwrap();
        assert_eq!(json["error"], "Character not found");
        assert_eq!(json["error_kind"], "not_found");
        assert_eq!(json["has_next_page"], true);
    }
}
