//! C-ABI wrapper around `catalog-core`.
//!
//! # Overview
//! Exposes request building, response parsing and the character store
//! through `extern "C"` functions so a mobile host can run the HTTP
//! round-trips itself while the list state machine stays in Rust.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `catalog_build_*` / `catalog_parse_*` mirror the core client 1:1.
//! - Store page loads are two calls: `catalog_store_begin_*` returns the
//!   request plus an `FfiPageTicket`, and `catalog_store_complete_fetch`
//!   (or `catalog_store_fail_fetch`) hands the outcome back with that ticket.
//!   Tickets from before a filter change or refresh come back `Stale`.
//! - The C caller owns all returned pointers and must call the matching
//!   `catalog_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use catalog_core::{
    ApiError, CatalogClient, CharacterStore, FileStore, FilterUpdate, HttpResponse, MemoryStore, PageRequest,
    ThemePreference, DEFAULT_CACHE_LIMIT, DEFAULT_TIMEOUT,
};

use types::*;

/// Copy a nullable C string into an owned `String`.
fn opt_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new `CatalogClient` bound to `base_url`.
///
/// `timeout_ms == 0` selects the default 10 second timeout.
/// Returns null if `base_url` is null or if an internal panic occurs.
/// The caller must free the returned pointer with `catalog_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_client_new(base_url: *const c_char, timeout_ms: u32) -> *mut FfiCatalogClient {
    catch_unwind(|| {
        let Some(url) = opt_string(base_url) else {
            return std::ptr::null_mut();
        };
        let timeout = if timeout_ms == 0 {
            DEFAULT_TIMEOUT
        } else {
            Duration::from_millis(u64::from(timeout_ms))
        };
        let client = CatalogClient::with_timeout(&url, timeout);
        Box::into_raw(Box::new(FfiCatalogClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `catalog_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_client_free(client: *mut FfiCatalogClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build the request for one page of characters.
///
/// `status` and `species` may be null or empty for "no constraint".
/// Returns null if `client` is null or `page` is 0.
/// The caller must free the returned pointer with `catalog_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_build_list_characters(
    client: *const FfiCatalogClient,
    page: u32,
    status: *const c_char,
    species: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let filters = catalog_core::CharacterFilters::new(
            opt_string(status).unwrap_or_default(),
            opt_string(species).unwrap_or_default(),
        );
        match client.inner.build_list_characters(page, &filters) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build the request for a single character.
///
/// Returns null if `client` is null or `id` is 0.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_build_get_character(client: *const FfiCatalogClient, id: u32) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        match client.inner.build_get_character(id) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null body is
/// treated as empty.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    HttpResponse::new(resp.status, opt_string(resp.body).unwrap_or_default())
}

/// Parse the response to a list request.
///
/// Returns a result with `data_tag = CharacterPage` on success. A 404 is a
/// successful empty page.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_parse_list_characters(
    client: *const FfiCatalogClient,
    response: *const FfiHttpResponse,
) -> *mut FfiCatalogResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiCatalogResult::null_arg("client");
        }
        if response.is_null() {
            return FfiCatalogResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        match client.inner.parse_list_characters(ffi_response_to_core(resp)) {
            Ok(page) => FfiCatalogResult::ok_json(FfiDataTag::CharacterPage, &page),
            Err(e) => FfiCatalogResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiCatalogResult::panic("panic in catalog_parse_list_characters"))
}

/// Parse the response to a single-character request.
///
/// Returns a result with `data_tag = Character` on success.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_parse_get_character(
    client: *const FfiCatalogClient,
    response: *const FfiHttpResponse,
) -> *mut FfiCatalogResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiCatalogResult::null_arg("client");
        }
        if response.is_null() {
            return FfiCatalogResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        match client.inner.parse_get_character(ffi_response_to_core(resp)) {
            Ok(character) => FfiCatalogResult::ok_json(FfiDataTag::Character, &character),
            Err(e) => FfiCatalogResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiCatalogResult::panic("panic in catalog_parse_get_character"))
}

// ---------------------------------------------------------------------------
// Store lifecycle
// ---------------------------------------------------------------------------

/// Create a character store.
///
/// With a non-null `cache_dir` the offline cache and theme preference are
/// persisted there and restored on the next launch; with null they live in
/// memory only. `cache_limit == 0` selects the default of 20.
/// Returns null if the directory cannot be created.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_store_new(cache_dir: *const c_char, cache_limit: u32) -> *mut FfiCharacterStore {
    catch_unwind(|| {
        let limit = if cache_limit == 0 {
            DEFAULT_CACHE_LIMIT
        } else {
            cache_limit as usize
        };
        let store = match opt_string(cache_dir) {
            Some(dir) => match FileStore::open(dir) {
                Ok(storage) => CharacterStore::with_cache_limit(storage, limit),
                Err(_) => return std::ptr::null_mut(),
            },
            None => CharacterStore::with_cache_limit(MemoryStore::new(), limit),
        };
        Box::into_raw(Box::new(FfiCharacterStore { inner: store }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a store created by `catalog_store_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_store_free(store: *mut FfiCharacterStore) {
    if !store.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(store) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Store page loads
// ---------------------------------------------------------------------------

/// Turn a store `PageRequest` into an HTTP request and fill `out_ticket`.
/// A request that cannot be built is completed as failed right away.
fn issue(
    store: &mut CharacterStore,
    client: &CatalogClient,
    request: PageRequest,
    out_ticket: *mut FfiPageTicket,
) -> *mut FfiHttpRequest {
    match client.build_list_characters(request.page, &request.filters) {
        Ok(req) => {
            unsafe {
                *out_ticket = FfiPageTicket {
                    epoch: request.epoch,
                    page: request.page,
                };
            }
            FfiHttpRequest::from_core(req)
        }
        Err(e) => {
            store.complete_fetch(&request, Err(e));
            std::ptr::null_mut()
        }
    }
}

/// Start loading `page` (1 replaces the list, >1 appends).
///
/// Returns the request to execute and fills `out_ticket`, or null on a null
/// argument or an invalid page (the store then carries the error).
#[unsafe(no_mangle)]
pub extern "C" fn catalog_store_begin_fetch(
    store: *mut FfiCharacterStore,
    client: *const FfiCatalogClient,
    page: u32,
    out_ticket: *mut FfiPageTicket,
) -> *mut FfiHttpRequest {
    catch_unwind(AssertUnwindSafe(|| {
        if store.is_null() || client.is_null() || out_ticket.is_null() {
            return std::ptr::null_mut();
        }
        let store = unsafe { &mut (*store).inner };
        let client = unsafe { &(*client).inner };
        let request = store.begin_fetch(page);
        issue(store, client, request, out_ticket)
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Start loading the next page.
///
/// Returns null when there is no next page or a load is already in flight.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_store_begin_load_more(
    store: *mut FfiCharacterStore,
    client: *const FfiCatalogClient,
    out_ticket: *mut FfiPageTicket,
) -> *mut FfiHttpRequest {
    catch_unwind(AssertUnwindSafe(|| {
        if store.is_null() || client.is_null() || out_ticket.is_null() {
            return std::ptr::null_mut();
        }
        let store = unsafe { &mut (*store).inner };
        let client = unsafe { &(*client).inner };
        match store.begin_load_more() {
            Some(request) => issue(store, client, request, out_ticket),
            None => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Pull-to-refresh.
///
/// With `connected == false` nothing is cleared, the store records a
/// connectivity error and null is returned. Otherwise the list is emptied
/// and the request for page 1 returned.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_store_refresh(
    store: *mut FfiCharacterStore,
    client: *const FfiCatalogClient,
    connected: bool,
    out_ticket: *mut FfiPageTicket,
) -> *mut FfiHttpRequest {
    catch_unwind(AssertUnwindSafe(|| {
        if store.is_null() || client.is_null() || out_ticket.is_null() {
            return std::ptr::null_mut();
        }
        let store = unsafe { &mut (*store).inner };
        let client = unsafe { &(*client).inner };
        match store.refresh(connected) {
            Ok(request) => issue(store, client, request, out_ticket),
            Err(_) => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

fn ticket_request(store: &CharacterStore, ticket: FfiPageTicket) -> PageRequest {
    PageRequest {
        epoch: ticket.epoch,
        page: ticket.page,
        filters: store.filters().clone(),
    }
}

/// Hand the HTTP response for `ticket` back to the store.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_store_complete_fetch(
    store: *mut FfiCharacterStore,
    client: *const FfiCatalogClient,
    ticket: FfiPageTicket,
    response: *const FfiHttpResponse,
) -> FfiFetchOutcome {
    catch_unwind(AssertUnwindSafe(|| {
        if store.is_null() || client.is_null() || response.is_null() {
            return FfiFetchOutcome::NullArg;
        }
        if ticket.page == 0 {
            return FfiFetchOutcome::InvalidTicket;
        }
        let store = unsafe { &mut (*store).inner };
        let client = unsafe { &(*client).inner };
        let resp = unsafe { &*response };
        let result = client.parse_list_characters(ffi_response_to_core(resp));
        let request = ticket_request(store, ticket);
        store.complete_fetch(&request, result).into()
    }))
    .unwrap_or(FfiFetchOutcome::Panic)
}

/// Report that the request for `ticket` produced no response at all.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_store_fail_fetch(
    store: *mut FfiCharacterStore,
    ticket: FfiPageTicket,
    failure: FfiTransportFailure,
) -> FfiFetchOutcome {
    catch_unwind(AssertUnwindSafe(|| {
        if store.is_null() {
            return FfiFetchOutcome::NullArg;
        }
        if ticket.page == 0 {
            return FfiFetchOutcome::InvalidTicket;
        }
        let store = unsafe { &mut (*store).inner };
        let err = match failure {
            FfiTransportFailure::Timeout => ApiError::Timeout,
            FfiTransportFailure::Connection => ApiError::Transport("host reported a connection failure".to_string()),
        };
        let request = ticket_request(store, ticket);
        store.complete_fetch(&request, Err(err)).into()
    }))
    .unwrap_or(FfiFetchOutcome::Panic)
}

// ---------------------------------------------------------------------------
// Store mutations and reads
// ---------------------------------------------------------------------------

/// Change filters and empty the list. Null leaves that filter unchanged;
/// an empty string removes it. Follow up with `catalog_store_begin_fetch(.., 1, ..)`.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_store_set_filters(
    store: *mut FfiCharacterStore,
    status: *const c_char,
    species: *const c_char,
) {
    if store.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let store = unsafe { &mut (*store).inner };
        store.set_filters(FilterUpdate {
            status: opt_string(status),
            species: opt_string(species),
        });
    }));
}

/// Empty the list, keeping filters.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_store_clear(store: *mut FfiCharacterStore) {
    if store.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        unsafe { &mut (*store).inner }.clear();
    }));
}

/// Dismiss the current error message.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_store_clear_error(store: *mut FfiCharacterStore) {
    if store.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        unsafe { &mut (*store).inner }.clear_error();
    }));
}

/// Full store state as JSON (`data_tag = ListState`).
#[unsafe(no_mangle)]
pub extern "C" fn catalog_store_snapshot(store: *const FfiCharacterStore) -> *mut FfiCatalogResult {
    catch_unwind(AssertUnwindSafe(|| {
        if store.is_null() {
            return FfiCatalogResult::null_arg("store");
        }
        let store = unsafe { &(*store).inner };
        FfiCatalogResult::ok_json(FfiDataTag::ListState, store.state())
    }))
    .unwrap_or_else(|_| FfiCatalogResult::panic("panic in catalog_store_snapshot"))
}

// ---------------------------------------------------------------------------
// Theme preference
// ---------------------------------------------------------------------------

/// Whether dark mode is stored. False when `store` is null.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_theme_is_dark(store: *const FfiCharacterStore) -> bool {
    catch_unwind(AssertUnwindSafe(|| {
        if store.is_null() {
            return false;
        }
        let store = unsafe { &(*store).inner };
        ThemePreference::load(store.storage()).is_dark_mode
    }))
    .unwrap_or(false)
}

/// Persist the dark mode flag. Returns false if it could not be saved.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_theme_set_dark(store: *const FfiCharacterStore, dark: bool) -> bool {
    catch_unwind(AssertUnwindSafe(|| {
        if store.is_null() {
            return false;
        }
        let store = unsafe { &(*store).inner };
        ThemePreference { is_dark_mode: dark }
            .save(store.storage())
            .is_ok()
    }))
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any build or begin function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        if !req.url.is_null() {
            drop(unsafe { CString::from_raw(req.url) });
        }
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                if !h.key.is_null() {
                    drop(unsafe { CString::from_raw(h.key) });
                }
                if !h.value.is_null() {
                    drop(unsafe { CString::from_raw(h.value) });
                }
            }
        }
    });
}

/// Free an `FfiCatalogResult`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_free_result(result: *mut FfiCatalogResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if !result.data_json.is_null() {
            drop(unsafe { CString::from_raw(result.data_json) });
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
