//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Request types mirror the core's `HttpRequest` with C representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! enums with explicit discriminants. Parsed payloads (characters, pages,
//! store snapshots) cross as JSON strings tagged by `FfiDataTag`; the host
//! already decodes JSON and the nested character shape would be a lot of
//! hand-written C structs for no gain.

use std::ffi::CString;
use std::os::raw::c_char;

use catalog_core::{ApiError, CharacterStore, FetchOutcome, HttpMethod};
use serde::Serialize;

/// Opaque handle to a `CatalogClient`.
pub struct FfiCatalogClient {
    pub(crate) inner: catalog_core::CatalogClient,
}

/// Opaque handle to a `CharacterStore`.
pub struct FfiCharacterStore {
    pub(crate) inner: CharacterStore,
}

/// Allocate a C string, replacing interior NULs rather than failing.
pub(crate) fn to_c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    let bytes: Vec<u8> = s.into().into_iter().map(|b| if b == 0 { b'?' } else { b }).collect();
    CString::new(bytes).unwrap_or_default().into_raw()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[repr(C)]
pub enum FfiHttpMethod {
    Get = 0,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// The host must abort the request after `timeout_ms` and report it through
/// `catalog_store_fail_fetch` with `FfiTransportFailure::Timeout`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub timeout_ms: u32,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: catalog_core::HttpRequest) -> *mut Self {
        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Vec<FfiHeader> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: to_c_string(k),
                    value: to_c_string(v),
                })
                .collect();
            // Boxed slice of exactly `headers_len` entries; `catalog_free_request`
            // rebuilds it from the pointer and length.
            Box::into_raw(ffi_headers.into_boxed_slice()) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: to_c_string(req.url),
            headers,
            headers_len,
            timeout_ms: u32::try_from(req.timeout.as_millis()).unwrap_or(u32::MAX),
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// The C caller builds this on the stack after executing a request. The FFI
/// layer reads but does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

/// Identifies a page load handed out by the store.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FfiPageTicket {
    pub epoch: u64,
    pub page: u32,
}

/// Why the host could not produce a response.
#[repr(C)]
pub enum FfiTransportFailure {
    Timeout = 0,
    Connection = 1,
}

#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiFetchOutcome {
    Applied = 0,
    Failed = 1,
    Stale = 2,
    NullArg = 3,
    Panic = 4,
    /// The ticket was never handed out by a `catalog_store_begin_*` call.
    InvalidTicket = 5,
}

impl From<FetchOutcome> for FfiFetchOutcome {
    fn from(outcome: FetchOutcome) -> Self {
        match outcome {
            FetchOutcome::Applied => FfiFetchOutcome::Applied,
            FetchOutcome::Failed => FfiFetchOutcome::Failed,
            FetchOutcome::Stale => FfiFetchOutcome::Stale,
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    NotFound = 1,
    Http = 2,
    MalformedResponse = 3,
    Timeout = 4,
    Transport = 5,
    ConnectivityUnavailable = 6,
    InvalidArgument = 7,
    Serialization = 8,
    Panic = 9,
    NullArg = 10,
}

/// What `FfiCatalogResult::data_json` encodes.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    Character = 1,
    CharacterPage = 2,
    ListState = 3,
}

/// Result envelope for parse and snapshot operations.
///
/// On success `error_code` is `Ok`, `error_message` is null and `data_json`
/// holds the payload described by `data_tag`. On failure `error_code`
/// describes the category, `error_message` is the display message and
/// `data_json` is null.
#[repr(C)]
pub struct FfiCatalogResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data_json: *mut c_char,
}

impl FfiCatalogResult {
    /// Build a success result carrying `value` as JSON.
    pub(crate) fn ok_json<T: Serialize>(tag: FfiDataTag, value: &T) -> *mut Self {
        match serde_json::to_string(value) {
            Ok(json) => Box::into_raw(Box::new(FfiCatalogResult {
                error_code: FfiErrorCode::Ok,
                error_message: std::ptr::null_mut(),
                http_status: 0,
                data_tag: tag,
                data_json: to_c_string(json),
            })),
            Err(e) => Self::error(FfiErrorCode::Serialization, 0, &e.to_string()),
        }
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let code = match &err {
            ApiError::NotFound => FfiErrorCode::NotFound,
            ApiError::Http { .. } => FfiErrorCode::Http,
            ApiError::MalformedResponse(_) => FfiErrorCode::MalformedResponse,
            ApiError::Timeout => FfiErrorCode::Timeout,
            ApiError::Transport(_) => FfiErrorCode::Transport,
            ApiError::ConnectivityUnavailable => FfiErrorCode::ConnectivityUnavailable,
            ApiError::InvalidArgument(_) => FfiErrorCode::InvalidArgument,
        };
        Self::error(code, err.http_status().unwrap_or(0), &err.to_string())
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::error(FfiErrorCode::NullArg, 0, &format!("null argument: {name}"))
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::error(FfiErrorCode::Panic, 0, msg)
    }

    fn error(code: FfiErrorCode, http_status: u16, msg: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiCatalogResult {
            error_code: code,
            error_message: to_c_string(msg),
            http_status,
            data_tag: FfiDataTag::None,
            data_json: std::ptr::null_mut(),
        }))
    }
}
