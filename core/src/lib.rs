//! Client core for the Rick and Morty character catalog.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern), and drives the paginated,
//! filterable character list through `CharacterStore`.
//!
//! # Design
//! - `CatalogClient` is stateless: it holds only `base_url` and a timeout.
//! - Each operation is split into `build_*` (produces request) and `parse_*`
//!   (consumes response), so the I/O boundary is explicit. `CatalogService`
//!   closes the loop through a `Transport` for hosts that want the core to
//!   do the round-trip.
//! - `CharacterStore` tags every page request with the list epoch and drops
//!   responses that arrive after the list was reset.
//! - Only the last-N offline cache and the theme flag are persisted, through
//!   the `KeyValueStore` trait.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod preferences;
pub mod service;
pub mod storage;
pub mod store;
pub mod transport;
pub mod types;

pub use client::{CatalogClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use config::CatalogConfig;
pub use error::{ApiError, ErrorKind, StorageError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use preferences::ThemePreference;
pub use service::CatalogService;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{CharacterStore, FetchOutcome, ListState, PageRequest, DEFAULT_CACHE_LIMIT};
#[cfg(feature = "blocking")]
pub use transport::UreqTransport;
pub use transport::{Transport, TransportError};
pub use types::{
    Character, CharacterFilters, CharacterPage, CharacterStatus, FilterUpdate, Gender, LocationRef, PageInfo,
};
