//! A `CatalogClient` wired to a `Transport`.

use tracing::debug;

use crate::client::CatalogClient;
use crate::error::ApiError;
use crate::transport::{Transport, TransportError};
use crate::types::{Character, CharacterFilters, CharacterPage};

/// Fetch client that performs the round-trip itself. Never retries.
#[derive(Debug, Clone)]
pub struct CatalogService<T> {
    client: CatalogClient,
    transport: T,
}

impl<T: Transport> CatalogService<T> {
    pub fn new(client: CatalogClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &CatalogClient {
        &self.client
    }

    pub fn list_characters(
        &self,
        page: u32,
        filters: &CharacterFilters,
    ) -> Result<CharacterPage, ApiError> {
        let request = self.client.build_list_characters(page, filters)?;
        debug!(url = %request.url, "listing characters");
        let response = self.transport.execute(&request).map_err(ApiError::from)?;
        self.client.parse_list_characters(response)
    }

    pub fn get_character(&self, id: u32) -> Result<Character, ApiError> {
        let request = self.client.build_get_character(id)?;
        debug!(url = %request.url, "fetching character");
        let response = self.transport.execute(&request).map_err(ApiError::from)?;
        self.client.parse_get_character(response)
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => ApiError::Timeout,
            TransportError::Connection(msg) => ApiError::Transport(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::http::{HttpRequest, HttpResponse};

    /// Replays a fixed outcome and records the URLs it was asked for.
    struct Canned {
        outcome: Result<HttpResponse, TransportError>,
        seen: RefCell<Vec<String>>,
    }

    impl Transport for Canned {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.borrow_mut().push(request.url.clone());
            self.outcome.clone()
        }
    }

    fn service(outcome: Result<HttpResponse, TransportError>) -> CatalogService<Canned> {
        CatalogService::new(
            CatalogClient::new("http://catalog.test/api"),
            Canned {
                outcome,
                seen: RefCell::new(Vec::new()),
            },
        )
    }

    #[test]
    fn timeout_maps_to_timeout_error() {
        let svc = service(Err(TransportError::Timeout));
        let err = svc
            .list_characters(1, &CharacterFilters::default())
            .unwrap_err();
        assert_eq!(err, ApiError::Timeout);
    }

    #[test]
    fn connection_failure_maps_to_transport_error() {
        let svc = service(Err(TransportError::Connection("refused".into())));
        let err = svc.get_character(1).unwrap_err();
        assert_eq!(err, ApiError::Transport("refused".into()));
    }

    #[test]
    fn invalid_page_never_reaches_transport() {
        let svc = service(Ok(HttpResponse::new(200, "")));
        let err = svc
            .list_characters(0, &CharacterFilters::default())
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(_)));
        assert!(svc.transport.seen.borrow().is_empty());
    }

    #[test]
    fn not_found_list_is_empty_page() {
        let svc = service(Ok(HttpResponse::new(404, "")));
        let filters = CharacterFilters::new("dead", "robot");
        let page = svc.list_characters(1, &filters).unwrap();
        assert!(page.results.is_empty());
        assert_eq!(
            svc.transport.seen.borrow()[0],
            "http://catalog.test/api/character?page=1&status=dead&species=robot"
        );
    }
}
