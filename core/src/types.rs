//! Domain DTOs for the character catalog.
//!
//! # Design
//! These types mirror the remote API's schema and are deserialized strictly:
//! unknown enum values or missing fields fail the whole parse, which the
//! client reports as `ApiError::MalformedResponse`. The mock-server crate
//! defines its own copies; integration tests catch schema drift.

use serde::{Deserialize, Serialize};

/// Life status of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharacterStatus {
    Alive,
    Dead,
    #[serde(rename = "unknown")]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
    Genderless,
    #[serde(rename = "unknown")]
    Unknown,
}

/// A named place plus its API reference (empty when the API has none).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRef {
    pub name: String,
    pub url: String,
}

/// A single catalog entry. Never mutated client-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: u32,
    pub name: String,
    pub status: CharacterStatus,
    pub species: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub gender: Gender,
    pub origin: LocationRef,
    pub location: LocationRef,
    pub image: String,
    pub episode: Vec<String>,
    pub url: String,
    pub created: String,
}

/// Pagination metadata of a list response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub count: u32,
    pub pages: u32,
    pub next: Option<String>,
    pub prev: Option<String>,
}

impl PageInfo {
    pub fn empty() -> Self {
        Self {
            count: 0,
            pages: 0,
            next: None,
            prev: None,
        }
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

/// One page of the character list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterPage {
    pub info: PageInfo,
    pub results: Vec<Character>,
}

impl CharacterPage {
    /// What a 404 from the list endpoint means: no matches.
    pub fn empty() -> Self {
        Self {
            info: PageInfo::empty(),
            results: Vec::new(),
        }
    }
}

/// Active list filters. Empty strings mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterFilters {
    pub status: String,
    pub species: String,
}

impl CharacterFilters {
    pub fn new(status: impl Into<String>, species: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            species: species.into(),
        }
    }

    /// Merge a partial update; fields left `None` keep their value.
    pub fn apply(&mut self, update: FilterUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(species) = update.species {
            self.species = species;
        }
    }
}

/// Partial filter change. Only the fields present are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
}

impl FilterUpdate {
    pub fn status(value: impl Into<String>) -> Self {
        Self {
            status: Some(value.into()),
            species: None,
        }
    }

    pub fn species(value: impl Into<String>) -> Self {
        Self {
            status: None,
            species: Some(value.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RICK: &str = r#"{
        "id": 1,
        "name": "Rick Sanchez",
        "status": "Alive",
        "species": "Human",
        "type": "",
        "gender": "Male",
        "origin": {"name": "Earth (C-137)", "url": "https://rickandmortyapi.com/api/location/1"},
        "location": {"name": "Citadel of Ricks", "url": "https://rickandmortyapi.com/api/location/3"},
        "image": "https://rickandmortyapi.com/api/character/avatar/1.jpeg",
        "episode": ["https://rickandmortyapi.com/api/episode/1"],
        "url": "https://rickandmortyapi.com/api/character/1",
        "created": "2017-11-04T18:48:46.250Z"
    }"#;

    #[test]
    fn character_deserializes_wire_names() {
        let c: Character = serde_json::from_str(RICK).unwrap();
        assert_eq!(c.id, 1);
        assert_eq!(c.status, CharacterStatus::Alive);
        assert_eq!(c.gender, Gender::Male);
        assert_eq!(c.kind, "");
        assert_eq!(c.origin.name, "Earth (C-137)");
        assert_eq!(c.episode.len(), 1);
    }

    #[test]
    fn lowercase_unknown_maps_to_unknown_variants() {
        let json = RICK
            .replace("\"Alive\"", "\"unknown\"")
            .replace("\"Male\"", "\"unknown\"");
        let c: Character = serde_json::from_str(&json).unwrap();
        assert_eq!(c.status, CharacterStatus::Unknown);
        assert_eq!(c.gender, Gender::Unknown);

        let back = serde_json::to_value(&c).unwrap();
        assert_eq!(back["status"], "unknown");
        assert_eq!(back["type"], "");
    }

    #[test]
    fn unexpected_status_is_rejected() {
        let json = RICK.replace("\"Alive\"", "\"Zombie\"");
        assert!(serde_json::from_str::<Character>(&json).is_err());
    }

    #[test]
    fn filter_update_merges_only_present_fields() {
        let mut filters = CharacterFilters::new("alive", "human");
        filters.apply(FilterUpdate::species("alien"));
        assert_eq!(filters, CharacterFilters::new("alive", "alien"));

        filters.apply(FilterUpdate::default());
        assert_eq!(filters, CharacterFilters::new("alive", "alien"));
    }

    #[test]
    fn empty_page_has_no_next() {
        let page = CharacterPage::empty();
        assert!(page.results.is_empty());
        assert!(!page.info.has_next());
        assert_eq!(page.info.pages, 0);
    }
}
