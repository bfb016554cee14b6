use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: u32,
    pub name: String,
    pub status: String,
    pub species: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub gender: String,
    pub origin: Location,
    pub location: Location,
    pub image: String,
    pub episode: Vec<String>,
    pub url: String,
    pub created: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub count: usize,
    pub pages: usize,
    pub next: Option<String>,
    pub prev: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub info: Info,
    pub results: Vec<Character>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub page: Option<usize>,
    pub status: Option<String>,
    pub species: Option<String>,
}

/// Knobs for the fake catalog.
#[derive(Clone, Debug)]
pub struct MockConfig {
    /// Origin used for `next`/`prev` and character URLs.
    pub public_url: String,
    /// Delay added before every response.
    pub latency: Duration,
    pub page_size: usize,
    pub character_count: u32,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            public_url: "http://localhost:3000".to_string(),
            latency: Duration::ZERO,
            page_size: 20,
            character_count: 45,
        }
    }
}

#[derive(Clone)]
struct Catalog {
    characters: Arc<Vec<Character>>,
    config: Arc<MockConfig>,
}

const NAMES: [&str; 5] = [
    "Rick Sanchez",
    "Morty Smith",
    "Summer Smith",
    "Beth Smith",
    "Jerry Smith",
];

/// Deterministic dataset: status cycles Alive/Dead/unknown by `id % 3`,
/// odd ids are Human and even ids Alien.
pub fn seed_characters(count: u32, public_url: &str) -> Vec<Character> {
    (1..=count)
        .map(|id| {
            let status = match id % 3 {
                1 => "Alive",
                2 => "Dead",
                _ => "unknown",
            };
            let species = if id % 2 == 1 { "Human" } else { "Alien" };
            let gender = match id % 4 {
                0 => "Female",
                1 => "Male",
                2 => "Genderless",
                _ => "unknown",
            };
            let name = NAMES
                .get(id as usize - 1)
                .map(|n| n.to_string())
                .unwrap_or_else(|| format!("Citizen {id}"));
            let earth = Location {
                name: "Earth (C-137)".to_string(),
                url: format!("{public_url}/api/location/1"),
            };
            Character {
                id,
                name,
                status: status.to_string(),
                species: species.to_string(),
                kind: String::new(),
                gender: gender.to_string(),
                origin: earth.clone(),
                location: earth,
                image: format!("{public_url}/api/character/avatar/{id}.jpeg"),
                episode: vec![format!("{public_url}/api/episode/{}", id % 51 + 1)],
                url: format!("{public_url}/api/character/{id}"),
                created: "2017-11-04T18:48:46.250Z".to_string(),
            }
        })
        .collect()
}

pub fn app() -> Router {
    app_with(MockConfig::default())
}

pub fn app_with(config: MockConfig) -> Router {
    let catalog = Catalog {
        characters: Arc::new(seed_characters(config.character_count, &config.public_url)),
        config: Arc::new(config),
    };
    Router::new()
        .route("/api/character", get(list_characters))
        .route("/api/character/{id}", get(get_character))
        .layer(TraceLayer::new_for_http())
        .with_state(catalog)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, MockConfig::default()).await
}

pub async fn run_with(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<serde_json::Value>)>;

fn not_found(message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": message })))
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

async fn list_characters(State(catalog): State<Catalog>, Query(query): Query<ListQuery>) -> ApiResult<Page> {
    delay(&catalog.config).await;

    let status = normalize(query.status);
    let species = normalize(query.species);
    let matches: Vec<&Character> = catalog
        .characters
        .iter()
        .filter(|c| status.as_deref().is_none_or(|s| c.status.to_lowercase() == s))
        .filter(|c| species.as_deref().is_none_or(|s| c.species.to_lowercase() == s))
        .collect();

    let size = catalog.config.page_size.max(1);
    let pages = matches.len().div_ceil(size);
    let page = query.page.unwrap_or(1).max(1);
    if matches.is_empty() || page > pages {
        return Err(not_found("There is nothing here"));
    }

    let start = (page - 1) * size;
    let end = (start + size).min(matches.len());
    let link = |n: usize| {
        let mut url = format!("{}/api/character?page={n}", catalog.config.public_url);
        if let Some(s) = &status {
            url.push_str(&format!("&status={}", s.replace(' ', "%20")));
        }
        if let Some(s) = &species {
            url.push_str(&format!("&species={}", s.replace(' ', "%20")));
        }
        url
    };

    Ok(Json(Page {
        info: Info {
            count: matches.len(),
            pages,
            next: (page < pages).then(|| link(page + 1)),
            prev: (page > 1).then(|| link(page - 1)),
        },
        results: matches[start..end].iter().map(|c| (*c).clone()).collect(),
    }))
}

async fn get_character(State(catalog): State<Catalog>, Path(id): Path<u32>) -> ApiResult<Character> {
    delay(&catalog.config).await;
    catalog
        .characters
        .iter()
        .find(|c| c.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found("Character not found"))
}

async fn delay(config: &MockConfig) {
    if !config.latency.is_zero() {
        tokio::time::sleep(config.latency).await;
    }
}
