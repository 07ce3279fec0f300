// Typed endpoints over the raw `Catalog::request`.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::gateway::{Catalog, Params};
use crate::types::{display_title, Genre, Movie};

/// The catalog never serves more than this many pages for one listing.
pub const MAX_TOTAL_PAGES: u32 = 500;

pub const GENRES_PATH: &str = "/genre/movie/list";
pub const DISCOVER_PATH: &str = "/discover/movie";
pub const SEARCH_PATH: &str = "/search/movie";

/// `{ page, total_pages, results }` envelope shared by list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoviePage {
    pub page: Option<u32>,
    pub total_pages: Option<u32>,
    pub results: Option<Vec<Movie>>,
}

impl MoviePage {
    pub fn page_or(&self, requested: u32) -> u32 {
        self.page.filter(|p| *p >= 1).unwrap_or(requested)
    }

    /// Server total clamped to `[1, MAX_TOTAL_PAGES]`.
    pub fn total_pages_clamped(&self) -> u32 {
        self.total_pages.unwrap_or(1).clamp(1, MAX_TOTAL_PAGES)
    }

    pub fn into_results(self) -> Vec<Movie> {
        self.results.unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct GenreList {
    #[serde(default)]
    genres: Vec<Genre>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Video {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub site: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CastMember {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub character: Option<String>,
    pub order: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CrewMember {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub job: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

/// `/movie/{id}` with `credits` and `videos` appended.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawDetail")]
pub struct DetailRecord {
    pub id: i64,
    pub title: String,
    pub overview: String,
    pub tagline: Option<String>,
    pub release_date: Option<String>,
    pub runtime: Option<u32>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: Option<f64>,
    pub genres: Vec<Genre>,
    pub credits: Credits,
    pub videos: Vec<Video>,
}

#[derive(Deserialize)]
struct RawDetail {
    id: i64,
    title: Option<String>,
    name: Option<String>,
    overview: Option<String>,
    tagline: Option<String>,
    release_date: Option<String>,
    runtime: Option<u32>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    vote_average: Option<f64>,
    #[serde(default)]
    genres: Vec<Genre>,
    credits: Option<Credits>,
    videos: Option<VideoList>,
}

#[derive(Deserialize)]
struct VideoList {
    #[serde(default)]
    results: Vec<Video>,
}

impl From<RawDetail> for DetailRecord {
    fn from(raw: RawDetail) -> Self {
        DetailRecord {
            id: raw.id,
            title: display_title(raw.title.as_deref(), raw.name.as_deref()),
            overview: raw.overview.unwrap_or_default(),
            tagline: raw.tagline.filter(|t| !t.is_empty()),
            release_date: raw.release_date.filter(|d| !d.is_empty()),
            runtime: raw.runtime.filter(|r| *r > 0),
            poster_path: raw.poster_path,
            backdrop_path: raw.backdrop_path,
            vote_average: raw.vote_average,
            genres: raw.genres,
            credits: raw.credits.unwrap_or_default(),
            videos: raw.videos.map(|v| v.results).unwrap_or_default(),
        }
    }
}

impl DetailRecord {
    /// List-shaped view of this record, e.g. to toggle it as a favorite.
    pub fn to_movie(&self) -> Movie {
        Movie {
            id: self.id,
            title: self.title.clone(),
            overview: self.overview.clone(),
            release_date: self.release_date.clone(),
            poster_path: self.poster_path.clone(),
            vote_average: self.vote_average,
            genre_ids: Some(self.genres.iter().map(|g| g.id).collect()),
        }
    }
}

pub async fn fetch_genres(catalog: &dyn Catalog) -> ApiResult<Vec<Genre>> {
    let body = catalog.request(GENRES_PATH, &Params::new()).await?;
    decode::<GenreList>(GENRES_PATH, body).map(|g| g.genres)
}

pub async fn discover_movies(catalog: &dyn Catalog, params: &Params) -> ApiResult<MoviePage> {
    let body = catalog.request(DISCOVER_PATH, params).await?;
    decode(DISCOVER_PATH, body)
}

pub async fn search_movies(catalog: &dyn Catalog, query: &str, page: u32) -> ApiResult<MoviePage> {
    let params = Params::new().set("query", query).set("page", page);
    let body = catalog.request(SEARCH_PATH, &params).await?;
    decode(SEARCH_PATH, body)
}

pub async fn movie_details(catalog: &dyn Catalog, id: i64) -> ApiResult<DetailRecord> {
    let path = format!("/movie/{id}");
    let params = Params::new().set("append_to_response", "credits,videos");
    let body = catalog.request(&path, &params).await?;
    decode(&path, body)
}

fn decode<T: DeserializeOwned>(path: &str, body: Value) -> ApiResult<T> {
    serde_json::from_value(body).map_err(|e| ApiError::parse(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn envelope_defaults() {
        let page: MoviePage = serde_json::from_value(json!({})).unwrap();
        assert_eq!(page.page_or(4), 4);
        assert_eq!(page.total_pages_clamped(), 1);
        assert!(page.into_results().is_empty());
    }

    #[test]
    fn total_pages_is_capped() {
        let page: MoviePage = serde_json::from_value(json!({"page": 3, "total_pages": 10000, "results": []})).unwrap();
        assert_eq!(page.page_or(1), 3);
        assert_eq!(page.total_pages_clamped(), MAX_TOTAL_PAGES);

        let empty: MoviePage = serde_json::from_value(json!({"page": 1, "total_pages": 0})).unwrap();
        assert_eq!(empty.total_pages_clamped(), 1);
    }

    #[test]
    fn wrong_shape_is_parse_error() {
        let err = decode::<MoviePage>(SEARCH_PATH, json!({"results": "nope"})).unwrap_err();
        assert_matches!(err, ApiError::Parse { ref path, .. } if path == SEARCH_PATH);
    }

    #[test]
    fn detail_flattens_appended_resources() {
        let d: DetailRecord = serde_json::from_value(json!({
            "id": 603, "title": "The Matrix", "overview": "...", "tagline": "",
            "runtime": 136, "genres": [{"id": 28, "name": "Action"}],
            "credits": {"cast": [{"id": 6384, "name": "Keanu Reeves", "character": "Neo", "order": 0}]},
            "videos": {"results": [{"key": "abc", "site": "YouTube", "type": "Trailer", "name": "Official"}]}
        })).unwrap();
        assert_eq!(d.tagline, None);
        assert_eq!(d.runtime, Some(136));
        assert_eq!(d.credits.cast[0].name, "Keanu Reeves");
        assert!(d.credits.crew.is_empty());
        assert_eq!(d.videos[0].kind, "Trailer");

        let m = d.to_movie();
        assert_eq!((m.id, m.title.as_str()), (603, "The Matrix"));
        assert_eq!(m.genre_ids, Some(vec![28]));
    }
}
