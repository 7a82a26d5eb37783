use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultItem {
    #[serde(rename = "imdbID")]
    pub imdb_id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "Poster")]
    pub poster: Option<String>,
    #[serde(rename = "PosterThumbnail")]
    pub poster_thumbnail: Option<String>,
    /// Remaining upstream fields (`Type`, ...), passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultPage {
    pub movies: Vec<SearchResultItem>,
    pub total_results: u64,
    pub current_page: u32,
    pub total_pages: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetail {
    #[serde(rename = "imdbID")]
    pub imdb_id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "Runtime")]
    pub runtime: String,
    #[serde(rename = "Genre")]
    pub genre: String,
    #[serde(rename = "Director")]
    pub director: String,
    #[serde(rename = "Actors")]
    pub actors: String,
    #[serde(rename = "Plot")]
    pub plot: String,
    #[serde(rename = "imdbRating")]
    pub imdb_rating: String,
    #[serde(rename = "Poster")]
    pub poster: Option<String>,
    #[serde(rename = "PosterHQ")]
    pub poster_hq: Option<String>,
    #[serde(rename = "PosterThumbnail")]
    pub poster_thumbnail: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
