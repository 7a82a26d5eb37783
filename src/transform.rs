//! Reshapes OMDb payloads into the proxy's response types. No I/O.
use crate::models::{MovieDetail, SearchResultItem, SearchResultPage};
use crate::omdb::{MovieRecord, SearchResponse};

/// OMDb always pages search results by ten.
pub const PAGE_SIZE: u64 = 10;
pub const THUMBNAIL_HEIGHT: u32 = 300;
const POSTER_SENTINEL: &str = "N/A";

/// Builds image-endpoint URLs for a movie poster.
#[derive(Debug, Clone, Copy)]
pub struct PosterLinks<'a> {
    base: &'a str,
    api_key: &'a str,
}

impl<'a> PosterLinks<'a> {
    pub fn new(base: &'a str, api_key: &'a str) -> Self {
        Self {
            base: base.trim_end_matches('/'),
            api_key,
        }
    }

    /// Full resolution when `height` is `None`.
    pub fn url(&self, imdb_id: &str, height: Option<u32>) -> String {
        let mut url = format!(
            "{}/?apikey={}&i={}",
            self.base,
            urlencoding::encode(self.api_key),
            urlencoding::encode(imdb_id)
        );
        if let Some(h) = height {
            url.push_str(&format!("&h={h}"));
        }
        url
    }

    pub fn thumbnail(&self, imdb_id: &str) -> String {
        self.url(imdb_id, Some(THUMBNAIL_HEIGHT))
    }

    pub fn full(&self, imdb_id: &str) -> String {
        self.url(imdb_id, None)
    }
}

/// Drops the "no poster" sentinel (and blanks) so they serialize as `null`.
pub fn normalize_poster(poster: Option<String>) -> Option<String> {
    poster.filter(|p| {
        let p = p.trim();
        !p.is_empty() && p != POSTER_SENTINEL
    })
}

pub fn parse_total_results(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse::<u64>().ok()).unwrap_or(0)
}

pub fn total_pages(total_results: u64) -> u64 {
    total_results.div_ceil(PAGE_SIZE)
}

pub fn to_search_result_page(
    body: SearchResponse,
    page: u32,
    links: &PosterLinks<'_>,
) -> SearchResultPage {
    let total_results = parse_total_results(body.total_results.as_deref());
    let movies = body
        .search
        .into_iter()
        .map(|item| {
            let poster = normalize_poster(item.poster);
            // No id, nothing to point the image endpoint at.
            let poster_thumbnail = poster
                .as_ref()
                .filter(|_| !item.imdb_id.is_empty())
                .map(|_| links.thumbnail(&item.imdb_id));
            SearchResultItem {
                imdb_id: item.imdb_id,
                title: item.title,
                year: item.year,
                poster,
                poster_thumbnail,
                extra: item.extra,
            }
        })
        .collect();

    SearchResultPage {
        movies,
        total_results,
        current_page: page,
        total_pages: total_pages(total_results),
    }
}

pub fn to_movie_detail(record: MovieRecord, id: &str, links: &PosterLinks<'_>) -> MovieDetail {
    let poster = normalize_poster(record.poster);
    let (poster_hq, poster_thumbnail) = match poster {
        Some(_) => (Some(links.full(id)), Some(links.thumbnail(id))),
        None => (None, None),
    };

    MovieDetail {
        imdb_id: record.imdb_id,
        title: record.title,
        year: record.year,
        runtime: record.runtime,
        genre: record.genre,
        director: record.director,
        actors: record.actors,
        plot: record.plot,
        imdb_rating: record.imdb_rating,
        poster,
        poster_hq,
        poster_thumbnail,
        extra: record.extra,
    }
}
