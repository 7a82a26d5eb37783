//! Inbound parameter checks for the movie endpoints.
//!
//! Every failing field is collected so the caller gets the full list in one 400 response.
use chrono::{Datelike, Utc};
use serde::Deserialize;

use crate::error::{AppError, FieldError, Location};

pub const MIN_QUERY_CHARS: usize = 2;
pub const FIRST_FILM_YEAR: i64 = 1888;
pub const MAX_PAGE: i64 = 100;

/// Raw `?query&type&year&page` parameters, exactly as received.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub year: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct DetailParams {
    pub plot: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Movie,
    Series,
    Episode,
}

impl MediaType {
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "movie" => Some(MediaType::Movie),
            "series" => Some(MediaType::Series),
            "episode" => Some(MediaType::Episode),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Series => "series",
            MediaType::Episode => "episode",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Plot {
    Short,
    #[default]
    Full,
}

impl Plot {
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "short" => Some(Plot::Short),
            "full" => Some(Plot::Full),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Plot::Short => "short",
            Plot::Full => "full",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub media_type: Option<MediaType>,
    pub year: Option<i32>,
    pub page: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieLookup {
    pub id: String,
    pub plot: Plot,
}

pub fn validate_search(params: &SearchParams) -> Result<SearchQuery, AppError> {
    validate_search_for_year(params, Utc::now().year())
}

/// Same as [`validate_search`] with the upper year bound pinned, so the check is reproducible.
pub fn validate_search_for_year(
    params: &SearchParams,
    current_year: i32,
) -> Result<SearchQuery, AppError> {
    let mut errors = Vec::new();

    let text = params.query.as_deref().unwrap_or_default().trim().to_string();
    if text.is_empty() {
        errors.push(query_error("query", "Search query is required", &text));
    } else if text.chars().count() < MIN_QUERY_CHARS {
        errors.push(query_error(
            "query",
            "Search query must be at least 2 characters long",
            &text,
        ));
    }

    let media_type = match params.media_type.as_deref() {
        None => None,
        Some(raw) => {
            let parsed = MediaType::parse(raw);
            if parsed.is_none() {
                errors.push(query_error(
                    "type",
                    "Type must be either movie, series, or episode",
                    raw,
                ));
            }
            parsed
        }
    };

    let year = match params.year.as_deref() {
        None => None,
        Some(raw) => {
            let parsed = int_in_range(raw, FIRST_FILM_YEAR, i64::from(current_year));
            if parsed.is_none() {
                errors.push(query_error("year", "Invalid year", raw));
            }
            parsed.and_then(|y| i32::try_from(y).ok())
        }
    };

    let page = match params.page.as_deref() {
        None => Some(1),
        Some(raw) => {
            let parsed = int_in_range(raw, 1, MAX_PAGE);
            if parsed.is_none() {
                errors.push(query_error("page", "Page must be between 1 and 100", raw));
            }
            parsed.and_then(|p| u32::try_from(p).ok())
        }
    };

    match page {
        Some(page) if errors.is_empty() => Ok(SearchQuery {
            text,
            media_type,
            year,
            page,
        }),
        _ => Err(AppError::Validation(errors)),
    }
}

pub fn validate_lookup(id: &str, params: &DetailParams) -> Result<MovieLookup, AppError> {
    let mut errors = Vec::new();

    let id = id.trim();
    if id.is_empty() {
        errors.push(FieldError {
            field: "id",
            message: "Movie ID is required",
            value: Some(id.to_string()),
            location: Location::Params,
        });
    } else if !is_imdb_id(id) {
        errors.push(FieldError {
            field: "id",
            message: "Invalid movie ID format",
            value: Some(id.to_string()),
            location: Location::Params,
        });
    }

    let plot = match params.plot.as_deref() {
        None => Plot::default(),
        Some(raw) => Plot::parse(raw).unwrap_or_else(|| {
            errors.push(query_error("plot", "Plot must be either short or full", raw));
            Plot::default()
        }),
    };

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    Ok(MovieLookup {
        id: id.to_string(),
        plot,
    })
}

/// Turns a query-string decoding failure (e.g. `?page=1&page=2`) into a field error.
///
/// `fields` lists the parameters the endpoint accepts; the first one named in
/// `detail` is blamed, otherwise the first entry.
pub fn malformed_query(detail: &str, fields: &[&'static str]) -> AppError {
    let field = fields
        .iter()
        .copied()
        .find(|f| detail.contains(&format!("`{f}`")))
        .or_else(|| fields.first().copied())
        .unwrap_or("query");
    let message = if detail.contains("duplicate field") {
        "Parameter must not be repeated"
    } else {
        "Malformed query string"
    };
    AppError::Validation(vec![FieldError {
        field,
        message,
        value: None,
        location: Location::Query,
    }])
}

/// `tt` followed by one or more ASCII digits.
pub fn is_imdb_id(input: &str) -> bool {
    input
        .strip_prefix("tt")
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}

fn int_in_range(raw: &str, min: i64, max: i64) -> Option<i64> {
    raw.parse::<i64>()
        .ok()
        .filter(|v| (min..=max).contains(v))
}

fn query_error(field: &'static str, message: &'static str, value: &str) -> FieldError {
    FieldError {
        field,
        message,
        value: Some(value.to_string()),
        location: Location::Query,
    }
}
