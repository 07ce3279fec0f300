use chrono::Datelike;

use crate::types::parse_release_date;

pub const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/";
pub const PLACEHOLDER_POSTER: &str = "/placeholder-poster.svg";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PosterSize {
    W185,
    #[default]
    W342,
    W500,
}

impl PosterSize {
    pub fn as_str(self) -> &'static str {
        match self {
            PosterSize::W185 => "w185",
            PosterSize::W342 => "w342",
            PosterSize::W500 => "w500",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackdropSize {
    #[default]
    W780,
    W1280,
    Original,
}

impl BackdropSize {
    pub fn as_str(self) -> &'static str {
        match self {
            BackdropSize::W780 => "w780",
            BackdropSize::W1280 => "w1280",
            BackdropSize::Original => "original",
        }
    }
}

/// Full poster URL, or the bundled placeholder when the record has none.
pub fn poster_url(path: Option<&str>, size: PosterSize) -> String {
    match path.filter(|p| !p.is_empty()) {
        Some(p) => format!("{IMAGE_BASE}{}{p}", size.as_str()),
        None => PLACEHOLDER_POSTER.to_string(),
    }
}

/// Full backdrop URL; empty when the record has none.
pub fn backdrop_url(path: Option<&str>, size: BackdropSize) -> String {
    match path.filter(|p| !p.is_empty()) {
        Some(p) => format!("{IMAGE_BASE}{}{p}", size.as_str()),
        None => String::new(),
    }
}

pub fn year_of(date: Option<&str>) -> Option<i32> {
    date.and_then(parse_release_date).map(|d| d.year())
}
