//! Client-side narrowing and ordering for search results.
//!
//! The search endpoint neither filters by genre/year nor sorts, so the
//! engine does both locally on the page it received. Discovery results are
//! never passed through here; the server already applied the same filters.

use chrono::NaiveDate;

use crate::filters::{FilterState, SortBy};
use crate::types::Movie;

/// Apply the genre and year filters from `filters`, then its sort mode.
pub fn refine(results: Vec<Movie>, filters: &FilterState) -> Vec<Movie> {
    let mut results = narrow(results, filters.genre_id, filters.year);
    sort_locally(&mut results, &filters.sort_by);
    results
}

/// Keep results tagged with `genre` and released in `year`.
///
/// Records without a genre list never match a genre filter; records without
/// a parseable release date never match a year filter.
pub fn narrow(results: Vec<Movie>, genre: Option<i64>, year: Option<i32>) -> Vec<Movie> {
    results
        .into_iter()
        .filter(|m| genre.map_or(true, |g| m.has_genre(g)))
        .filter(|m| year.map_or(true, |y| m.release_year() == Some(y)))
        .collect()
}

/// Stable in-place sort for the modes the client can emulate. Other modes keep server order.
pub fn sort_locally(results: &mut [Movie], sort: &SortBy) {
    match sort {
        SortBy::VoteAverageDesc => results.sort_by(|a, b| b.rating().total_cmp(&a.rating())),
        SortBy::ReleaseDateDesc => results.sort_by(|a, b| date_key(b).cmp(&date_key(a))),
        SortBy::ReleaseDateAsc => results.sort_by(|a, b| date_key(a).cmp(&date_key(b))),
        _ => {}
    }
}

// Missing or unparseable dates sort as 1970-01-01.
fn date_key(m: &Movie) -> NaiveDate {
    m.release_day().unwrap_or_default()
}
