use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

pub const DEFAULT_SORT: &str = "popularity.desc";

/// Catalog sort key. Unknown keys are passed through to the discovery endpoint untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SortBy {
    #[default]
    PopularityDesc,
    PopularityAsc,
    VoteAverageDesc,
    VoteAverageAsc,
    ReleaseDateDesc,
    ReleaseDateAsc,
    Other(String),
}

impl SortBy {
    pub fn as_str(&self) -> &str {
        match self {
            SortBy::PopularityDesc => DEFAULT_SORT,
            SortBy::PopularityAsc => "popularity.asc",
            SortBy::VoteAverageDesc => "vote_average.desc",
            SortBy::VoteAverageAsc => "vote_average.asc",
            SortBy::ReleaseDateDesc => "primary_release_date.desc",
            SortBy::ReleaseDateAsc => "primary_release_date.asc",
            SortBy::Other(s) => s.as_str(),
        }
    }

    /// Total parse: empty input is the default, anything unrecognised becomes `Other`.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "" | DEFAULT_SORT => SortBy::PopularityDesc,
            "popularity.asc" => SortBy::PopularityAsc,
            "vote_average.desc" => SortBy::VoteAverageDesc,
            "vote_average.asc" => SortBy::VoteAverageAsc,
            "primary_release_date.desc" => SortBy::ReleaseDateDesc,
            "primary_release_date.asc" => SortBy::ReleaseDateAsc,
            other => SortBy::Other(other.to_string()),
        }
    }
}

impl FromStr for SortBy {
    type Err = Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SortBy::parse(s))
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for SortBy {
    fn from(s: String) -> Self {
        SortBy::parse(&s)
    }
}

impl From<SortBy> for String {
    fn from(s: SortBy) -> Self {
        s.as_str().to_string()
    }
}

/// The consumer's current query parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    pub query: String,
    pub genre_id: Option<i64>,
    pub year: Option<i32>,
    pub sort_by: SortBy,
}

impl FilterState {
    /// Zero genre/year mean "unset".
    pub fn normalized(mut self) -> Self {
        self.genre_id = self.genre_id.filter(|g| *g != 0);
        self.year = self.year.filter(|y| *y != 0);
        self
    }

    /// Trimmed free-text query, or `None` when the discovery branch applies.
    pub fn search_text(&self) -> Option<&str> {
        Some(self.query.trim()).filter(|q| !q.is_empty())
    }

    pub fn apply(&mut self, patch: FilterPatch) {
        if let Some(q) = patch.query {
            self.query = q;
        }
        if let Some(g) = patch.genre_id {
            self.genre_id = g;
        }
        if let Some(y) = patch.year {
            self.year = y;
        }
        if let Some(s) = patch.sort_by {
            self.sort_by = s;
        }
    }
}

/// Field-level update; outer `None` leaves the field as is, `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct FilterPatch {
    pub query: Option<String>,
    pub genre_id: Option<Option<i64>>,
    pub year: Option<Option<i32>>,
    pub sort_by: Option<SortBy>,
}

/// Session-wide filter state handle. Clones share the same value.
#[derive(Debug, Clone, Default)]
pub struct SharedFilters(Arc<RwLock<FilterState>>);

impl SharedFilters {
    pub fn new(initial: FilterState) -> Self {
        Self(Arc::new(RwLock::new(initial.normalized())))
    }

    pub fn snapshot(&self) -> FilterState {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn replace(&self, next: FilterState) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = next.normalized();
    }

    pub fn patch(&self, patch: FilterPatch) {
        let mut guard = self.0.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = guard.clone();
        next.apply(patch);
        *guard = next.normalized();
    }
}
