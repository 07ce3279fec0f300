use chrono::{DateTime, Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A catalog record as it appears in list responses.
///
/// The catalog names the display title `title` for movies and `name` for
/// other media; both are folded into [`Movie::title`] when the record is
/// deserialized, so nothing downstream sees the two-field form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawMovie")]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub overview: String,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    pub genre_ids: Option<Vec<i64>>,
}

#[derive(Deserialize)]
struct RawMovie {
    id: i64,
    title: Option<String>,
    name: Option<String>,
    overview: Option<String>,
    release_date: Option<String>,
    poster_path: Option<String>,
    vote_average: Option<f64>,
    genre_ids: Option<Vec<i64>>,
}

impl From<RawMovie> for Movie {
    fn from(raw: RawMovie) -> Self {
        Movie {
            id: raw.id,
            title: display_title(raw.title.as_deref(), raw.name.as_deref()),
            overview: raw.overview.unwrap_or_default(),
            release_date: non_empty(raw.release_date),
            poster_path: non_empty(raw.poster_path),
            vote_average: raw.vote_average,
            genre_ids: raw.genre_ids,
        }
    }
}

impl Movie {
    /// Minimal record, mostly useful to toggle a favorite by id.
    pub fn stub(id: i64, title: impl Into<String>) -> Self {
        Movie {
            id,
            title: title.into(),
            overview: String::new(),
            release_date: None,
            poster_path: None,
            vote_average: None,
            genre_ids: None,
        }
    }

    pub fn release_day(&self) -> Option<NaiveDate> {
        self.release_date.as_deref().and_then(parse_release_date)
    }

    pub fn release_year(&self) -> Option<i32> {
        self.release_day().map(|d| d.year())
    }

    /// Rating used for ordering; a missing rating counts as zero.
    pub fn rating(&self) -> f64 {
        self.vote_average.unwrap_or(0.0)
    }

    pub fn has_genre(&self, genre_id: i64) -> bool {
        self.genre_ids.as_ref().is_some_and(|ids| ids.contains(&genre_id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// First non-empty of `title` and `name`, or the empty string.
pub(crate) fn display_title(title: Option<&str>, name: Option<&str>) -> String {
    [title, name]
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and bare years.
pub(crate) fn parse_release_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if s.len() == 4 {
        return s.parse::<i32>().ok().and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1));
    }
    None
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}
