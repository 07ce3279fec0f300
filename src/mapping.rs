use anyhow::{Context, Result};

use crate::dao::FavoriteRow;
use crate::favorites::FavoriteEntry;
use crate::types::Movie;

pub fn favorite_from_movie(movie: &Movie) -> FavoriteEntry {
    FavoriteEntry {
        id: movie.id,
        title: movie.title.clone(),
        poster_path: movie.poster_path.clone(),
        vote_average: movie.vote_average,
        genre_ids: movie.genre_ids.clone(),
    }
}

pub fn favorite_row_from(position: i64, entry: &FavoriteEntry) -> Result<FavoriteRow> {
    let genre_ids = entry
        .genre_ids
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .context("encoding genre ids")?;
    Ok(FavoriteRow {
        id: entry.id,
        position,
        title: entry.title.clone(),
        poster_path: entry.poster_path.clone(),
        vote_average: entry.vote_average,
        genre_ids,
    })
}

pub fn favorite_from_row(row: FavoriteRow) -> Result<FavoriteEntry> {
    let genre_ids = row
        .genre_ids
        .as_deref()
        .map(serde_json::from_str::<Vec<i64>>)
        .transpose()
        .with_context(|| format!("decoding genre ids for favorite {}", row.id))?;
    Ok(FavoriteEntry {
        id: row.id,
        title: row.title,
        poster_path: row.poster_path,
        vote_average: row.vote_average,
        genre_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_conversion_is_lossless() {
        let entry = FavoriteEntry {
            id: 42,
            title: "Dune".into(),
            poster_path: Some("/p.jpg".into()),
            vote_average: Some(8.1),
            genre_ids: Some(vec![12, 28]),
        };
        let row = favorite_row_from(3, &entry).unwrap();
        assert_eq!(row.genre_ids.as_deref(), Some("[12,28]"));
        assert_eq!(favorite_from_row(row).unwrap(), entry);

        let bare = FavoriteEntry { genre_ids: None, poster_path: None, vote_average: None, ..entry };
        let row = favorite_row_from(0, &bare).unwrap();
        assert_eq!(row.genre_ids, None);
        assert_eq!(favorite_from_row(row).unwrap(), bare);
    }
}
