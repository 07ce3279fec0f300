use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::AnyPool;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteRow {
    pub id: i64,
    pub position: i64,
    pub title: String,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    pub genre_ids: Option<String>, // JSON array string
}

type FavoriteTuple = (i64, i64, String, Option<String>, Option<f64>, Option<String>);

pub async fn list_favorites(pool: &AnyPool) -> Result<Vec<FavoriteRow>> {
    let rows: Vec<FavoriteTuple> = sqlx::query_as(
        "SELECT id, position, title, poster_path, vote_average, genre_ids FROM favorites ORDER BY position, id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(id, position, title, poster_path, vote_average, genre_ids)| FavoriteRow {
            id,
            position,
            title,
            poster_path,
            vote_average,
            genre_ids,
        })
        .collect())
}

/// Replace the whole table with `rows` in one transaction.
pub async fn replace_favorites(pool: &AnyPool, rows: &[FavoriteRow]) -> Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM favorites").execute(&mut *tx).await?;
    for r in rows {
        sqlx::query(
            "INSERT INTO favorites(id, position, title, poster_path, vote_average, genre_ids)\n             VALUES(?, ?, ?, ?, ?, ?)\n             ON CONFLICT(id) DO UPDATE SET\n               position=excluded.position, title=excluded.title, poster_path=excluded.poster_path,\n               vote_average=excluded.vote_average, genre_ids=excluded.genre_ids",
        )
        .bind(r.id)
        .bind(r.position)
        .bind(&r.title)
        .bind(&r.poster_path)
        .bind(r.vote_average)
        .bind(&r.genre_ids)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

pub async fn count_favorites(pool: &AnyPool) -> Result<i64> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM favorites").fetch_one(pool).await?;
    Ok(n)
}
