//! Player statistics documents.
//!
//! The whole season > competition > match hierarchy of a player is stored as
//! one document and written back in full after each harvest.

use crate::error::Result;
use crate::{decode, encode, timestamp};
use scoutline_core::{PlayerId, PlayerStat};
use sqlx::{Pool, Sqlite};

/// Load a player's statistics document.
pub async fn get_player_stat(
    pool: &Pool<Sqlite>,
    player_id: &PlayerId,
) -> Result<Option<PlayerStat>> {
    let row: Option<(String, String)> =
        sqlx::query_as("SELECT id, data FROM player_stats WHERE player_id = ?")
            .bind(player_id.as_str())
            .fetch_optional(pool)
            .await?;

    row.map(|(id, json)| decode("player_stats", &id, &json))
        .transpose()
}

/// Insert or replace a player's statistics document.
///
/// The player must already be stored.
pub async fn upsert_player_stat(pool: &Pool<Sqlite>, stat: &PlayerStat) -> Result<()> {
    let now = timestamp();

    sqlx::query(
        "INSERT INTO player_stats (id, player_id, data, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
            data = excluded.data,
            updated_at = excluded.updated_at",
    )
    .bind(stat.id.as_str())
    .bind(stat.player_id.as_str())
    .bind(encode(stat)?)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    tracing::debug!(
        "Stored stats for player {} ({} seasons)",
        stat.player_id,
        stat.seasons.len()
    );
    Ok(())
}
