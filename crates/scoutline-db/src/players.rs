//! Player documents.

use crate::error::Result;
use crate::{decode, encode, timestamp};
use scoutline_core::{ClubId, Player, PlayerId};
use sqlx::{Pool, Sqlite};

/// Insert or update players in one transaction.
///
/// A record without market-value history (a degraded lookup) keeps the
/// history already stored for that player.
pub async fn upsert_players(pool: &Pool<Sqlite>, players: &[Player]) -> Result<()> {
    let now = timestamp();
    let mut tx = pool.begin().await?;

    for player in players {
        let mut merged = player.clone();
        if merged.market_value_history.is_empty() {
            let stored: Option<String> =
                sqlx::query_scalar("SELECT data FROM players WHERE id = ?")
                    .bind(player.id.as_str())
                    .fetch_optional(&mut *tx)
                    .await?;
            if let Some(json) = stored {
                let existing: Player = decode("players", player.id.as_str(), &json)?;
                merged.market_value_history = existing.market_value_history;
                merged.market_value = merged.market_value.or(existing.market_value);
            }
        }

        sqlx::query(
            "INSERT INTO players (id, club_id, name, data, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                club_id = COALESCE(excluded.club_id, players.club_id),
                name = excluded.name,
                data = excluded.data,
                updated_at = excluded.updated_at",
        )
        .bind(merged.id.as_str())
        .bind(merged.club_id.as_ref().map(ClubId::as_str))
        .bind(&merged.name)
        .bind(encode(&merged)?)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    tracing::debug!("Upserted {} players", players.len());
    Ok(())
}

/// Look up a player by its site ID.
pub async fn get_player(pool: &Pool<Sqlite>, player_id: &PlayerId) -> Result<Option<Player>> {
    let data: Option<String> = sqlx::query_scalar("SELECT data FROM players WHERE id = ?")
        .bind(player_id.as_str())
        .fetch_optional(pool)
        .await?;

    data.map(|json| decode("players", player_id.as_str(), &json))
        .transpose()
}

/// Players currently listed in a club's squad, sorted by name.
pub async fn get_players_for_club(pool: &Pool<Sqlite>, club_id: &ClubId) -> Result<Vec<Player>> {
    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT id, data FROM players WHERE club_id = ? ORDER BY name")
            .bind(club_id.as_str())
            .fetch_all(pool)
            .await?;

    rows.iter()
        .map(|(id, json)| decode("players", id, json))
        .collect()
}
