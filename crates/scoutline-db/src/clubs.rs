//! Club documents.

use crate::error::Result;
use crate::{decode, encode, timestamp};
use scoutline_core::{Club, ClubId, CompetitionId};
use sqlx::{Pool, Sqlite};

/// Insert or update clubs in one transaction.
///
/// Competition memberships accumulate across writes. A record with an empty
/// squad keeps the previously stored player list.
pub async fn upsert_clubs(pool: &Pool<Sqlite>, clubs: &[Club]) -> Result<()> {
    let now = timestamp();
    let mut tx = pool.begin().await?;

    for club in clubs {
        let stored: Option<String> = sqlx::query_scalar("SELECT data FROM clubs WHERE id = ?")
            .bind(club.id.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        let mut merged = club.clone();
        if let Some(json) = stored {
            let existing: Club = decode("clubs", club.id.as_str(), &json)?;
            merged.competition_ids.extend(existing.competition_ids);
            if merged.player_ids.is_empty() {
                merged.player_ids = existing.player_ids;
            }
        }

        sqlx::query(
            "INSERT INTO clubs (id, name, data, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                data = excluded.data,
                updated_at = excluded.updated_at",
        )
        .bind(merged.id.as_str())
        .bind(&merged.name)
        .bind(encode(&merged)?)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    tracing::debug!("Upserted {} clubs", clubs.len());
    Ok(())
}

/// Look up a club by its site ID.
pub async fn get_club(pool: &Pool<Sqlite>, club_id: &ClubId) -> Result<Option<Club>> {
    let data: Option<String> = sqlx::query_scalar("SELECT data FROM clubs WHERE id = ?")
        .bind(club_id.as_str())
        .fetch_optional(pool)
        .await?;

    data.map(|json| decode("clubs", club_id.as_str(), &json))
        .transpose()
}

/// Clubs that take part in a competition, sorted by name.
pub async fn get_clubs_for_competition(
    pool: &Pool<Sqlite>,
    competition_id: &CompetitionId,
) -> Result<Vec<Club>> {
    let rows: Vec<(String, String)> = sqlx::query_as("SELECT id, data FROM clubs ORDER BY name")
        .fetch_all(pool)
        .await?;

    let mut clubs = Vec::new();
    for (id, json) in rows {
        let club: Club = decode("clubs", &id, &json)?;
        if club.competition_ids.contains(competition_id) {
            clubs.push(club);
        }
    }
    Ok(clubs)
}
