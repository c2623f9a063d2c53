//! Competition documents.
//!
//! A competition is always filed under a country. Writes merge into the stored
//! record with [`Competition::enrich`], so a partial quick-select capture never
//! erases aggregates a reconciliation search or roster scrape already stored.

use crate::error::{DatabaseError, Result};
use crate::{decode, encode, timestamp};
use scoutline_core::{Competition, CompetitionId, CountryId};
use sqlx::{Pool, Sqlite, SqliteConnection};

/// Look up a competition by its site ID.
pub async fn get_competition(
    pool: &Pool<Sqlite>,
    competition_id: &CompetitionId,
) -> Result<Option<Competition>> {
    let data: Option<String> = sqlx::query_scalar("SELECT data FROM competitions WHERE id = ?")
        .bind(competition_id.as_str())
        .fetch_optional(pool)
        .await?;

    data.map(|json| decode("competitions", competition_id.as_str(), &json))
        .transpose()
}

/// All competitions filed under a country, in the order they were first stored.
pub async fn get_competitions_for_country(
    pool: &Pool<Sqlite>,
    country_id: &CountryId,
) -> Result<Vec<Competition>> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT id, data FROM competitions WHERE country_id = ? ORDER BY rowid",
    )
    .bind(country_id.as_str())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|(id, json)| decode("competitions", id, json))
        .collect()
}

/// Merge competitions into an existing country's list.
///
/// # Errors
/// Returns `DatabaseError::NotFoundWithMessage` if the country is not stored.
pub async fn update_competitions_for_country(
    pool: &Pool<Sqlite>,
    country_id: &CountryId,
    competitions: &[Competition],
) -> Result<()> {
    let mut tx = pool.begin().await?;

    let exists: Option<String> = sqlx::query_scalar("SELECT id FROM countries WHERE id = ?")
        .bind(country_id.as_str())
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(DatabaseError::NotFoundWithMessage(format!(
            "Country '{country_id}' not found"
        )));
    }

    let now = timestamp();
    for competition in competitions {
        upsert_in(&mut tx, country_id, competition.clone(), &now).await?;
    }
    tx.commit().await?;

    tracing::debug!(
        "Updated {} competitions for country {}",
        competitions.len(),
        country_id
    );
    Ok(())
}

pub(crate) async fn upsert_in(
    conn: &mut SqliteConnection,
    country_id: &CountryId,
    mut competition: Competition,
    now: &str,
) -> Result<()> {
    competition.country_id = Some(country_id.clone());

    let stored: Option<String> = sqlx::query_scalar("SELECT data FROM competitions WHERE id = ?")
        .bind(competition.id.as_str())
        .fetch_optional(&mut *conn)
        .await?;

    let merged = match stored {
        Some(json) => {
            let mut existing: Competition =
                decode("competitions", competition.id.as_str(), &json)?;
            existing.enrich(competition);
            existing
        }
        None => competition,
    };

    sqlx::query(
        "INSERT INTO competitions (id, country_id, name, data, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
            country_id = excluded.country_id,
            name = excluded.name,
            data = excluded.data,
            updated_at = excluded.updated_at",
    )
    .bind(merged.id.as_str())
    .bind(country_id.as_str())
    .bind(&merged.name)
    .bind(encode(&merged)?)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
