//! Country records and their competition lists.
//!
//! The number of stored countries doubles as the discovery resume point, so
//! the sentinel "International" country is excluded from
//! [`count_countries`].

use crate::competitions::{self, get_competitions_for_country};
use crate::error::{DatabaseError, Result};
use crate::{decode, timestamp};
use scoutline_core::{Competition, Country, CountryId, INTERNATIONAL_COUNTRY_ID};
use sqlx::{Pool, Sqlite};
use std::collections::HashMap;

/// Number of countries persisted by discovery.
pub async fn count_countries(pool: &Pool<Sqlite>) -> Result<usize> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM countries WHERE id != ?")
        .bind(INTERNATIONAL_COUNTRY_ID)
        .fetch_one(pool)
        .await?;

    Ok(usize::try_from(count).unwrap_or_default())
}

/// All stored countries with their competitions, sorted by name.
pub async fn get_all_countries(pool: &Pool<Sqlite>) -> Result<Vec<Country>> {
    let rows: Vec<(String, String, Option<String>)> =
        sqlx::query_as("SELECT id, name, flag_url FROM countries ORDER BY name, id")
            .fetch_all(pool)
            .await?;

    let competition_rows: Vec<(String, String, String)> =
        sqlx::query_as("SELECT country_id, id, data FROM competitions ORDER BY rowid")
            .fetch_all(pool)
            .await?;

    let mut by_country: HashMap<String, Vec<Competition>> = HashMap::new();
    for (country_id, id, json) in competition_rows {
        let competition = decode("competitions", &id, &json)?;
        by_country.entry(country_id).or_default().push(competition);
    }

    rows.into_iter()
        .map(|(id, name, flag_url)| {
            let competitions = by_country.remove(&id).unwrap_or_default();
            Ok(Country {
                id: parse_country_id(&id)?,
                name,
                flag_url,
                competitions,
            })
        })
        .collect()
}

/// Look up a single country with its competitions.
pub async fn get_country(pool: &Pool<Sqlite>, country_id: &CountryId) -> Result<Option<Country>> {
    let row: Option<(String, Option<String>)> =
        sqlx::query_as("SELECT name, flag_url FROM countries WHERE id = ?")
            .bind(country_id.as_str())
            .fetch_optional(pool)
            .await?;

    let Some((name, flag_url)) = row else {
        return Ok(None);
    };

    Ok(Some(Country {
        id: country_id.clone(),
        name,
        flag_url,
        competitions: get_competitions_for_country(pool, country_id).await?,
    }))
}

/// Insert or update countries and merge their competitions, in one transaction.
pub async fn upsert_countries(pool: &Pool<Sqlite>, countries: &[Country]) -> Result<()> {
    let now = timestamp();
    let mut tx = pool.begin().await?;

    for country in countries {
        sqlx::query(
            "INSERT INTO countries (id, name, flag_url, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                flag_url = COALESCE(excluded.flag_url, countries.flag_url),
                updated_at = excluded.updated_at",
        )
        .bind(country.id.as_str())
        .bind(&country.name)
        .bind(country.flag_url.as_deref())
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        for competition in &country.competitions {
            competitions::upsert_in(&mut tx, &country.id, competition.clone(), &now).await?;
        }
    }

    tx.commit().await?;
    tracing::debug!("Upserted {} countries", countries.len());
    Ok(())
}

fn parse_country_id(id: &str) -> Result<CountryId> {
    CountryId::new(id).map_err(|e| DatabaseError::Decode(format!("countries row: {e}")))
}
