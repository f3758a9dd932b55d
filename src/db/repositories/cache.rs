use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{DatabaseConnection, EntityTrait, Set};

use crate::entities::{prelude::*, weather_cache};

pub struct CacheRepository {
    conn: DatabaseConnection,
}

impl CacheRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Return the cached payload for a search if it is still fresh.
    ///
    /// A row with an unparseable timestamp is treated as absent.
    pub async fn get_fresh(&self, search_id: i32, ttl: Duration) -> Result<Option<String>> {
        let row = WeatherCache::find_by_id(search_id)
            .one(&self.conn)
            .await
            .context("Failed to query weather cache")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let Ok(last_fetched) = DateTime::parse_from_rfc3339(&row.last_fetched) else {
            return Ok(None);
        };

        if is_fresh(last_fetched.with_timezone(&Utc), Utc::now(), ttl) {
            Ok(Some(row.data))
        } else {
            Ok(None)
        }
    }

    /// Insert or overwrite the cache entry for a search.
    pub async fn upsert(&self, search_id: i32, data: &str) -> Result<()> {
        let active = weather_cache::ActiveModel {
            search_id: Set(search_id),
            data: Set(data.to_string()),
            last_fetched: Set(Utc::now().to_rfc3339()),
        };

        WeatherCache::insert(active)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(weather_cache::Column::SearchId)
                    .update_columns([
                        weather_cache::Column::Data,
                        weather_cache::Column::LastFetched,
                    ])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await
            .context("Failed to upsert cache entry")?;

        Ok(())
    }
}

/// Freshness predicate: fresh iff `now - last_fetched < ttl`, strictly.
/// An entry that is exactly `ttl` old counts as stale and gets refreshed.
#[must_use]
pub fn is_fresh(last_fetched: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    now.signed_duration_since(last_fetched) < ttl
}
