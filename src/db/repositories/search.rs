use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::entities::{prelude::*, search_history, weather_cache};

/// One persisted (user, city, country) lookup
#[derive(Debug, Clone)]
pub struct SearchRecord {
    pub id: i32,
    pub user_id: i32,
    pub city: String,
    pub country: String,
    pub timestamp: String,
}

impl From<search_history::Model> for SearchRecord {
    fn from(model: search_history::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            city: model.city,
            country: model.country,
            timestamp: model.timestamp,
        }
    }
}

pub struct SearchRepository {
    conn: DatabaseConnection,
}

impl SearchRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Record a search and return its id.
    ///
    /// If the user already searched this (city, country) the existing row's
    /// timestamp is bumped in place, which moves it to the front of the
    /// recency ordering without creating a duplicate.
    pub async fn save(&self, user_id: i32, city: &str, country: &str) -> Result<i32> {
        let city = city.trim();
        let country = country.trim();

        let existing = SearchHistory::find()
            .filter(search_history::Column::UserId.eq(user_id))
            .filter(search_history::Column::City.eq(city))
            .filter(search_history::Column::Country.eq(country))
            .one(&self.conn)
            .await
            .context("Failed to query search history")?;

        let now = chrono::Utc::now().to_rfc3339();

        if let Some(row) = existing {
            let id = row.id;
            let mut active: search_history::ActiveModel = row.into();
            active.timestamp = Set(now);
            active
                .update(&self.conn)
                .await
                .context("Failed to bump search timestamp")?;
            return Ok(id);
        }

        let active = search_history::ActiveModel {
            user_id: Set(user_id),
            city: Set(city.to_string()),
            country: Set(country.to_string()),
            timestamp: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert search record")?;

        Ok(model.id)
    }

    /// Most recent searches for a user, newest first.
    pub async fn recent(&self, user_id: i32, limit: u64) -> Result<Vec<SearchRecord>> {
        let rows = SearchHistory::find()
            .filter(search_history::Column::UserId.eq(user_id))
            .order_by_desc(search_history::Column::Timestamp)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to query recent searches")?;

        Ok(rows.into_iter().map(SearchRecord::from).collect())
    }

    /// Fetch a single search record, scoped to its owner.
    pub async fn get_for_user(&self, user_id: i32, search_id: i32) -> Result<Option<SearchRecord>> {
        let row = SearchHistory::find_by_id(search_id)
            .filter(search_history::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query search record")?;

        Ok(row.map(SearchRecord::from))
    }

    /// Delete all of a user's search records and their cache entries.
    /// Returns the number of search rows removed.
    pub async fn clear_for_user(&self, user_id: i32) -> Result<u64> {
        let ids: Vec<i32> = SearchHistory::find()
            .filter(search_history::Column::UserId.eq(user_id))
            .all(&self.conn)
            .await
            .context("Failed to query search history for clearing")?
            .into_iter()
            .map(|row| row.id)
            .collect();

        if ids.is_empty() {
            return Ok(0);
        }

        WeatherCache::delete_many()
            .filter(weather_cache::Column::SearchId.is_in(ids.clone()))
            .exec(&self.conn)
            .await
            .context("Failed to delete cache entries")?;

        let result = SearchHistory::delete_many()
            .filter(search_history::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete search history")?;

        Ok(result.rows_affected)
    }
}
