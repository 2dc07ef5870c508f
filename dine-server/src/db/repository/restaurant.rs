//! Restaurant Profile Repository (Singleton)

use super::{BaseRepository, RepoResult};
use crate::db::models::{RestaurantProfile, RestaurantUpdate};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "restaurant";
const SINGLETON_ID: &str = "main";

#[derive(Clone)]
pub struct RestaurantRepository {
    base: BaseRepository,
}

impl RestaurantRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    fn singleton() -> RecordId {
        RecordId::from_table_key(TABLE, SINGLETON_ID)
    }

    /// Stored profile, if any
    pub async fn get(&self) -> RepoResult<Option<RestaurantProfile>> {
        let rows: Vec<RestaurantProfile> = self
            .base
            .db()
            .query("SELECT * OMIT id FROM $thing")
            .bind(("thing", Self::singleton()))
            .await?
            .take(0)?;
        Ok(rows.into_iter().next())
    }

    /// Stored profile or an empty default (nothing is written)
    pub async fn get_or_default(&self) -> RepoResult<RestaurantProfile> {
        Ok(self.get().await?.unwrap_or_default())
    }

    /// Merge a partial update into the profile, creating it if needed
    pub async fn update(&self, data: RestaurantUpdate) -> RepoResult<RestaurantProfile> {
        let mut profile = self.get_or_default().await?;
        profile.apply(data);
        profile.updated_at = shared::util::now_millis();

        self.base
            .db()
            .query("UPSERT $thing CONTENT $profile RETURN NONE")
            .bind(("thing", Self::singleton()))
            .bind(("profile", profile.clone()))
            .await?
            .check()?;

        Ok(profile)
    }
}
