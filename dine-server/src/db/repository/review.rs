//! Review Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Review, ReviewQuery};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

pub(crate) const TABLE: &str = "review";

#[derive(Clone)]
pub struct ReviewRepository {
    base: BaseRepository,
}

impl ReviewRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Newest first, optionally for one order
    pub async fn find_all(&self, query: &ReviewQuery) -> RepoResult<Vec<Review>> {
        let sql = if query.order_id.is_some() {
            "SELECT *, record::id(id) AS id FROM review WHERE order_id = $order_id ORDER BY created_at DESC"
        } else {
            "SELECT *, record::id(id) AS id FROM review ORDER BY created_at DESC"
        };
        let reviews: Vec<Review> = self
            .base
            .db()
            .query(sql)
            .bind(("order_id", query.order_id))
            .await?
            .take(0)?;
        Ok(reviews)
    }

    pub async fn find_by_id(&self, id: i64) -> RepoResult<Option<Review>> {
        self.base.find_one(TABLE, id).await
    }

    pub async fn create(
        &self,
        order_id: i64,
        table_id: i64,
        rating: i32,
        comment: Option<String>,
    ) -> RepoResult<Review> {
        let review = new_review(order_id, table_id, rating, comment);
        let id = review.id;
        self.base.insert(TABLE, review).await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::Database("Failed to create review".to_string()))
    }

    pub async fn delete(&self, id: i64) -> RepoResult<bool> {
        self.base.delete(TABLE, id).await
    }
}

/// Fresh review row; blank comments are stored as null
pub fn new_review(order_id: i64, table_id: i64, rating: i32, comment: Option<String>) -> Review {
    Review {
        id: shared::util::snowflake_id(),
        order_id,
        table_id,
        rating,
        comment: comment.filter(|c| !c.trim().is_empty()),
        created_at: shared::util::now_millis(),
    }
}
