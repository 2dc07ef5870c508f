//! Dining Table Repository

use super::{BaseRepository, RepoError, RepoResult, thing};
use crate::db::models::{DiningTable, DiningTableCreate, DiningTableUpdate, QrPayload, TableStatus};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

pub(crate) const TABLE: &str = "dining_table";

#[derive(Clone)]
pub struct DiningTableRepository {
    base: BaseRepository,
}

impl DiningTableRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// All tables ordered by number
    pub async fn find_all(&self) -> RepoResult<Vec<DiningTable>> {
        let tables: Vec<DiningTable> = self
            .base
            .db()
            .query("SELECT *, record::id(id) AS id FROM dining_table ORDER BY number")
            .await?
            .take(0)?;
        Ok(tables)
    }

    pub async fn find_by_id(&self, id: i64) -> RepoResult<Option<DiningTable>> {
        self.base.find_one(TABLE, id).await
    }

    /// Resolve a scanned table number
    pub async fn find_by_number(&self, number: i32) -> RepoResult<Option<DiningTable>> {
        let tables: Vec<DiningTable> = self
            .base
            .db()
            .query("SELECT *, record::id(id) AS id FROM dining_table WHERE number = $number LIMIT 1")
            .bind(("number", number))
            .await?
            .take(0)?;
        Ok(tables.into_iter().next())
    }

    pub async fn create(&self, data: DiningTableCreate) -> RepoResult<DiningTable> {
        if self.find_by_number(data.number).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Table number {} already exists",
                data.number
            )));
        }

        let table = DiningTable {
            id: shared::util::snowflake_id(),
            number: data.number,
            name: data
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("Table {}", data.number)),
            capacity: data.capacity.unwrap_or(4),
            location: data.location,
            status: TableStatus::Available,
            active_order_id: None,
            qr: None,
            created_at: shared::util::now_millis(),
        };
        let id = table.id;
        self.base.insert(TABLE, table).await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::Database("Failed to create dining table".to_string()))
    }

    pub async fn update(&self, id: i64, data: DiningTableUpdate) -> RepoResult<DiningTable> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Dining table {id} not found")))?;

        if let Some(number) = data.number
            && number != existing.number
            && self.find_by_number(number).await?.is_some()
        {
            return Err(RepoError::Duplicate(format!(
                "Table number {number} already exists"
            )));
        }

        self.base
            .db()
            .query(
                "UPDATE $thing SET number = $number, name = $name, capacity = $capacity, \
                 location = $location, status = $status",
            )
            .bind(("thing", thing(TABLE, id)))
            .bind(("number", data.number.unwrap_or(existing.number)))
            .bind(("name", data.name.unwrap_or(existing.name)))
            .bind(("capacity", data.capacity.unwrap_or(existing.capacity)))
            .bind(("location", data.location.or(existing.location)))
            .bind(("status", data.status.unwrap_or(existing.status)))
            .await?
            .check()?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Dining table {id} not found")))
    }

    /// Store or clear the rendered QR code
    pub async fn set_qr(&self, id: i64, qr: Option<QrPayload>) -> RepoResult<DiningTable> {
        self.base
            .db()
            .query("UPDATE $thing SET qr = $qr")
            .bind(("thing", thing(TABLE, id)))
            .bind(("qr", qr))
            .await?
            .check()?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Dining table {id} not found")))
    }

    /// Back to `available` with no active order
    pub async fn release(&self, id: i64) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE $thing SET status = 'available', active_order_id = NONE")
            .bind(("thing", thing(TABLE, id)))
            .await?
            .check()?;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> RepoResult<bool> {
        self.base.delete(TABLE, id).await
    }
}
