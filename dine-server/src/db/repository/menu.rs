//! Menu Item Repository
//!
//! `status` is derived from `stock` and rewritten on every write.

use super::{BaseRepository, RepoError, RepoResult, thing};
use crate::db::models::{MenuItem, MenuItemCreate, MenuItemUpdate, MenuQuery, MenuStatus, Nutrition};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

pub(crate) const TABLE: &str = "menu_item";

#[derive(Clone)]
pub struct MenuRepository {
    base: BaseRepository,
}

impl MenuRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_all(&self, query: &MenuQuery) -> RepoResult<Vec<MenuItem>> {
        let mut sql = String::from("SELECT *, record::id(id) AS id FROM menu_item");
        let mut filters = Vec::new();
        if query.category.is_some() {
            filters.push("category = $category");
        }
        if query.available == Some(true) {
            filters.push("stock > 0");
        }
        if !filters.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&filters.join(" AND "));
        }
        sql.push_str(" ORDER BY category, name");

        let mut items: Vec<MenuItem> = self
            .base
            .db()
            .query(sql)
            .bind(("category", query.category.clone()))
            .await?
            .take(0)?;
        items.iter_mut().for_each(MenuItem::refresh_status);
        Ok(items)
    }

    pub async fn find_by_id(&self, id: i64) -> RepoResult<Option<MenuItem>> {
        let mut item: Option<MenuItem> = self.base.find_one(TABLE, id).await?;
        if let Some(item) = item.as_mut() {
            item.refresh_status();
        }
        Ok(item)
    }

    /// Several items by id, in no particular order
    pub async fn find_many(&self, ids: &[i64]) -> RepoResult<Vec<MenuItem>> {
        let things: Vec<_> = ids.iter().map(|id| thing(TABLE, *id)).collect();
        let mut items: Vec<MenuItem> = self
            .base
            .db()
            .query("SELECT *, record::id(id) AS id FROM $things")
            .bind(("things", things))
            .await?
            .take(0)?;
        items.iter_mut().for_each(MenuItem::refresh_status);
        Ok(items)
    }

    /// Create an item; `nutrition` is the already-estimated value if any
    pub async fn create(
        &self,
        data: MenuItemCreate,
        nutrition: Option<Nutrition>,
    ) -> RepoResult<MenuItem> {
        let now = shared::util::now_millis();
        let item = MenuItem {
            id: shared::util::snowflake_id(),
            name: data.name,
            description: data.description,
            composition: data.composition,
            category: data.category,
            price: data.price,
            stock: data.stock,
            status: MenuStatus::from_stock(data.stock),
            image_url: data.image_url,
            nutrition: nutrition.or(data.nutrition).map(Nutrition::normalized),
            created_at: now,
            updated_at: now,
        };
        let id = item.id;
        self.base.insert(TABLE, item).await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::Database("Failed to create menu item".to_string()))
    }

    pub async fn update(
        &self,
        id: i64,
        data: MenuItemUpdate,
        nutrition: Option<Nutrition>,
    ) -> RepoResult<MenuItem> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Menu item {id} not found")))?;

        let stock = data.stock.unwrap_or(existing.stock);
        let nutrition = nutrition
            .or(data.nutrition)
            .map(Nutrition::normalized)
            .or(existing.nutrition);

        self.base
            .db()
            .query(
                "UPDATE $thing SET name = $name, description = $description, \
                 composition = $composition, category = $category, price = $price, \
                 stock = $stock, status = $status, image_url = $image_url, \
                 nutrition = $nutrition, updated_at = $now",
            )
            .bind(("thing", thing(TABLE, id)))
            .bind(("name", data.name.unwrap_or(existing.name)))
            .bind(("description", data.description.or(existing.description)))
            .bind(("composition", data.composition.or(existing.composition)))
            .bind(("category", data.category.or(existing.category)))
            .bind(("price", data.price.unwrap_or(existing.price)))
            .bind(("stock", stock))
            .bind(("status", MenuStatus::from_stock(stock)))
            .bind(("image_url", data.image_url.or(existing.image_url)))
            .bind(("nutrition", nutrition))
            .bind(("now", shared::util::now_millis()))
            .await?
            .check()?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Menu item {id} not found")))
    }

    pub async fn delete(&self, id: i64) -> RepoResult<bool> {
        self.base.delete(TABLE, id).await
    }
}
