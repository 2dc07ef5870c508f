//! User Repository

use super::{BaseRepository, RepoError, RepoResult, thing};
use crate::db::models::{Role, UserCreate, UserRecord, UserUpdate};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "app_user";

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_all(&self) -> RepoResult<Vec<UserRecord>> {
        let users: Vec<UserRecord> = self
            .base
            .db()
            .query("SELECT *, record::id(id) AS id FROM app_user ORDER BY username")
            .await?
            .take(0)?;
        Ok(users)
    }

    pub async fn find_by_id(&self, id: i64) -> RepoResult<Option<UserRecord>> {
        self.base.find_one(TABLE, id).await
    }

    pub async fn find_by_username(&self, username: &str) -> RepoResult<Option<UserRecord>> {
        let users: Vec<UserRecord> = self
            .base
            .db()
            .query("SELECT *, record::id(id) AS id FROM app_user WHERE username = $username LIMIT 1")
            .bind(("username", username.to_string()))
            .await?
            .take(0)?;
        Ok(users.into_iter().next())
    }

    pub async fn count_admins(&self) -> RepoResult<usize> {
        let ids: Vec<i64> = self
            .base
            .db()
            .query("SELECT VALUE record::id(id) FROM app_user WHERE role = 'admin' AND is_active = true")
            .await?
            .take(0)?;
        Ok(ids.len())
    }

    pub async fn create(&self, data: UserCreate) -> RepoResult<UserRecord> {
        if self.find_by_username(&data.username).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Username '{}' already exists",
                data.username
            )));
        }

        let hash_pass = UserRecord::hash_password(&data.password)
            .map_err(|e| RepoError::Validation(format!("Failed to hash password: {e}")))?;

        let user = UserRecord {
            id: shared::util::snowflake_id(),
            username: data.username,
            email: data.email,
            hash_pass,
            role: data.role,
            is_active: true,
            created_at: shared::util::now_millis(),
        };
        let id = user.id;
        self.base.insert(TABLE, user).await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::Database("Failed to create user".to_string()))
    }

    pub async fn update(&self, id: i64, data: UserUpdate) -> RepoResult<UserRecord> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))?;

        if let Some(username) = &data.username
            && let Some(found) = self.find_by_username(username).await?
            && found.id != existing.id
        {
            return Err(RepoError::Duplicate(format!(
                "Username '{username}' already exists"
            )));
        }

        let hash_pass = match &data.password {
            Some(password) => UserRecord::hash_password(password)
                .map_err(|e| RepoError::Validation(format!("Failed to hash password: {e}")))?,
            None => existing.hash_pass,
        };

        self.base
            .db()
            .query(
                "UPDATE $thing SET username = $username, email = $email, hash_pass = $hash_pass, \
                 role = $role, is_active = $is_active",
            )
            .bind(("thing", thing(TABLE, id)))
            .bind(("username", data.username.unwrap_or(existing.username)))
            .bind(("email", data.email.or(existing.email)))
            .bind(("hash_pass", hash_pass))
            .bind(("role", data.role.unwrap_or(existing.role)))
            .bind(("is_active", data.is_active.unwrap_or(existing.is_active)))
            .await?
            .check()?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))
    }

    pub async fn delete(&self, id: i64) -> RepoResult<bool> {
        self.base.delete(TABLE, id).await
    }

    /// Create the configured administrator when no active admin exists
    pub async fn ensure_admin(
        &self,
        username: &str,
        password: &str,
        email: Option<String>,
    ) -> RepoResult<Option<UserRecord>> {
        if self.count_admins().await? > 0 {
            return Ok(None);
        }
        let admin = self
            .create(UserCreate {
                username: username.to_string(),
                password: password.to_string(),
                email,
                role: Role::Admin,
            })
            .await?;
        Ok(Some(admin))
    }
}
