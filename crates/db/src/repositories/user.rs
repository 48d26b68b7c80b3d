use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;

use wardrobe_core::domain::cart::UserId;

use super::{parse_timestamp, timestamp, RepositoryError, UserRepository};
use crate::DbPool;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub city: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: UserId(uuid::Uuid::new_v4().to_string()),
            username: username.into(),
            email: email.into(),
            city: None,
            created_at: now,
            updated_at: now,
        }
    }
}

pub struct SqlUserRepository {
    pool: DbPool,
}

impl SqlUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<UserRecord, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let username: String =
        row.try_get("username").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let email: String = row.try_get("email").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let city: Option<String> =
        row.try_get("city").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(UserRecord {
        id: UserId(id),
        username,
        email,
        city,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[async_trait::async_trait]
impl UserRepository for SqlUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, username, email, city, created_at, updated_at FROM app_user WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn save(&self, user: UserRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO app_user (id, username, email, city, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 username = excluded.username,
                 email = excluded.email,
                 city = excluded.city,
                 updated_at = excluded.updated_at",
        )
        .bind(&user.id.0)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.city)
        .bind(timestamp(user.created_at))
        .bind(timestamp(user.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create(&self, user: &UserRecord) -> Result<bool, RepositoryError> {
        let inserted = sqlx::query(
            "INSERT INTO app_user (id, username, email, city, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id.0)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.city)
        .bind(timestamp(user.created_at))
        .bind(timestamp(user.updated_at))
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(true),
            Err(sqlx::Error::Database(error)) if error.is_unique_violation() => Ok(false),
            Err(error) => Err(error.into()),
        }
    }

    async fn update_city(&self, id: &UserId, city: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE app_user SET city = ?, updated_at = ? WHERE id = ?")
            .bind(city)
            .bind(timestamp(Utc::now()))
            .bind(&id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
