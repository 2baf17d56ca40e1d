use quiz_core::model::{User, UserId, UserName};

use super::{
    SqliteRepository,
    mapping::{db_err, map_user_row, user_id_from_i64},
};
use crate::repository::{StorageError, UserRepository};

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn insert_user_if_absent(&self, name: &UserName) -> Result<UserId, StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // Older databases may hold padded names; they count as the same user.
        let inserted = sqlx::query(
            r"
                INSERT INTO users (name)
                SELECT ?1
                WHERE NOT EXISTS (SELECT 1 FROM users WHERE trim(name) = ?1)
                ON CONFLICT(name) DO NOTHING
            ",
        )
        .bind(name.as_str())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?
        .rows_affected();

        let id: i64 = sqlx::query_scalar(
            "SELECT id FROM users WHERE trim(name) = ?1 ORDER BY id ASC LIMIT 1",
        )
        .bind(name.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?
        .ok_or(StorageError::NotFound)?;

        tx.commit().await.map_err(db_err)?;

        if inserted > 0 {
            tracing::info!(user_id = id, name = %name, "registered user");
        }
        user_id_from_i64(id)
    }

    async fn find_user(&self, name: &UserName) -> Result<Option<User>, StorageError> {
        let row = sqlx::query(
            "SELECT id, name FROM users WHERE trim(name) = ?1 ORDER BY id ASC LIMIT 1",
        )
        .bind(name.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_user_row).transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT MIN(id) AS id, trim(name) AS name
                FROM users
                WHERE name IS NOT NULL AND trim(name) <> ''
                GROUP BY trim(name)
                ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            users.push(map_user_row(&row)?);
        }
        Ok(users)
    }
}
