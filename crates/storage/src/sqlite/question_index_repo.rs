use quiz_core::model::QuestionId;

use super::{
    SqliteRepository,
    mapping::{db_err, id_i64},
};
use crate::repository::{QuestionIndexEntry, QuestionIndexRepository, StorageError};

#[async_trait::async_trait]
impl QuestionIndexRepository for SqliteRepository {
    async fn register_sources(&self, entries: &[QuestionIndexEntry]) -> Result<u64, StorageError> {
        if entries.is_empty() {
            return Ok(0);
        }

        // Dropping the transaction on an early return rolls the batch back.
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut inserted = 0_u64;
        for entry in entries {
            let res = sqlx::query(
                r"
                    INSERT INTO question_index (id, file_name)
                    VALUES (?1, ?2)
                    ON CONFLICT(id) DO NOTHING
                ",
            )
            .bind(id_i64("question_id", entry.question_id.value())?)
            .bind(entry.file_name.as_str())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
            inserted += res.rows_affected();
        }
        tx.commit().await.map_err(db_err)?;

        Ok(inserted)
    }

    async fn source_of(&self, id: QuestionId) -> Result<Option<String>, StorageError> {
        let file: Option<Option<String>> =
            sqlx::query_scalar("SELECT file_name FROM question_index WHERE id = ?1")
                .bind(id_i64("question_id", id.value())?)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        Ok(file.flatten())
    }
}
