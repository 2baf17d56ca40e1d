use quiz_core::model::{AnswerEvent, UserId};

use super::{
    SqliteRepository,
    mapping::{correct_to_i64, db_err, id_i64, map_event_row, map_named_event_row, question_to_text},
};
use crate::repository::{AnswerEventRepository, NamedAnswerEvent, StorageError};

#[async_trait::async_trait]
impl AnswerEventRepository for SqliteRepository {
    async fn append_event(&self, event: &AnswerEvent) -> Result<i64, StorageError> {
        let user_id = id_i64("user_id", event.user_id.value())?;

        // Stored in the same "YYYY-MM-DD HH:MM:SS" UTC shape as the column default.
        let res = sqlx::query(
            r"
                INSERT INTO stats (user_id, question, correct, timestamp)
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(user_id)
        .bind(question_to_text(event.question_id))
        .bind(correct_to_i64(event.correct))
        .bind(event.answered_at.naive_utc())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        tracing::debug!(
            user_id,
            question = %event.question_id,
            correct = event.correct,
            "appended answer event"
        );
        Ok(res.last_insert_rowid())
    }

    async fn events_for_user(&self, user_id: UserId) -> Result<Vec<AnswerEvent>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT user_id, question, correct, timestamp
                FROM stats
                WHERE user_id = ?1
                ORDER BY rowid ASC
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_event_row(&row)?);
        }
        Ok(out)
    }

    async fn all_events_named(&self) -> Result<Vec<NamedAnswerEvent>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT u.name, s.user_id, s.question, s.correct, s.timestamp
                FROM stats s
                JOIN users u ON s.user_id = u.id
                ORDER BY s.timestamp ASC, s.rowid ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_named_event_row(&row)?);
        }
        Ok(out)
    }
}
