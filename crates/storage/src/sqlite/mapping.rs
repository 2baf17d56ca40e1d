use chrono::{DateTime, Utc};
use quiz_core::model::{AnswerEvent, QuestionId, User, UserId, UserName};
use sqlx::Row;

use crate::repository::{NamedAnswerEvent, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Constraint violations mean the caller referenced something that does not
/// exist (or collided with a unique key); everything else is a backend failure.
pub(crate) fn db_err(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db)
            if db.is_foreign_key_violation() || db.is_unique_violation() =>
        {
            StorageError::Conflict
        }
        _ => StorageError::Connection(e.to_string()),
    }
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn map_user_row(row: &sqlx::sqlite::SqliteRow) -> Result<User, StorageError> {
    let id = user_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let name = UserName::new(row.try_get::<String, _>("name").map_err(ser)?).map_err(ser)?;
    Ok(User::new(id, name))
}

/// `stats.question` is TEXT holding the decimal question id.
pub(crate) fn question_to_text(id: QuestionId) -> String {
    id.to_string()
}

pub(crate) fn correct_to_i64(correct: bool) -> i64 {
    i64::from(correct)
}

/// Rows written by older versions may hold any non-zero integer for "correct".
pub(crate) fn correct_from_i64(value: i64) -> bool {
    value != 0
}

pub(crate) fn map_event_row(row: &sqlx::sqlite::SqliteRow) -> Result<AnswerEvent, StorageError> {
    let question: String = row.try_get("question").map_err(ser)?;
    let answered_at: DateTime<Utc> = row.try_get("timestamp").map_err(ser)?;
    Ok(AnswerEvent {
        user_id: user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        question_id: question.parse().map_err(ser)?,
        correct: correct_from_i64(row.try_get::<i64, _>("correct").map_err(ser)?),
        answered_at,
    })
}

pub(crate) fn map_named_event_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<NamedAnswerEvent, StorageError> {
    Ok(NamedAnswerEvent {
        user_name: row.try_get::<String, _>("name").map_err(ser)?,
        event: map_event_row(row)?,
    })
}
