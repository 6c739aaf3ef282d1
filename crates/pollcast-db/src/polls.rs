use crate::{DbError, DbPool};
use chrono::SecondsFormat;
use pollcast_models::Poll;

/// A poll document together with the revision it was read at.
#[derive(Debug, Clone)]
pub struct StoredPoll {
    pub poll: Poll,
    pub revision: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct PollRow {
    revision: i64,
    document: String,
}

impl PollRow {
    fn into_stored(self) -> Result<StoredPoll, DbError> {
        Ok(StoredPoll {
            poll: serde_json::from_str(&self.document)?,
            revision: self.revision,
        })
    }
}

// Fixed-width so that lexical order in SQLite matches chronological order.
fn created_at_key(poll: &Poll) -> String {
    poll.created_at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub async fn insert_poll(pool: &DbPool, poll: &Poll) -> Result<StoredPoll, DbError> {
    let document = serde_json::to_string(poll)?;
    sqlx::query(
        "INSERT INTO polls (id, created_at, revision, document)
         VALUES (?1, ?2, 0, ?3)",
    )
    .bind(&poll.id)
    .bind(created_at_key(poll))
    .bind(document)
    .execute(pool)
    .await?;
    Ok(StoredPoll {
        poll: poll.clone(),
        revision: 0,
    })
}

pub async fn get_poll(pool: &DbPool, id: &str) -> Result<Option<StoredPoll>, DbError> {
    let row = sqlx::query_as::<_, PollRow>("SELECT revision, document FROM polls WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(PollRow::into_stored).transpose()
}

/// All polls, newest first.
pub async fn list_polls(pool: &DbPool) -> Result<Vec<Poll>, DbError> {
    let rows = sqlx::query_as::<_, PollRow>(
        "SELECT revision, document FROM polls
         ORDER BY created_at DESC, rowid DESC",
    )
    .fetch_all(pool)
    .await?;
    rows.into_iter()
        .map(|row| row.into_stored().map(|stored| stored.poll))
        .collect()
}

/// Replace a poll document only if it is still at `expected_revision`.
///
/// Returns `false` when another writer committed in between; the caller must
/// reload and re-validate before trying again.
pub async fn update_poll_if_revision(
    pool: &DbPool,
    poll: &Poll,
    expected_revision: i64,
) -> Result<bool, DbError> {
    let document = serde_json::to_string(poll)?;
    let result = sqlx::query(
        "UPDATE polls SET document = ?2, revision = revision + 1
         WHERE id = ?1 AND revision = ?3",
    )
    .bind(&poll.id)
    .bind(document)
    .bind(expected_revision)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}
