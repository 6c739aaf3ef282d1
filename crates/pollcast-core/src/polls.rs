use chrono::Utc;
use pollcast_db::DbPool;
use pollcast_models::{Poll, VoteStatus};

use crate::error::CoreError;
use crate::locks::PollLocks;
use crate::vote;

/// Default number of load/validate/write cycles before a vote gives up.
pub const DEFAULT_WRITE_ATTEMPTS: u32 = 5;

pub async fn create_poll(
    pool: &DbPool,
    question: &str,
    option_texts: &[String],
    allow_multiple_answers: bool,
) -> Result<Poll, CoreError> {
    let id = uuid::Uuid::new_v4().simple().to_string();
    let poll = vote::new_poll(id, question, option_texts, allow_multiple_answers, Utc::now())?;
    let stored = pollcast_db::polls::insert_poll(pool, &poll).await?;
    tracing::info!(
        poll_id = %stored.poll.id,
        options = stored.poll.options.len(),
        multiple = stored.poll.allow_multiple_answers,
        "poll created"
    );
    Ok(stored.poll)
}

pub async fn get_poll(pool: &DbPool, poll_id: &str) -> Result<Poll, CoreError> {
    pollcast_db::polls::get_poll(pool, poll_id)
        .await?
        .map(|stored| stored.poll)
        .ok_or(CoreError::NotFound)
}

pub async fn list_polls(pool: &DbPool) -> Result<Vec<Poll>, CoreError> {
    Ok(pollcast_db::polls::list_polls(pool).await?)
}

pub async fn check_vote_status(
    pool: &DbPool,
    poll_id: &str,
    user_id: &str,
) -> Result<VoteStatus, CoreError> {
    let poll = get_poll(pool, poll_id).await?;
    Ok(vote::vote_status(&poll, user_id))
}

/// Apply one voter's selection to a poll and persist it atomically.
///
/// The per-poll lock serialises voters inside this process. The revision
/// guard on the write covers anything the lock cannot see (another server
/// process on the same database): a lost race reloads the poll and validates
/// again, so a concurrent repeat by the same voter ends as `DuplicateVote`.
pub async fn cast_vote(
    pool: &DbPool,
    locks: &PollLocks,
    poll_id: &str,
    user_id: &str,
    option_indices: &[i64],
    write_attempts: u32,
) -> Result<Poll, CoreError> {
    vote::validate_user_id(user_id)?;

    // Only ids of stored polls get a lock entry. Polls are never deleted, so
    // the poll is still there once the lock is held.
    if pollcast_db::polls::get_poll(pool, poll_id).await?.is_none() {
        return Err(CoreError::NotFound);
    }
    let _guard = locks.lock(poll_id).await;

    for attempt in 1..=write_attempts.max(1) {
        let stored = pollcast_db::polls::get_poll(pool, poll_id)
            .await?
            .ok_or(CoreError::NotFound)?;
        let mut poll = stored.poll;

        if let Err(err) = vote::apply_vote(&mut poll, user_id, option_indices, Utc::now()) {
            tracing::debug!(poll_id, user_id, error = %err, "vote rejected");
            return Err(err);
        }
        debug_assert!(vote::tallies_consistent(&poll));

        if pollcast_db::polls::update_poll_if_revision(pool, &poll, stored.revision).await? {
            tracing::info!(
                poll_id,
                user_id,
                options = ?poll.voters.last().map(|v| &v.voted_options),
                "vote recorded"
            );
            return Ok(poll);
        }

        tracing::warn!(
            poll_id,
            attempt,
            revision = stored.revision,
            "poll changed during vote, retrying"
        );
    }

    Err(CoreError::WriteContention)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> DbPool {
        let pool = pollcast_db::create_pool("sqlite::memory:", 1).await.unwrap();
        pollcast_db::run_migrations(&pool).await.unwrap();
        pool
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn tea_or_coffee_scenario() {
        let pool = test_pool().await;
        let locks = PollLocks::new();

        let poll = create_poll(&pool, "Tea or coffee?", &texts(&["Tea", "Coffee"]), false)
            .await
            .unwrap();
        cast_vote(&pool, &locks, &poll.id, "u1", &[1], DEFAULT_WRITE_ATTEMPTS)
            .await
            .unwrap();

        let loaded = get_poll(&pool, &poll.id).await.unwrap();
        let tallies: Vec<(&str, u64)> = loaded
            .options
            .iter()
            .map(|o| (o.text.as_str(), o.votes))
            .collect();
        assert_eq!(tallies, vec![("Tea", 0), ("Coffee", 1)]);

        let status = check_vote_status(&pool, &poll.id, "u1").await.unwrap();
        assert!(status.has_voted);
        assert_eq!(status.voted_options, Some(vec![1]));

        let err = cast_vote(&pool, &locks, &poll.id, "u1", &[0], DEFAULT_WRITE_ATTEMPTS)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateVote));
        assert_eq!(get_poll(&pool, &poll.id).await.unwrap(), loaded);
    }

    #[tokio::test]
    async fn rejected_vote_is_not_persisted() {
        let pool = test_pool().await;
        let locks = PollLocks::new();
        let poll = create_poll(&pool, "Q?", &texts(&["A", "B"]), false)
            .await
            .unwrap();

        let err = cast_vote(&pool, &locks, &poll.id, "u1", &[0, 1], DEFAULT_WRITE_ATTEMPTS)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::MultipleAnswersNotAllowed));

        let loaded = pollcast_db::polls::get_poll(&pool, &poll.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.revision, 0);
        assert!(loaded.poll.voters.is_empty());
    }

    #[tokio::test]
    async fn missing_user_id_checked_before_poll_lookup() {
        let pool = test_pool().await;
        let locks = PollLocks::new();
        let err = cast_vote(&pool, &locks, "nope", "", &[0], DEFAULT_WRITE_ATTEMPTS)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn vote_on_unknown_poll_is_not_found() {
        let pool = test_pool().await;
        let locks = PollLocks::new();
        let err = cast_vote(&pool, &locks, "nope", "u1", &[0], DEFAULT_WRITE_ATTEMPTS)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound));

        let err = check_vote_status(&pool, "nope", "u1").await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound));
    }

    #[tokio::test]
    async fn votes_on_missing_polls_leave_no_lock_entries() {
        let pool = test_pool().await;
        let locks = PollLocks::new();
        for i in 0..50 {
            let err = cast_vote(
                &pool,
                &locks,
                &format!("no-such-poll-{i}"),
                "u1",
                &[0],
                DEFAULT_WRITE_ATTEMPTS,
            )
            .await
            .unwrap_err();
            assert!(matches!(err, CoreError::NotFound));
        }
        assert!(locks.is_empty());

        let poll = create_poll(&pool, "Q?", &texts(&["A", "B"]), false)
            .await
            .unwrap();
        cast_vote(&pool, &locks, &poll.id, "u1", &[0], DEFAULT_WRITE_ATTEMPTS)
            .await
            .unwrap();
        assert_eq!(locks.len(), 1);
    }

    #[tokio::test]
    async fn create_poll_rejects_too_few_options() {
        let pool = test_pool().await;
        let err = create_poll(&pool, "Q?", &texts(&["", "A", ""]), false)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
        assert!(list_polls(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_distinct_voters_keep_tallies_consistent() {
        let pool = test_pool().await;
        let locks = PollLocks::new();
        let poll = create_poll(&pool, "Pick", &texts(&["A", "B", "C"]), true)
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..24 {
            let pool = pool.clone();
            let locks = locks.clone();
            let poll_id = poll.id.clone();
            handles.push(tokio::spawn(async move {
                let choice: Vec<i64> = if i % 2 == 0 { vec![0, 2] } else { vec![1] };
                cast_vote(
                    &pool,
                    &locks,
                    &poll_id,
                    &format!("user-{i}"),
                    &choice,
                    DEFAULT_WRITE_ATTEMPTS,
                )
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let loaded = get_poll(&pool, &poll.id).await.unwrap();
        assert_eq!(loaded.voters.len(), 24);
        assert_eq!(
            loaded.options.iter().map(|o| o.votes).collect::<Vec<_>>(),
            vec![12, 12, 12]
        );
        assert!(vote::tallies_consistent(&loaded));
    }

    #[tokio::test]
    async fn racing_duplicate_votes_without_shared_lock_count_once() {
        let pool = test_pool().await;
        let poll = create_poll(&pool, "Race", &texts(&["A", "B"]), false)
            .await
            .unwrap();

        // Separate lock tables stand in for separate server processes, so only
        // the revision guard stands between the writers.
        let mut handles = Vec::new();
        for _ in 0..16 {
            let pool = pool.clone();
            let poll_id = poll.id.clone();
            handles.push(tokio::spawn(async move {
                let locks = PollLocks::new();
                cast_vote(&pool, &locks, &poll_id, "same-user", &[0], DEFAULT_WRITE_ATTEMPTS)
                    .await
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(CoreError::DuplicateVote) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(accepted, 1);

        let loaded = get_poll(&pool, &poll.id).await.unwrap();
        assert_eq!(loaded.voters.len(), 1);
        assert_eq!(loaded.options[0].votes, 1);
        assert!(vote::tallies_consistent(&loaded));
    }

    #[tokio::test]
    async fn zero_write_attempts_still_tries_once() {
        let pool = test_pool().await;
        let locks = PollLocks::new();
        let poll = create_poll(&pool, "Q?", &texts(&["A", "B"]), false)
            .await
            .unwrap();

        cast_vote(&pool, &locks, &poll.id, "u1", &[0], 0)
            .await
            .unwrap();
        let loaded = get_poll(&pool, &poll.id).await.unwrap();
        assert_eq!(loaded.options[0].votes, 1);
    }
}
