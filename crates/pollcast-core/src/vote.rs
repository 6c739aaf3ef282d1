//! Poll voting model.
//!
//! Pure functions over a [`Poll`] document: building a new poll, applying a
//! vote, and answering whether a voter has already voted. Nothing here touches
//! storage; [`crate::polls`] wraps these in the load/validate/write cycle.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use pollcast_models::{Poll, PollOption, VoteRecord, VoteStatus};

use crate::error::CoreError;

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 6;

/// Voter identities are opaque and unverified; any non-empty string is accepted.
pub fn validate_user_id(user_id: &str) -> Result<(), CoreError> {
    if user_id.is_empty() {
        return Err(CoreError::InvalidInput("User ID is required".into()));
    }
    Ok(())
}

/// Build a fresh poll. Blank option texts are dropped before counting.
pub fn new_poll(
    id: String,
    question: &str,
    option_texts: &[String],
    allow_multiple_answers: bool,
    now: DateTime<Utc>,
) -> Result<Poll, CoreError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(CoreError::InvalidInput("Question is required".into()));
    }

    let texts: Vec<&str> = option_texts
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();

    if texts.len() < MIN_OPTIONS {
        return Err(CoreError::InvalidInput(format!(
            "A poll needs at least {MIN_OPTIONS} non-empty options"
        )));
    }
    if texts.len() > MAX_OPTIONS {
        return Err(CoreError::InvalidInput(format!(
            "A poll can have at most {MAX_OPTIONS} options"
        )));
    }

    Ok(Poll {
        id,
        question: question.to_string(),
        options: texts
            .into_iter()
            .map(|text| PollOption {
                text: text.to_string(),
                votes: 0,
            })
            .collect(),
        allow_multiple_answers,
        voters: Vec::new(),
        created_at: now,
    })
}

/// Validate a vote against `poll` and, only if every check passes, apply it.
///
/// Checks run in a fixed order and the first failure wins: voter identity,
/// duplicate voter, option indices, then the single-answer rule. On error the
/// poll is left untouched.
pub fn apply_vote(
    poll: &mut Poll,
    user_id: &str,
    option_indices: &[i64],
    now: DateTime<Utc>,
) -> Result<(), CoreError> {
    validate_user_id(user_id)?;

    if poll.voters.iter().any(|v| v.user_id == user_id) {
        return Err(CoreError::DuplicateVote);
    }

    let indices = resolve_indices(poll, option_indices)?;

    if !poll.allow_multiple_answers && indices.len() != 1 {
        return Err(CoreError::MultipleAnswersNotAllowed);
    }

    for &index in &indices {
        poll.options[index].votes += 1;
    }
    poll.voters.push(VoteRecord {
        user_id: user_id.to_string(),
        voted_options: indices,
        voted_at: now,
    });
    Ok(())
}

fn resolve_indices(poll: &Poll, option_indices: &[i64]) -> Result<Vec<usize>, CoreError> {
    if option_indices.is_empty() {
        return Err(CoreError::InvalidOption(
            "At least one option must be selected".into(),
        ));
    }

    let mut seen = HashSet::with_capacity(option_indices.len());
    let mut indices = Vec::with_capacity(option_indices.len());
    for &raw in option_indices {
        let index = usize::try_from(raw)
            .ok()
            .filter(|&i| i < poll.options.len())
            .ok_or_else(|| CoreError::InvalidOption("Invalid option indices".into()))?;
        if !seen.insert(index) {
            return Err(CoreError::InvalidOption(format!(
                "Option {index} was selected more than once"
            )));
        }
        indices.push(index);
    }
    Ok(indices)
}

/// Report whether `user_id` has voted on `poll`.
///
/// The first matching record is authoritative. More than one match means the
/// single-vote invariant was broken somewhere and is logged.
pub fn vote_status(poll: &Poll, user_id: &str) -> VoteStatus {
    let mut matches = poll.voters.iter().filter(|v| v.user_id == user_id);
    let Some(first) = matches.next() else {
        return VoteStatus {
            has_voted: false,
            voted_options: None,
        };
    };

    let extra = matches.count();
    if extra > 0 {
        tracing::warn!(
            poll_id = %poll.id,
            user_id = %user_id,
            records = extra + 1,
            "consistency: voter has more than one vote record"
        );
    }

    VoteStatus {
        has_voted: true,
        voted_options: Some(first.voted_options.clone()),
    }
}

/// True when every option counter equals the number of records naming it.
pub fn tallies_consistent(poll: &Poll) -> bool {
    let mut counted = vec![0u64; poll.options.len()];
    for record in &poll.voters {
        for &index in &record.voted_options {
            match counted.get_mut(index) {
                Some(slot) => *slot += 1,
                None => return false,
            }
        }
    }
    poll.options
        .iter()
        .zip(counted)
        .all(|(option, count)| option.votes == count)
}
