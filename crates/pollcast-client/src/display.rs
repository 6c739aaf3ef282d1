use pollcast_models::{Poll, VoteStatus};

pub fn total_votes(poll: &Poll) -> u64 {
    poll.options.iter().map(|o| o.votes).sum()
}

/// Share of all option selections, rounded to a whole percent.
pub fn percentage(votes: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    (votes * 100 + total / 2) / total
}

pub fn poll_line(poll: &Poll) -> String {
    let kind = if poll.allow_multiple_answers { "multi" } else { "single" };
    format!(
        "{}  {}  [{} options, {}, {} votes]",
        poll.id,
        poll.question,
        poll.options.len(),
        kind,
        total_votes(poll)
    )
}

/// Multi-line tally view. Options the local voter picked are starred.
pub fn poll_details(poll: &Poll, status: Option<&VoteStatus>) -> String {
    let total = total_votes(poll);
    let picked: &[usize] = status
        .and_then(|s| s.voted_options.as_deref())
        .unwrap_or(&[]);
    let mode = if poll.allow_multiple_answers {
        "multiple answers allowed"
    } else {
        "single answer"
    };

    let mut lines = vec![
        poll.question.clone(),
        format!(
            "created {}  |  {mode}",
            poll.created_at.format("%Y-%m-%d %H:%M UTC")
        ),
    ];
    lines.extend(poll.options.iter().enumerate().map(|(index, option)| {
        let marker = if picked.contains(&index) { '*' } else { ' ' };
        format!(
            "{marker} [{index}] {:<30} {:>5} votes {:>4}%",
            option.text,
            option.votes,
            percentage(option.votes, total)
        )
    }));
    lines.push(format!("total votes: {total}"));
    match status {
        Some(s) if s.has_voted => lines.push("you have voted".to_string()),
        Some(_) => lines.push("you have not voted yet".to_string()),
        None => {}
    }
    lines.join("\n")
}
