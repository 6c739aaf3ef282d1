use pollcast_models::{Poll, VoteStatus};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::{ClientError, PollClient};

/// Re-fetch period used by the interactive watch view.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub poll: Poll,
    pub status: VoteStatus,
}

pub async fn fetch_snapshot(
    client: &PollClient,
    poll_id: &str,
    user_id: &str,
) -> Result<Snapshot, ClientError> {
    let (poll, status) = tokio::try_join!(
        client.get_poll(poll_id),
        client.check_vote(poll_id, user_id)
    )?;
    Ok(Snapshot { poll, status })
}

/// Poll the server every `period` and hand each snapshot to `on_snapshot`
/// until it returns `false`. Transient failures are logged and skipped; a
/// poll that no longer exists ends the watch with its error.
pub async fn watch<F>(
    client: &PollClient,
    poll_id: &str,
    user_id: &str,
    period: Duration,
    mut on_snapshot: F,
) -> Result<(), ClientError>
where
    F: FnMut(&Snapshot) -> bool,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match fetch_snapshot(client, poll_id, user_id).await {
            Ok(snapshot) => {
                if !on_snapshot(&snapshot) {
                    return Ok(());
                }
            }
            Err(err @ ClientError::Api { status: 404, .. }) => return Err(err),
            Err(err) => tracing::warn!(poll_id, "refresh failed: {err}"),
        }
    }
}
