use std::future::Future;
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{error, info};

/// Runs `task` on a fixed cadence until the process exits.
///
/// The first tick fires one full interval after the call; callers wanting
/// an immediate run invoke the task once before handing it over. A failing
/// tick is logged and the loop keeps going. A slow tick causes the missed
/// intervals to be skipped, never queued, so ticks are always scheduled in
/// the future at a whole multiple of `interval` from the original start.
pub async fn every<F, Fut>(interval: Duration, mut task: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let mut next_time = Instant::now() + interval;
    loop {
        sleep_until(next_time).await;
        info!("starting scheduled task");
        if let Err(err) = task().await {
            error!(error = %err, "scheduled task failed, retrying at next tick");
        }
        next_time = advance_deadline(next_time, Instant::now(), interval);
    }
}

/// Advances `next_time` past `now` by whole multiples of `interval`.
///
/// On time this is just `next_time + interval`; when the tick overran, the
/// deadline jumps over every missed slot so only one tick fires per wall
/// interval.
pub fn advance_deadline(next_time: Instant, now: Instant, interval: Duration) -> Instant {
    let behind = now.saturating_duration_since(next_time);
    let skipped = (behind.as_nanos() / interval.as_nanos()) as u32;
    next_time + interval * (skipped + 1)
}
