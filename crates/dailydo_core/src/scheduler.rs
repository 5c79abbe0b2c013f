//! Timer-driven daily reset.
//!
//! # Responsibility
//! - Run the board's reset check on a fixed poll and at local midnight.
//!
//! # Invariants
//! - One check runs immediately when the schedule starts.
//! - The poll is the correctness guarantee; the midnight timer only makes
//!   the reset land close to the boundary. A suspended process catches up
//!   on the first poll after resume.
//! - The board lock is held for one check at a time and never across an
//!   await point.

use crate::clock::Clock;
use crate::repo::kv_repo::KeyValueStore;
use crate::service::board::{ResetTrigger, TaskBoard};
use chrono::{NaiveDateTime, NaiveTime};
use log::{error, info};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
pub const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Reset timer cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetSchedule {
    pub poll_interval: Duration,
    pub day_interval: Duration,
}

impl Default for ResetSchedule {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            day_interval: DAY,
        }
    }
}

/// Time from `now` (local wall clock) to the next local midnight.
///
/// Always in `(0, 24h]`: exactly at midnight the next boundary is a full day
/// away.
pub fn duration_until_next_midnight(now: NaiveDateTime) -> Duration {
    now.date()
        .succ_opt()
        .map(|tomorrow| tomorrow.and_time(NaiveTime::MIN) - now)
        .and_then(|delta| delta.to_std().ok())
        .filter(|delay| !delay.is_zero())
        .unwrap_or(DAY)
}

/// Runs reset checks until `cancel` fires.
///
/// `on_reset` is called after every check that cleared the daily list, so
/// the caller can re-render.
pub async fn run_reset_schedule<S, C, F>(
    board: Arc<Mutex<TaskBoard<S, C>>>,
    schedule: ResetSchedule,
    cancel: CancellationToken,
    mut on_reset: F,
) where
    S: KeyValueStore,
    C: Clock,
    F: FnMut(ResetTrigger),
{
    let mut poll = tokio::time::interval(schedule.poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let first_midnight = {
        let guard = board.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        duration_until_next_midnight(guard.clock().local_now())
    };
    let midnight = tokio::time::sleep(first_midnight);
    tokio::pin!(midnight);

    info!(
        "event=reset_schedule module=scheduler status=start poll_secs={} first_midnight_secs={}",
        schedule.poll_interval.as_secs(),
        first_midnight.as_secs()
    );

    loop {
        let trigger = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = &mut midnight => {
                midnight.as_mut().reset(Instant::now() + schedule.day_interval);
                ResetTrigger::Midnight
            }
            _ = poll.tick() => ResetTrigger::Poll,
        };

        if run_check(&board, trigger) {
            on_reset(trigger);
        }
    }

    info!("event=reset_schedule module=scheduler status=stopped");
}

fn run_check<S: KeyValueStore, C: Clock>(
    board: &Mutex<TaskBoard<S, C>>,
    trigger: ResetTrigger,
) -> bool {
    let mut guard = board.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    match guard.check_for_reset_with(trigger) {
        Ok(reset) => reset,
        Err(err) => {
            error!(
                "event=daily_reset module=scheduler status=error trigger={} error={}",
                trigger.as_str(),
                err
            );
            false
        }
    }
}
