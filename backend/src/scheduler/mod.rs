//! Background expiry scheduler.
//!
//! A trigger task pushes job names onto a channel at fixed wall-clock hours;
//! a single worker receives them in order and runs the matching sweep.
//! Sweeps therefore never overlap.

pub mod jobs;

use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, TimeZone};
use chrono_tz::Tz;
use tokio::{
    sync::mpsc::{self, error::SendError},
    task::JoinHandle,
};

use crate::{config::Config, db::Store, utils::time::now_in_timezone};

pub use jobs::{Job, JobRunner};

const CHANNEL_CAPACITY: usize = 8;

/// Fires `job` once a day at `hour`:00 local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyTrigger {
    pub job: Job,
    pub hour: u32,
}

impl DailyTrigger {
    pub fn new(job: Job, hour: u32) -> Self {
        Self { job, hour }
    }

    /// First firing time strictly after `now`. A day whose firing hour does
    /// not exist locally (DST gap) is skipped.
    pub fn next_after(&self, now: DateTime<Tz>) -> DateTime<Tz> {
        let tz = now.timezone();
        for days in 0..=2 {
            let Some(date) = now
                .date_naive()
                .checked_add_signed(ChronoDuration::days(days))
            else {
                continue;
            };
            let Some(naive) = date.and_hms_opt(self.hour, 0, 0) else {
                continue;
            };
            if let Some(candidate) = tz.from_local_datetime(&naive).earliest() {
                if candidate > now {
                    return candidate;
                }
            }
        }
        now + ChronoDuration::days(1)
    }
}

/// Triggers built from the configured sweep hours.
pub fn daily_triggers(config: &Config) -> Vec<DailyTrigger> {
    vec![
        DailyTrigger::new(Job::ExpiredInvites, config.invite_sweep_hour),
        DailyTrigger::new(Job::ExpiredPassResets, config.reset_sweep_hour),
    ]
}

/// Receives job names until every sender is gone. Unknown names are logged
/// and dropped; failed sweeps are logged and left for the next trigger.
pub async fn process(mut rx: mpsc::Receiver<String>, runner: JobRunner) {
    while let Some(name) = rx.recv().await {
        let Some(job) = Job::from_name(&name) else {
            tracing::error!(job = %name, "Unknown job received");
            continue;
        };
        match runner.run(job).await {
            Ok(removed) => tracing::info!(job = %job, removed, "Expiry sweep finished"),
            Err(err) => tracing::error!(job = %job, error = %err, "Expiry sweep failed"),
        }
    }
    tracing::debug!("Scheduler worker stopped");
}

/// Sleeps until the earliest pending trigger, sends its job and reschedules
/// it for the following day. Returns once the worker has gone away.
pub async fn trigger(tx: mpsc::Sender<String>, triggers: Vec<DailyTrigger>, time_zone: Tz) {
    if triggers.is_empty() {
        return;
    }
    let now = now_in_timezone(&time_zone);
    let mut pending: Vec<(DailyTrigger, DateTime<Tz>)> = triggers
        .into_iter()
        .map(|trigger| (trigger, trigger.next_after(now)))
        .collect();

    loop {
        let Some(index) = pending
            .iter()
            .enumerate()
            .min_by_key(|(_, (_, at))| *at)
            .map(|(index, _)| index)
        else {
            return;
        };
        let (daily, at) = pending[index];

        let wait = (at - now_in_timezone(&time_zone))
            .to_std()
            .unwrap_or(Duration::ZERO);
        tracing::debug!(job = %daily.job, at = %at, "Next expiry sweep scheduled");
        tokio::time::sleep(wait).await;

        if tx.send(daily.job.name().to_string()).await.is_err() {
            return;
        }
        pending[index].1 = daily.next_after(at);
    }
}

/// Handle to the running trigger and worker tasks.
pub struct Scheduler {
    sender: mpsc::Sender<String>,
    trigger: JoinHandle<()>,
    worker: JoinHandle<()>,
}

impl Scheduler {
    pub fn start(store: Store, config: &Config) -> Self {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let worker = tokio::spawn(process(receiver, JobRunner::new(store)));
        let trigger = tokio::spawn(self::trigger(
            sender.clone(),
            daily_triggers(config),
            config.time_zone,
        ));
        tracing::info!(
            invite_hour = config.invite_sweep_hour,
            reset_hour = config.reset_sweep_hour,
            time_zone = %config.time_zone,
            "Scheduled recurring jobs"
        );
        Self {
            sender,
            trigger,
            worker,
        }
    }

    /// Queues a job by name for the worker.
    pub async fn send(&self, job: &str) -> Result<(), SendError<String>> {
        self.sender.send(job.to_string()).await
    }

    /// Stops the trigger, lets the worker drain queued jobs and waits for it.
    pub async fn shutdown(self) {
        self.trigger.abort();
        let _ = self.trigger.await;
        drop(self.sender);
        if let Err(err) = self.worker.await {
            tracing::error!(error = %err, "Scheduler worker panicked");
        }
    }
}
