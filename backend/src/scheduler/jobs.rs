//! Expiry sweeps run by the scheduler.

use crate::{
    db::{buckets, Store, StoreError},
    models::{invite::Invite, password_reset::PassReset},
    repositories::sweep::sweep_bucket,
    utils::time::unix_now,
};

/// Jobs understood by the scheduler, addressed by name on its channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    ExpiredInvites,
    ExpiredPassResets,
}

impl Job {
    pub const ALL: [Job; 2] = [Job::ExpiredInvites, Job::ExpiredPassResets];

    pub fn name(&self) -> &'static str {
        match self {
            Job::ExpiredInvites => "invite",
            Job::ExpiredPassResets => "passreset",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|job| job.name() == name)
    }
}

impl std::fmt::Display for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug)]
pub struct JobRunner {
    store: Store,
}

impl JobRunner {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Runs one sweep and returns the number of records removed.
    pub async fn run(&self, job: Job) -> Result<usize, StoreError> {
        let now = unix_now();
        match job {
            Job::ExpiredInvites => {
                sweep_bucket(&self.store, buckets::INVITE, |invite: &Invite| {
                    invite.is_stale(now)
                })
                .await
            }
            Job::ExpiredPassResets => {
                sweep_bucket(&self.store, buckets::PASS_RESET, |reset: &PassReset| {
                    reset.is_stale(now)
                })
                .await
            }
        }
    }
}
