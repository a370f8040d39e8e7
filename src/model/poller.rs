//! Blocking status polling for submitted remix jobs.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use tracing::{debug, info, warn};

use crate::{
    config::DEFAULT_POLL_INTERVAL,
    error::{RemixError, Result},
    io::progress::emit_poll_progress,
    types::{JobHandle, JobStatus, PollProgress, RemixJob},
};

/// Reported progress never exceeds this until the job has succeeded.
pub const MAX_RUNNING_PERCENT: u8 = 95;

/// Anything that can report the current state of a job by id.
pub trait JobSource {
    fn fetch_job(&self, id: &str) -> Result<RemixJob>;
}

/// Expected wall time for a job generating `duration_secs` of audio.
pub fn estimated_total(duration_secs: u32) -> Duration {
    Duration::from_secs_f64(1.3 * duration_secs as f64 + 20.0)
}

pub fn progress_percent(elapsed: Duration, estimate: Duration, status: JobStatus) -> u8 {
    if status == JobStatus::Succeeded {
        return 100;
    }
    let est = estimate.as_secs_f64();
    if est <= 0.0 {
        return MAX_RUNNING_PERCENT;
    }
    let pct = (elapsed.as_secs_f64() / est * 100.0).floor();
    pct.clamp(0.0, MAX_RUNNING_PERCENT as f64) as u8
}

pub fn progress_snapshot(
    job_id: &str,
    status: JobStatus,
    elapsed: Duration,
    duration_secs: u32,
) -> PollProgress {
    let estimate = estimated_total(duration_secs);
    PollProgress {
        job_id: job_id.to_string(),
        status,
        elapsed,
        estimated_total: estimate,
        remaining: estimate.saturating_sub(elapsed),
        percent: progress_percent(elapsed, estimate, status),
    }
}

pub struct JobPoller {
    interval: Duration,
    stop: Arc<AtomicBool>,
}

impl Default for JobPoller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl JobPoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Setting the returned flag makes [`JobPoller::wait`] give up at its next
    /// check. The remote job keeps running.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Refreshes the job until it is terminal, emitting a [`PollProgress`]
    /// after every refresh.
    ///
    /// Succeeded jobs are returned; failed or canceled ones become
    /// [`RemixError::JobFailed`] with the service's message.
    pub fn wait<S: JobSource + ?Sized>(&self, source: &S, handle: &JobHandle) -> Result<RemixJob> {
        let started = Instant::now();
        let mut shown = handle.initial.status;

        loop {
            if self.stop.load(Ordering::SeqCst) {
                info!(job_id = %handle.id, "polling stopped; remote job left running");
                return Err(RemixError::PollingStopped(handle.id.clone()));
            }

            let job = source.fetch_job(&handle.id)?;

            if job.status.rank() < shown.rank() {
                warn!(job_id = %handle.id, from = %shown, to = %job.status, "ignoring backwards status");
            } else {
                shown = job.status;
            }

            let report = progress_snapshot(&handle.id, shown, started.elapsed(), handle.duration_secs);
            debug!(
                job_id = %report.job_id,
                status = %report.status,
                percent = report.percent,
                remaining_secs = report.remaining.as_secs(),
                "poll"
            );
            emit_poll_progress(&report);

            if job.status.is_terminal() {
                return finish(job);
            }

            thread::sleep(self.interval);
        }
    }
}

fn finish(job: RemixJob) -> Result<RemixJob> {
    match job.status {
        JobStatus::Succeeded => {
            info!(job_id = %job.id, "remix succeeded");
            Ok(job)
        }
        status => Err(RemixError::JobFailed {
            message: job
                .failure_detail()
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string()),
            id: job.id,
            status,
        }),
    }
}
