use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, time::Duration};

/// Shown in place of any feature value that was not computed.
pub const PLACEHOLDER: &str = "---";

#[derive(Clone, Debug)]
pub struct AudioData {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioData {
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    pub fn duration_secs(&self) -> u32 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.frames() / self.sample_rate as usize) as u32
    }
}

/// Status of a hosted generation job.
///
/// The service reports `starting` for freshly created predictions; it is
/// folded into `Queued`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[serde(alias = "starting")]
    Queued,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Canceled
        )
    }

    /// Position in the forward-only lifecycle. All terminal states share a rank.
    pub(crate) fn rank(self) -> u8 {
        match self {
            JobStatus::Queued => 0,
            JobStatus::Processing => 1,
            _ => 2,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

/// A generation request. Built once and never mutated after submission.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemixRequest {
    pub source_audio: PathBuf,
    pub prompt: String,
    pub duration_secs: u32,
    pub temperature: f64,
    pub seed: Option<i64>,
}

/// Snapshot of a hosted job as last fetched from the service.
#[derive(Clone, Debug, PartialEq)]
pub struct RemixJob {
    pub id: String,
    pub status: JobStatus,
    pub output_url: Option<String>,
    pub error_message: Option<String>,
    /// Remote explanation attached to a canceled job.
    pub cancel_reason: Option<String>,
}

impl RemixJob {
    /// Builds a snapshot that keeps `output_url` set only on success and
    /// `error_message` set only on failure. Remote text sent with a
    /// cancellation lands in `cancel_reason`.
    pub fn new(
        id: impl Into<String>,
        status: JobStatus,
        output_url: Option<String>,
        error_message: Option<String>,
    ) -> Self {
        let mut job = Self {
            id: id.into(),
            status,
            output_url: None,
            error_message: None,
            cancel_reason: None,
        };
        match status {
            JobStatus::Succeeded => match output_url {
                Some(url) => job.output_url = Some(url),
                None => {
                    job.status = JobStatus::Failed;
                    job.error_message = Some("job succeeded without an output url".into());
                }
            },
            JobStatus::Failed => {
                job.error_message =
                    Some(error_message.unwrap_or_else(|| "unknown error".into()));
            }
            JobStatus::Canceled => job.cancel_reason = error_message,
            JobStatus::Queued | JobStatus::Processing => {}
        }
        job
    }

    /// Text explaining a failed or canceled job, if the service sent any.
    pub fn failure_detail(&self) -> Option<&str> {
        self.error_message
            .as_deref()
            .or(self.cancel_reason.as_deref())
    }
}

/// Reference to a submitted job. Only the id and the requested duration are
/// needed to poll it.
#[derive(Clone, Debug)]
pub struct JobHandle {
    pub id: String,
    pub duration_secs: u32,
    pub initial: RemixJob,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub tempo_bpm: u32,
    pub key: String,
    pub duration_secs: u32,
}

/// Display form of the analysis, with [`PLACEHOLDER`] for missing values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureTags {
    pub tempo: String,
    pub key: String,
    pub duration: String,
}

impl FeatureTags {
    pub fn placeholders() -> Self {
        Self {
            tempo: PLACEHOLDER.into(),
            key: PLACEHOLDER.into(),
            duration: PLACEHOLDER.into(),
        }
    }

    pub fn has_tempo(&self) -> bool {
        self.tempo != PLACEHOLDER
    }

    pub fn has_key(&self) -> bool {
        self.key != PLACEHOLDER
    }
}

impl From<&AudioFeatures> for FeatureTags {
    fn from(f: &AudioFeatures) -> Self {
        Self {
            tempo: f.tempo_bpm.to_string(),
            key: f.key.clone(),
            duration: f.duration_secs.to_string(),
        }
    }
}

/// One finished remix as kept in the session history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub prompt: String,
    pub output_url: String,
    pub timestamp: String,
    pub seed: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemixOptions {
    pub prompt: Option<String>,
    pub genre: String,
    pub duration_secs: Option<u32>,
    pub temperature: f64,
    pub seed: String,
    pub detect_features: bool,
    pub optimize_prompt: bool,
}

impl Default for RemixOptions {
    fn default() -> Self {
        Self {
            prompt: None,
            genre: "electronic".into(),
            duration_secs: None,
            temperature: 0.8,
            seed: String::new(),
            detect_features: true,
            optimize_prompt: true,
        }
    }
}

/// Snapshot handed to the poll observer after every status refresh.
#[derive(Clone, Debug, PartialEq)]
pub struct PollProgress {
    pub job_id: String,
    pub status: JobStatus,
    pub elapsed: Duration,
    pub estimated_total: Duration,
    pub remaining: Duration,
    /// 0..=95 while the job runs, 100 only once it has succeeded.
    pub percent: u8,
}
