use std::path::Path;

use chrono::Local;
use tracing::info;

use crate::{
    config::Config,
    core::analysis::{default_prompt, Analysis},
    error::Result,
    model::{
        client::ReplicateClient,
        job::{parse_seed, RemixJobClient},
        optimizer::PromptOptimizer,
        poller::JobPoller,
        registry::{resolve_model, ModelKind, RegistryEntry},
    },
    types::{AudioFeatures, FeatureTags, HistoryEntry, RemixOptions, RemixRequest},
};

/// Steps reported while a remix runs.
#[derive(Clone, Debug, PartialEq)]
pub enum RemixStage<'a> {
    Optimizing,
    Optimized(&'a str),
    Uploading,
    Generating { job_id: &'a str },
}

/// Result of one successful remix.
#[derive(Clone, Debug)]
pub struct CompletedRemix {
    pub job_id: String,
    pub prompt: String,
    pub output_url: String,
    pub seed: Option<i64>,
    pub duration_secs: u32,
    /// Measured features, when detection ran and succeeded.
    pub features: Option<AudioFeatures>,
    pub tags: FeatureTags,
}

impl CompletedRemix {
    /// Record for the session history, stamped with the local time.
    pub fn history_entry(&self) -> HistoryEntry {
        HistoryEntry {
            prompt: self.prompt.clone(),
            output_url: self.output_url.clone(),
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            seed: self.seed.map(|s| s.to_string()).unwrap_or_default(),
        }
    }
}

/// Prompt typed by the user, verbatim, or the one derived from the tags.
pub fn base_prompt(opts: &RemixOptions, tags: &FeatureTags) -> String {
    match opts.prompt.as_deref() {
        Some(p) if !p.trim().is_empty() => p.to_string(),
        _ => default_prompt(&opts.genre, tags),
    }
}

/// Client, resolved models and poller for a session.
pub struct RemixEngine {
    client: ReplicateClient,
    music_model: RegistryEntry,
    text_model: RegistryEntry,
    poller: JobPoller,
}

impl RemixEngine {
    pub fn new(
        client: ReplicateClient,
        music_model: RegistryEntry,
        text_model: RegistryEntry,
        poller: JobPoller,
    ) -> Self {
        Self {
            client,
            music_model,
            text_model,
            poller,
        }
    }

    /// Empty model names select the registry defaults.
    pub fn from_config(config: &Config, music_model: &str, text_model: &str) -> Result<Self> {
        Ok(Self::new(
            ReplicateClient::new(config)?,
            resolve_model(music_model, ModelKind::Music)?,
            resolve_model(text_model, ModelKind::Text)?,
            JobPoller::new(config.poll_interval),
        ))
    }

    pub fn client(&self) -> &ReplicateClient {
        &self.client
    }

    pub fn poller(&self) -> &JobPoller {
        &self.poller
    }

    pub fn optimizer(&self) -> PromptOptimizer<'_> {
        PromptOptimizer::new(&self.client, &self.text_model, self.poller.interval())
    }

    pub fn job_client(&self) -> RemixJobClient<'_> {
        RemixJobClient::new(&self.client, &self.music_model)
    }

    /// Runs prompt selection, optional optimization, submission and polling
    /// for an already analyzed clip. History is left to the caller.
    pub fn remix(
        &self,
        audio: &Path,
        analysis: &Analysis,
        opts: &RemixOptions,
        mut on_stage: impl FnMut(RemixStage<'_>),
    ) -> Result<CompletedRemix> {
        let mut prompt = base_prompt(opts, &analysis.tags);

        if opts.optimize_prompt {
            on_stage(RemixStage::Optimizing);
            prompt = self.optimizer().optimize(&prompt)?;
            on_stage(RemixStage::Optimized(&prompt));
        }

        let request = RemixRequest {
            source_audio: audio.to_path_buf(),
            prompt,
            duration_secs: opts
                .duration_secs
                .unwrap_or_else(|| analysis.suggested_duration()),
            temperature: opts.temperature,
            seed: parse_seed(&opts.seed),
        };

        on_stage(RemixStage::Uploading);
        let handle = self.job_client().submit(&request)?;

        on_stage(RemixStage::Generating { job_id: &handle.id });
        let job = self.poller.wait(&self.client, &handle)?;

        info!(job_id = %job.id, "remix ready");
        Ok(CompletedRemix {
            output_url: job.output_url.unwrap_or_default(),
            job_id: job.id,
            prompt: request.prompt,
            seed: request.seed,
            duration_secs: request.duration_secs,
            features: analysis.features.clone(),
            tags: analysis.tags.clone(),
        })
    }
}
