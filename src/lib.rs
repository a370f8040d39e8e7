//! # phantom-trax
//!
//! Core of an AI remix tool: estimate tempo and key of an uploaded clip,
//! optionally rewrite the style prompt with a hosted language model, submit
//! a generation job to a hosted music model and poll it to completion.

pub mod config;
pub mod core;
pub mod error;
pub mod history;
pub mod io;
pub mod model;
pub mod paths;
pub mod pipeline;
pub mod types;

pub use crate::{
    config::{Config, TokenDiagnostic},
    core::{
        analysis::{analyze_file, analyze_upload, default_prompt, Analysis},
        audio::{read_audio, write_audio},
    },
    error::{RemixError, Result},
    history::RemixHistory,
    io::{
        net::download_with_progress,
        progress::{
            clear_poll_progress_callback, set_download_progress_callback,
            set_poll_progress_callback,
        },
    },
    model::{
        client::ReplicateClient,
        job::{parse_seed, remix_input, RemixJobClient},
        optimizer::PromptOptimizer,
        poller::{JobPoller, JobSource},
        registry::{load_registry, resolve_model, ModelKind},
    },
    paths::{default_staging_dir, stage_upload},
    pipeline::{CompletedRemix, RemixEngine, RemixStage},
    types::{
        AudioData, AudioFeatures, FeatureTags, HistoryEntry, JobHandle, JobStatus, PollProgress,
        RemixJob, RemixOptions, RemixRequest, PLACEHOLDER,
    },
};
