use std::path::Path;

use tracing::{info, warn};

use crate::{
    core::{
        audio::{downmix_to_mono, read_audio, resample_mono},
        dsp::ANALYSIS_RATE,
        key::estimate_key,
        tempo::estimate_tempo,
    },
    error::{RemixError, Result},
    types::{AudioFeatures, FeatureTags, PLACEHOLDER},
};

/// Duration requested when the clip could not be measured.
pub const DEFAULT_DURATION_SECS: u32 = 30;
pub const MIN_DURATION_SECS: u32 = 5;
pub const MAX_DURATION_SECS: u32 = 30;

/// Decodes `path` and estimates tempo, key and duration.
pub fn analyze_file<P: AsRef<Path>>(path: P) -> Result<AudioFeatures> {
    let audio = read_audio(path)?;
    let duration_secs = audio.duration_secs();

    let mono = downmix_to_mono(&audio.samples, audio.channels);
    let mono = resample_mono(&mono, audio.sample_rate, ANALYSIS_RATE)?;

    let bpm = estimate_tempo(&mono, ANALYSIS_RATE)?;
    let key = estimate_key(&mono, ANALYSIS_RATE)
        .ok_or_else(|| RemixError::Analysis("no pitched content detected".into()))?;

    Ok(AudioFeatures {
        tempo_bpm: (bpm as u32).max(1),
        key: key.label(),
        duration_secs,
    })
}

/// What the caller gets back for an uploaded clip, successful or not.
#[derive(Clone, Debug)]
pub struct Analysis {
    pub features: Option<AudioFeatures>,
    pub tags: FeatureTags,
    pub clip_duration_secs: Option<u32>,
    pub error: Option<String>,
}

impl Analysis {
    /// Generation length to request: the clip length clamped to the
    /// supported range, or the default when the clip was unreadable.
    pub fn suggested_duration(&self) -> u32 {
        match self.clip_duration_secs {
            Some(d) if self.error.is_none() => d.clamp(MIN_DURATION_SECS, MAX_DURATION_SECS),
            _ => DEFAULT_DURATION_SECS,
        }
    }
}

/// Analyzes an upload, recovering from any failure with placeholder tags.
///
/// With `detect` off only the clip duration is measured.
pub fn analyze_upload<P: AsRef<Path>>(path: P, detect: bool) -> Analysis {
    let path = path.as_ref();

    if !detect {
        return match read_audio(path) {
            Ok(audio) => {
                let d = audio.duration_secs();
                Analysis {
                    features: None,
                    tags: FeatureTags {
                        duration: d.to_string(),
                        ..FeatureTags::placeholders()
                    },
                    clip_duration_secs: Some(d),
                    error: None,
                }
            }
            Err(e) => failed(path, e.into()),
        };
    }

    match analyze_file(path) {
        Ok(features) => {
            info!(
                tempo_bpm = features.tempo_bpm,
                key = %features.key,
                duration_secs = features.duration_secs,
                "analyzed {}",
                path.display()
            );
            Analysis {
                tags: FeatureTags::from(&features),
                clip_duration_secs: Some(features.duration_secs),
                features: Some(features),
                error: None,
            }
        }
        Err(e) => failed(path, e),
    }
}

fn failed(path: &Path, e: RemixError) -> Analysis {
    warn!("analysis of {} failed: {e}", path.display());
    Analysis {
        features: None,
        tags: FeatureTags::placeholders(),
        clip_duration_secs: None,
        error: Some(e.to_string()),
    }
}

/// Prompt used when the user typed none. Clauses whose tag is a placeholder
/// are dropped and whitespace is collapsed.
pub fn default_prompt(genre: &str, tags: &FeatureTags) -> String {
    let bpm = if tags.tempo == PLACEHOLDER {
        String::new()
    } else {
        format!("at {} BPM", tags.tempo)
    };
    let key = if tags.key == PLACEHOLDER {
        String::new()
    } else {
        format!("in {}", tags.key)
    };

    format!("{genre} remix {bpm} {key}")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
