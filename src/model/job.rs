use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::{
    error::{RemixError, Result},
    model::{client::ReplicateClient, registry::RegistryEntry},
    types::{JobHandle, RemixRequest},
};

pub const DEFAULT_MODEL_VERSION: &str = "stereo-melody-large";
pub const NORMALIZATION_STRATEGY: &str = "loudness";

/// Parses the free-text seed field. Blank input means "no seed"; text that
/// is not an integer is ignored.
pub fn parse_seed(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<i64>() {
        Ok(seed) => Some(seed),
        Err(_) => {
            warn!("ignoring non-integer seed {raw:?}");
            None
        }
    }
}

/// Input object for the music model. `seed` is only present when set.
pub fn remix_input(request: &RemixRequest, audio_url: &str, model_version: &str) -> Value {
    let mut input = Map::new();
    input.insert("input_audio".into(), Value::from(audio_url));
    input.insert("prompt".into(), Value::from(request.prompt.as_str()));
    input.insert("duration".into(), Value::from(request.duration_secs));
    input.insert("model_version".into(), Value::from(model_version));
    input.insert(
        "normalization_strategy".into(),
        Value::from(NORMALIZATION_STRATEGY),
    );
    input.insert("temperature".into(), Value::from(request.temperature));
    if let Some(seed) = request.seed {
        input.insert("seed".into(), Value::from(seed));
    }
    Value::Object(input)
}

fn validate(request: &RemixRequest) -> Result<()> {
    if request.prompt.trim().is_empty() {
        return Err(RemixError::InvalidRequest("prompt is empty".into()));
    }
    if request.duration_secs == 0 {
        return Err(RemixError::InvalidRequest("duration must be positive".into()));
    }
    if !request.temperature.is_finite() || request.temperature < 0.0 {
        return Err(RemixError::InvalidRequest(format!(
            "temperature {} out of range",
            request.temperature
        )));
    }
    Ok(())
}

/// Submits generation jobs for one music model.
pub struct RemixJobClient<'a> {
    client: &'a ReplicateClient,
    model: &'a RegistryEntry,
}

impl<'a> RemixJobClient<'a> {
    pub fn new(client: &'a ReplicateClient, model: &'a RegistryEntry) -> Self {
        Self { client, model }
    }

    /// Uploads the source clip and creates the job. Does not wait for it.
    pub fn submit(&self, request: &RemixRequest) -> Result<JobHandle> {
        validate(request)?;

        let uploaded = self.client.upload_file(&request.source_audio)?;
        let model_version = self
            .model
            .model_version
            .as_deref()
            .unwrap_or(DEFAULT_MODEL_VERSION);
        let input = remix_input(request, &uploaded.urls.get, model_version);

        let prediction = self.client.create_prediction(self.model, input)?;
        info!(
            job_id = %prediction.id,
            duration_secs = request.duration_secs,
            seeded = request.seed.is_some(),
            "submitted remix job"
        );

        Ok(JobHandle {
            id: prediction.id.clone(),
            duration_secs: request.duration_secs,
            initial: prediction.to_job(),
        })
    }
}
