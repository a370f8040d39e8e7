//! Blocking client for the hosted prediction API.

use std::{path::Path, thread, time::Duration};

use reqwest::blocking::{multipart::Form, Client};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::{
    config::Config,
    error::{RemixError, Result},
    io::net::{check_status, http_client},
    model::{poller::JobSource, registry::RegistryEntry},
    types::{JobStatus, RemixJob},
};

#[derive(Clone, Debug, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub logs: Option<String>,
}

impl Prediction {
    /// Output as a single URL. Models that return a list yield the first entry.
    pub fn output_url(&self) -> Option<String> {
        match self.output.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Array(items) => items
                .iter()
                .find_map(|v| v.as_str().filter(|s| !s.is_empty()))
                .map(str::to_string),
            _ => None,
        }
    }

    /// Output fragments joined into one string, without trimming.
    pub fn output_text(&self) -> Option<String> {
        match self.output.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Array(items) => Some(items.iter().filter_map(Value::as_str).collect()),
            _ => None,
        }
    }

    pub fn error_text(&self) -> Option<String> {
        match self.error.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn to_job(&self) -> RemixJob {
        RemixJob::new(
            self.id.clone(),
            self.status,
            self.output_url(),
            self.error_text(),
        )
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct FileUrls {
    pub get: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    pub urls: FileUrls,
}

pub struct ReplicateClient {
    http: Client,
    base_url: String,
    token: String,
}

impl ReplicateClient {
    /// Fails with [`RemixError::MissingCredential`] when no token is configured.
    pub fn new(config: &Config) -> Result<Self> {
        let token = config.require_token()?.to_string();
        Ok(Self {
            http: http_client(config)?,
            base_url: config.api_base_url.clone(),
            token,
        })
    }

    pub fn with_http(http: Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Streams a local file to the hosted file store.
    pub fn upload_file(&self, path: &Path) -> Result<UploadedFile> {
        let form = Form::new().file("content", path)?;
        info!("uploading {}", path.display());
        let resp = self
            .http
            .post(self.url("/v1/files"))
            .bearer_auth(&self.token)
            .multipart(form)
            .send()?;
        let file: UploadedFile = check_status(resp)?.json()?;
        debug!(file_id = %file.id, url = %file.urls.get, "uploaded");
        Ok(file)
    }

    /// Creates a prediction against `model`, by version when the id pins one.
    pub fn create_prediction(&self, model: &RegistryEntry, input: Value) -> Result<Prediction> {
        let req = match model.version() {
            Some(version) => self
                .http
                .post(self.url("/v1/predictions"))
                .json(&json!({ "version": version, "input": input })),
            None => self
                .http
                .post(self.url(&format!("/v1/models/{}/predictions", model.model_path())))
                .json(&json!({ "input": input })),
        };
        let resp = req.bearer_auth(&self.token).send()?;
        let prediction: Prediction = check_status(resp)?.json()?;
        debug!(id = %prediction.id, status = %prediction.status, model = %model.id, "created prediction");
        Ok(prediction)
    }

    pub fn get_prediction(&self, id: &str) -> Result<Prediction> {
        let resp = self
            .http
            .get(self.url(&format!("/v1/predictions/{id}")))
            .bearer_auth(&self.token)
            .send()?;
        Ok(check_status(resp)?.json()?)
    }

    /// Blocks until `prediction` is terminal, refreshing every `interval`.
    /// Failed or canceled predictions become [`RemixError::JobFailed`].
    pub fn wait_for(&self, mut prediction: Prediction, interval: Duration) -> Result<Prediction> {
        while !prediction.status.is_terminal() {
            thread::sleep(interval);
            prediction = self.get_prediction(&prediction.id)?;
        }

        match prediction.status {
            JobStatus::Succeeded => Ok(prediction),
            status => {
                let job = prediction.to_job();
                if let Some(logs) = prediction.logs.as_deref().filter(|l| !l.is_empty()) {
                    debug!(id = %prediction.id, %status, "prediction logs:\n{logs}");
                }
                Err(RemixError::JobFailed {
                    message: job
                        .failure_detail()
                        .map(str::to_string)
                        .unwrap_or_else(|| status.to_string()),
                    id: prediction.id,
                    status,
                })
            }
        }
    }
}

impl JobSource for ReplicateClient {
    fn fetch_job(&self, id: &str) -> Result<RemixJob> {
        Ok(self.get_prediction(id)?.to_job())
    }
}
