use crate::error::{RemixError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Music,
    Text,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Music => f.write_str("music"),
            ModelKind::Text => f.write_str("text"),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct RegistryEntry {
    pub name: String,
    pub kind: ModelKind,
    /// `owner/name` or `owner/name:version`.
    pub id: String,
    /// Checkpoint selector passed to music models.
    #[serde(default)]
    pub model_version: Option<String>,
}

impl RegistryEntry {
    /// Version hash, if the id pins one.
    pub fn version(&self) -> Option<&str> {
        self.id.split_once(':').map(|(_, v)| v)
    }

    /// `owner/name` part of the id.
    pub fn model_path(&self) -> &str {
        self.id.split_once(':').map(|(m, _)| m).unwrap_or(&self.id)
    }
}

#[derive(Debug, Deserialize)]
pub struct Registry {
    pub default_music: String,
    pub default_text: String,
    pub models: Vec<RegistryEntry>,
}

impl Registry {
    pub fn default_for(&self, kind: ModelKind) -> &str {
        match kind {
            ModelKind::Music => &self.default_music,
            ModelKind::Text => &self.default_text,
        }
    }
}

const REGISTRY_JSON: &str = include_str!("../../models/registry.json");

pub fn load_registry() -> Result<Registry> {
    Ok(serde_json::from_str(REGISTRY_JSON)?)
}

/// Looks up a model by registry name; an empty name selects the default for
/// `kind`. A name shaped like `owner/name[:version]` is accepted as a raw id.
pub fn resolve_model(model_name: &str, kind: ModelKind) -> Result<RegistryEntry> {
    let reg = load_registry()?;
    let target = if model_name.trim().is_empty() {
        reg.default_for(kind).to_string()
    } else {
        model_name.trim().to_string()
    };

    if let Some(entry) = reg.models.iter().find(|m| m.name == target) {
        if entry.kind != kind {
            return Err(RemixError::Registry(format!(
                "Model `{target}` is a {} model, expected {kind}",
                entry.kind
            )));
        }
        return Ok(entry.clone());
    }

    if target.contains('/') {
        if kind == ModelKind::Music && !target.contains(':') {
            return Err(RemixError::Registry(format!(
                "Music model `{target}` must pin a version (owner/name:version)"
            )));
        }
        return Ok(RegistryEntry {
            name: target.clone(),
            kind,
            id: target,
            model_version: None,
        });
    }

    Err(RemixError::Registry(format!(
        "Model `{target}` not found in registry"
    )))
}
