use std::time::Duration;

use serde_json::json;
use tracing::info;

use crate::{
    error::{RemixError, Result},
    model::{client::ReplicateClient, registry::RegistryEntry},
};

pub const SYSTEM_INSTRUCTION: &str = "You are an expert music producer. \
Rewrite the user's prompt to be descriptive, using specific musical terms \
(BPM, instruments, mood, genre) that work well for AI music generators. \
Keep it concise (under 30 words). Output ONLY the new prompt, nothing else.";

pub const MAX_TOKENS: u32 = 100;
pub const TEMPERATURE: f64 = 0.7;

pub fn optimizer_prompt(original: &str) -> String {
    format!("{SYSTEM_INSTRUCTION}\n\nUser Input: {original}\n\nOptimized Prompt:")
}

/// Rewrites style prompts through a hosted text model. Single attempt.
pub struct PromptOptimizer<'a> {
    client: &'a ReplicateClient,
    model: &'a RegistryEntry,
    poll_interval: Duration,
}

impl<'a> PromptOptimizer<'a> {
    pub fn new(client: &'a ReplicateClient, model: &'a RegistryEntry, poll_interval: Duration) -> Self {
        Self {
            client,
            model,
            poll_interval,
        }
    }

    pub fn optimize(&self, original: &str) -> Result<String> {
        info!(model = %self.model.id, "optimizing prompt");
        let input = json!({
            "prompt": optimizer_prompt(original),
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
        });

        let created = self.client.create_prediction(self.model, input)?;
        let done = self.client.wait_for(created, self.poll_interval)?;

        let text = done.output_text().unwrap_or_default();
        let rewritten = text.trim();
        if rewritten.is_empty() {
            return Err(RemixError::Anyhow(anyhow::anyhow!(
                "prompt optimizer returned no text"
            )));
        }
        Ok(rewritten.to_string())
    }
}
