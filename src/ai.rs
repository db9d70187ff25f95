//! Generative provider client. One attempt against the primary model, one
//! retry against the fallback model, no backoff beyond that.

use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::warn;

use crate::metrics::AI_FALLBACK_TOTAL;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const PRIMARY_MODEL: &str = "gemini-2.5-flash";
const FALLBACK_MODEL: &str = "gemini-2.0-flash";

#[derive(Error, Debug)]
pub enum AiError {
    #[error("GEMINI_API_KEY not set — AI features are disabled")]
    NotConfigured,

    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("empty response from model")]
    Empty,

    #[error("model returned invalid JSON: {0}")]
    BadJson(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

pub struct AiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl AiClient {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        if api_key.is_none() {
            warn!("GEMINI_API_KEY not set — AI endpoints will fail at generation time");
        }
        Self {
            client,
            api_key,
            base_url: API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(client: reqwest::Client, api_key: Option<String>, base_url: String) -> Self {
        Self {
            client,
            api_key,
            base_url,
        }
    }

    /// Ask for a JSON document and parse it. Any primary-model failure
    /// (transport, provider error, empty text, bad JSON) triggers exactly one
    /// retry on the fallback model.
    pub async fn generate_json(&self, prompt: &str) -> Result<Value, AiError> {
        let key = self.api_key.as_deref().ok_or(AiError::NotConfigured)?;
        let prompt =
            format!("{prompt}\n\nRespond ONLY with valid JSON. No markdown, no code fences, no extra text.");

        match self.call_model(PRIMARY_MODEL, key, &prompt).await {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!("primary model failed ({err}), retrying on {FALLBACK_MODEL}");
                AI_FALLBACK_TOTAL.inc();
                self.call_model(FALLBACK_MODEL, key, &prompt).await
            }
        }
    }

    async fn call_model(&self, model: &str, key: &str, prompt: &str) -> Result<Value, AiError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseMimeType": "application/json" },
        });

        let response = self
            .client
            .post(format!("{}/{model}:generateContent", self.base_url))
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let parsed: GenerateContentResponse = response.json().await?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .and_then(|p| p.text)
            .filter(|t| !t.trim().is_empty())
            .ok_or(AiError::Empty)?;

        Ok(serde_json::from_str(text.trim())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_provider_key_fails_before_any_network_call() {
        let client = AiClient::new(reqwest::Client::new(), None);
        let err = client.generate_json("quack").await.unwrap_err();
        assert!(matches!(err, AiError::NotConfigured));
    }

    #[test]
    fn response_text_is_buried_three_levels_deep() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"{\"quack\":1}"}]}}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let text = parsed.candidates[0].content.parts[0].text.as_deref();
        assert_eq!(text, Some("{\"quack\":1}"));
    }
}
