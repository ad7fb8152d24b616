// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Client for the Gemini `generateContent` endpoint.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Gemini API key not configured")]
    NotConfigured,

    #[error("Failed to reach the text generation service: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Text generation failed: {status} {message}")]
    Upstream { status: u16, message: String },

    #[error("Unexpected response from the text generation service: {0}")]
    Decode(String),
}

/// Sampling parameters sent as `generationConfig`.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl GenerationSettings {
    pub const TASKS: Self = Self {
        temperature: 0.7,
        top_k: 40,
        top_p: 0.95,
        max_output_tokens: 2048,
    };

    pub const RECOMMENDATIONS: Self = Self {
        temperature: 0.6,
        top_k: 40,
        top_p: 0.9,
        max_output_tokens: 512,
    };

    pub const BREAKDOWN: Self = Self {
        temperature: 0.5,
        top_k: 40,
        top_p: 0.9,
        max_output_tokens: 1024,
    };

    pub const IMPROVEMENT: Self = Self {
        temperature: 0.6,
        top_k: 40,
        top_p: 0.9,
        max_output_tokens: 1024,
    };
}

/// Anything that turns a prompt into free-form text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        settings: &GenerationSettings,
    ) -> Result<String, GenerationError>;
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug, Default)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Deserialize, Debug, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize, Debug, Default)]
struct Part {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        settings: &GenerationSettings,
    ) -> Result<String, GenerationError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": settings,
        });

        debug!("Sending prompt of {} chars to Gemini.", prompt.len());

        let response = self
            .http
            .post(&self.api_url)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|value| value["error"]["message"].as_str().map(str::to_string))
                .unwrap_or_default();
            let reason = status.canonical_reason().unwrap_or("Unknown status");
            error!("Gemini responded with {}: {}", status, detail);
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                message: format!("{reason}. {detail}").trim().to_string(),
            });
        }

        let data: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Decode(e.to_string()))?;

        Ok(data
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .unwrap_or_default())
    }
}
