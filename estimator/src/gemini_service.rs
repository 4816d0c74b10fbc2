use crate::config::GeminiConfig;
use crate::models::*;
use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;

/// One-shot text generation from a document and a prompt.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, request: &EstimationRequest) -> Result<String>;
}

pub struct GeminiService {
    client: Client,
    config: GeminiConfig,
}

impl GeminiService {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client for Gemini")?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        )
    }

    fn build_request(&self, request: &EstimationRequest) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![
                    GeminiPart {
                        inline_data: Some(GeminiInlineData {
                            mime_type: request.media_type.clone(),
                            data: STANDARD.encode(&request.document),
                        }),
                        ..Default::default()
                    },
                    GeminiPart {
                        text: Some(request.prompt.clone()),
                        ..Default::default()
                    },
                ],
            }],
        }
    }
}

#[async_trait]
impl GenerationClient for GeminiService {
    async fn generate(&self, request: &EstimationRequest) -> Result<String> {
        let body = self.build_request(request);

        log::debug!(
            "Sending {} document bytes and {} prompt chars to {}",
            request.document.len(),
            request.prompt.len(),
            self.config.model
        );

        // The key travels in a header so it never shows up in error messages
        // that quote the URL.
        let mut call = self.client.post(self.endpoint()).json(&body);
        if let Some(api_key) = &self.config.api_key {
            call = call.header("x-goog-api-key", api_key);
        }

        let response = call.send().await.map_err(|e| {
            if e.is_timeout() {
                anyhow::anyhow!(
                    "Gemini request timed out after {}s",
                    self.config.timeout.as_secs_f32()
                )
            } else {
                anyhow::Error::new(e).context("Gemini request failed")
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Gemini API error {}: {}", status, error_text));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        if let Some(text) = gemini_response.text() {
            return Ok(text);
        }

        let reason = gemini_response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
            .or_else(|| {
                gemini_response
                    .candidates
                    .first()
                    .and_then(|c| c.finish_reason.clone())
            })
            .unwrap_or_else(|| "no candidates".to_string());

        Err(anyhow::anyhow!("Gemini returned no text ({})", reason))
    }
}
