use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::caption::build_prompt;
use crate::config::ModelSettings;
use crate::errors::{AimError, Result};
use crate::traits::ImageDescriber;

const DEFAULT_OLLAMA_PORT: u16 = 11434;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    images: Vec<String>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Blocking client for Ollama's `/api/generate` endpoint.
///
/// To run against a local server:
///
/// ```text
/// $ ollama pull llava
/// $ ollama serve
/// ```
pub struct OllamaClient {
    client: Client,
    endpoint: String,
    model: String,
    prompt: String,
    temperature: f32,
}

impl OllamaClient {
    pub fn new(host: &str, settings: &ModelSettings, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AimError::Configuration {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint: generate_endpoint(host),
            model: settings.model.clone(),
            prompt: build_prompt(&settings.tone, settings.keyword_count),
            temperature: settings.temperature,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    fn classify(&self, err: reqwest::Error) -> AimError {
        if err.is_connect() || err.is_timeout() {
            AimError::InferenceUnavailable {
                endpoint: self.endpoint.clone(),
                source: Box::new(err),
            }
        } else {
            self.bad_response(err.to_string())
        }
    }

    fn bad_response(&self, reason: String) -> AimError {
        AimError::InferenceResponse {
            endpoint: self.endpoint.clone(),
            reason,
        }
    }
}

impl ImageDescriber for OllamaClient {
    fn describe(&self, image: &[u8]) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt: &self.prompt,
            images: vec![STANDARD.encode(image)],
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        debug!(
            "POST {} (model {}, {} bytes)",
            self.endpoint,
            self.model,
            image.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let body = response.text().map_err(|e| self.classify(e))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(self.bad_response(format!("HTTP {}: {}", status, detail.trim())));
        }

        let generated: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| self.bad_response(format!("malformed payload: {}", e)))?;

        let text = generated.response.trim();
        if text.is_empty() {
            return Err(self.bad_response("empty description".to_string()));
        }

        Ok(text.to_string())
    }
}

/// `OLLAMA_HOST` is commonly set without a scheme (`127.0.0.1:11434`) or without a
/// port (`0.0.0.0`); plain HTTP hosts without a port get the Ollama default.
fn generate_endpoint(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    let (scheme, rest) = host.split_once("://").unwrap_or(("http", host));
    let (authority, path) = rest.split_at(rest.find('/').unwrap_or(rest.len()));

    let has_port = authority
        .rsplit_once(':')
        .is_some_and(|(_, port)| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()));

    if has_port || !scheme.eq_ignore_ascii_case("http") {
        format!("{}://{}{}/api/generate", scheme, authority, path)
    } else {
        format!(
            "{}://{}:{}{}/api/generate",
            scheme, authority, DEFAULT_OLLAMA_PORT, path
        )
    }
}
