//! Translation provider abstraction
//!
//! Two implementations behind one trait:
//! - `ExternalTranslator` posts to a configured translation endpoint
//! - `MockTranslator` does a built-in dictionary lookup
//!
//! The `Translator` chain prefers the external provider when configured and
//! falls back silently to the mock on any failure, so a flaky upstream can
//! never fail a translate request.

use crate::config::TranslationConfig;
use crate::db::models::LanguageCode;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Marker appended to mock-translated text
pub const MOCK_MARKER: &str = " (mock)";

/// Trait for translation providers
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Translate text between two languages of the enumerated set
    async fn translate(
        &self,
        text: &str,
        source: LanguageCode,
        target: LanguageCode,
    ) -> Result<String>;
}

/// Client for an external HTTP translation endpoint
pub struct ExternalTranslator {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Serialize)]
struct ExternalRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExternalResponse {
    translated_text: String,
}

impl ExternalTranslator {
    pub fn new(endpoint: String, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, endpoint }
    }
}

#[async_trait]
impl TranslationProvider for ExternalTranslator {
    async fn translate(
        &self,
        text: &str,
        source: LanguageCode,
        target: LanguageCode,
    ) -> Result<String> {
        let request = ExternalRequest {
            q: text,
            source: source.as_str(),
            target: target.as_str(),
            format: "text",
        };

        let response: ExternalResponse = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::ServiceUnavailable {
                message: format!("Translation endpoint error: {}", e),
            })?
            .json()
            .await
            .map_err(|e| AppError::ServiceUnavailable {
                message: format!("Malformed translation response: {}", e),
            })?;

        Ok(response.translated_text)
    }
}

/// Dictionary-lookup mock provider
pub struct MockTranslator;

impl MockTranslator {
    /// Built-in per-source-language dictionary
    fn dictionary(source: LanguageCode) -> &'static [(&'static str, &'static str)] {
        match source {
            LanguageCode::En => &[
                ("hello", "bonjour (mock)"),
                ("world", "monde (mock)"),
                ("this", "ceci (mock)"),
                ("is", "est (mock)"),
                ("a", "un (mock)"),
                ("test", "test (mock)"),
            ],
            LanguageCode::Fr => &[
                ("bonjour", "hello (mock)"),
                ("monde", "world (mock)"),
            ],
            _ => &[],
        }
    }
}

#[async_trait]
impl TranslationProvider for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        source: LanguageCode,
        _target: LanguageCode,
    ) -> Result<String> {
        let dictionary = Self::dictionary(source);

        let translated = text
            .to_lowercase()
            .split_whitespace()
            .map(|word| {
                dictionary
                    .iter()
                    .find(|(from, _)| *from == word)
                    .map(|(_, to)| *to)
                    .unwrap_or(word)
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join(" ");

        Ok(format!("{}{}", translated, MOCK_MARKER))
    }
}

/// Provider chain used by the translate service
pub struct Translator {
    external: Option<ExternalTranslator>,
    mock: MockTranslator,
}

impl Translator {
    /// Select providers from configuration; no endpoint means mock only
    pub fn from_config(config: &TranslationConfig) -> Self {
        let external = config
            .api_url
            .as_ref()
            .map(|url| ExternalTranslator::new(url.clone(), config.timeout_secs));

        Self {
            external,
            mock: MockTranslator,
        }
    }

    /// Translate text, falling back to the mock provider on any external
    /// failure. Infallible by construction.
    pub async fn translate(
        &self,
        text: &str,
        source: LanguageCode,
        target: LanguageCode,
    ) -> String {
        if let Some(ref external) = self.external {
            match external.translate(text, source, target).await {
                Ok(translated) => return translated,
                Err(e) => {
                    tracing::error!(error = %e, "External translation API failed");
                }
            }
        }

        self.mock
            .translate(text, source, target)
            .await
            .unwrap_or_else(|_| format!("{}{}", text, MOCK_MARKER))
    }
}
