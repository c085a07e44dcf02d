// Translator: normalizes user text into a knowledge base query

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const TRANSLATE_TIMEOUT: Duration = Duration::from_secs(2);

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate_to_query(&self, text: &str) -> Result<String>;

    fn is_available(&self) -> bool;
}

/// Passes text through untouched.
#[derive(Debug, Default, Clone)]
pub struct NoopTranslator;

#[async_trait]
impl Translator for NoopTranslator {
    async fn translate_to_query(&self, text: &str) -> Result<String> {
        Ok(text.to_string())
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    translated_text: String,
}

/// Remote translation service: `POST {url}/translate` with `{text}`.
#[derive(Debug, Clone)]
pub struct HttpTranslator {
    http: Client,
    url: String,
}

impl HttpTranslator {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate_to_query(&self, text: &str) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/translate", self.url))
            .timeout(TRANSLATE_TIMEOUT)
            .json(&TranslateRequest { text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("translation service returned {}: {}", status, body));
        }

        let translated: TranslateResponse = response.json().await?;
        if translated.translated_text.trim().is_empty() {
            return Err(anyhow!("translation service returned empty text"));
        }

        debug!("Translated query: {}", translated.translated_text);
        Ok(translated.translated_text)
    }

    fn is_available(&self) -> bool {
        !self.url.is_empty()
    }
}
