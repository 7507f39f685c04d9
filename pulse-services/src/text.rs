//! Text providers
//!
//! Opaque text completion (daily briefs, industry reports) and batch headline
//! translation. Both are optional; callers fall back to templated text or
//! original headlines when a provider is absent or fails.

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

const DEEPL_FREE_URL: &str = "https://api-free.deepl.com";
const DEEPL_PRO_URL: &str = "https://api.deepl.com";
/// DeepL accepts at most 50 texts per request
const DEEPL_MAX_TEXTS: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum TextError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Provider returned no text")]
    Empty,
}

impl From<reqwest::Error> for TextError {
    fn from(err: reqwest::Error) -> Self {
        TextError::Request(err.to_string())
    }
}

/// Opaque text-completion function
#[async_trait]
pub trait TextCompleter: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, TextError>;
}

/// Batch translation into a target language
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate every text; the output has the same length and order as the input
    async fn translate_batch(&self, texts: &[String], target: &str) -> Result<Vec<String>, TextError>;
}

/// Chat-completion backed text generation
#[derive(Debug, Clone)]
pub struct OpenAiCompleter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiCompleter {
    pub fn new(api_key: &str, model: &str) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl TextCompleter for OpenAiCompleter {
    #[instrument(skip(self, system, prompt), fields(model = %self.model))]
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, TextError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()
                    .map_err(|e| TextError::Request(e.to_string()))?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()
                    .map_err(|e| TextError::Request(e.to_string()))?
                    .into(),
            ])
            .temperature(0.4)
            .build()
            .map_err(|e| TextError::Request(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| TextError::Request(format!("OpenAI API error: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(TextError::Empty)?;

        debug!("[TEXT] Completion returned {} chars", content.len());
        Ok(content)
    }
}

#[derive(Serialize)]
struct DeepLRequest<'a> {
    text: &'a [String],
    target_lang: &'a str,
}

#[derive(Deserialize)]
struct DeepLResponse {
    translations: Vec<DeepLTranslation>,
}

#[derive(Deserialize)]
struct DeepLTranslation {
    text: String,
}

/// DeepL v2 translation client
#[derive(Debug, Clone)]
pub struct DeepLTranslator {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl DeepLTranslator {
    /// Free-tier keys (suffix `:fx`) use the free endpoint
    pub fn new(api_key: &str) -> Self {
        let base_url = if api_key.ends_with(":fx") {
            DEEPL_FREE_URL
        } else {
            DEEPL_PRO_URL
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn translate_chunk(&self, texts: &[String], target: &str) -> Result<Vec<String>, TextError> {
        let response = self
            .client
            .post(format!("{}/v2/translate", self.base_url))
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .json(&DeepLRequest {
                text: texts,
                target_lang: target,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TextError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: DeepLResponse = response
            .json()
            .await
            .map_err(|e| TextError::Parse(e.to_string()))?;

        if body.translations.len() != texts.len() {
            return Err(TextError::Parse(format!(
                "expected {} translations, got {}",
                texts.len(),
                body.translations.len()
            )));
        }

        Ok(body.translations.into_iter().map(|t| t.text).collect())
    }
}

#[async_trait]
impl Translator for DeepLTranslator {
    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn translate_batch(&self, texts: &[String], target: &str) -> Result<Vec<String>, TextError> {
        let target = target.to_uppercase();
        let mut translated = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(DEEPL_MAX_TEXTS) {
            match self.translate_chunk(chunk, &target).await {
                Ok(batch) => translated.extend(batch),
                Err(e) => {
                    warn!("[TRANSLATE] DeepL batch of {} failed: {}", chunk.len(), e);
                    return Err(e);
                }
            }
        }

        Ok(translated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_deepl_translates_in_order() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v2/translate")
                    .header("Authorization", "DeepL-Auth-Key test-key");
                then.status(200).json_body(serde_json::json!({
                    "translations": [
                        {"detected_source_language": "KO", "text": "Chip exports surge"},
                        {"detected_source_language": "KO", "text": "Rates held"}
                    ]
                }));
            })
            .await;

        let translator = DeepLTranslator::new("test-key").with_base_url(&server.base_url());
        let texts = vec!["반도체 수출 급증".to_string(), "금리 동결".to_string()];
        let out = translator.translate_batch(&texts, "en").await.unwrap();

        mock.assert_async().await;
        assert_eq!(out, vec!["Chip exports surge", "Rates held"]);
    }

    #[tokio::test]
    async fn test_deepl_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/translate");
                then.status(456).body("Quota exceeded");
            })
            .await;

        let translator = DeepLTranslator::new("test-key").with_base_url(&server.base_url());
        let err = translator
            .translate_batch(&["hola".to_string()], "EN")
            .await
            .unwrap_err();
        assert!(matches!(err, TextError::Api { status: 456, .. }));
    }

    #[test]
    fn test_free_keys_use_free_endpoint() {
        assert_eq!(DeepLTranslator::new("abc:fx").base_url, DEEPL_FREE_URL);
        assert_eq!(DeepLTranslator::new("abc").base_url, DEEPL_PRO_URL);
    }
}
