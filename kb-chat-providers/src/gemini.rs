//! Google Gemini HTTP client implementation

use async_trait::async_trait;
use kb_chat_core::config::GeminiConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::base::{LLMProvider, ModelInfo, ProviderError, ProviderResult};

const GENERATE_METHOD: &str = "generateContent";

/// generateContent request format
#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// generateContent response format
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// models.list response format
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ApiModel>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiModel {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

impl From<ApiModel> for ModelInfo {
    fn from(model: ApiModel) -> Self {
        Self {
            name: model.name,
            display_name: model.display_name,
            description: model.description,
            supported_methods: model.supported_generation_methods,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Gemini provider client
pub struct GeminiClient {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Create a new Gemini client for a fixed model
    pub fn new(
        api_key: impl Into<String>,
        api_base: impl Into<String>,
        model: impl Into<String>,
    ) -> ProviderResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ProviderError::ConfigError(
                "GEMINI_API_KEY environment variable is required".to_string(),
            ));
        }

        Ok(Self {
            client: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key,
            model: normalize_model_name(&model.into()).to_string(),
        })
    }

    /// Bound every HTTP request made by this client, model listing included
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        self
    }

    /// Build a client for the most preferred configured model without
    /// checking that the account can use it
    pub fn from_config(config: &GeminiConfig) -> ProviderResult<Self> {
        let model = config
            .models
            .iter()
            .find(|m| !m.trim().is_empty())
            .ok_or_else(|| ProviderError::ConfigError("no Gemini model configured".to_string()))?;
        let client = Self::new(config.api_key.clone(), config.api_base.clone(), model.clone())?;
        Ok(client.with_request_timeout(Duration::from_secs(config.timeout_secs)))
    }

    /// Build a client for the first configured model the API reports as
    /// usable.
    ///
    /// If the model listing itself fails, the most preferred model is used
    /// as-is and any problem surfaces on the first generation call.
    pub async fn connect(config: &GeminiConfig) -> ProviderResult<Self> {
        let mut client = Self::from_config(config)?;

        let available = match client.list_models().await {
            Ok(models) => models,
            Err(e) => {
                warn!(
                    "Could not list Gemini models ({}), falling back to {}",
                    e, client.model
                );
                return Ok(client);
            }
        };

        match select_model(&config.models, &available) {
            Some(model) => {
                info!("Successfully initialized with model: {}", model);
                client.model = model;
                Ok(client)
            }
            None => Err(ProviderError::NoAvailableModel(
                available.into_iter().map(|m| m.name).collect(),
            )),
        }
    }

    /// List every model visible to the API key
    pub async fn list_models(&self) -> ProviderResult<Vec<ModelInfo>> {
        let url = format!("{}/models", self.api_base);
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut req_builder = self.apply_headers(self.client.get(&url));
            if let Some(token) = &page_token {
                req_builder = req_builder.query(&[("pageToken", token)]);
            }

            let response = req_builder.send().await?;
            if !response.status().is_success() {
                return Err(Self::api_error(response).await);
            }

            let page: ListModelsResponse = response.json().await?;
            models.extend(page.models.into_iter().map(ModelInfo::from));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("Gemini reported {} models", models.len());
        Ok(models)
    }

    fn apply_headers(&self, req_builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req_builder.header("x-goog-api-key", self.api_key.as_str())
    }

    /// Turn a non-success response into an error carrying Gemini's own message
    async fn api_error(response: reqwest::Response) -> ProviderError {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => {
                let code = envelope.error.code.unwrap_or_else(|| status.as_u16());
                let message = match envelope.error.status {
                    Some(kind) => format!("{} {}: {}", code, kind, envelope.error.message),
                    None => format!("{}: {}", code, envelope.error.message),
                };
                ProviderError::ApiError(message)
            }
            Err(_) => ProviderError::ApiError(format!("HTTP {}: {}", status, body)),
        }
    }

    /// Extract the reply text from the first candidate
    fn parse_response(response: GenerateContentResponse) -> ProviderResult<String> {
        let Some(candidate) = response.candidates.into_iter().next() else {
            let reason = response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(ProviderError::InvalidResponse(format!(
                "response blocked: {}",
                reason
            )));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ProviderError::InvalidResponse(format!(
                "candidate has no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text)
    }
}

#[async_trait]
impl LLMProvider for GeminiClient {
    async fn generate(&self, prompt: &str) -> ProviderResult<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        debug!(
            "Sending generateContent request to {} with model {}",
            self.api_base, self.model
        );

        let url = format!("{}/models/{}:{}", self.api_base, self.model, GENERATE_METHOD);
        let response = self
            .apply_headers(self.client.post(&url).json(&request))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let data: GenerateContentResponse = response.json().await?;
        Self::parse_response(data)
    }

    fn model(&self) -> String {
        self.model.clone()
    }
}

/// `models/gemini-2.5-flash` -> `gemini-2.5-flash`
fn normalize_model_name(name: &str) -> &str {
    name.strip_prefix("models/").unwrap_or(name)
}

/// Pick the first preferred model that is listed as supporting generation
pub fn select_model(preferred: &[String], available: &[ModelInfo]) -> Option<String> {
    preferred.iter().find_map(|wanted| {
        let wanted = normalize_model_name(wanted.trim());
        available
            .iter()
            .find(|m| {
                normalize_model_name(&m.name) == wanted
                    && m.supported_methods.iter().any(|s| s == GENERATE_METHOD)
            })
            .map(|_| wanted.to_string())
    })
}
