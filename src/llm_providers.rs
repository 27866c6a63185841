use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::models::ImageAttachment;

/// A single prompt sent to a provider
#[derive(Debug, Clone, Copy, Default)]
pub struct LLMRequest<'a> {
    pub system_message: Option<&'a str>,
    pub prompt: &'a str,
    pub image: Option<&'a ImageAttachment>,
    /// Ask the provider to answer with JSON only, where supported
    pub json_output: bool,
}

impl<'a> LLMRequest<'a> {
    pub fn new(prompt: &'a str) -> Self {
        Self {
            prompt,
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system_message: &'a str) -> Self {
        self.system_message = Some(system_message);
        self
    }

    pub fn with_image(mut self, image: Option<&'a ImageAttachment>) -> Self {
        self.image = image;
        self
    }

    pub fn expect_json(mut self) -> Self {
        self.json_output = true;
        self
    }
}

/// Common message structure for LLM requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMMessage {
    pub role: String,
    /// Plain string, or an array of typed parts when an image is attached
    pub content: serde_json::Value,
}

/// Enum-based LLM provider implementation for better compatibility
#[derive(Debug, Clone)]
pub enum LLMProvider {
    OpenAI(OpenAIProvider),
    Gemini(GeminiProvider),
}

impl LLMProvider {
    pub async fn make_request(&self, request: LLMRequest<'_>) -> Result<String> {
        match self {
            LLMProvider::OpenAI(provider) => provider.make_request(request).await,
            LLMProvider::Gemini(provider) => provider.make_request(request).await,
        }
    }

    /// Get the provider name for logging
    pub fn provider_name(&self) -> &'static str {
        match self {
            LLMProvider::OpenAI(provider) => provider.provider_name(),
            LLMProvider::Gemini(provider) => provider.provider_name(),
        }
    }

    /// Get the model name being used
    pub fn model_name(&self) -> &str {
        match self {
            LLMProvider::OpenAI(provider) => provider.model_name(),
            LLMProvider::Gemini(provider) => provider.model_name(),
        }
    }
}

/// OpenAI provider implementation
#[derive(Debug, Clone)]
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<LLMMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

impl OpenAIProvider {
    pub fn new(api_key: String, base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: model.unwrap_or_else(|| "gpt-4o-mini".to_string()),
        }
    }

    fn user_content(prompt: &str, image: Option<&ImageAttachment>) -> serde_json::Value {
        match image {
            Some(image) => json!([
                { "type": "text", "text": prompt },
                {
                    "type": "image_url",
                    "image_url": {
                        "url": format!("data:{};base64,{}", image.mime_type, image.data)
                    }
                }
            ]),
            None => serde_json::Value::String(prompt.to_string()),
        }
    }

    pub async fn make_request(&self, request: LLMRequest<'_>) -> Result<String> {
        let mut messages = Vec::new();

        if let Some(sys_msg) = request.system_message {
            messages.push(LLMMessage {
                role: "system".to_string(),
                content: serde_json::Value::String(sys_msg.to_string()),
            });
        }

        messages.push(LLMMessage {
            role: "user".to_string(),
            content: Self::user_content(request.prompt, request.image),
        });

        let request_body = OpenAIRequest {
            model: self.model.clone(),
            messages,
            response_format: request
                .json_output
                .then(|| json!({ "type": "json_object" })),
        };

        info!(
            provider = self.provider_name(),
            model = %self.model,
            base_url = %self.base_url,
            prompt_length = request.prompt.len(),
            has_image = request.image.is_some(),
            "Making LLM request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(
                provider = self.provider_name(),
                status = %status,
                error = %error_text,
                "LLM API request failed"
            );
            return Err(anyhow::anyhow!("OpenAI API request failed: {}", error_text));
        }

        let openai_response: OpenAIResponse = response.json().await?;

        let response_content = openai_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow::anyhow!("No choices in OpenAI response"))?;

        info!(
            provider = self.provider_name(),
            response_length = response_content.len(),
            "Successfully received LLM response"
        );

        Ok(response_content)
    }

    pub fn provider_name(&self) -> &'static str {
        "OpenAI"
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }
}

/// Gemini provider implementation
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiInlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "topK")]
    top_k: i32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: i32,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContent,
}

impl GeminiProvider {
    pub fn new(api_key: String, base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".to_string()),
            model: model.unwrap_or_else(|| "gemini-2.5-flash".to_string()),
        }
    }

    pub async fn make_request(&self, request: LLMRequest<'_>) -> Result<String> {
        let full_prompt = match request.system_message {
            Some(sys_msg) => format!("{}\n\n{}", sys_msg, request.prompt),
            None => request.prompt.to_string(),
        };

        // Image goes ahead of the text part
        let mut parts = Vec::new();
        if let Some(image) = request.image {
            parts.push(GeminiPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.data.clone(),
                },
            });
        }
        parts.push(GeminiPart::Text { text: full_prompt });

        let request_body = GeminiRequest {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiGenerationConfig {
                temperature: 0.7,
                top_k: 40,
                top_p: 0.9,
                max_output_tokens: 8192,
                response_mime_type: request
                    .json_output
                    .then(|| "application/json".to_string()),
            },
        };

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        info!(
            provider = self.provider_name(),
            model = %self.model,
            base_url = %self.base_url,
            prompt_length = request.prompt.len(),
            has_image = request.image.is_some(),
            "Making LLM request"
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(
                provider = self.provider_name(),
                status = %status,
                error = %error_text,
                "LLM API request failed"
            );
            return Err(anyhow::anyhow!("Gemini API request failed: {}", error_text));
        }

        let gemini_response: GeminiResponse = response.json().await?;

        let candidate = gemini_response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("No candidates in Gemini response"))?;

        let response_content: String = candidate
            .content
            .parts
            .into_iter()
            .filter_map(|part| match part {
                GeminiPart::Text { text } => Some(text),
                GeminiPart::InlineData { .. } => None,
            })
            .collect();

        if response_content.is_empty() {
            return Err(anyhow::anyhow!("No text parts in Gemini response"));
        }

        info!(
            provider = self.provider_name(),
            response_length = response_content.len(),
            "Successfully received LLM response"
        );

        Ok(response_content)
    }

    pub fn provider_name(&self) -> &'static str {
        "Gemini"
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }
}

/// Centralized JSON response parser with robust extraction logic
#[derive(Clone)]
pub struct JsonResponseParser;

impl JsonResponseParser {
    /// Extract JSON from LLM responses that might be wrapped in markdown or other formatting
    pub fn extract_json_from_response(content: &str) -> String {
        if let Some(start) = content.find("```json") {
            if let Some(end) = content[start + 7..].find("```") {
                let json_start = start + 7;
                return content[json_start..json_start + end].trim().to_string();
            }
        }

        if let Some(start) = content.find("```") {
            if let Some(end) = content[start + 3..].find("```") {
                let json_start = start + 3;
                let potential_json = content[json_start..json_start + end].trim();
                if potential_json.starts_with('{') || potential_json.starts_with('[') {
                    return potential_json.to_string();
                }
            }
        }

        // Whichever bracket opens first decides between object and array
        let object_start = content.find('{');
        let array_start = content.find('[');
        let (open, close) = match (object_start, array_start) {
            (Some(o), Some(a)) if a < o => ('[', ']'),
            (None, Some(_)) => ('[', ']'),
            _ => ('{', '}'),
        };

        if let (Some(start), Some(end)) = (content.find(open), content.rfind(close)) {
            if end > start {
                return content[start..=end].to_string();
            }
        }

        content.trim().to_string()
    }

    /// Parse JSON response into a specific type with error handling
    pub fn parse_json_response<T>(&self, content: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let json_content = Self::extract_json_from_response(content);
        serde_json::from_str::<T>(&json_content)
            .map_err(|e| anyhow::anyhow!("Failed to parse JSON response: {}", e))
    }
}

/// Factory for creating LLM providers based on provider type
pub struct LLMProviderFactory;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LLMProviderType {
    OpenAI,
    Gemini,
}

impl LLMProviderFactory {
    pub fn create_provider(
        provider_type: LLMProviderType,
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
    ) -> LLMProvider {
        match provider_type {
            LLMProviderType::OpenAI => {
                LLMProvider::OpenAI(OpenAIProvider::new(api_key, base_url, model))
            }
            LLMProviderType::Gemini => {
                LLMProvider::Gemini(GeminiProvider::new(api_key, base_url, model))
            }
        }
    }
}
