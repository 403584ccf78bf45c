use async_trait::async_trait;
use log::debug;
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;

use super::{ ChatClient, CompletionResponse };
use crate::llm::{ LlmConfig, LlmType };
use crate::models::chat::Message;

/// Chat-completions client for OpenAI and the providers that mirror its API
/// (DeepSeek, xAI, Groq).
pub struct OpenAIChatClient {
    http: HttpClient,
    model: String,
    base_url: String,
    system_prompt: String,
}

#[derive(Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

fn default_endpoint(llm_type: LlmType) -> (&'static str, &'static str) {
    match llm_type {
        LlmType::DeepSeek => ("https://api.deepseek.com/chat/completions", "deepseek-chat"),
        LlmType::XAI => ("https://api.x.ai/v1/chat/completions", "grok-2-latest"),
        LlmType::Groq => ("https://api.groq.com/openai/v1/chat/completions", "llama-3.1-8b-instant"),
        _ => ("https://api.openai.com/v1/chat/completions", "gpt-4o-mini"),
    }
}

impl OpenAIChatClient {
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        system_prompt: String
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e|
                format!("Invalid API key format: {}", e)
            )?
        );

        let http = HttpClient::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Box::new(e) as Box<dyn StdError + Send + Sync>)?;

        Ok(Self {
            http,
            model,
            base_url,
            system_prompt,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_key = config.api_key
            .clone()
            .ok_or_else(|| format!("API key is required for {:?}", config.llm_type))?;
        let (default_url, default_model) = default_endpoint(config.llm_type);

        Self::new(
            api_key,
            config.completion_model.clone().unwrap_or_else(|| default_model.to_string()),
            config.base_url.clone().unwrap_or_else(|| default_url.to_string()),
            config.system_prompt.clone()
        )
    }

    fn build_request(&self, history: &[Message]) -> OpenAIChatRequest {
        let mut messages = Vec::with_capacity(history.len() + 1);
        if !self.system_prompt.is_empty() {
            messages.push(OpenAIMessage {
                role: "system".to_string(),
                content: self.system_prompt.clone(),
            });
        }
        for m in history {
            messages.push(OpenAIMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            });
        }

        OpenAIChatRequest {
            model: self.model.clone(),
            messages,
            temperature: 0.7,
            max_tokens: Some(2048),
        }
    }
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn chat(
        &self,
        history: &[Message]
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        let req = self.build_request(history);
        debug!("OpenAIChatClient::chat() → model={} url={}", self.model, self.base_url);

        let resp = self.http.post(&self.base_url).json(&req).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("Chat completion failed ({}): {}", status, body).into());
        }

        let data = resp.json::<OpenAIResponse>().await?;
        let text = data.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or("Chat completion returned no choices")?;
        Ok(CompletionResponse { response: text })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}
