use crate::domain::GenerationRequest;
use crate::provider::{ClientMetadata, GenerationClient, TransportError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub struct OpenRouterClient {
    id: String,
    name: String,
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenRouterClient {
    pub fn new(
        id: impl Into<String>,
        base_url: String,
        api_key: String,
        model: String,
    ) -> Self {
        let client = reqwest::ClientBuilder::new()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            id: id.into(),
            name: "OpenRouterClient".to_string(),
            client,
            base_url,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl GenerationClient for OpenRouterClient {
    fn metadata(&self) -> ClientMetadata {
        ClientMetadata {
            id: self.id.clone(),
            name: self.name.clone(),
            model: self.model.clone(),
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, TransportError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let mut messages = Vec::<serde_json::Value>::new();
        if let Some(sys) = &request.prompt.system {
            messages.push(serde_json::json!({"role": "system", "content": sys}));
        }
        messages.push(serde_json::json!({"role": "user", "content": request.prompt.user}));

        let payload = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": 0.8,
            "max_tokens": 2000,
        });

        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Transport
                }
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(TransportError::RateLimited);
            }
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|_| TransportError::InvalidResponse)?;
        let content = body
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .unwrap_or("");

        if content.trim().is_empty() {
            return Err(TransportError::InvalidResponse);
        }

        Ok(content.to_string())
    }

    async fn health_check(&self) -> Result<(), TransportError> {
        let url = format!("{}/models", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|_| TransportError::Transport)?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(TransportError::Unavailable)
        }
    }
}
