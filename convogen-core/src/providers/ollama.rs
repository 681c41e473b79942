use crate::domain::GenerationRequest;
use crate::logging::{LogEvent, LogLevel, SharedEventLogger};
use crate::provider::{ClientMetadata, GenerationClient, TransportError};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use std::time::Duration;
use tokio::time::timeout;

pub struct OllamaClient {
    id: String,
    name: String,
    client: Client,
    base_url: String,
    model: String,
    logger: SharedEventLogger,
    stream_timeout: Duration,
}

impl OllamaClient {
    /// Default stream timeout is 300s; local models can be slow to produce a
    /// full multi-turn transcript.
    pub fn new(
        id: impl Into<String>,
        base_url: String,
        model: String,
        logger: SharedEventLogger,
    ) -> Self {
        let client = reqwest::ClientBuilder::new()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(900))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self::with_client_and_timeout(id, base_url, model, client, logger, Duration::from_secs(300))
    }

    pub fn with_client_and_timeout(
        id: impl Into<String>,
        base_url: String,
        model: String,
        client: Client,
        logger: SharedEventLogger,
        stream_timeout: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            name: "OllamaClient".to_string(),
            client,
            base_url,
            model,
            logger,
            stream_timeout,
        }
    }
}

#[async_trait]
impl GenerationClient for OllamaClient {
    fn metadata(&self) -> ClientMetadata {
        ClientMetadata {
            id: self.id.clone(),
            name: self.name.clone(),
            model: self.model.clone(),
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, TransportError> {
        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let payload = serde_json::json!({
            "model": self.model,
            "prompt": request.prompt.user,
            "system": request.prompt.system,
            "stream": true
        });

        self.logger
            .log(LogEvent::new(LogLevel::Debug, "ollama.request.send"));
        let send_fut = self.client.post(url).json(&payload).send();
        let resp = match timeout(self.stream_timeout, send_fut).await {
            Ok(Ok(r)) => r,
            Ok(Err(e)) => {
                if e.is_timeout() {
                    return Err(TransportError::Timeout);
                } else {
                    return Err(TransportError::Transport);
                }
            }
            Err(_) => return Err(TransportError::Timeout),
        };

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let mut stream = resp.bytes_stream();

        let streaming_result = timeout(self.stream_timeout, async {
            let mut buffer: Vec<u8> = Vec::new();
            let mut content = String::new();
            let mut done_received = false;

            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|_| TransportError::Transport)?;
                buffer.extend_from_slice(&chunk);

                while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                    let line = buffer.drain(..=pos).collect::<Vec<u8>>();
                    let line = std::str::from_utf8(&line)
                        .map_err(|_| TransportError::InvalidResponse)?
                        .trim();
                    if line.is_empty() {
                        continue;
                    }

                    let value: serde_json::Value = match serde_json::from_str(line) {
                        Ok(v) => v,
                        Err(e) => {
                            self.logger.log(
                                LogEvent::new(LogLevel::Warn, "ollama.json.parse.error")
                                    .with_field("error", e.to_string()),
                            );
                            continue;
                        }
                    };
                    if let Some(err) = value.get("error").and_then(|v| v.as_str()) {
                        return Err(TransportError::Service {
                            status: 500,
                            body: err.to_string(),
                        });
                    }
                    if let Some(delta) = value.get("response").and_then(|v| v.as_str()) {
                        content.push_str(delta);
                    }
                    if value.get("done").and_then(|v| v.as_bool()) == Some(true) {
                        done_received = true;
                        buffer.clear();
                        break;
                    }
                }

                if done_received {
                    break;
                }
            }

            // A final fragment without a trailing newline still carries data.
            if !buffer.is_empty() {
                let line = std::str::from_utf8(&buffer)
                    .map_err(|_| TransportError::InvalidResponse)?
                    .trim();
                if !line.is_empty() {
                    if let Ok(value) = serde_json::from_str::<serde_json::Value>(line) {
                        if let Some(delta) = value.get("response").and_then(|v| v.as_str()) {
                            content.push_str(delta);
                        }
                    }
                }
            }

            Ok((content, done_received))
        })
        .await;

        let (content, done_received) = match streaming_result {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(TransportError::Timeout),
        };

        if !done_received {
            self.logger
                .log(LogEvent::new(LogLevel::Warn, "ollama.done.not_received"));
        }

        if content.trim().is_empty() {
            return Err(TransportError::InvalidResponse);
        }

        Ok(content)
    }

    async fn health_check(&self) -> Result<(), TransportError> {
        let url = format!("{}/api/tags", self.base_url.trim_end_matches('/'));
        let resp = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Transport
            }
        })?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(TransportError::Unavailable)
        }
    }
}
