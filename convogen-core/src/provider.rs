use crate::domain::GenerationRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientMetadata {
    pub id: String,
    pub name: String,
    pub model: String,
}

#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("transport error")]
    Transport,
    #[error("request timed out")]
    Timeout,
    #[error("rate limited")]
    RateLimited,
    #[error("invalid response")]
    InvalidResponse,
    #[error("service unavailable")]
    Unavailable,
    #[error("service error {status}: {body}")]
    Service { status: u16, body: String },
}

/// Stateless call into the external text-generation service: composed request
/// in, raw transcript text out. The engine is agnostic to model identity;
/// that is configuration metadata only.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    fn metadata(&self) -> ClientMetadata;

    async fn generate(&self, request: &GenerationRequest) -> Result<String, TransportError>;

    async fn health_check(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientConfig {
    OpenRouter {
        id: String,
        base_url: String,
        api_key: String,
        model: String,
    },
    Ollama {
        id: String,
        base_url: String,
        model: String,
    },
    Script {
        id: String,
        command: String,
        args: Vec<String>,
        timeout_ms: Option<u64>,
    },
    Mock {
        id: String,
    },
}

impl ClientConfig {
    pub fn id(&self) -> &str {
        match self {
            Self::OpenRouter { id, .. } => id,
            Self::Ollama { id, .. } => id,
            Self::Script { id, .. } => id,
            Self::Mock { id } => id,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Self::OpenRouter { model, .. } => model,
            Self::Ollama { model, .. } => model,
            Self::Script { .. } => "external",
            Self::Mock { .. } => "mock",
        }
    }
}
