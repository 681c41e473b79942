use crate::domain::GenerationRequest;
use crate::provider::{ClientMetadata, GenerationClient, TransportError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScriptConfig {
    pub command: String,
    pub args: Vec<String>,
    pub timeout_ms: Option<u64>,
}

/// Runs an external command per request: the request JSON goes to stdin, the
/// transcript text comes back on stdout, either raw or wrapped in a
/// `{"content": ...}` envelope.
pub struct ScriptClient {
    id: String,
    name: String,
    config: ScriptConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct ScriptOutput {
    content: String,
    metadata: Option<HashMap<String, String>>,
}

impl ScriptClient {
    pub fn new(id: impl Into<String>, config: ScriptConfig) -> Self {
        Self {
            id: id.into(),
            name: "ScriptClient".to_string(),
            config,
        }
    }
}

#[async_trait]
impl GenerationClient for ScriptClient {
    fn metadata(&self) -> ClientMetadata {
        ClientMetadata {
            id: self.id.clone(),
            name: self.name.clone(),
            model: "external".to_string(),
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, TransportError> {
        let mut cmd = Command::new(&self.config.command);
        cmd.args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|_| TransportError::Unavailable)?;

        let stdin = child.stdin.as_mut().ok_or(TransportError::Transport)?;
        let input_json =
            serde_json::to_string(request).map_err(|_| TransportError::Transport)?;
        stdin
            .write_all(input_json.as_bytes())
            .await
            .map_err(|_| TransportError::Transport)?;
        // Close stdin to signal end of input.
        drop(child.stdin.take());

        let wait = child.wait_with_output();
        let output = match self.config.timeout_ms {
            Some(ms) => tokio::time::timeout(Duration::from_millis(ms), wait)
                .await
                .map_err(|_| TransportError::Timeout)?,
            None => wait.await,
        }
        .map_err(|_| TransportError::Transport)?;

        if !output.status.success() {
            return Err(TransportError::InvalidResponse);
        }

        let output_str =
            String::from_utf8(output.stdout).map_err(|_| TransportError::InvalidResponse)?;

        // JSON envelope first, raw output as fallback.
        let content = match serde_json::from_str::<ScriptOutput>(&output_str) {
            Ok(parsed) => parsed.content,
            Err(_) => output_str,
        };

        if content.trim().is_empty() {
            return Err(TransportError::InvalidResponse);
        }

        Ok(content)
    }
}
