mod mock;
mod ollama;
mod openrouter;
mod script;

pub use mock::MockClient;
pub use ollama::OllamaClient;
pub use openrouter::OpenRouterClient;
pub use script::{ScriptClient, ScriptConfig};

use crate::logging::SharedEventLogger;
use crate::provider::{ClientConfig, GenerationClient};

pub fn create_client(config: ClientConfig, logger: SharedEventLogger) -> Box<dyn GenerationClient> {
    match config {
        ClientConfig::OpenRouter {
            id,
            base_url,
            api_key,
            model,
        } => Box::new(OpenRouterClient::new(id, base_url, api_key, model)),
        ClientConfig::Ollama {
            id,
            base_url,
            model,
        } => Box::new(OllamaClient::new(id, base_url, model, logger)),
        ClientConfig::Script {
            id,
            command,
            args,
            timeout_ms,
        } => Box::new(ScriptClient::new(
            id,
            ScriptConfig {
                command,
                args,
                timeout_ms,
            },
        )),
        ClientConfig::Mock { id } => Box::new(MockClient::new(id)),
    }
}
