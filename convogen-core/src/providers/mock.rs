use crate::domain::GenerationRequest;
use crate::provider::{ClientMetadata, GenerationClient, TransportError};
use async_trait::async_trait;

/// Offline stand-in for the generation service. Returns a fixed payment-call
/// transcript, so scenarios requiring other tags exercise the retry and
/// exhaustion paths.
pub struct MockClient {
    id: String,
    name: String,
}

impl MockClient {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: "MockClient".to_string(),
        }
    }
}

#[async_trait]
impl GenerationClient for MockClient {
    fn metadata(&self) -> ClientMetadata {
        ClientMetadata {
            id: self.id.clone(),
            name: self.name.clone(),
            model: "mock".to_string(),
        }
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<String, TransportError> {
        let transcript = serde_json::json!([
            {"role": "assistant", "content": "Good morning, this is the collections department calling about your overdue loan account. Please note this call may be recorded for quality purposes. May I confirm I am speaking with the account holder?"},
            {"role": "user", "content": "Yes, speaking. How are you? What is this about exactly?"},
            {"role": "assistant", "content": "Thank you for confirming. Our records show an outstanding balance on your account that was due last month. I understand things come up, so may I ask when you would be able to settle the payment?"},
            {"role": "user", "content": "I see. Okay, I can actually pay the full amount this Thursday, is that fine?"},
            {"role": "assistant", "content": "That works, thank you. I will note Thursday as your committed payment date and send a confirmation by text message. (function_1)"},
            {"role": "user", "content": "Sure, thank you for being understanding about it. Have a good day."}
        ]);
        Ok(transcript.to_string())
    }
}
