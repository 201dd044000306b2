use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs
    },
    Client as OpenAIClient
};
use async_trait::async_trait;
use aws_sdk_bedrockruntime::{
    primitives::Blob,
    Client as BedrockClient
};
use serde::{Deserialize, Serialize};
use serde_json;

use crate::{
    error::AgentError,
    prompt::SYSTEM_PROMPT
};

/// Anything that turns a prompt into text. The assistant only talks to
/// models through this.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, AgentError>;
}

pub struct OpenAIAgent {
    client: OpenAIClient<OpenAIConfig>,
    model: String,
}

impl OpenAIAgent {
    /// The client reads `OPENAI_API_KEY` itself when built from `OpenAIConfig::new()`.
    pub fn new(client: OpenAIClient<OpenAIConfig>, model: &str) -> Self {
        OpenAIAgent {
            client,
            model: model.to_string()
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAIAgent {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, AgentError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .max_tokens(max_tokens)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(SYSTEM_PROMPT)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?
                    .into(),
            ])
            .build()?;

        self.client
            .chat()
            .create(request)
            .await?
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AgentError::EmptyCompletion)
    }
}

pub struct BedrockAgent {
    client: BedrockClient,
    model_id: String,
}

impl BedrockAgent {
    /// `model_id` must accept the Nova messages schema.
    pub fn new(client: BedrockClient, model_id: &str) -> Self {
        BedrockAgent {
            client,
            model_id: model_id.to_string()
        }
    }
}

#[async_trait]
impl TextGenerator for BedrockAgent {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, AgentError> {
        let model_input = ModelInput::new(SYSTEM_PROMPT, prompt, max_tokens);
        let input = serde_json::to_string(&model_input)?;

        let raw = self.client.invoke_model()
            .body(Blob::new(input))
            .content_type("application/json")
            .model_id(self.model_id.as_str())
            .send()
            .await?
            .body;

        ModelResponse::from(raw)?.get_output()
    }
}

// request parameters structs.

#[derive(Debug, Serialize)]
struct ModelInput {
    system: Vec<BedrockText>,
    messages: Vec<UserMessage>,
    #[serde(rename = "inferenceConfig")]
    inference_config: InferenceConfig
}

#[derive(Debug, Serialize)]
struct UserMessage {
    role: String, // "user"
    content: Vec<BedrockText>
}

#[derive(Debug, Deserialize, Serialize)]
struct BedrockText {
    text: String
}

#[derive(Debug, Serialize)]
struct InferenceConfig {
    max_new_tokens: u32,
    top_p: f32, // 0.9
    top_k: u32, // 20
    temperature: f32 // 0.5
}

impl ModelInput {
    fn new(system: &str, content: &str, max_new_tokens: u32) -> Self {
        ModelInput {
            system: vec![ BedrockText { text: system.to_string() } ],
            messages: vec![
                UserMessage {
                    role: "user".to_string(),
                    content: vec![ BedrockText { text: content.to_string() } ]
                }
            ],
            inference_config: InferenceConfig::new(max_new_tokens)
        }
    }
}

impl InferenceConfig {
    fn new(max_new_tokens: u32) -> Self {
        InferenceConfig {
            max_new_tokens,
            top_p: 0.9,
            top_k: 20,
            temperature: 0.5
        }
    }
}

// response parameter structs.

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct ModelResponse {
    output: ModelOutput,
    #[serde(rename = "stopReason")]
    stop_reason: String,
}

#[derive(Debug, Deserialize)]
struct ModelOutput {
    message: ModelMessage
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct ModelMessage {
    content: Vec<BedrockText>,
    role: String
}

impl ModelResponse {
    fn from(raw: Blob) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(&raw.into_inner())
    }

    fn get_output(self) -> Result<String, AgentError> {
        self.output.message.content
            .into_iter()
            .next()
            .map(|t| t.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or(AgentError::EmptyCompletion)
    }
}
