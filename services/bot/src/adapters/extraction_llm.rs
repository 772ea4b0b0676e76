//! services/bot/src/adapters/extraction_llm.rs
//!
//! This module contains the adapter for the report-extraction LLM.
//! It implements the `ReportExtractor` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use site_report_core::contract::{render_instructions, RawExtraction, SYSTEM_INSTRUCTIONS};
use site_report_core::ports::{PortError, PortResult, ReportExtractor};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ReportExtractor` using an OpenAI-compatible LLM in JSON mode.
#[derive(Clone)]
pub struct OpenAiExtractionAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiExtractionAdapter {
    /// Creates a new `OpenAiExtractionAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `ReportExtractor` Trait Implementation
//=========================================================================================

#[async_trait]
impl ReportExtractor for OpenAiExtractionAdapter {
    /// Sends the extraction instructions and parses the JSON object the model returns.
    async fn extract(&self, source_text: &str) -> PortResult<RawExtraction> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(render_instructions(source_text))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .response_format(ResponseFormat::JsonObject)
            .temperature(0.2)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected("Extraction LLM response contained no text content.".to_string())
            })?;
        debug!(content = %content, "raw extraction response");

        RawExtraction::parse(&content).map_err(|e| PortError::Unexpected(e.to_string()))
    }
}
