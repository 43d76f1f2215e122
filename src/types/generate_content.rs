use serde::{Deserialize, Serialize};

use crate::types::Content;

/// Request body for `generateContent` and `streamGenerateContent`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// The conversation so far, oldest first, ending with the new user turn.
    pub contents: Vec<Content>,

    /// The persona and ground rules for the model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,

    /// Sampling overrides.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// Creates a request from the given contents.
    pub fn new(contents: Vec<Content>) -> Self {
        Self {
            contents,
            system_instruction: None,
            generation_config: None,
        }
    }

    /// Sets the system instruction.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(Content::instruction(instruction));
        self
    }

    /// Sets the generation config, dropping it entirely when nothing is overridden.
    pub fn with_generation_config(mut self, config: Option<GenerationConfig>) -> Self {
        self.generation_config = config.filter(|config| !config.is_empty());
        self
    }
}

/// Sampling parameters. Unset fields use the model's defaults.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Nucleus sampling probability mass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Top-k sampling limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    /// Maximum tokens in the reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl GenerationConfig {
    /// Returns true when no field is overridden.
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.top_p.is_none()
            && self.top_k.is_none()
            && self.max_output_tokens.is_none()
    }
}

/// A complete response, or one streamed piece of a response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Candidate replies. The tutor only ever requests one.
    #[serde(default)]
    pub candidates: Vec<Candidate>,

    /// Token accounting, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,

    /// The exact model version that served the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

impl GenerateContentResponse {
    /// The text of the first candidate; empty when there is none.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(Content::text)
            .unwrap_or_default()
    }

    /// The finish reason of the first candidate, if it has finished.
    pub fn finish_reason(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.finish_reason.as_deref())
    }
}

/// One candidate reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// The generated content. Absent when generation was blocked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,

    /// Why generation stopped (`STOP`, `MAX_TOKENS`, `SAFETY`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Token accounting for a request.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    /// Tokens in the prompt, including replayed history.
    #[serde(default)]
    pub prompt_token_count: u64,

    /// Tokens in the reply.
    #[serde(default)]
    pub candidates_token_count: u64,

    /// Total tokens billed.
    #[serde(default)]
    pub total_token_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serialization_uses_camel_case() {
        let request = GenerateContentRequest::new(vec![Content::user("hi")])
            .with_system_instruction("tutor")
            .with_generation_config(Some(GenerationConfig {
                temperature: Some(0.5),
                max_output_tokens: Some(256),
                ..GenerationConfig::default()
            }));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            json!({
                "contents": [{"role": "user", "parts": [{"text": "hi"}]}],
                "systemInstruction": {"parts": [{"text": "tutor"}]},
                "generationConfig": {"temperature": 0.5, "maxOutputTokens": 256}
            })
        );
    }

    #[test]
    fn empty_generation_config_is_dropped() {
        let request = GenerateContentRequest::new(vec![])
            .with_generation_config(Some(GenerationConfig::default()));
        assert!(request.generation_config.is_none());
    }

    #[test]
    fn response_text_from_first_candidate() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hello "}, {"text": "student"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 3, "totalTokenCount": 15},
            "modelVersion": "gemini-3-pro-preview"
        }))
        .unwrap();
        assert_eq!(response.text(), "Hello student");
        assert_eq!(response.finish_reason(), Some("STOP"));
        assert_eq!(response.usage_metadata.unwrap().total_token_count, 15);
    }

    #[test]
    fn response_without_candidates_has_empty_text() {
        let response: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(response.text(), "");
        assert!(response.finish_reason().is_none());
    }

    #[test]
    fn thought_parts_are_not_answer_text() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "thinking...", "thought": true},
                    {"text": "Answer"}
                ]}
            }]
        }))
        .unwrap();
        assert_eq!(response.text(), "Answer");
    }
}
