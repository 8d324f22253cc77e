// Gemini `generateContent` wire format.
use serde::{Deserialize, Serialize};

use crate::error::CallError;
use crate::settings::Settings;

pub const EMPTY_REPLY: &str = "I received your message but couldn't generate a response.";

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl From<&Settings> for GenerationConfig {
    fn from(settings: &Settings) -> Self {
        GenerationConfig {
            temperature: settings.temperature,
            top_k: settings.top_k,
            top_p: settings.top_p,
            max_output_tokens: settings.max_output_tokens,
        }
    }
}

impl GenerateContentRequest {
    pub fn new(prompt: impl Into<String>, generation_config: GenerationConfig) -> Self {
        GenerateContentRequest {
            generation_config: Some(generation_config),
            ..Self::probe(prompt)
        }
    }

    // Bare request with service-side generation defaults.
    pub fn probe(prompt: impl Into<String>) -> Self {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.into()),
                }],
            }],
            generation_config: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    pub parts: Option<Vec<Part>>,
}

impl GenerateContentResponse {
    pub fn from_json(json: &str) -> Result<Self, CallError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Text of `candidates[0].content.parts[0]`. A missing or empty text is
    /// replaced with [`EMPTY_REPLY`]; a missing path is malformed.
    pub fn into_text(self) -> Result<String, CallError> {
        let part = self
            .candidates
            .and_then(|candidates| candidates.into_iter().next())
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts)
            .and_then(|parts| parts.into_iter().next())
            .ok_or_else(|| {
                CallError::MalformedResponse("response has no candidate parts".to_string())
            })?;

        match part.text {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Ok(EMPTY_REPLY.to_string()),
        }
    }
}
