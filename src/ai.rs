use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use strum_macros::Display;

use crate::ai_response::{GenerateContentRequest, GenerateContentResponse, GenerationConfig};
use crate::context::{ConversationMode, SessionContext};
use crate::error::CallError;
use crate::knowledge::KnowledgeEntry;
use crate::settings::Settings;

const TEST_PROMPT: &str = "Hello, this is a test message.";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConnectivityStatus {
    #[default]
    Unknown,
    Connected,
    Error,
}

impl ConnectivityStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ConnectivityStatus::Connected,
            2 => ConnectivityStatus::Error,
            _ => ConnectivityStatus::Unknown,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            ConnectivityStatus::Unknown => 0,
            ConnectivityStatus::Connected => 1,
            ConnectivityStatus::Error => 2,
        }
    }
}

/// Shared, last-write-wins connectivity flag. Clones observe the same cell.
#[derive(Debug, Clone, Default)]
pub struct StatusCell {
    inner: Arc<AtomicU8>,
}

impl StatusCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> ConnectivityStatus {
        ConnectivityStatus::from_u8(self.inner.load(Ordering::Acquire))
    }

    fn set(&self, status: ConnectivityStatus) {
        self.inner.store(status.as_u8(), Ordering::Release);
    }
}

const API_KEY_HEADER: &str = "x-goog-api-key";

/// One round trip to a text generation service.
pub trait Generator: Send + Sync {
    fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> impl Future<Output = Result<String, CallError>> + Send;

    /// Reachability check. Succeeds when the service accepts the request,
    /// whatever it answers with.
    fn probe(
        &self,
        request: &GenerateContentRequest,
    ) -> impl Future<Output = Result<(), CallError>> + Send {
        async move { self.generate_content(request).await.map(|_| ()) }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            model: model.into(),
            base_url: base_url.into(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, reqwest::Error> {
        Self::new(
            settings.api_key.clone(),
            settings.model.clone(),
            settings.base_url.clone(),
            settings.request_timeout(),
        )
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    // Sends the request with the key in a header. Non-2xx answers become `Upstream`.
    async fn post(&self, request: &GenerateContentRequest) -> Result<reqwest::Response, CallError> {
        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(CallError::Unauthenticated)?;

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| CallError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(CallError::Upstream {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

impl Generator for GeminiClient {
    async fn generate_content(&self, request: &GenerateContentRequest) -> Result<String, CallError> {
        let body = self.post(request).await?.text().await?;
        GenerateContentResponse::from_json(&body)?.into_text()
    }

    async fn probe(&self, request: &GenerateContentRequest) -> Result<(), CallError> {
        self.post(request).await.map(|_| ())
    }
}

/// Remote half of the coaching pipeline: builds the prompt, calls the
/// generator and records the outcome in the connectivity status.
#[derive(Debug, Clone)]
pub struct CoachingClient<G> {
    generator: G,
    generation_config: GenerationConfig,
    status: StatusCell,
}

impl<G: Generator> CoachingClient<G> {
    pub fn new(generator: G, generation_config: GenerationConfig) -> Self {
        Self {
            generator,
            generation_config,
            status: StatusCell::new(),
        }
    }

    pub fn status(&self) -> ConnectivityStatus {
        self.status.get()
    }

    pub fn status_cell(&self) -> StatusCell {
        self.status.clone()
    }

    pub async fn generate(
        &self,
        utterance: &str,
        context: &SessionContext,
        matched: Option<&KnowledgeEntry>,
    ) -> Result<String, CallError> {
        let prompt = build_prompt(utterance, context, matched);
        log::debug!("Sending prompt: {prompt}");
        self.send(prompt).await
    }

    // Any 2xx answer to the probe prompt counts as connected.
    pub async fn test_connection(&self) -> bool {
        let request = GenerateContentRequest::probe(TEST_PROMPT);
        let result = self.generator.probe(&request).await;
        match self.record(result) {
            Ok(()) => true,
            Err(e) => {
                log::error!("API test failed: {e}");
                false
            }
        }
    }

    async fn send(&self, prompt: String) -> Result<String, CallError> {
        let request = GenerateContentRequest::new(prompt, self.generation_config);
        let result = self.generator.generate_content(&request).await;
        self.record(result)
    }

    fn record<T>(&self, result: Result<T, CallError>) -> Result<T, CallError> {
        match &result {
            Ok(_) => self.status.set(ConnectivityStatus::Connected),
            Err(e) => {
                log::warn!("Gemini call failed: {e}");
                self.status.set(ConnectivityStatus::Error);
            }
        }
        result
    }
}

pub fn system_instruction(context: &SessionContext, matched: Option<&KnowledgeEntry>) -> String {
    match context.conversation_mode {
        ConversationMode::Gaming => {
            let mut instruction = format!(
                "You are CoachGPT, an expert gaming coach specializing in {}. The user is currently {} with a {}% win rate and {} K/D/A ratio.",
                context.selected_game, context.rank, context.win_rate, context.kda
            );
            if let Some(entry) = matched {
                instruction.push_str(&format!(
                    " I have specific knowledge about this topic: \"{}\" - {}. Use this information to provide a comprehensive answer.",
                    entry.question, entry.answer
                ));
            }
            instruction.push_str(" Provide specific, actionable gaming advice. Be encouraging and focus on improvement strategies. Keep responses concise but helpful (under 300 words).");
            instruction
        }
        ConversationMode::General => "You are CoachGPT, a helpful AI assistant. You can discuss any topic - gaming, life advice, general questions, or casual conversation. Be friendly, informative, and engaging. Keep responses conversational and helpful (under 300 words).".to_string(),
    }
}

pub fn build_prompt(
    utterance: &str,
    context: &SessionContext,
    matched: Option<&KnowledgeEntry>,
) -> String {
    format!(
        "{}\n\nUser: {}",
        system_instruction(context, matched),
        utterance
    )
}
