use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{Instant, sleep};

use crate::ai::{CoachingClient, ConnectivityStatus, Generator, StatusCell};
use crate::ai_response::GenerationConfig;
use crate::context::{ConversationMode, SessionContext};
use crate::fallback::FallbackResponder;
use crate::knowledge::{KnowledgeBase, KnowledgeMatcher};
use crate::message::{Role, Transcript};
use crate::settings::Settings;
use crate::typing::{TypingGuard, TypingIndicator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    AwaitingReply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Remote,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Resolved { message_id: u64 },
    // The conversation was cleared while the reply was pending.
    Stale,
}

/// Ticket for a turn whose user message is already in the transcript.
#[derive(Debug)]
pub struct PendingTurn {
    utterance: String,
    category: ConversationMode,
    generation: u64,
    user_message_id: u64,
    _typing: TypingGuard,
}

impl PendingTurn {
    pub fn utterance(&self) -> &str {
        &self.utterance
    }

    pub fn user_message_id(&self) -> u64 {
        self.user_message_id
    }
}

/// Resolves each user turn into exactly one coach reply.
///
/// The remote model is tried first, grounded with the best knowledge-base
/// match. Any remote failure is swallowed and replaced by the rule-based
/// fallback, so callers always get a reply; the failure only shows up in the
/// connectivity status.
pub struct Coach<G> {
    client: CoachingClient<G>,
    knowledge: Arc<KnowledgeBase>,
    matcher: KnowledgeMatcher,
    responder: FallbackResponder,
    rng: Mutex<StdRng>,
    typing: TypingIndicator,
    typing_delay: Duration,
}

impl<G: Generator> Coach<G> {
    pub fn new(
        client: CoachingClient<G>,
        knowledge: Arc<KnowledgeBase>,
        matcher: KnowledgeMatcher,
    ) -> Self {
        Self {
            client,
            knowledge,
            matcher,
            responder: FallbackResponder::new(matcher),
            rng: Mutex::new(StdRng::from_os_rng()),
            typing: TypingIndicator::new(),
            typing_delay: Duration::ZERO,
        }
    }

    pub fn from_settings(settings: &Settings, generator: G, knowledge: Arc<KnowledgeBase>) -> Self {
        let client = CoachingClient::new(generator, GenerationConfig::from(settings));
        Self::new(
            client,
            knowledge,
            KnowledgeMatcher::new(settings.partial_match_threshold),
        )
        .with_typing_delay(settings.typing_delay())
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    /// Minimum time a reply takes, so instant fallbacks still read as typed.
    pub fn with_typing_delay(mut self, typing_delay: Duration) -> Self {
        self.typing_delay = typing_delay;
        self
    }

    pub fn status(&self) -> ConnectivityStatus {
        self.client.status()
    }

    pub fn status_cell(&self) -> StatusCell {
        self.client.status_cell()
    }

    pub fn typing(&self) -> &TypingIndicator {
        &self.typing
    }

    pub fn turn_state(&self) -> TurnState {
        if self.typing.is_typing() {
            TurnState::AwaitingReply
        } else {
            TurnState::Idle
        }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Appends the user message and opens the turn. Blank input is ignored.
    pub fn begin_turn(
        &self,
        transcript: &mut Transcript,
        utterance: &str,
        context: &SessionContext,
    ) -> Option<PendingTurn> {
        if utterance.trim().is_empty() {
            log::debug!("Ignoring empty message");
            return None;
        }

        let category = context.conversation_mode;
        let user_message_id = transcript.push(Role::User, utterance, category).id;
        Some(PendingTurn {
            utterance: utterance.to_string(),
            category,
            generation: transcript.generation(),
            user_message_id,
            _typing: self.typing.start(),
        })
    }

    pub async fn resolve(&self, turn: &PendingTurn, context: &SessionContext) -> Reply {
        let started = Instant::now();
        let entries = self.knowledge.entries();
        let matched = self.matcher.find_match(&turn.utterance, entries);
        if let Some(entry) = matched {
            log::debug!("Knowledge match for turn {}: {}", turn.user_message_id, entry.question);
        }

        let reply = match self.client.generate(&turn.utterance, context, matched).await {
            Ok(text) => Reply {
                text,
                source: ReplySource::Remote,
            },
            Err(e) => {
                log::warn!("Gemini API failed, using fallback: {e}");
                Reply {
                    text: self.fallback(&turn.utterance, context),
                    source: ReplySource::Fallback,
                }
            }
        };

        let remaining = self.typing_delay.saturating_sub(started.elapsed());
        if !remaining.is_zero() {
            sleep(remaining).await;
        }
        reply
    }

    fn fallback(&self, utterance: &str, context: &SessionContext) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.responder
            .respond(utterance, context, self.knowledge.entries(), &mut *rng)
    }

    /// Appends the coach reply unless the transcript was cleared since the
    /// turn began, in which case the reply is dropped.
    pub fn complete_turn(
        &self,
        transcript: &mut Transcript,
        turn: PendingTurn,
        reply: Reply,
    ) -> TurnOutcome {
        if transcript.generation() != turn.generation {
            log::info!(
                "Discarding reply to message {} from a cleared conversation",
                turn.user_message_id
            );
            return TurnOutcome::Stale;
        }

        let message_id = transcript.push(Role::Coach, reply.text, turn.category).id;
        TurnOutcome::Resolved { message_id }
    }

    pub async fn handle_turn(
        &self,
        utterance: &str,
        context: &SessionContext,
        mut transcript: Transcript,
    ) -> (Transcript, ConnectivityStatus) {
        if let Some(turn) = self.begin_turn(&mut transcript, utterance, context) {
            let reply = self.resolve(&turn, context).await;
            self.complete_turn(&mut transcript, turn, reply);
        }
        (transcript, self.status())
    }

    pub fn clear(&self, transcript: &mut Transcript, context: &SessionContext) {
        transcript.clear(&context.selected_game);
    }

    pub async fn test_connection(&self) -> bool {
        self.client.test_connection().await
    }
}
