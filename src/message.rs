use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::context::ConversationMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Coach,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Local>,
    pub category: ConversationMode,
}

impl Message {
    pub fn new(id: u64, role: Role, text: impl Into<String>, category: ConversationMode) -> Self {
        Self {
            id,
            role,
            text: text.into(),
            timestamp: Local::now(),
            category,
        }
    }
}

pub fn seed_text(selected_game: &str) -> String {
    format!(
        "Hello! I'm CoachGPT, powered by Google Gemini AI and trained on extensive gaming knowledge. I can help you with gaming strategies, general conversations, and specific game mechanics. I see you're currently playing {selected_game}. How can I assist you today?"
    )
}

/// Ordered conversation log.
///
/// Messages are only ever appended; `clear` is the single exception and
/// replaces everything with a fresh seed message. Every clear bumps the
/// generation so replies for turns started before it can be recognised as
/// stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
    next_id: u64,
    generation: u64,
}

impl Transcript {
    pub fn new(selected_game: &str) -> Self {
        Self {
            messages: vec![Message::new(
                1,
                Role::Coach,
                seed_text(selected_game),
                ConversationMode::General,
            )],
            next_id: 2,
            generation: 0,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn push(&mut self, role: Role, text: impl Into<String>, category: ConversationMode) -> &Message {
        let message = Message::new(self.next_id, role, text, category);
        self.next_id += 1;
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn clear(&mut self, selected_game: &str) {
        let generation = self.generation + 1;
        *self = Self::new(selected_game);
        self.generation = generation;
    }
}
