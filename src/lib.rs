pub mod ai;
pub mod ai_response;
pub mod app;
pub mod coach;
pub mod context;
pub mod error;
pub mod fallback;
pub mod game_stats;
pub mod knowledge;
pub mod logging;
pub mod message;
pub mod settings;
pub mod typing;

// Re-export commonly used items for easier access
pub use ai::{CoachingClient, ConnectivityStatus, GeminiClient, Generator, StatusCell};
pub use coach::{Coach, PendingTurn, Reply, ReplySource, TurnOutcome, TurnState};
pub use context::{ConversationMode, SessionContext};
pub use error::{AppError, CallError};
pub use fallback::FallbackResponder;
pub use knowledge::{KnowledgeBase, KnowledgeEntry, KnowledgeMatcher, find_match};
pub use message::{Message, Role, Transcript};
pub use settings::Settings;
