use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::game_stats::GameProfile;

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ConversationMode {
    #[default]
    Gaming,
    General,
}

/// Read-only view of the player's session handed to every coaching turn.
///
/// The coach never mutates it; callers rebuild it when the player switches
/// game or mode and the next turn picks the change up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub selected_game: String,
    pub rank: String,
    pub win_rate: f32,
    pub kda: f32,
    pub conversation_mode: ConversationMode,
}

impl SessionContext {
    pub fn new(
        selected_game: impl Into<String>,
        rank: impl Into<String>,
        win_rate: f32,
        kda: f32,
        conversation_mode: ConversationMode,
    ) -> Self {
        Self {
            selected_game: selected_game.into(),
            rank: rank.into(),
            win_rate: win_rate.clamp(0.0, 100.0),
            kda,
            conversation_mode,
        }
    }

    /// Builds a context from a built-in game profile. Unknown ids use the default profile.
    pub fn for_game(game_id: &str, conversation_mode: ConversationMode) -> Self {
        let profile = GameProfile::find_or_default(game_id);
        Self::new(
            profile.id,
            profile.rank,
            profile.win_rate,
            profile.kda,
            conversation_mode,
        )
    }

    pub fn with_mode(mut self, conversation_mode: ConversationMode) -> Self {
        self.conversation_mode = conversation_mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!(
            ConversationMode::from_str("General").ok(),
            Some(ConversationMode::General)
        );
        assert_eq!(
            ConversationMode::from_str("gaming").ok(),
            Some(ConversationMode::Gaming)
        );
        assert!(ConversationMode::from_str("casual").is_err());
        assert_eq!(ConversationMode::General.to_string(), "general");
    }

    #[test]
    fn win_rate_is_clamped() {
        let context = SessionContext::new("cs2", "Gold", 140.0, 1.0, ConversationMode::Gaming);
        assert_eq!(context.win_rate, 100.0);
    }
}
