use rand::Rng;

use crate::context::{ConversationMode, SessionContext};
use crate::knowledge::{KnowledgeEntry, KnowledgeMatcher};

pub const KNOWLEDGE_PREFIX: &str = "Based on my gaming knowledge: ";

const GREETING_WORDS: &[&str] = &["hello", "hi", "hey"];
const WELLBEING_PHRASES: &[&str] = &["how are you", "how's it going"];
const TIME_GREETING_PHRASES: &[&str] = &["good morning", "good afternoon", "good evening"];
const GRATITUDE_PHRASES: &[&str] = &["thank you", "thanks"];
const IDENTITY_PHRASES: &[&str] = &["who are you", "what are you"];

pub const JOKES: &[&str] = &[
    "Why don't scientists trust atoms? Because they make up everything! 😄",
    "Why did the gamer break up with their keyboard? It wasn't their type! ⌨️😂",
    "What do you call a noob who's good at Tetris? A block star! 🎮✨",
];

pub const GENERAL_HELP_REPLY: &str = "I'm here to help! I can assist with gaming advice, answer questions, have conversations, or help with various topics. What would you like to know?";
pub const GENERAL_DEFAULT_REPLY: &str = "I'm here to chat and help with any questions you might have. Could you tell me more about what you'd like to discuss?";

/// Rule-based replies used whenever the remote model is unavailable.
///
/// Rules are checked in a fixed order and the first hit wins; the last rule
/// always answers, so every utterance gets a non-empty reply. Randomness
/// only picks among the templates of a rule and is supplied by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackResponder {
    matcher: KnowledgeMatcher,
}

impl FallbackResponder {
    pub fn new(matcher: KnowledgeMatcher) -> Self {
        Self { matcher }
    }

    pub fn respond<R: Rng>(
        &self,
        utterance: &str,
        context: &SessionContext,
        entries: &[KnowledgeEntry],
        rng: &mut R,
    ) -> String {
        let lower = utterance.to_lowercase();

        if contains_word(&lower, GREETING_WORDS) {
            return pick(greetings(context), rng);
        }
        if contains_any(&lower, WELLBEING_PHRASES) {
            return wellbeing_reply(context);
        }
        if contains_any(&lower, TIME_GREETING_PHRASES) {
            return pick(time_greetings(context), rng);
        }
        if contains_any(&lower, GRATITUDE_PHRASES) {
            return gratitude_reply(context);
        }
        if contains_any(&lower, IDENTITY_PHRASES) {
            return identity_reply(context);
        }
        if let Some(entry) = self.matcher.find_match(utterance, entries) {
            return format!("{KNOWLEDGE_PREFIX}{}", entry.answer);
        }

        match context.conversation_mode {
            ConversationMode::Gaming => gaming_reply(&lower, context),
            ConversationMode::General => general_reply(&lower, rng),
        }
    }
}

fn pick<R: Rng>(mut options: Vec<String>, rng: &mut R) -> String {
    let index = rng.random_range(0..options.len());
    options.swap_remove(index)
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| text.contains(needle))
}

// Whole-word check: "this" must not count as "hi".
fn contains_word(text: &str, words: &[&str]) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .any(|token| words.contains(&token))
}

pub fn greetings(context: &SessionContext) -> Vec<String> {
    let game = &context.selected_game;
    vec![
        format!(
            "Hello! I'm CoachGPT, your AI gaming assistant. I see you're playing {game} with a {}% win rate - that's solid! How can I help you improve today?",
            context.win_rate
        ),
        format!(
            "Hey there! Welcome to CoachGPT. I'm here to help you dominate in {game}. With your current {} rank, I can provide personalized tips to help you climb even higher!",
            context.rank
        ),
        format!(
            "Hi! Great to see you back. I've been analyzing gaming strategies and I'm ready to help you level up your {game} gameplay. What would you like to work on?"
        ),
    ]
}

pub fn time_greetings(context: &SessionContext) -> Vec<String> {
    let game = &context.selected_game;
    vec![
        format!(
            "Good to see you! Ready for some {game} coaching? I've got some fresh strategies that could help boost your performance."
        ),
        format!(
            "Hope you're having a great day! Let's make it even better by improving your {game} skills. What aspect of your gameplay would you like to focus on?"
        ),
        format!(
            "Welcome back! I'm here and ready to help you dominate your next {game} matches. What can we work on together?"
        ),
    ]
}

fn wellbeing_reply(context: &SessionContext) -> String {
    format!(
        "I'm doing great! I've been studying the latest {} meta and analyzing pro player strategies. I'm excited to help you improve your gameplay. How has your gaming session been going?",
        context.selected_game
    )
}

fn gratitude_reply(context: &SessionContext) -> String {
    format!(
        "You're very welcome! I'm always here to help you improve at {}. Feel free to ask me anything about strategies, techniques, or game mechanics. Good luck in your next matches!",
        context.selected_game
    )
}

fn identity_reply(context: &SessionContext) -> String {
    format!(
        "I'm CoachGPT, your personal AI gaming coach powered by Google Gemini and trained on extensive gaming knowledge. I specialize in helping players like you improve at {} and other competitive games. I can analyze your performance, suggest strategies, and provide personalized coaching based on your current rank of {}.",
        context.selected_game, context.rank
    )
}

fn gaming_reply(lower: &str, context: &SessionContext) -> String {
    let game = &context.selected_game;
    if contains_any(lower, &["aim", "crosshair"]) {
        format!(
            "For {game}, focus on keeping your crosshair at head level and practice pre-aiming common angles. Your current rank of {} suggests you have good fundamentals, but consistent crosshair placement can help you climb higher.",
            context.rank
        )
    } else if contains_any(lower, &["rank", "improve"]) {
        format!(
            "With your current {}% win rate in {game}, you're performing well! Focus on consistency and reviewing your gameplay. Small improvements in positioning and decision-making can help you reach the next rank.",
            context.win_rate
        )
    } else if contains_any(lower, &["economy", "money"]) {
        format!(
            "Economy management is crucial in {game}. Save when your team saves, buy when your team buys. Don't force-buy unless it's a must-win round. Coordinate with your team for maximum impact."
        )
    } else {
        format!(
            "I'd love to help you improve at {game}! What specific aspect of your gameplay would you like to work on? I have extensive knowledge about game mechanics, strategies, and tips."
        )
    }
}

fn general_reply<R: Rng>(lower: &str, rng: &mut R) -> String {
    if lower.contains("joke") {
        JOKES[rng.random_range(0..JOKES.len())].to_string()
    } else if lower.contains("help") {
        GENERAL_HELP_REPLY.to_string()
    } else {
        GENERAL_DEFAULT_REPLY.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_words_need_word_boundaries() {
        assert!(contains_word("hi, coach", GREETING_WORDS));
        assert!(contains_word("well hey!", GREETING_WORDS));
        assert!(!contains_word("this is which", GREETING_WORDS));
        assert!(!contains_word("they hiked", GREETING_WORDS));
    }
}
