use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

pub const DEFAULT_PARTIAL_MATCH_THRESHOLD: usize = 2;

// Tokens this short or shorter are ignored by the partial match.
const NOISE_TOKEN_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub question: String,
    pub answer: String,
}

impl KnowledgeEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Canned question/answer pairs, in file order, loaded once at startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
    loaded: bool,
}

impl KnowledgeBase {
    pub fn new(entries: Vec<KnowledgeEntry>) -> Self {
        Self {
            entries,
            loaded: true,
        }
    }

    /// The "not loaded" knowledge base. Every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Self {
        Self::new(parse_entries(text))
    }

    // Unreadable resources degrade to an empty, not-loaded base instead of failing.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => {
                let knowledge = Self::parse(&text);
                log::info!(
                    "Loaded {} knowledge entries from {}",
                    knowledge.len(),
                    path.display()
                );
                knowledge
            }
            Err(e) => {
                log::error!("Failed to load knowledge base {}: {e}", path.display());
                Self::empty()
            }
        }
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Header row skipped; each row splits at its first comma only.
pub fn parse_entries(text: &str) -> Vec<KnowledgeEntry> {
    text.lines().skip(1).filter_map(parse_row).collect()
}

fn parse_row(line: &str) -> Option<KnowledgeEntry> {
    if line.trim().is_empty() {
        return None;
    }
    let (question, answer) = line.split_once(',')?;
    let question = clean_field(question);
    if question.is_empty() {
        return None;
    }
    Some(KnowledgeEntry::new(question, clean_field(answer)))
}

fn clean_field(field: &str) -> String {
    field.replace('"', "").trim().to_string()
}

/// First-match lookup of a stored question for a user utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnowledgeMatcher {
    partial_match_threshold: usize,
}

impl Default for KnowledgeMatcher {
    fn default() -> Self {
        Self {
            partial_match_threshold: DEFAULT_PARTIAL_MATCH_THRESHOLD,
        }
    }
}

impl KnowledgeMatcher {
    pub fn new(partial_match_threshold: usize) -> Self {
        Self {
            partial_match_threshold: partial_match_threshold.max(1),
        }
    }

    pub fn partial_match_threshold(&self) -> usize {
        self.partial_match_threshold
    }

    /// Exact (case-insensitive) matches take precedence over partial ones
    /// anywhere in the list; otherwise the first entry sharing at least
    /// `partial_match_threshold` meaningful tokens wins.
    pub fn find_match<'a>(
        &self,
        utterance: &str,
        entries: &'a [KnowledgeEntry],
    ) -> Option<&'a KnowledgeEntry> {
        let utterance = utterance.to_lowercase();

        if let Some(entry) = entries
            .iter()
            .find(|entry| entry.question.to_lowercase() == utterance)
        {
            return Some(entry);
        }

        let utterance_tokens = meaningful_tokens(&utterance);
        if utterance_tokens.len() < self.partial_match_threshold {
            return None;
        }

        entries.iter().find(|entry| {
            let question = entry.question.to_lowercase();
            let question_tokens = meaningful_tokens(&question);
            utterance_tokens.intersection(&question_tokens).count() >= self.partial_match_threshold
        })
    }
}

fn meaningful_tokens(text: &str) -> HashSet<&str> {
    text.split_whitespace()
        .filter(|token| token.chars().count() > NOISE_TOKEN_LEN)
        .collect()
}

pub fn find_match<'a>(utterance: &str, entries: &'a [KnowledgeEntry]) -> Option<&'a KnowledgeEntry> {
    KnowledgeMatcher::default().find_match(utterance, entries)
}
