use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

const SPINNER_CHARS: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// "Coach is typing" flag shared between the coach and whoever renders it.
///
/// Counts pending replies rather than holding a bool, since several turns
/// may be waiting at once.
#[derive(Debug, Clone, Default)]
pub struct TypingIndicator {
    pending: Arc<AtomicUsize>,
    current_frame: Arc<AtomicUsize>,
}

impl TypingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    // Typing stays on until the returned guard is dropped.
    pub fn start(&self) -> TypingGuard {
        self.pending.fetch_add(1, Ordering::AcqRel);
        TypingGuard {
            pending: self.pending.clone(),
        }
    }

    pub fn is_typing(&self) -> bool {
        self.pending() > 0
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    pub fn next_frame(&self) {
        self.current_frame.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frame(&self) -> char {
        let frame = self.current_frame.load(Ordering::Relaxed) % SPINNER_CHARS.len();
        SPINNER_CHARS[frame]
    }

    pub fn label(&self) -> String {
        format!("CoachGPT is typing {}", self.frame())
    }
}

#[derive(Debug)]
pub struct TypingGuard {
    pending: Arc<AtomicUsize>,
}

impl Drop for TypingGuard {
    fn drop(&mut self) {
        self.pending.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_count_pending_replies() {
        let typing = TypingIndicator::new();
        let first = typing.start();
        let second = typing.start();
        assert_eq!(typing.pending(), 2);

        drop(first);
        assert!(typing.is_typing());
        drop(second);
        assert!(!typing.is_typing());
    }

    #[test]
    fn frames_wrap_around() {
        let typing = TypingIndicator::new();
        for _ in 0..SPINNER_CHARS.len() {
            typing.next_frame();
        }
        assert_eq!(typing.frame(), SPINNER_CHARS[0]);
    }
}
