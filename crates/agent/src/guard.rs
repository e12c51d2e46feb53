//! Loop guard — per-run bookkeeping that keeps the engine from spinning.
//!
//! Tracks which actions already ran and what they returned, which results
//! the model has already seen, how many replies in a row failed to parse,
//! and how many turns have been spent.

use std::collections::{HashMap, HashSet};

/// Stored results are cut to this many characters.
pub const MAX_RECORDED_CHARS: usize = 500;

const REPEAT_NOTE: &str = "(SYSTEM NOTE: You have received this exact information in a previous \
turn. It did not help then and it will not help now. Stop retrying. If you have the answer, \
output it immediately using `Answer:`. Otherwise try a completely different approach or tool.)";

#[derive(Debug)]
pub struct LoopGuard {
    invocations: HashMap<String, String>,
    first_result: Option<String>,
    seen_results: HashSet<String>,
    parse_failures: u32,
    turns: u32,
    max_turns: u32,
}

impl LoopGuard {
    pub fn new(max_turns: u32) -> Self {
        Self {
            invocations: HashMap::new(),
            first_result: None,
            seen_results: HashSet::new(),
            parse_failures: 0,
            turns: 0,
            max_turns,
        }
    }

    /// The recorded result if this exact action already ran.
    pub fn should_stop(&self, key: &str) -> Option<&str> {
        self.invocations.get(key).map(String::as_str)
    }

    /// Answer to give when an action repeats: the first result of the run,
    /// falling back to the one stored for `key`.
    pub fn cached_answer(&self, key: &str) -> Option<String> {
        self.first_result
            .clone()
            .or_else(|| self.invocations.get(key).cloned())
    }

    pub fn record(&mut self, key: impl Into<String>, result: &str) {
        let truncated: String = result.chars().take(MAX_RECORDED_CHARS).collect();
        if self.first_result.is_none() {
            self.first_result = Some(truncated.clone());
        }
        self.invocations.insert(key.into(), truncated);
    }

    /// Trim `result` and flag it if the model has already seen the same text.
    pub fn annotate_if_seen(&mut self, result: &str) -> String {
        let trimmed = result.trim();
        if self.seen_results.contains(trimmed) {
            format!("{trimmed}\n\n{REPEAT_NOTE}")
        } else {
            self.seen_results.insert(trimmed.to_string());
            trimmed.to_string()
        }
    }

    /// Count a parse failure; returns the consecutive total.
    pub fn record_failure(&mut self) -> u32 {
        self.parse_failures += 1;
        self.parse_failures
    }

    pub fn reset_failures(&mut self) {
        self.parse_failures = 0;
    }

    /// Start a new turn. Returns `false` once the budget is spent.
    pub fn increment_turn(&mut self) -> bool {
        if self.turns >= self.max_turns {
            return false;
        }
        self.turns += 1;
        true
    }

    pub fn turns(&self) -> u32 {
        self.turns
    }
}
