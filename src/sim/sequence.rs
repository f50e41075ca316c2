//! Sequence collection state machine
//!
//! Tracks how far the player is through the target sequence. Progress only
//! moves forward on the expected symbol; anything else drops back to zero.

use serde::{Deserialize, Serialize};

/// Result of feeding one symbol to the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceStep {
    /// Expected symbol; `progress` symbols now collected
    Advanced { progress: usize },
    /// Last symbol collected; progress is back at zero
    Completed { cycle: u32 },
    /// Wrong symbol; progress is back at zero
    Mismatch { expected: char, got: char },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceTracker {
    symbols: Vec<char>,
    /// Index of the next expected symbol, always < symbols.len()
    progress: usize,
    /// Completed cycles
    completions: u32,
}

impl SequenceTracker {
    pub fn new(symbols: Vec<char>) -> Self {
        Self {
            symbols,
            progress: 0,
            completions: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbols collected in the current cycle
    pub fn progress(&self) -> usize {
        self.progress
    }

    pub fn completions(&self) -> u32 {
        self.completions
    }

    /// Next symbol the player must click
    pub fn expected(&self) -> Option<char> {
        self.symbols.get(self.progress).copied()
    }

    pub fn symbol_at(&self, index: usize) -> Option<char> {
        self.symbols.get(index).copied()
    }

    /// Collected symbols, for display
    pub fn collected(&self) -> &[char] {
        &self.symbols[..self.progress]
    }

    /// Feed a clicked symbol
    pub fn feed(&mut self, symbol: char) -> SequenceStep {
        let Some(expected) = self.expected() else {
            return SequenceStep::Mismatch {
                expected: symbol,
                got: symbol,
            };
        };

        if symbol != expected {
            self.progress = 0;
            return SequenceStep::Mismatch {
                expected,
                got: symbol,
            };
        }

        self.progress += 1;
        if self.progress == self.symbols.len() {
            self.progress = 0;
            self.completions += 1;
            SequenceStep::Completed {
                cycle: self.completions,
            }
        } else {
            SequenceStep::Advanced {
                progress: self.progress,
            }
        }
    }

    /// Start a fresh run
    pub fn reset(&mut self) {
        self.progress = 0;
        self.completions = 0;
    }
}
