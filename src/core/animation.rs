//! Typewriter animation state machine.
//!
//! Replaces the recursive frame-callback closure of a browser terminal with
//! an explicit continuation: the decomposed text, a position cursor, and the
//! action to run once the text is exhausted. The main loop is the frame
//! source; each call to [`Typewriter::step`] yields at most one character.

use std::time::{Duration, Instant};

/// Action to run when an animation finishes normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Re-emit the prompt
    Prompt,
    /// Advance full-CV playback to the next section
    NextSection,
}

/// Result of advancing the animation by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Emit this character to the display
    Char(char),
    /// All characters consumed
    Done,
}

/// An in-flight typewriter animation.
///
/// Pure state, no I/O: the controller owns the terminal and decides what
/// each [`Step`] means on screen.
#[derive(Debug)]
pub struct Typewriter {
    chars: Vec<char>,
    pos: usize,
    completion: Completion,
}

impl Typewriter {
    pub fn new(text: &str, completion: Completion) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            completion,
        }
    }

    /// Advance by one frame.
    pub fn step(&mut self) -> Step {
        match self.chars.get(self.pos) {
            Some(&c) => {
                self.pos += 1;
                Step::Char(c)
            }
            None => Step::Done,
        }
    }

    pub fn completion(&self) -> Completion {
        self.completion
    }

    /// Characters not yet emitted.
    #[cfg(test)]
    pub fn remaining(&self) -> usize {
        self.chars.len() - self.pos
    }
}

/// Paces animation frames against wall-clock time.
///
/// The main loop wakes on every input event as well as on the poll timeout;
/// without gating, a held key (autorepeat) would turn each ignored event
/// into an extra frame. A frame is due only when a full interval has passed
/// since the last one.
#[derive(Debug)]
pub struct FrameClock {
    interval: Duration,
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// True if a frame should be emitted now; arms the next interval.
    pub fn due(&mut self) -> bool {
        match self.last {
            Some(t) if t.elapsed() < self.interval => false,
            _ => {
                self.last = Some(Instant::now());
                true
            }
        }
    }

    /// Time until the next frame is due.
    pub fn timeout(&self) -> Duration {
        match self.last {
            Some(t) => self.interval.saturating_sub(t.elapsed()),
            None => Duration::ZERO,
        }
    }
}
