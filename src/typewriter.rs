//! Fixed-rate, one-character-at-a-time reveal of streamed text.
//!
//! Fragments of any size are queued as they arrive. Every tick of the reveal
//! timer moves exactly one character from the front of the queue to the
//! revealed text and re-renders the whole revealed text to HTML. When the
//! queue runs dry the timer stops; the next fragment restarts it.
//!
//! The rendered HTML is only what "Copy HTML" hands out. The answer window
//! draws `revealed()` through its own markdown viewer.

use crate::markdown;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Most ticks a single `advance` call runs. After a longer stall the missed
/// ticks are dropped and the reveal resumes at the fixed rate.
pub const MAX_CATCH_UP_TICKS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealState {
    Idle,
    Revealing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RevealTimer {
    last_tick: Instant,
}

#[derive(Debug, Clone)]
pub struct Typewriter {
    pending: VecDeque<char>,
    revealed: String,
    html: String,
    interval: Duration,
    timer: Option<RevealTimer>,
    scroll_to_bottom: bool,
}

impl Typewriter {
    pub fn new(interval: Duration) -> Self {
        Self {
            pending: VecDeque::new(),
            revealed: String::new(),
            html: String::new(),
            interval: interval.max(Duration::from_millis(1)),
            timer: None,
            scroll_to_bottom: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> RevealState {
        if self.timer.is_some() {
            RevealState::Revealing
        } else {
            RevealState::Idle
        }
    }

    pub fn is_revealing(&self) -> bool {
        self.timer.is_some()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_text(&self) -> String {
        self.pending.iter().collect()
    }

    pub fn revealed(&self) -> &str {
        &self.revealed
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// Queue a fragment behind everything received so far and start the
    /// timer if it is not running. Empty fragments change nothing.
    pub fn append(&mut self, fragment: &str, now: Instant) {
        if fragment.is_empty() {
            return;
        }
        self.pending.extend(fragment.chars());
        if self.timer.is_none() {
            self.timer = Some(RevealTimer { last_tick: now });
        }
    }

    /// One timer tick. Reveals a single character and returns `true`, or
    /// stops the timer and returns `false` when nothing is pending.
    pub fn tick(&mut self) -> bool {
        match self.pending.pop_front() {
            Some(c) => {
                self.revealed.push(c);
                self.html = markdown::to_html(&self.revealed);
                self.scroll_to_bottom = true;
                true
            }
            None => {
                self.timer = None;
                false
            }
        }
    }

    /// Run the ticks that fell due up to `now`, at most
    /// [`MAX_CATCH_UP_TICKS`]. Returns the number of characters revealed.
    pub fn advance(&mut self, now: Instant) -> usize {
        let mut revealed = 0;
        while let Some(timer) = self.timer {
            let due = timer.last_tick + self.interval;
            if due > now {
                break;
            }
            if revealed == MAX_CATCH_UP_TICKS {
                if let Some(timer) = self.timer.as_mut() {
                    timer.last_tick = now;
                }
                break;
            }
            if self.tick() {
                revealed += 1;
                if let Some(timer) = self.timer.as_mut() {
                    timer.last_tick = due;
                }
            }
        }
        revealed
    }

    /// When the next tick is due, if the timer is running.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.map(|t| t.last_tick + self.interval)
    }

    /// Reset pending and revealed text and stop the timer. Valid in any state.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.revealed.clear();
        self.html.clear();
        self.timer = None;
        self.scroll_to_bottom = false;
    }

    /// Consume a pending request to scroll the display to the bottom.
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_to_bottom)
    }
}

impl Default for Typewriter {
    fn default() -> Self {
        Self::new(Duration::from_millis(10))
    }
}
