//! # Walkthrough Step Controller
//!
//! Tracks which step of a fixed list is active and whether autoplay is on.
//! Pure state: no timers live here (see [`super::player`]).
//!
//! ## Boundary policy
//!
//! Manual navigation clamps. `next()` on the last step and `prev()` on the
//! first are no-ops, which is what lets the UI grey out its buttons.
//! Autoplay wraps: [`WalkthroughController::tick`] goes from the last step
//! back to the first so the story loops.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use super::steps::Step;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WalkthroughError {
    #[error("a walkthrough needs at least one step")]
    NoSteps,
}

/// Mutable part of the walkthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WalkthroughState {
    pub active_index: usize,
    pub is_playing: bool,
}

#[derive(Debug, Clone)]
pub struct WalkthroughController {
    steps: Arc<[Step]>,
    state: WalkthroughState,
}

impl WalkthroughController {
    /// Build a controller over `steps`, starting at index 0, paused.
    pub fn new(steps: Vec<Step>) -> Result<Self, WalkthroughError> {
        if steps.is_empty() {
            return Err(WalkthroughError::NoSteps);
        }
        Ok(Self {
            steps: steps.into(),
            state: WalkthroughState::default(),
        })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false; construction rejects empty step lists.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn state(&self) -> WalkthroughState {
        self.state
    }

    pub fn active_index(&self) -> usize {
        self.state.active_index
    }

    pub fn active_step(&self) -> &Step {
        &self.steps[self.state.active_index]
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    pub fn can_prev(&self) -> bool {
        self.state.active_index > 0
    }

    pub fn can_next(&self) -> bool {
        self.state.active_index + 1 < self.steps.len()
    }

    /// Jump to `index`, clamped into range. Returns whether the active step
    /// actually changed, so repeated calls with the same index are silent.
    pub fn set_active(&mut self, index: usize) -> bool {
        let clamped = index.min(self.steps.len() - 1);
        if clamped == self.state.active_index {
            return false;
        }
        self.state.active_index = clamped;
        true
    }

    /// One step forward, stopping at the last step.
    pub fn next(&mut self) -> bool {
        self.set_active(self.state.active_index.saturating_add(1))
    }

    /// One step back, stopping at the first step.
    pub fn prev(&mut self) -> bool {
        self.set_active(self.state.active_index.saturating_sub(1))
    }

    /// Flip autoplay. Returns the new value.
    pub fn toggle_play(&mut self) -> bool {
        self.state.is_playing = !self.state.is_playing;
        self.state.is_playing
    }

    /// Force autoplay off.
    pub fn pause(&mut self) {
        self.state.is_playing = false;
    }

    /// Advance one step, wrapping, if autoplay is on. Returns the new index
    /// when a move happened.
    pub fn tick(&mut self) -> Option<usize> {
        if !self.state.is_playing {
            return None;
        }
        let next = (self.state.active_index + 1) % self.steps.len();
        self.state.active_index = next;
        Some(next)
    }
}
