//! Stall tracking for the scroll loop.

use crate::config::ScanConfig;

/// What the scroll loop should do after an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallAction {
    Continue,
    /// Jump to the bottom extent, wait longer, harvest.
    JumpBottom,
    /// Jump back to the top, harvest, then keep stepping down.
    JumpTop,
    /// Stop with what we have.
    GiveUp,
}

/// Counts consecutive iterations without catalog growth.
#[derive(Debug, Clone)]
pub struct StallTracker {
    bottom_jump_after: u32,
    top_jump_after: u32,
    give_up_after: u32,
    last_len: usize,
    stalled: u32,
}

impl StallTracker {
    pub fn new(cfg: &ScanConfig, initial_len: usize) -> Self {
        Self {
            bottom_jump_after: cfg.bottom_jump_after,
            top_jump_after: cfg.top_jump_after,
            give_up_after: cfg.give_up_after.max(1),
            last_len: initial_len,
            stalled: 0,
        }
    }

    pub fn stalled(&self) -> u32 {
        self.stalled
    }

    /// Records the catalog size after a step harvest.
    ///
    /// Growth picked up by a recovery harvest shows in the next observation,
    /// so a recovery that works resets the count one iteration later.
    pub fn observe(&mut self, len: usize) -> StallAction {
        let grew = len != self.last_len;
        self.last_len = len;
        if grew {
            self.stalled = 0;
            return StallAction::Continue;
        }

        self.stalled += 1;
        if self.stalled >= self.give_up_after {
            StallAction::GiveUp
        } else if self.stalled == self.top_jump_after {
            StallAction::JumpTop
        } else if self.stalled == self.bottom_jump_after {
            StallAction::JumpBottom
        } else {
            StallAction::Continue
        }
    }
}
