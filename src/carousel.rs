use std::time::Duration;

use serde::Serialize;
use tracing::warn;

/// How long the transition lock is held after an accepted operation.
pub const TRANSITION_COOLDOWN: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Lock released; operations are accepted.
    Idle,
    /// Lock held; operations are rejected until the cooldown ends.
    Transitioning,
}

/// An accepted operation. `from == to` when a non-looping carousel is
/// already at the boundary; the display is still refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideChange {
    pub from: usize,
    pub to: usize,
}

/// Slide index plus transition lock.
///
/// Rules:
/// - `current` stays in `0..slide_count`.
/// - `advance`/`retreat` wrap when looping and clamp otherwise.
/// - Every accepted operation enters `Transitioning`; the owner must call
///   [`Carousel::release_lock`] once [`TRANSITION_COOLDOWN`] has elapsed.
#[derive(Debug, Clone)]
pub struct Carousel {
    slide_count: usize,
    current: usize,
    looping: bool,
    phase: Phase,
}

impl Carousel {
    /// `slide_count` must be positive; the container check guarantees it.
    pub fn new(slide_count: usize, looping: bool) -> Self {
        debug_assert!(slide_count > 0, "carousel needs at least one slide");
        Self {
            slide_count,
            current: 0,
            looping,
            phase: Phase::Idle,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn slide_count(&self) -> usize {
        self.slide_count
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_locked(&self) -> bool {
        self.phase == Phase::Transitioning
    }

    pub fn advance(&mut self) -> Option<SlideChange> {
        if self.is_locked() {
            return None;
        }
        let last = self.slide_count - 1;
        let to = if self.current >= last {
            if self.looping { 0 } else { last }
        } else {
            self.current + 1
        };
        Some(self.goto(to))
    }

    pub fn retreat(&mut self) -> Option<SlideChange> {
        if self.is_locked() {
            return None;
        }
        let to = if self.current == 0 {
            if self.looping { self.slide_count - 1 } else { 0 }
        } else {
            self.current - 1
        };
        Some(self.goto(to))
    }

    pub fn jump_to(&mut self, index: usize) -> Option<SlideChange> {
        if self.is_locked() || index == self.current {
            return None;
        }
        if index >= self.slide_count {
            warn!(
                index,
                slide_count = self.slide_count,
                "ignoring jump to out-of-range slide"
            );
            return None;
        }
        Some(self.goto(index))
    }

    pub fn release_lock(&mut self) {
        self.phase = Phase::Idle;
    }

    fn goto(&mut self, to: usize) -> SlideChange {
        let ch = SlideChange {
            from: self.current,
            to,
        };
        self.current = to;
        self.phase = Phase::Transitioning;
        ch
    }
}
