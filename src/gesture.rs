//! Horizontal swipe recognition.
//!
//! 1) [`SwipeTracker::start`] records the starting coordinate.
//! 2) [`SwipeTracker::sample`] records the latest coordinate; nothing moves yet.
//! 3) [`SwipeTracker::end`] classifies the gesture and resets the tracker.

/// Minimum horizontal travel for a gesture to count as a swipe.
pub const SWIPE_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swipe {
    /// Finger moved left: show the next slide.
    Next,
    /// Finger moved right: show the previous slide.
    Previous,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SwipeTracker {
    start_x: Option<f64>,
    last_x: Option<f64>,
}

impl SwipeTracker {
    pub fn start(&mut self, x: f64) {
        self.start_x = Some(x);
        self.last_x = Some(x);
    }

    /// Ignored unless a gesture is active.
    pub fn sample(&mut self, x: f64) {
        if self.start_x.is_some() {
            self.last_x = Some(x);
        }
    }

    /// Finish the gesture. `None` for taps, short drags, or an end with no start.
    pub fn end(&mut self) -> Option<Swipe> {
        let start = self.start_x.take()?;
        let last = self.last_x.take().unwrap_or(start);
        classify(start - last)
    }
}

fn classify(delta: f64) -> Option<Swipe> {
    if delta.abs() <= SWIPE_THRESHOLD {
        None
    } else if delta > 0.0 {
        Some(Swipe::Next)
    } else {
        Some(Swipe::Previous)
    }
}
