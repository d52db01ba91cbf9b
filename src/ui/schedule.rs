//! Explicit frame and timer scheduling.
//!
//! The host loop alternates ticks and renders. A component that wants to
//! measure layout requests the next frame through its own [`FrameSlot`]; a
//! request while one is already pending is a no-op, so bursts of scroll and
//! resize events collapse into one measurement pass. [`Debounce`] is a single
//! cancellable delayed task whose deadline moves on every reschedule.

use std::time::{Duration, Instant};

/// Single pending frame callback
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameSlot {
    pending: bool,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the next frame. Returns false when a request was already pending.
    pub fn request(&mut self) -> bool {
        if self.pending {
            return false;
        }
        self.pending = true;
        true
    }

    /// Consume the pending request, if any. Called once per rendered frame.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn cancel(&mut self) {
        self.pending = false;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

/// Delayed task that fires once, `delay` after the most recent schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// (Re)start the timer from `now`
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Fire if the deadline has passed. Disarms on firing.
    pub fn fire_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_slot_coalesces() {
        let mut slot = FrameSlot::new();
        assert!(slot.request());
        assert!(!slot.request());
        assert!(slot.take());
        assert!(!slot.take());
        assert!(slot.request());
        slot.cancel();
        assert!(!slot.take());
    }

    #[test]
    fn test_debounce_resets_on_schedule() {
        let start = Instant::now();
        let mut timer = Debounce::new(Duration::from_millis(240));
        timer.schedule(start);
        timer.schedule(start + Duration::from_millis(200));
        assert!(!timer.fire_due(start + Duration::from_millis(300)));
        assert!(timer.fire_due(start + Duration::from_millis(440)));
        assert!(!timer.fire_due(start + Duration::from_millis(900)));
    }

    #[test]
    fn test_debounce_cancel() {
        let start = Instant::now();
        let mut timer = Debounce::new(Duration::from_millis(10));
        timer.schedule(start);
        timer.cancel();
        assert!(!timer.is_armed());
        assert!(!timer.fire_due(start + Duration::from_secs(1)));
    }
}
