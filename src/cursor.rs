//! Cursor smoothing.
//!
//! The render loop ticks faster than (and independently of) the detection
//! cycle, so the raw cursor jumps whenever a fresh frame lands.  The smoother
//! exponentially eases the displayed position toward the latest raw value
//! once per render frame, which damps detection jitter without the latency a
//! hard delay would add.

use glam::Vec3;

/// Per-render-frame interpolation factor toward the raw cursor.
pub const SMOOTHING: f32 = 0.2;

#[derive(Debug, Default)]
pub struct CursorSmoother {
    displayed: Vec3,
    primed: bool,
}

impl CursorSmoother {
    pub fn new() -> Self {
        CursorSmoother::default()
    }

    /// Advance one render frame toward `raw` and return the displayed
    /// position.  The first sample snaps (no easing in from the origin).
    pub fn tick(&mut self, raw: Vec3) -> Vec3 {
        if !self.primed {
            self.displayed = raw;
            self.primed = true;
        } else {
            self.displayed = self.displayed.lerp(raw, SMOOTHING);
        }
        self.displayed
    }

    /// Last displayed position without advancing.
    pub fn displayed(&self) -> Vec3 {
        self.displayed
    }
}
