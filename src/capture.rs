//! Stroke-capture finite state machine.
//!
//! Turns the continuous per-frame pinch signal into discrete stroke
//! boundaries.  The machine owns nothing but its state; each [`Capture::step`]
//! returns the [`StrokeAction`] the session should apply to the store, which
//! keeps the drawing-session boundary unambiguous and testable in isolation.
//!
//! ```text
//!            detected && pinch edge ↑
//!   Idle ───────────────────────────────► Drawing
//!    ▲  ╲ detected                          │  pinch edge ↓ (still detected)
//!    │   ╲──────────► Tracking ◄────────────┘   (seals the open stroke)
//!    │                   │
//!    └── !detected ──────┴── from any state
//! ```

/// Named machine states, driven once per incoming frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureState {
    /// No hand detected.
    Idle,
    /// Hand detected, not pinching.
    Tracking,
    /// Hand detected and pinching — a stroke is open.
    Drawing,
}

/// What the store should do as a result of one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrokeAction {
    /// Nothing this frame.
    None,
    /// Pinch began: open a new stroke, then append this frame's cursor.
    Begin,
    /// Still pinching: attempt to append this frame's cursor.
    Extend,
    /// Pinch ended (or hand lost while drawing): seal the open stroke.
    Seal,
}

/// The capture machine.  Starts in [`CaptureState::Idle`].
#[derive(Debug)]
pub struct Capture {
    state: CaptureState,
}

impl Default for Capture {
    fn default() -> Self {
        Capture {
            state: CaptureState::Idle,
        }
    }
}

impl Capture {
    pub fn new() -> Self {
        Capture::default()
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Force the machine back to Idle, without emitting an action.
    /// Used when the session seals a stroke out-of-band (seal-on-view-mode).
    pub fn reset(&mut self) {
        self.state = CaptureState::Idle;
    }

    /// Advance one frame.  Begin/Seal are edge-triggered on the pinch
    /// transitions; a hand loss from Drawing also seals.
    pub fn step(&mut self, detected: bool, pinching: bool) -> StrokeAction {
        let next = match (detected, pinching) {
            (false, _) => CaptureState::Idle,
            (true, false) => CaptureState::Tracking,
            (true, true) => CaptureState::Drawing,
        };

        let action = match (self.state, next) {
            (CaptureState::Drawing, CaptureState::Drawing) => StrokeAction::Extend,
            (_, CaptureState::Drawing) => StrokeAction::Begin,
            (CaptureState::Drawing, _) => StrokeAction::Seal,
            _ => StrokeAction::None,
        };

        if next != self.state {
            tracing::debug!(from = ?self.state, to = ?next, ?action, "capture transition");
        }
        self.state = next;
        action
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
