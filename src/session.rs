//! Session controller.
//!
//! One owner for all mutable drawing state: the stroke store, the capture
//! machine, the palette selection, and the view-mode flag.  Frame application
//! and the UI setters are the only write paths; the render cycle reads a
//! borrowed [`SessionView`] snapshot and never mutates.
//!
//! All mutation happens on the single thread that drains the frame channel,
//! so readers can never observe a half-appended point or half-created stroke.

use std::time::Instant;

use glam::Vec3;

use crate::capture::{Capture, CaptureState, StrokeAction};
use crate::landmark::{map_frame, LandmarkFrame};
use crate::store::{Stroke, StrokeStore};

/// What happens to an open stroke when the user toggles into view mode.
///
/// `KeepOpen` reproduces the behavior this tool shipped with: frames are
/// simply not processed while orbiting, so a pinch held across a round trip
/// through view mode continues the same stroke.  `SealOnEnter` treats the
/// toggle as a gesture boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SealPolicy {
    #[default]
    KeepOpen,
    SealOnEnter,
}

// ════════════════════════════════════════════════════════════════════════════
// Session
// ════════════════════════════════════════════════════════════════════════════

pub struct Session {
    store: StrokeStore,
    capture: Capture,
    cursor_raw: Vec3,
    hand_detected: bool,
    color: u32,
    line_width: f32,
    view_mode: bool,
    seal_policy: SealPolicy,
}

impl Session {
    pub fn new(color: u32, line_width: f32, seal_policy: SealPolicy) -> Self {
        Session {
            store: StrokeStore::new(),
            capture: Capture::new(),
            cursor_raw: Vec3::ZERO,
            hand_detected: false,
            color,
            line_width,
            view_mode: false,
            seal_policy,
        }
    }

    // ── detection cycle ──────────────────────────────────────────────────

    /// Apply one detection cycle's frame (or its absence).
    ///
    /// While view mode is active frames are ignored entirely — the capture
    /// machine is frozen, which is what keeps an open stroke open across an
    /// orbit under [`SealPolicy::KeepOpen`].
    pub fn apply_frame(&mut self, frame: Option<&LandmarkFrame>) {
        if self.view_mode {
            self.hand_detected = false;
            return;
        }

        let sample = map_frame(frame, self.view_mode);
        self.hand_detected = sample.detected;
        if sample.detected {
            self.cursor_raw = sample.cursor;
        }

        match self.capture.step(sample.detected, sample.pinching) {
            StrokeAction::Begin => {
                self.store.begin(self.color, self.line_width);
                self.store.append(sample.cursor, Instant::now());
            }
            StrokeAction::Extend => {
                self.store.append(sample.cursor, Instant::now());
            }
            StrokeAction::Seal => {
                self.store.seal();
            }
            StrokeAction::None => {}
        }
    }

    // ── UI control boundary ──────────────────────────────────────────────

    /// Select the paint color for strokes begun from now on.  Never touches
    /// strokes already in the store, open or sealed.
    pub fn set_color(&mut self, color: u32) {
        self.color = color;
    }

    pub fn set_line_width(&mut self, width: f32) {
        self.line_width = width.max(0.01);
    }

    pub fn toggle_view_mode(&mut self) {
        self.view_mode = !self.view_mode;
        if self.view_mode && self.seal_policy == SealPolicy::SealOnEnter {
            self.store.seal();
            self.capture.reset();
        }
        tracing::info!(view_mode = self.view_mode, "view mode toggled");
    }

    // ── read access for the render cycle ─────────────────────────────────

    pub fn snapshot(&self) -> SessionView<'_> {
        SessionView {
            strokes: self.store.strokes(),
            cursor_raw: self.cursor_raw,
            hand_detected: self.hand_detected,
            drawing: self.drawing(),
            view_mode: self.view_mode,
            color: self.color,
            line_width: self.line_width,
        }
    }

    pub fn drawing(&self) -> bool {
        self.store.open_id().is_some()
    }

    pub fn view_mode(&self) -> bool {
        self.view_mode
    }

    pub fn capture_state(&self) -> CaptureState {
        self.capture.state()
    }

    pub fn strokes(&self) -> &[Stroke] {
        self.store.strokes()
    }
}

/// Read-only per-frame view of the session, consumed by the renderer.
#[derive(Clone, Copy)]
pub struct SessionView<'a> {
    pub strokes: &'a [Stroke],
    pub cursor_raw: Vec3,
    pub hand_detected: bool,
    pub drawing: bool,
    pub view_mode: bool,
    pub color: u32,
    pub line_width: f32,
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{Landmark, INDEX_TIP, LANDMARK_COUNT, THUMB_TIP};

    const CYAN: u32 = 0xFF00FFCC;
    const RED: u32 = 0xFFFF0055;

    /// A well-formed frame with the index tip at normalized (x, y, z),
    /// pinching or not.
    fn frame(x: f32, y: f32, z: f32, pinching: bool) -> LandmarkFrame {
        let mut landmarks = vec![Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];
        landmarks[INDEX_TIP] = Landmark::new(x, y, z);
        let thumb_dx = if pinching { 0.01 } else { 0.2 };
        landmarks[THUMB_TIP] = Landmark::new(x + thumb_dx, y, z);
        LandmarkFrame { landmarks }
    }

    fn session() -> Session {
        Session::new(CYAN, 0.1, SealPolicy::KeepOpen)
    }

    #[test]
    fn lost_frames_never_create_strokes() {
        let mut s = session();
        for _ in 0..5 {
            s.apply_frame(None);
        }
        assert!(s.strokes().is_empty());
        assert!(!s.drawing());
        assert_eq!(s.capture_state(), CaptureState::Idle);
    }

    #[test]
    fn open_id_nonnull_iff_drawing() {
        let mut s = session();
        assert!(!s.drawing());
        s.apply_frame(Some(&frame(0.5, 0.5, 0.0, true)));
        assert!(s.drawing());
        s.apply_frame(Some(&frame(0.4, 0.5, 0.0, false)));
        assert!(!s.drawing());
    }

    #[test]
    fn end_to_end_single_stroke() {
        // track → pinch for 3 frames moving > 0.01 world units each →
        // release: exactly one sealed 3-point stroke with pinch-start paint.
        let mut s = session();
        s.apply_frame(Some(&frame(0.50, 0.5, 0.0, false)));
        s.apply_frame(Some(&frame(0.50, 0.5, 0.0, true)));
        s.apply_frame(Some(&frame(0.48, 0.5, 0.0, true)));
        s.apply_frame(Some(&frame(0.46, 0.5, 0.0, true)));
        s.apply_frame(Some(&frame(0.46, 0.5, 0.0, false)));

        assert_eq!(s.strokes().len(), 1);
        assert!(!s.drawing());
        let stroke = &s.strokes()[0];
        assert_eq!(stroke.points.len(), 3);
        assert_eq!(stroke.color, CYAN);
        assert!((stroke.line_width - 0.1).abs() < 1e-6);
        // Insertion order follows the cursor's rightward march.
        assert!(stroke.points[0].position.x < stroke.points[1].position.x);
        assert!(stroke.points[1].position.x < stroke.points[2].position.x);
    }

    #[test]
    fn jittered_pinch_keeps_single_point() {
        // Normalized jitter of 0.0005 is < 0.01 world units; only the first
        // point survives the dedup filter.
        let mut s = session();
        s.apply_frame(Some(&frame(0.5, 0.5, 0.0, true)));
        s.apply_frame(Some(&frame(0.5005, 0.5, 0.0, true)));
        s.apply_frame(Some(&frame(0.4995, 0.5, 0.0, true)));
        assert_eq!(s.strokes()[0].points.len(), 1);
    }

    #[test]
    fn hand_loss_mid_stroke_seals() {
        let mut s = session();
        s.apply_frame(Some(&frame(0.5, 0.5, 0.0, true)));
        s.apply_frame(None);
        assert!(!s.drawing());
        assert_eq!(s.strokes().len(), 1);
        // Later frames leave the sealed stroke untouched.
        let before = s.strokes()[0].points.len();
        s.apply_frame(Some(&frame(0.3, 0.3, 0.0, false)));
        assert_eq!(s.strokes()[0].points.len(), before);
    }

    #[test]
    fn two_pinches_two_strokes() {
        let mut s = session();
        s.apply_frame(Some(&frame(0.5, 0.5, 0.0, true)));
        s.apply_frame(Some(&frame(0.5, 0.5, 0.0, false)));
        s.apply_frame(Some(&frame(0.3, 0.5, 0.0, true)));
        s.apply_frame(Some(&frame(0.3, 0.5, 0.0, false)));
        assert_eq!(s.strokes().len(), 2);
        assert_ne!(s.strokes()[0].id, s.strokes()[1].id);
    }

    #[test]
    fn mid_stroke_color_change_affects_next_stroke_only() {
        let mut s = session();
        s.apply_frame(Some(&frame(0.5, 0.5, 0.0, true)));
        s.set_color(RED);
        s.apply_frame(Some(&frame(0.4, 0.5, 0.0, true)));
        s.apply_frame(Some(&frame(0.4, 0.5, 0.0, false)));
        s.apply_frame(Some(&frame(0.3, 0.5, 0.0, true)));
        assert_eq!(s.strokes()[0].color, CYAN);
        assert_eq!(s.strokes()[1].color, RED);
    }

    #[test]
    fn keep_open_policy_survives_view_mode_round_trip() {
        let mut s = session();
        s.apply_frame(Some(&frame(0.5, 0.5, 0.0, true)));
        assert!(s.drawing());

        s.toggle_view_mode();
        // Frames during view mode are ignored; the stroke stays open.
        s.apply_frame(Some(&frame(0.4, 0.5, 0.0, false)));
        assert!(s.drawing());
        assert!(!s.snapshot().hand_detected);

        s.toggle_view_mode();
        // Pinch still held: the same stroke keeps extending.
        s.apply_frame(Some(&frame(0.4, 0.5, 0.0, true)));
        assert_eq!(s.strokes().len(), 1);
        assert_eq!(s.strokes()[0].points.len(), 2);
    }

    #[test]
    fn seal_on_enter_policy_seals_open_stroke() {
        let mut s = Session::new(CYAN, 0.1, SealPolicy::SealOnEnter);
        s.apply_frame(Some(&frame(0.5, 0.5, 0.0, true)));
        assert!(s.drawing());
        s.toggle_view_mode();
        assert!(!s.drawing());
        s.toggle_view_mode();
        // A held pinch after returning begins a fresh stroke.
        s.apply_frame(Some(&frame(0.4, 0.5, 0.0, true)));
        assert_eq!(s.strokes().len(), 2);
    }

    #[test]
    fn cursor_holds_last_position_through_loss() {
        let mut s = session();
        s.apply_frame(Some(&frame(0.25, 0.5, 0.0, false)));
        let held = s.snapshot().cursor_raw;
        s.apply_frame(None);
        assert_eq!(s.snapshot().cursor_raw, held);
        assert!(!s.snapshot().hand_detected);
    }
}
