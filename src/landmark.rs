//! Landmark frames and the frame → cursor/pinch mapper.
//!
//! A detection cycle hands us one [`LandmarkFrame`] (or nothing when no hand
//! is visible).  [`map_frame`] reduces it to a [`HandSample`]: a world-space
//! cursor position plus the detected/pinching booleans that drive the capture
//! state machine.  Sensing gaps are never errors — anything malformed maps to
//! `detected = false`.

use glam::Vec3;

// ════════════════════════════════════════════════════════════════════════════
// Landmark conventions
// ════════════════════════════════════════════════════════════════════════════

/// Landmark index of the thumb tip (MediaPipe hand convention).
pub const THUMB_TIP: usize = 4;
/// Landmark index of the index fingertip.
pub const INDEX_TIP: usize = 8;
/// A well-formed hand frame carries at least this many landmarks.
pub const LANDMARK_COUNT: usize = 21;

/// Thumb–index distance (normalized landmark space) below which the hand
/// counts as pinching.  Empirically tuned.
pub const PINCH_THRESHOLD: f32 = 0.05;

// World-mapping constants.  A fixed affine transform mirroring the
// horizontally-flipped camera view — a bounded interaction volume, not a
// calibrated metric mapping.
const WORLD_X_SPAN: f32 = 10.0; // x ∈ [0,1] → [−5, 5]
const WORLD_Y_SPAN: f32 = 6.0;  // y ∈ [0,1] → [−3, 3]
/// Scale on the relative landmark depth.  Tunable, no calibration step;
/// negative landmark z (closer to camera) maps toward the viewer (+z).
pub const DEPTH_SCALE: f32 = 5.0;

// ════════════════════════════════════════════════════════════════════════════
// Frame types
// ════════════════════════════════════════════════════════════════════════════

/// One normalized hand landmark.  `x`,`y` ∈ [0,1] relative to the camera
/// frame; `z` is depth relative to the wrist, smaller = closer to the camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Landmark { x, y, z }
    }

    /// Euclidean distance to another landmark in normalized space.
    pub fn distance(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// One detection cycle's worth of hand landmarks.
#[derive(Clone, Debug, Default)]
pub struct LandmarkFrame {
    pub landmarks: Vec<Landmark>,
}

impl LandmarkFrame {
    /// True when the frame carries the full landmark set.
    pub fn is_well_formed(&self) -> bool {
        self.landmarks.len() >= LANDMARK_COUNT
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandSample — mapper output
// ════════════════════════════════════════════════════════════════════════════

/// The mapper's per-frame verdict.  When `detected` is false the cursor field
/// is unspecified and must not be rendered.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandSample {
    pub cursor: Vec3,
    pub detected: bool,
    pub pinching: bool,
}

impl HandSample {
    /// The "nothing this cycle" sample: forces the capture machine to Idle.
    pub fn lost() -> Self {
        HandSample {
            cursor: Vec3::ZERO,
            detected: false,
            pinching: false,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// map_frame
// ════════════════════════════════════════════════════════════════════════════

/// Map one frame's landmarks to a world-space cursor and pinch signal.
///
/// Returns [`HandSample::lost`] when view mode is active, the frame is
/// absent, or the landmark list is incomplete.
pub fn map_frame(frame: Option<&LandmarkFrame>, view_mode: bool) -> HandSample {
    if view_mode {
        return HandSample::lost();
    }
    let frame = match frame {
        Some(f) if f.is_well_formed() => f,
        Some(_) => {
            tracing::warn!("dropping malformed landmark frame");
            return HandSample::lost();
        }
        None => return HandSample::lost(),
    };

    let index = &frame.landmarks[INDEX_TIP];
    let thumb = &frame.landmarks[THUMB_TIP];

    let pinching = index.distance(thumb) < PINCH_THRESHOLD;

    HandSample {
        cursor: landmark_to_world(index),
        detected: true,
        pinching,
    }
}

/// Fixed affine map from normalized landmark space to world space.
/// X and Y are mirrored to match the horizontally-flipped camera view.
pub fn landmark_to_world(lm: &Landmark) -> Vec3 {
    Vec3::new(
        (1.0 - lm.x) * WORLD_X_SPAN - WORLD_X_SPAN / 2.0,
        (1.0 - lm.y) * WORLD_Y_SPAN - WORLD_Y_SPAN / 2.0,
        -lm.z * DEPTH_SCALE,
    )
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    /// A frame with all 21 landmarks at the wrist, then thumb/index placed.
    fn frame_with(thumb: Landmark, index: Landmark) -> LandmarkFrame {
        let mut landmarks = vec![Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];
        landmarks[THUMB_TIP] = thumb;
        landmarks[INDEX_TIP] = index;
        LandmarkFrame { landmarks }
    }

    #[test]
    fn centre_maps_to_origin() {
        let w = landmark_to_world(&Landmark::new(0.5, 0.5, 0.0));
        assert!(w.abs_diff_eq(Vec3::ZERO, 1e-6));
    }

    #[test]
    fn top_left_maps_to_far_corner() {
        let w = landmark_to_world(&Landmark::new(0.0, 0.0, 0.0));
        assert!(w.abs_diff_eq(Vec3::new(5.0, 3.0, 0.0), 1e-6));
    }

    #[test]
    fn bottom_right_near_maps_to_opposite_corner() {
        let w = landmark_to_world(&Landmark::new(1.0, 1.0, -1.0));
        assert!(w.abs_diff_eq(Vec3::new(-5.0, -3.0, 5.0), 1e-6));
    }

    #[test]
    fn close_fingers_pinch() {
        let f = frame_with(
            Landmark::new(0.50, 0.50, 0.0),
            Landmark::new(0.52, 0.50, 0.0),
        );
        let s = map_frame(Some(&f), false);
        assert!(s.detected);
        assert!(s.pinching);
    }

    #[test]
    fn spread_fingers_do_not_pinch() {
        let f = frame_with(
            Landmark::new(0.3, 0.5, 0.0),
            Landmark::new(0.6, 0.5, 0.0),
        );
        let s = map_frame(Some(&f), false);
        assert!(s.detected);
        assert!(!s.pinching);
    }

    #[test]
    fn pinch_threshold_is_exclusive() {
        // Exactly at the threshold distance: not a pinch.
        let f = frame_with(
            Landmark::new(0.5, 0.5, 0.0),
            Landmark::new(0.5 + PINCH_THRESHOLD, 0.5, 0.0),
        );
        assert!(!map_frame(Some(&f), false).pinching);
    }

    #[test]
    fn absent_frame_is_lost() {
        let s = map_frame(None, false);
        assert!(!s.detected);
        assert!(!s.pinching);
    }

    #[test]
    fn short_landmark_list_is_lost() {
        let f = LandmarkFrame {
            landmarks: vec![Landmark::new(0.5, 0.5, 0.0); 5],
        };
        assert!(!map_frame(Some(&f), false).detected);
    }

    #[test]
    fn view_mode_suppresses_detection() {
        let f = frame_with(
            Landmark::new(0.5, 0.5, 0.0),
            Landmark::new(0.51, 0.5, 0.0),
        );
        let s = map_frame(Some(&f), true);
        assert!(!s.detected);
        assert!(!s.pinching);
    }

    #[test]
    fn cursor_tracks_index_tip_not_thumb() {
        let f = frame_with(
            Landmark::new(0.9, 0.9, 0.0),
            Landmark::new(0.25, 0.5, 0.0),
        );
        let s = map_frame(Some(&f), false);
        assert!(s.cursor.abs_diff_eq(Vec3::new(2.5, 0.0, 0.0), 1e-6));
    }
}
