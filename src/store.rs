//! Stroke data model and the append-only stroke store.
//!
//! The store is the single source of truth the render cycle reads.  Strokes
//! append in draw order and are never reordered or deleted; an open stroke's
//! point list only grows, and a sealed stroke is immutable.  The open stroke
//! is reached through a stored index, never a scan.

use std::time::Instant;

use glam::Vec3;

/// Candidate points closer than this (world units) to the open stroke's last
/// accepted point are discarded — suppresses jitter-induced micro-segments.
pub const MIN_POINT_SPACING: f32 = 0.01;

// ════════════════════════════════════════════════════════════════════════════
// StrokeId
// ════════════════════════════════════════════════════════════════════════════

/// Unique per-session stroke identifier, issued monotonically by the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StrokeId(pub u64);

// ════════════════════════════════════════════════════════════════════════════
// StrokePoint / Stroke
// ════════════════════════════════════════════════════════════════════════════

/// One captured cursor position.  Immutable once created.
#[derive(Clone, Copy, Debug)]
pub struct StrokePoint {
    pub position: Vec3,
    pub timestamp: Instant,
}

/// One continuous drawing gesture.  Color and line width are fixed at
/// creation from whatever the palette selection was at pinch-start;
/// mid-stroke palette changes never alter an in-progress stroke.
#[derive(Clone, Debug)]
pub struct Stroke {
    pub id: StrokeId,
    pub points: Vec<StrokePoint>,
    /// Packed ARGB (0xAARRGGBB).
    pub color: u32,
    pub line_width: f32,
}

impl Stroke {
    /// Positions only, in insertion order — what the geometry generator eats.
    pub fn positions(&self) -> Vec<Vec3> {
        self.points.iter().map(|p| p.position).collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// StrokeStore
// ════════════════════════════════════════════════════════════════════════════

/// Ordered, append-only collection of strokes.  At most one stroke is open
/// (receiving points) at a time.
#[derive(Debug, Default)]
pub struct StrokeStore {
    strokes: Vec<Stroke>,
    /// Index of the open stroke, if any.  `Some` iff drawing.
    open: Option<usize>,
    next_id: u64,
}

impl StrokeStore {
    pub fn new() -> Self {
        StrokeStore::default()
    }

    /// Create a new stroke with the given paint settings, append it, and mark
    /// it open.  Any previously open stroke is sealed first (single-open
    /// invariant).
    pub fn begin(&mut self, color: u32, line_width: f32) -> StrokeId {
        if self.open.is_some() {
            tracing::warn!("begin with a stroke already open — sealing it");
            self.seal();
        }
        let id = StrokeId(self.next_id);
        self.next_id += 1;
        self.strokes.push(Stroke {
            id,
            points: Vec::new(),
            color,
            line_width,
        });
        self.open = Some(self.strokes.len() - 1);
        tracing::info!(id = id.0, "stroke begun");
        id
    }

    /// Attempt to append a point to the open stroke.
    ///
    /// Returns `true` when the point was accepted.  `false` means either no
    /// stroke is open (a no-op, never fatal) or the candidate fell within
    /// [`MIN_POINT_SPACING`] of the last accepted point and was discarded.
    /// The first point of a stroke is always accepted.
    pub fn append(&mut self, position: Vec3, timestamp: Instant) -> bool {
        let Some(idx) = self.open else {
            tracing::warn!("point append with no open stroke — ignored");
            return false;
        };
        let stroke = &mut self.strokes[idx];
        if let Some(last) = stroke.points.last() {
            if last.position.distance(position) < MIN_POINT_SPACING {
                tracing::debug!(id = stroke.id.0, "point within dedup radius — discarded");
                return false;
            }
        }
        stroke.points.push(StrokePoint {
            position,
            timestamp,
        });
        true
    }

    /// Seal the open stroke.  Idempotent: sealing with nothing open is a
    /// no-op.  Returns the id of the stroke that was sealed.
    pub fn seal(&mut self) -> Option<StrokeId> {
        let idx = self.open.take()?;
        let id = self.strokes[idx].id;
        tracing::info!(id = id.0, points = self.strokes[idx].points.len(), "stroke sealed");
        Some(id)
    }

    /// Full stroke list in draw order.
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// Id of the currently open stroke, if any.
    pub fn open_id(&self) -> Option<StrokeId> {
        self.open.map(|i| self.strokes[i].id)
    }

    /// The open stroke itself.
    pub fn open_stroke(&self) -> Option<&Stroke> {
        self.open.map(|i| &self.strokes[i])
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
