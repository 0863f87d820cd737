//! Tube geometry generation.
//!
//! A stroke's sparse, ordered points become a smooth renderable surface in
//! two steps: a uniform Catmull-Rom spline interpolates the points as control
//! points in insertion order, then a circular cross-section is swept along
//! the sampled curve using parallel-transported frames (so the tube doesn't
//! twist at curvature sign changes).  The sweep is open — no end caps.
//!
//! Generation is a pure function of (points, radius): identical inputs yield
//! an identical mesh.  Strokes with fewer than two points produce no
//! geometry; that is a degenerate input, not an error.

use std::collections::HashMap;

use glam::{Quat, Vec3};

use crate::store::{Stroke, StrokeId};

/// Longitudinal curve segments generated per control point.  Scales with
/// point count so long strokes stay smooth.
pub const SEGMENTS_PER_POINT: usize = 6;
/// Radial subdivisions per cross-section ring.
pub const RADIAL_SEGMENTS: usize = 8;

// ════════════════════════════════════════════════════════════════════════════
// TubeMesh
// ════════════════════════════════════════════════════════════════════════════

/// An indexed triangle mesh with per-vertex normals.
#[derive(Clone, Debug, PartialEq)]
pub struct TubeMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
}

impl TubeMesh {
    /// Number of longitudinal segments (rings − 1).
    pub fn segment_count(&self) -> usize {
        (self.positions.len() / RADIAL_SEGMENTS).saturating_sub(1)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Catmull-Rom sampling
// ════════════════════════════════════════════════════════════════════════════

/// Uniform Catmull-Rom basis for one segment, `t` ∈ [0,1].
fn catmull_rom(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}

/// Sample the spline through `points` at `count + 1` evenly spaced parameter
/// values.  Endpoints are duplicated as phantom controls so the curve passes
/// through the first and last point exactly.
fn sample_spline(points: &[Vec3], count: usize) -> Vec<Vec3> {
    let n = points.len();
    debug_assert!(n >= 2 && count >= 1);
    let last_seg = n - 2;

    (0..=count)
        .map(|i| {
            let u = i as f32 / count as f32 * (n - 1) as f32;
            let seg = (u as usize).min(last_seg);
            let t = u - seg as f32;
            let p0 = points[seg.saturating_sub(1)];
            let p1 = points[seg];
            let p2 = points[seg + 1];
            let p3 = points[(seg + 2).min(n - 1)];
            catmull_rom(p0, p1, p2, p3, t)
        })
        .collect()
}

/// Unit tangents along the sampled curve, by central differences.  Degenerate
/// (zero-length) differences inherit the previous tangent.
fn tangents(samples: &[Vec3]) -> Vec<Vec3> {
    let n = samples.len();
    let mut out = Vec::with_capacity(n);
    let mut prev = Vec3::Z;
    for i in 0..n {
        let lo = i.saturating_sub(1);
        let hi = (i + 1).min(n - 1);
        let d = samples[hi] - samples[lo];
        let t = if d.length_squared() > 1e-12 {
            d.normalize()
        } else {
            prev
        };
        out.push(t);
        prev = t;
    }
    out
}

/// A unit vector perpendicular to `t`, biased away from whichever world axis
/// `t` is most parallel to.
fn perpendicular(t: Vec3) -> Vec3 {
    let axis = if t.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    t.cross(axis).normalize()
}

// ════════════════════════════════════════════════════════════════════════════
// tube_mesh
// ════════════════════════════════════════════════════════════════════════════

/// Sweep a circular cross-section of the given radius along the spline
/// through `points`.  Returns `None` for fewer than two points.
pub fn tube_mesh(points: &[Vec3], radius: f32) -> Option<TubeMesh> {
    if points.len() < 2 {
        return None;
    }

    let segments = points.len() * SEGMENTS_PER_POINT;
    let samples = sample_spline(points, segments);
    let tangents = tangents(&samples);
    let rings = samples.len();

    let mut positions = Vec::with_capacity(rings * RADIAL_SEGMENTS);
    let mut normals = Vec::with_capacity(rings * RADIAL_SEGMENTS);

    // Parallel-transport the ring frame along the curve.
    let mut normal = perpendicular(tangents[0]);
    for (i, (&centre, &tangent)) in samples.iter().zip(&tangents).enumerate() {
        if i > 0 {
            let rot = Quat::from_rotation_arc(tangents[i - 1], tangent);
            normal = rot * normal;
            // Re-orthogonalise against drift.
            normal = (normal - tangent * normal.dot(tangent))
                .try_normalize()
                .unwrap_or_else(|| perpendicular(tangent));
        }
        let binormal = tangent.cross(normal);

        for j in 0..RADIAL_SEGMENTS {
            let theta = j as f32 / RADIAL_SEGMENTS as f32 * std::f32::consts::TAU;
            let dir = theta.cos() * normal + theta.sin() * binormal;
            positions.push(centre + radius * dir);
            normals.push(dir);
        }
    }

    // Stitch consecutive rings with quads (two triangles each); the ends
    // stay open.
    let r = RADIAL_SEGMENTS as u32;
    let mut triangles = Vec::with_capacity((rings - 1) * RADIAL_SEGMENTS * 2);
    for ring in 0..(rings as u32 - 1) {
        for j in 0..r {
            let jn = (j + 1) % r;
            let a = ring * r + j;
            let b = ring * r + jn;
            let c = (ring + 1) * r + j;
            let d = (ring + 1) * r + jn;
            triangles.push([a, c, b]);
            triangles.push([b, c, d]);
        }
    }

    Some(TubeMesh {
        positions,
        normals,
        triangles,
    })
}

// ════════════════════════════════════════════════════════════════════════════
// GeometryCache
// ════════════════════════════════════════════════════════════════════════════

struct CacheEntry {
    point_count: usize,
    mesh: TubeMesh,
}

/// Per-stroke mesh cache for the render cycle.
///
/// Points are append-only and width is fixed at creation, so the point count
/// alone identifies a stroke's generation: sealed strokes tessellate once,
/// the open stroke re-tessellates on every frame a point lands.
#[derive(Default)]
pub struct GeometryCache {
    entries: HashMap<StrokeId, CacheEntry>,
}

impl GeometryCache {
    pub fn new() -> Self {
        GeometryCache::default()
    }

    /// The mesh for `stroke`, rebuilt only when its point count has changed.
    /// `None` for degenerate strokes (< 2 points).
    pub fn mesh_for(&mut self, stroke: &Stroke) -> Option<&TubeMesh> {
        let count = stroke.points.len();
        if count < 2 {
            return None;
        }
        let stale = self
            .entries
            .get(&stroke.id)
            .map_or(true, |e| e.point_count != count);
        if stale {
            let mesh = tube_mesh(&stroke.positions(), stroke.line_width)?;
            self.entries.insert(
                stroke.id,
                CacheEntry {
                    point_count: count,
                    mesh,
                },
            );
        }
        self.entries.get(&stroke.id).map(|e| &e.mesh)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StrokeStore;
    use std::time::Instant;

    fn line(n: usize) -> Vec<Vec3> {
        (0..n).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect()
    }

    #[test]
    fn degenerate_strokes_have_no_geometry() {
        assert!(tube_mesh(&[], 0.1).is_none());
        assert!(tube_mesh(&[Vec3::ZERO], 0.1).is_none());
    }

    #[test]
    fn two_points_make_a_tube() {
        let m = tube_mesh(&line(2), 0.1).unwrap();
        assert!(!m.triangles.is_empty());
        assert_eq!(m.positions.len(), m.normals.len());
    }

    #[test]
    fn segment_count_scales_with_points() {
        let m3 = tube_mesh(&line(3), 0.1).unwrap();
        let m9 = tube_mesh(&line(9), 0.1).unwrap();
        assert_eq!(m3.segment_count(), 3 * SEGMENTS_PER_POINT);
        assert_eq!(m9.segment_count(), 9 * SEGMENTS_PER_POINT);
        assert!(m9.triangles.len() > m3.triangles.len());
    }

    #[test]
    fn ring_vertex_count_matches_radial_segments() {
        let m = tube_mesh(&line(4), 0.1).unwrap();
        assert_eq!(m.positions.len() % RADIAL_SEGMENTS, 0);
    }

    #[test]
    fn generation_is_pure() {
        let pts = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.5, -0.2),
            Vec3::new(2.0, -0.3, 0.4),
        ];
        assert_eq!(tube_mesh(&pts, 0.1), tube_mesh(&pts, 0.1));
    }

    #[test]
    fn spline_passes_through_endpoints() {
        let pts = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 2.0, 0.0),
            Vec3::new(3.0, 1.0, -1.0),
        ];
        let samples = sample_spline(&pts, 12);
        assert!(samples.first().unwrap().abs_diff_eq(pts[0], 1e-5));
        assert!(samples.last().unwrap().abs_diff_eq(pts[2], 1e-5));
    }

    #[test]
    fn spline_interpolates_interior_controls() {
        let pts = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 2.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
        ];
        // With count divisible by (n−1), the middle control lands on a sample.
        let samples = sample_spline(&pts, 10);
        assert!(samples[5].abs_diff_eq(pts[1], 1e-5));
    }

    #[test]
    fn vertices_sit_at_radius_from_centreline() {
        let radius = 0.25;
        let pts = line(3);
        let m = tube_mesh(&pts, radius).unwrap();
        let samples = sample_spline(&pts, pts.len() * SEGMENTS_PER_POINT);
        for (i, p) in m.positions.iter().enumerate() {
            let centre = samples[i / RADIAL_SEGMENTS];
            assert!((p.distance(centre) - radius).abs() < 1e-4);
        }
    }

    #[test]
    fn normals_are_unit_length() {
        let m = tube_mesh(
            &[
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.5),
                Vec3::new(2.0, 0.5, -0.5),
            ],
            0.1,
        )
        .unwrap();
        for n in &m.normals {
            assert!((n.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn cache_skips_degenerate_and_rebuilds_on_growth() {
        let mut store = StrokeStore::new();
        store.begin(0xFFFFFFFF, 0.1);
        store.append(Vec3::ZERO, Instant::now());

        let mut cache = GeometryCache::new();
        assert!(cache.mesh_for(store.open_stroke().unwrap()).is_none());

        store.append(Vec3::new(1.0, 0.0, 0.0), Instant::now());
        let t2 = cache
            .mesh_for(store.open_stroke().unwrap())
            .unwrap()
            .triangles
            .len();

        store.append(Vec3::new(2.0, 0.0, 0.0), Instant::now());
        let t3 = cache
            .mesh_for(store.open_stroke().unwrap())
            .unwrap()
            .triangles
            .len();
        assert!(t3 > t2);
    }
}
