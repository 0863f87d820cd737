//! Software-rendered canvas window using `minifb`.
//!
//! The window doubles as the simulated sensor: in draw mode the pointer is
//! the index fingertip and the held left button is the pinch, forwarded to
//! the [`SimFrameSource`](crate::source::SimFrameSource) over a channel.  In
//! view mode the pointer orbits the camera instead and no hand input is sent.
//!
//! Rendering is a painter's-algorithm pass over every stroke's tube mesh:
//! triangles are projected, depth-sorted far-to-near, and flat-shaded against
//! a fixed directional light.  The HUD shows the palette, mode, and a status
//! line.

use std::sync::mpsc::Sender;

use glam::Vec3;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use crate::geometry::GeometryCache;
use crate::session::SessionView;
use crate::source::SimInput;

// ════════════════════════════════════════════════════════════════════════════
// Layout and camera constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W: usize = 960;
pub const WIN_H: usize = 540;

const BG_COLOR: u32 = 0xFF050505;
const HUD_TEXT: u32 = 0xFFBBBBBB;
const HUD_DIM: u32 = 0xFF666666;
const CURSOR_TRACKING: u32 = 0xFFFFFFFF;

const PALETTE_SWATCH: usize = 26;
const PALETTE_GAP: usize = 8;

/// Draw-mode camera distance from the origin.
const CAMERA_RADIUS: f32 = 8.0;
const NEAR_PLANE: f32 = 0.1;
/// Vertical field of view, radians (~60°).
const FOV_Y: f32 = 1.05;

/// Fixed directional light for flat shading.
const LIGHT_DIR: Vec3 = Vec3::new(0.45, 0.6, 0.66);

const ORBIT_SENSITIVITY: f32 = 0.01;
const ORBIT_RADIUS_RANGE: (f32, f32) = (3.0, 20.0);
/// Simulated hand depth nudge per W/S key repeat.
const DEPTH_STEP: f32 = 0.05;

// ════════════════════════════════════════════════════════════════════════════
// UiCommand — the control boundary back to the session
// ════════════════════════════════════════════════════════════════════════════

/// UI actions polled from the window, applied by the app loop as plain
/// session-state setters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UiCommand {
    /// Palette slot selection (keys 1–5).
    SelectColor(usize),
    ToggleViewMode,
    /// Line-width nudge for strokes begun from now on.
    WidthDelta(f32),
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// OrbitCamera
// ════════════════════════════════════════════════════════════════════════════

/// Spherical orbit around the origin.  Draw mode pins yaw/pitch at zero,
/// which puts the eye on +z looking down the −z axis.
#[derive(Clone, Copy, Debug)]
struct OrbitCamera {
    yaw: f32,
    pitch: f32,
    radius: f32,
}

impl OrbitCamera {
    fn front() -> Self {
        OrbitCamera {
            yaw: 0.0,
            pitch: 0.0,
            radius: CAMERA_RADIUS,
        }
    }

    fn eye(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        self.radius * Vec3::new(cp * sy, sp, cp * cy)
    }

    /// Orthonormal view basis: forward toward the origin, right, up.
    fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let fwd = (-self.eye()).normalize();
        let right = fwd.cross(Vec3::Y).try_normalize().unwrap_or(Vec3::X);
        let up = right.cross(fwd);
        (fwd, right, up)
    }

    /// Project a world point to (screen x, screen y, camera-space depth).
    fn project(&self, p: Vec3) -> Option<(f32, f32, f32)> {
        let (fwd, right, up) = self.basis();
        let d = p - self.eye();
        let z = d.dot(fwd);
        if z < NEAR_PLANE {
            return None;
        }
        let focal = (WIN_H as f32 / 2.0) / (FOV_Y / 2.0).tan();
        let sx = WIN_W as f32 / 2.0 + focal * d.dot(right) / z;
        let sy = WIN_H as f32 / 2.0 - focal * d.dot(up) / z;
        Some((sx, sy, z))
    }

    fn focal(&self) -> f32 {
        (WIN_H as f32 / 2.0) / (FOV_Y / 2.0).tan()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf: Vec<u32>,
    sim_tx: Sender<SimInput>,
    palette: [u32; 5],
    orbit: OrbitCamera,
    /// Last pointer position while orbit-dragging, window pixels.
    drag_anchor: Option<(f32, f32)>,
    /// Scratch list of projected triangles, reused across frames.
    tri_queue: Vec<(f32, [(f32, f32); 3], u32)>,
}

impl Visualizer {
    pub fn new(sim_tx: Sender<SimInput>, palette: [u32; 5]) -> Result<Self, minifb::Error> {
        let mut window = Window::new(
            "Air Canvas — pinch to draw",
            WIN_W,
            WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;
        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            sim_tx,
            palette,
            orbit: OrbitCamera::front(),
            drag_anchor: None,
            tri_queue: Vec::new(),
        })
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    // ── input ─────────────────────────────────────────────────────────────

    /// Poll the window: UI keys become [`UiCommand`]s, pointer state becomes
    /// simulated hand input (draw mode) or orbit control (view mode).
    /// Returns false when the window should close.
    pub fn poll_input(&mut self, view_mode: bool, commands: &mut Vec<UiCommand>) -> bool {
        if !self.window.is_open() {
            return false;
        }

        let one_shot = |w: &Window, k: Key| w.is_key_pressed(k, KeyRepeat::No);
        let held = |w: &Window, k: Key| w.is_key_pressed(k, KeyRepeat::Yes);

        if one_shot(&self.window, Key::Q) {
            commands.push(UiCommand::Quit);
            return false;
        }
        if one_shot(&self.window, Key::V) {
            commands.push(UiCommand::ToggleViewMode);
        }
        for (i, key) in [Key::Key1, Key::Key2, Key::Key3, Key::Key4, Key::Key5]
            .into_iter()
            .enumerate()
        {
            if one_shot(&self.window, key) {
                commands.push(UiCommand::SelectColor(i));
            }
        }
        if held(&self.window, Key::LeftBracket) {
            commands.push(UiCommand::WidthDelta(-0.02));
        }
        if held(&self.window, Key::RightBracket) {
            commands.push(UiCommand::WidthDelta(0.02));
        }

        if view_mode {
            self.poll_orbit();
        } else {
            self.drag_anchor = None;
            self.poll_hand(held(&self.window, Key::W), held(&self.window, Key::S));
        }

        true
    }

    /// Draw mode: pointer → index fingertip, left button → pinch.
    fn poll_hand(&mut self, closer: bool, further: bool) {
        match self.window.get_mouse_pos(MouseMode::Discard) {
            Some((mx, my)) => {
                let _ = self.sim_tx.send(SimInput::Pointer {
                    x: mx / WIN_W as f32,
                    y: my / WIN_H as f32,
                });
                let _ = self
                    .sim_tx
                    .send(SimInput::Pinch(self.window.get_mouse_down(MouseButton::Left)));
            }
            None => {
                let _ = self.sim_tx.send(SimInput::HandLost);
            }
        }
        // Landmark depth shrinks toward the camera, so "closer" is negative.
        if closer {
            let _ = self.sim_tx.send(SimInput::DepthDelta(-DEPTH_STEP));
        }
        if further {
            let _ = self.sim_tx.send(SimInput::DepthDelta(DEPTH_STEP));
        }
    }

    /// View mode: left-drag orbits, scroll wheel zooms.
    fn poll_orbit(&mut self) {
        let pos = self.window.get_mouse_pos(MouseMode::Discard);
        if self.window.get_mouse_down(MouseButton::Left) {
            if let (Some((ax, ay)), Some((mx, my))) = (self.drag_anchor, pos) {
                self.orbit.yaw += (mx - ax) * ORBIT_SENSITIVITY;
                self.orbit.pitch =
                    (self.orbit.pitch + (my - ay) * ORBIT_SENSITIVITY).clamp(-1.4, 1.4);
            }
            self.drag_anchor = pos;
        } else {
            self.drag_anchor = None;
        }
        if let Some((_, scroll_y)) = self.window.get_scroll_wheel() {
            self.orbit.radius = (self.orbit.radius - scroll_y * 0.5)
                .clamp(ORBIT_RADIUS_RANGE.0, ORBIT_RADIUS_RANGE.1);
        }
    }

    // ── render ────────────────────────────────────────────────────────────

    /// Render one frame from the session snapshot, the smoothed cursor, and
    /// the mesh cache.
    pub fn render(
        &mut self,
        view: &SessionView<'_>,
        cursor: Vec3,
        cache: &mut GeometryCache,
        status: &str,
    ) {
        self.buf.fill(BG_COLOR);

        let camera = if view.view_mode {
            self.orbit
        } else {
            OrbitCamera::front()
        };

        // ── strokes: project, depth-sort, flat-shade ─────────────────────
        let light = LIGHT_DIR.normalize();
        let mut tris = std::mem::take(&mut self.tri_queue);
        tris.clear();

        for stroke in view.strokes {
            let Some(mesh) = cache.mesh_for(stroke) else {
                continue;
            };
            for tri in &mesh.triangles {
                let [a, b, c] = tri.map(|i| i as usize);
                let (Some(pa), Some(pb), Some(pc)) = (
                    camera.project(mesh.positions[a]),
                    camera.project(mesh.positions[b]),
                    camera.project(mesh.positions[c]),
                ) else {
                    continue;
                };
                let depth = (pa.2 + pb.2 + pc.2) / 3.0;
                let face_normal = (mesh.normals[a] + mesh.normals[b] + mesh.normals[c])
                    .try_normalize()
                    .unwrap_or(Vec3::Z);
                let shade = 0.25 + 0.75 * face_normal.dot(light).abs();
                tris.push((
                    depth,
                    [(pa.0, pa.1), (pb.0, pb.1), (pc.0, pc.1)],
                    scale_color(stroke.color, shade),
                ));
            }
        }

        // Far to near.
        tris.sort_by(|l, r| r.0.total_cmp(&l.0));
        for &(_, pts, color) in &tris {
            self.fill_triangle(pts, color);
        }
        self.tri_queue = tris;

        // ── cursor ────────────────────────────────────────────────────────
        if view.hand_detected && !view.view_mode {
            if let Some((sx, sy, z)) = camera.project(cursor) {
                let world_r = if view.drawing { 0.05 } else { 0.08 };
                let r = (camera.focal() * world_r / z).max(3.0);
                let color = if view.drawing {
                    view.color
                } else {
                    CURSOR_TRACKING
                };
                self.fill_circle(sx, sy, r + 1.5, scale_color(color, 0.35));
                self.fill_circle(sx, sy, r, color);
            }
        }

        // ── HUD ───────────────────────────────────────────────────────────
        self.draw_palette(view);
        let mode = if view.view_mode { "VIEW (ORBIT)" } else { "DRAW" };
        self.draw_label(mode, 10, 10, HUD_TEXT);
        self.draw_label(status, 10, WIN_H - 30, HUD_TEXT);
        self.draw_label(
            "MOUSE=HAND  LMB=PINCH  W/S=DEPTH  1-5=COLOR  [/]=WIDTH  V=VIEW  Q=QUIT",
            10,
            WIN_H - 14,
            HUD_DIM,
        );

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    fn draw_palette(&mut self, view: &SessionView<'_>) {
        let total = 5 * PALETTE_SWATCH + 4 * PALETTE_GAP;
        let x0 = (WIN_W - total) / 2;
        let y = WIN_H - 30 - PALETTE_SWATCH;
        let palette = self.palette;
        for (i, &color) in palette.iter().enumerate() {
            let x = x0 + i * (PALETTE_SWATCH + PALETTE_GAP);
            self.fill_rect(x, y, PALETTE_SWATCH, PALETTE_SWATCH, color);
            if color == view.color {
                self.draw_border(x, y, PALETTE_SWATCH, PALETTE_SWATCH, 0xFFFFFFFF);
                self.draw_border(x + 1, y + 1, PALETTE_SWATCH - 2, PALETTE_SWATCH - 2, 0xFFFFFFFF);
            }
        }
    }

    // ── primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(WIN_H) {
            for col in x..(x + w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for col in x..(x + w).min(WIN_W) {
            if y < WIN_H {
                self.buf[y * WIN_W + col] = color;
            }
            if y + h - 1 < WIN_H {
                self.buf[(y + h - 1) * WIN_W + col] = color;
            }
        }
        for row in y..(y + h).min(WIN_H) {
            if x < WIN_W {
                self.buf[row * WIN_W + x] = color;
            }
            if x + w - 1 < WIN_W {
                self.buf[row * WIN_W + x + w - 1] = color;
            }
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, color: u32) {
        let x0 = (cx - r).floor().max(0.0) as usize;
        let x1 = ((cx + r).ceil() as usize).min(WIN_W - 1);
        let y0 = (cy - r).floor().max(0.0) as usize;
        let y1 = ((cy + r).ceil() as usize).min(WIN_H - 1);
        let r2 = r * r;
        for py in y0..=y1 {
            for px in x0..=x1 {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.buf[py * WIN_W + px] = color;
                }
            }
        }
    }

    /// Rasterise a filled triangle by sign-consistent edge functions over its
    /// bounding box.
    fn fill_triangle(&mut self, p: [(f32, f32); 3], color: u32) {
        let edge = |a: (f32, f32), b: (f32, f32), px: f32, py: f32| {
            (b.0 - a.0) * (py - a.1) - (b.1 - a.1) * (px - a.0)
        };
        let area = edge(p[0], p[1], p[2].0, p[2].1);
        if area.abs() < 1e-6 {
            return;
        }

        let min_x = p.iter().map(|q| q.0).fold(f32::MAX, f32::min).floor().max(0.0) as usize;
        let max_x = (p.iter().map(|q| q.0).fold(f32::MIN, f32::max).ceil() as isize)
            .clamp(0, WIN_W as isize - 1) as usize;
        let min_y = p.iter().map(|q| q.1).fold(f32::MAX, f32::min).floor().max(0.0) as usize;
        let max_y = (p.iter().map(|q| q.1).fold(f32::MIN, f32::max).ceil() as isize)
            .clamp(0, WIN_H as isize - 1) as usize;
        if min_x > max_x || min_y > max_y {
            return;
        }

        for py in min_y..=max_y {
            for px in min_x..=max_x {
                let (fx, fy) = (px as f32 + 0.5, py as f32 + 0.5);
                let w0 = edge(p[1], p[2], fx, fy);
                let w1 = edge(p[2], p[0], fx, fy);
                let w2 = edge(p[0], p[1], fx, fy);
                let inside = if area > 0.0 {
                    w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0
                } else {
                    w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0
                };
                if inside {
                    self.set_pixel(px, py, color);
                }
            }
        }
    }

    /// Minimal bitmap font — 3×5 characters for HUD labels.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.set_pixel(cx + col, y + row, color);
                    }
                }
            }
            cx += 4; // 3 wide + 1 gap
            if cx + 4 > WIN_W {
                break;
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c.to_ascii_uppercase() {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '[' => [0b011, 0b010, 0b010, 0b010, 0b011],
        ']' => [0b110, 0b010, 0b010, 0b010, 0b110],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _ => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

/// Scale the RGB channels of a packed ARGB color, alpha forced opaque.
fn scale_color(argb: u32, f: f32) -> u32 {
    let f = f.clamp(0.0, 1.0);
    let scale = |c: u32| ((c as f32 * f) as u32).min(255);
    let r = scale((argb >> 16) & 0xFF);
    let g = scale((argb >> 8) & 0xFF);
    let b = scale(argb & 0xFF);
    0xFF000000 | (r << 16) | (g << 8) | b
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn front_camera_centres_the_origin() {
        let cam = OrbitCamera::front();
        let (sx, sy, z) = cam.project(Vec3::ZERO).unwrap();
        assert!((sx - WIN_W as f32 / 2.0).abs() < 1e-3);
        assert!((sy - WIN_H as f32 / 2.0).abs() < 1e-3);
        assert!((z - CAMERA_RADIUS).abs() < 1e-3);
    }

    #[test]
    fn world_right_projects_right_of_centre() {
        let cam = OrbitCamera::front();
        let (sx, _, _) = cam.project(Vec3::new(2.0, 0.0, 0.0)).unwrap();
        assert!(sx > WIN_W as f32 / 2.0);
    }

    #[test]
    fn world_up_projects_above_centre() {
        let cam = OrbitCamera::front();
        let (_, sy, _) = cam.project(Vec3::new(0.0, 2.0, 0.0)).unwrap();
        assert!(sy < WIN_H as f32 / 2.0);
    }

    #[test]
    fn points_behind_the_eye_are_culled() {
        let cam = OrbitCamera::front();
        assert!(cam.project(Vec3::new(0.0, 0.0, CAMERA_RADIUS + 1.0)).is_none());
    }

    #[test]
    fn closer_points_have_smaller_depth() {
        let cam = OrbitCamera::front();
        let (_, _, near) = cam.project(Vec3::new(0.0, 0.0, 3.0)).unwrap();
        let (_, _, far) = cam.project(Vec3::new(0.0, 0.0, -3.0)).unwrap();
        assert!(near < far);
    }

    #[test]
    fn orbit_eye_stays_on_its_sphere() {
        let cam = OrbitCamera {
            yaw: 1.2,
            pitch: -0.6,
            radius: 11.0,
        };
        assert!((cam.eye().length() - 11.0).abs() < 1e-4);
    }

    #[test]
    fn scale_color_dims_channels_and_keeps_alpha() {
        let dimmed = scale_color(0xFF80FF40, 0.5);
        assert_eq!(dimmed >> 24, 0xFF);
        assert_eq!((dimmed >> 16) & 0xFF, 0x40);
        assert_eq!((dimmed >> 8) & 0xFF, 0x7F);
    }

    #[test]
    fn glyphs_fit_three_columns() {
        for c in "ABCXYZ0129=[]/-.: ".chars() {
            for row in char_glyph(c) {
                assert!(row <= 0b111);
            }
        }
    }
}
