//! Top-level application wiring.
//!
//! `run()` spawns the frame source on its own thread, owns the session and
//! the window on the main thread, and drives the detect/draw/render loop:
//! poll window input → apply UI commands → drain landmark frames → smooth the
//! cursor → render.  Frames arrive at the source's cadence; rendering runs at
//! ~60 fps regardless.

use std::sync::mpsc::{self, TryRecvError};
use std::time::Duration;

use thiserror::Error;

use crate::cursor::CursorSmoother;
use crate::geometry::GeometryCache;
use crate::session::{SealPolicy, Session};
#[cfg(not(feature = "leap"))]
use crate::source::SimFrameSource;
use crate::source::{spawn_frame_source, FrameEvent, SimInput};
use crate::visualizer::{UiCommand, Visualizer};

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Configuration for the full application.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Five-slot paint palette, packed ARGB.
    pub palette: [u32; 5],
    /// Palette slot selected at startup.
    pub start_color: usize,
    /// Tube radius for new strokes, world units.
    pub line_width: f32,
    /// What toggling into view mode does to an open stroke.
    pub seal_policy: SealPolicy,
    /// Detection cadence of the simulated sensor.
    pub detect_hz: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            // Neon palette: red, cyan, lime, purple, white.
            palette: [0xFFFF0055, 0xFF00FFCC, 0xFFCCFF00, 0xFFAA00FF, 0xFFFFFFFF],
            start_color: 1,
            line_width: 0.1,
            seal_policy: SealPolicy::KeepOpen,
            detect_hz: 30,
        }
    }
}

impl AppConfig {
    pub fn detect_period(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.detect_hz.max(1) as f32)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppError
// ════════════════════════════════════════════════════════════════════════════

/// Failures at the outer boundary.  Sensing gaps are not errors and never
/// surface here.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to open window: {0}")]
    Window(#[from] minifb::Error),
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// This is the entry point called from `main.rs`.  It creates the visualizer,
/// the frame source (simulation by default, hardware with `--features leap`),
/// and drives the capture/render loop until the window closes.
pub fn run(cfg: AppConfig) -> Result<(), AppError> {
    // ── sim hand channel ──────────────────────────────────────────────────
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();

    #[cfg(not(feature = "leap"))]
    let frame_rx = spawn_frame_source(SimFrameSource {
        rx: sim_rx,
        period: cfg.detect_period(),
    });
    #[cfg(feature = "leap")]
    let frame_rx = {
        // Hardware mode: the window pointer is not a hand.
        drop(sim_rx);
        spawn_frame_source(crate::source::LeapFrameSource)
    };

    // ── visualizer (owns the window and the sim input sender) ────────────
    let mut vis = Visualizer::new(sim_tx, cfg.palette)?;

    // ── session state ─────────────────────────────────────────────────────
    let mut session = Session::new(
        cfg.palette[cfg.start_color.min(cfg.palette.len() - 1)],
        cfg.line_width,
        cfg.seal_policy,
    );
    let mut smoother = CursorSmoother::new();
    let mut cache = GeometryCache::new();
    let mut commands: Vec<UiCommand> = Vec::new();
    let mut source_live = true;

    // ── main loop ─────────────────────────────────────────────────────────
    while vis.is_open() {
        // 1. Poll window input → UI commands + simulated hand state.
        commands.clear();
        if !vis.poll_input(session.view_mode(), &mut commands) {
            break;
        }
        for cmd in commands.drain(..) {
            match cmd {
                UiCommand::SelectColor(i) => {
                    if let Some(&c) = cfg.palette.get(i) {
                        session.set_color(c);
                    }
                }
                UiCommand::ToggleViewMode => session.toggle_view_mode(),
                UiCommand::WidthDelta(d) => {
                    let w = session.snapshot().line_width;
                    session.set_line_width(w + d);
                }
                UiCommand::Quit => return Ok(()),
            }
        }

        // 2. Drain detection cycles.  A dead source halts capture but the
        //    canvas stays up; an open stroke simply stays open.
        loop {
            match frame_rx.try_recv() {
                Ok(FrameEvent::Frame(frame)) => session.apply_frame(Some(&frame)),
                Ok(FrameEvent::Lost) => session.apply_frame(None),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if source_live {
                        tracing::info!("frame source stopped — capture halted");
                        source_live = false;
                    }
                    break;
                }
            }
        }

        // 3. Render from a consistent snapshot.
        let view = session.snapshot();
        let cursor = smoother.tick(view.cursor_raw);
        let status = format!(
            "STROKES: {}  WIDTH: {:.2}{}",
            view.strokes.len(),
            view.line_width,
            if view.drawing { "  DRAWING" } else { "" },
        );
        vis.render(&view, cursor, &mut cache, &status);
    }

    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
