//! # air_canvas
//!
//! Pinch-to-draw spatial sketching: per-frame hand landmarks become a
//! smoothed 3D cursor and a pinch signal, pinches become ordered point
//! sequences, and point sequences become Catmull-Rom swept tube meshes
//! rendered in a software framebuffer.
//!
//! ## Gesture → action mapping
//!
//! | Gesture | Action |
//! |---|---|
//! | Pinch index + thumb | Begin a stroke at the cursor |
//! | Move while pinched | Extend the stroke (jitter-deduped) |
//! | Release pinch | Seal the stroke — it is immutable from then on |
//! | Move hand closer/further | Draw in depth |
//! | Hand leaves the frame | Cursor hidden; an open stroke is sealed |
//!
//! ## Pipeline
//!
//! A frame source publishes [`source::FrameEvent`]s over a channel at its own
//! cadence.  The main loop maps each frame ([`landmark::map_frame`]), steps
//! the capture machine ([`capture::Capture`]), and mutates the store
//! ([`store::StrokeStore`]) — all on one thread, so the render pass always
//! reads a consistent [`session::SessionView`].  The render loop runs at
//! ~60 fps independent of the detection rate; [`cursor::CursorSmoother`]
//! bridges the two.
//!
//! ## Feature flags
//!
//! * (default) — **Simulation mode**: the window pointer drives the hand.
//! * `leap` — **Hardware mode**: real hand tracking via a LeapMotion
//!   controller (requires the LeapC shared library).
//!
//! ### Simulation controls
//!
//! | Input | Meaning |
//! |---|---|
//! | Mouse move | Hand position |
//! | Hold left button | Pinch |
//! | `W` / `S` | Hand closer / further |
//! | `1`–`5` | Palette color |
//! | `[` / `]` | Line width |
//! | `V` | Toggle view (orbit) mode — drag to orbit, scroll to zoom |
//! | `Q` | Quit |

pub mod app;
pub mod capture;
pub mod cursor;
pub mod geometry;
pub mod landmark;
pub mod session;
pub mod source;
pub mod store;
pub mod visualizer;
