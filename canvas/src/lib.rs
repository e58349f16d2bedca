//! Canvas renderer for the trip planning whiteboard.
//!
//! This crate is compiled to WebAssembly and runs in the browser, but every
//! piece except [`web`] is plain Rust and runs headless too. It reads
//! immutable [`editor::EditorState`] snapshots, projects them into a
//! [`scene::RenderScene`], and paints three layered surfaces: a static grid
//! background, the main layer with blocks and connectors, and an overlay with
//! the selection. The renderer never mutates the document; drag previews are
//! a transient offset layered on top of the committed geometry.
//!
//! Redraws are incremental. Drag previews report the world rectangles they
//! touch to a [`dirty::DirtyTracker`], and the next frame clips the main layer
//! to the padded union of those rectangles instead of repainting everything.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`renderer`] | Layered renderer, hit-testing and drag preview |
//! | [`scene`] | Projection of a document into render primitives and styles |
//! | [`spatial`] | Uniform grid broad phase for hit-testing |
//! | [`dirty`] | Pending repaint regions |
//! | [`preview`] | Drag preview session state |
//! | [`render`] | Draw routines for each layer |
//! | [`surface`] | Drawing surface trait and the recording surface |
//! | [`web`] | `web-sys` canvas surface and the `wasm-bindgen` entry point |
//! | [`stats`] | Frame timing and coverage telemetry |
//! | [`camera`] | Viewport transform between world and screen space |
//! | [`geom`] | Points and axis-aligned rectangles |
//! | [`consts`] | Shared numeric constants (cell size, paddings, dashes) |

pub mod camera;
pub mod consts;
pub mod dirty;
pub mod geom;
pub mod preview;
pub mod render;
pub mod renderer;
pub mod scene;
pub mod spatial;
pub mod stats;
pub mod surface;
pub mod web;

pub use renderer::{RenderError, Renderer, RendererConfig};
pub use stats::RenderStats;
pub use surface::{DrawOp, RecordingSurface, Surface, SurfaceError};
