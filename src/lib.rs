//! Headless perf lab for the trip board editor and canvas renderer.
//!
//! | Module | Role |
//! |--------|------|
//! | [`scenarios`] | Synthetic boards (`grid-1k`, `grid-3k`, `cluster-5k`) |
//! | [`actions`] | Per-frame drivers: idle, pan, zoom, batch drag, drag preview |
//! | [`lab`] | Frame loop, timing metrics and the [`lab::LabReport`] |
//! | [`config`] | CLI flags with `TRIPBOARD_*` environment fallbacks |

pub mod actions;
pub mod config;
pub mod lab;
pub mod scenarios;
