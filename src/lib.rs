//! Chalkline is a step-driven schematic animation engine.
//!
//! It replays an ordered list of abstract animation steps (create,
//! transform, connect, or highlight a labeled shape) into a scene model and
//! draws each state as a deterministic CPU-rendered RGBA frame.
//!
//! # Pipeline overview
//!
//! 1. **Parse**: a JSON step script ([`ScriptDoc`]) from an upstream
//!    generator, deserialized leniently (malformed fields degrade to
//!    defaults, never to parse failures)
//! 2. **Interpret**: [`apply_step`] folds one step into the [`SceneModel`];
//!    unknown actions and dangling references are no-ops by contract
//! 3. **Play**: [`Player`] sequences steps on wall-clock deadlines with
//!    explicit start/stop/completion semantics
//! 4. **Render**: [`CpuRenderer`] draws a model snapshot plus the current
//!    step's caption to premultiplied RGBA8 pixels
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Nothing in the core is fatal**: a malformed or partially-invalid step
//!   script degrades to a visibly incomplete but non-crashing animation.
//! - **Deterministic rendering**: identical (model, step index) inputs
//!   produce identical pixels.
//! - **Host-agnostic timing**: the player owns a single armed deadline and
//!   consumes injected instants, so any UI loop (or a headless test) can
//!   drive it.
#![forbid(unsafe_code)]

pub mod core;
pub mod error;
pub mod interp;
pub mod player;
pub mod render;
pub mod render_cpu;
pub mod scene;
pub mod script;
mod text;

pub use crate::core::{
    COLOR_BACKGROUND, COLOR_CONNECTION, COLOR_GRID, COLOR_HIGHLIGHT, COLOR_INK, COLOR_LABEL,
    Canvas, DEFAULT_POSITION, PALETTE, Point, Rgba8, Vec2,
};
pub use error::{ChalklineError, ChalklineResult};
pub use interp::{apply_step, model_at};
pub use player::{Phase, PlaybackEvent, Player};
pub use render::{ConnectionStyle, FrameRGBA, RenderSettings, Renderer};
pub use render_cpu::CpuRenderer;
pub use scene::{ElementStyle, SceneElement, SceneModel};
pub use script::{Action, AnimationStep, ScriptDoc, Shape, StepProps, fallback_steps};
