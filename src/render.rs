use crate::core::{COLOR_BACKGROUND, Canvas};
use crate::error::ChalklineResult;
use crate::scene::SceneModel;
use crate::script::AnimationStep;

/// One rendered frame.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

/// How connections are drawn. The two styles observed across hosts: a solid
/// line with an arrowhead at the target, or a heavier dashed line with no
/// head.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionStyle {
    #[default]
    Arrow,
    Dashed,
}

#[derive(Clone, Debug)]
pub struct RenderSettings {
    pub canvas: Canvas,
    pub background_rgba: [u8; 4],
    /// Spacing of the cosmetic background grid; `None` disables it.
    pub grid_spacing_px: Option<f64>,
    pub connection_style: ConnectionStyle,
    /// Font for labels and captions. Fonts are external IO the host
    /// front-loads; without one the frame renders textless.
    pub font_bytes: Option<Vec<u8>>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            background_rgba: COLOR_BACKGROUND.to_array(),
            grid_spacing_px: Some(50.0),
            connection_style: ConnectionStyle::Arrow,
            font_bytes: None,
        }
    }
}

/// Draws one scene snapshot plus the current step's caption. Deterministic
/// and idempotent: identical inputs must produce identical pixels, and
/// inputs are never mutated.
pub trait Renderer {
    fn render(
        &mut self,
        model: &SceneModel,
        steps: &[AnimationStep],
        current_step: usize,
    ) -> ChalklineResult<FrameRGBA>;
}
