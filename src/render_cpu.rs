use vello_cpu::kurbo::{Affine, BezPath, Circle, Rect, Shape as _, Stroke};
use vello_cpu::peniko;

use crate::core::{COLOR_CONNECTION, COLOR_GRID, COLOR_HIGHLIGHT, COLOR_INK, COLOR_LABEL, Rgba8};
use crate::error::{ChalklineError, ChalklineResult};
use crate::render::{ConnectionStyle, FrameRGBA, RenderSettings, Renderer};
use crate::scene::{SceneElement, SceneModel};
use crate::script::{Action, AnimationStep, Shape};
use crate::text::{TextBrushRgba8, TextLayoutEngine, layout_size};

const SHAPE_RADIUS: f64 = 25.0;
const TRIANGLE_OFFSET: f64 = 20.0;
const OUTLINE_WIDTH: f64 = 2.0;
const HIGHLIGHT_WIDTH: f64 = 4.0;
const CONNECTION_WIDTH: f64 = 2.0;
const DASHED_WIDTH: f64 = 3.0;
const DASH_PATTERN: [f64; 2] = [5.0, 5.0];
const ARROWHEAD_LEN: f64 = 10.0;
const LABEL_SIZE_PX: f32 = 12.0;
const CAPTION_SIZE_PX: f32 = 14.0;
const CAPTION_BOTTOM_MARGIN: f64 = 15.0;

/// CPU renderer over a reusable `vello_cpu` context.
pub struct CpuRenderer {
    settings: RenderSettings,
    ctx: Option<vello_cpu::RenderContext>,
    text: TextLayoutEngine,
    font: Option<peniko::FontData>,
}

impl CpuRenderer {
    pub fn new(settings: RenderSettings) -> ChalklineResult<Self> {
        let mut text = TextLayoutEngine::new();
        let font = match &settings.font_bytes {
            Some(bytes) => {
                text.set_font(bytes)?;
                Some(peniko::FontData::new(peniko::Blob::from(bytes.clone()), 0))
            }
            None => None,
        };

        Ok(Self {
            settings,
            ctx: None,
            text,
            font,
        })
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut Self, &mut vello_cpu::RenderContext) -> ChalklineResult<R>,
    ) -> ChalklineResult<R> {
        let mut ctx = match self.ctx.take() {
            None => vello_cpu::RenderContext::new(width, height),
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            Some(_) => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(self, &mut ctx)?;
        self.ctx = Some(ctx);
        Ok(out)
    }

    fn draw_grid(ctx: &mut vello_cpu::RenderContext, spacing: f64, w: f64, h: f64) {
        ctx.set_paint(paint(COLOR_GRID));
        let mut x = spacing;
        while x < w {
            ctx.fill_rect(&Rect::new(x - 0.5, 0.0, x + 0.5, h));
            x += spacing;
        }
        let mut y = spacing;
        while y < h {
            ctx.fill_rect(&Rect::new(0.0, y - 0.5, w, y + 0.5));
            y += spacing;
        }
    }

    fn draw_element(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        element: &SceneElement,
        highlighted: bool,
    ) -> ChalklineResult<()> {
        let path = shape_path(element.style.shape, element.position);

        ctx.set_transform(Affine::IDENTITY);
        ctx.set_paint(paint(element.style.color));
        ctx.fill_path(&path);

        ctx.set_paint(paint(COLOR_INK));
        ctx.set_stroke(Stroke::new(OUTLINE_WIDTH));
        ctx.stroke_path(&path);

        if highlighted {
            ctx.set_paint(paint(COLOR_HIGHLIGHT));
            ctx.set_stroke(Stroke::new(HIGHLIGHT_WIDTH));
            ctx.stroke_path(&path);
        }

        self.draw_text_centered(
            ctx,
            &element.name,
            LABEL_SIZE_PX,
            COLOR_LABEL,
            element.position.x,
            element.position.y,
        )
    }

    fn draw_connection(
        &self,
        ctx: &mut vello_cpu::RenderContext,
        from: crate::core::Point,
        to: crate::core::Point,
    ) {
        let mut line = BezPath::new();
        line.move_to((from.x, from.y));
        line.line_to((to.x, to.y));

        ctx.set_transform(Affine::IDENTITY);
        ctx.set_paint(paint(COLOR_CONNECTION));

        match self.settings.connection_style {
            ConnectionStyle::Arrow => {
                ctx.set_stroke(Stroke::new(CONNECTION_WIDTH));
                ctx.stroke_path(&line);

                let angle = (to.y - from.y).atan2(to.x - from.x);
                let mut head = BezPath::new();
                head.move_to((to.x, to.y));
                head.line_to((
                    to.x - ARROWHEAD_LEN * (angle - std::f64::consts::FRAC_PI_6).cos(),
                    to.y - ARROWHEAD_LEN * (angle - std::f64::consts::FRAC_PI_6).sin(),
                ));
                head.line_to((
                    to.x - ARROWHEAD_LEN * (angle + std::f64::consts::FRAC_PI_6).cos(),
                    to.y - ARROWHEAD_LEN * (angle + std::f64::consts::FRAC_PI_6).sin(),
                ));
                head.close_path();
                ctx.fill_path(&head);
            }
            ConnectionStyle::Dashed => {
                ctx.set_stroke(Stroke::new(DASHED_WIDTH).with_dashes(0.0, DASH_PATTERN));
                ctx.stroke_path(&line);
            }
        }
    }

    fn draw_text_centered(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        content: &str,
        size_px: f32,
        color: Rgba8,
        cx: f64,
        cy: f64,
    ) -> ChalklineResult<()> {
        if content.is_empty() {
            return Ok(());
        }
        let Some(layout) = self
            .text
            .layout_plain(content, size_px, TextBrushRgba8::from(color))?
        else {
            return Ok(());
        };
        let Some(font) = self.font.as_ref() else {
            return Ok(());
        };

        let (tw, th) = layout_size(&layout);
        ctx.set_transform(Affine::translate((cx - tw / 2.0, cy - th / 2.0)));

        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                ctx.set_paint(peniko::Color::from_rgba8(brush.r, brush.g, brush.b, brush.a));
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }

        Ok(())
    }
}

impl Renderer for CpuRenderer {
    #[tracing::instrument(skip(self, model, steps))]
    fn render(
        &mut self,
        model: &SceneModel,
        steps: &[AnimationStep],
        current_step: usize,
    ) -> ChalklineResult<FrameRGBA> {
        let width: u16 = self
            .settings
            .canvas
            .width
            .try_into()
            .map_err(|_| ChalklineError::render("canvas width exceeds u16"))?;
        let height: u16 = self
            .settings
            .canvas
            .height
            .try_into()
            .map_err(|_| ChalklineError::render("canvas height exceeds u16"))?;
        if width == 0 || height == 0 {
            return Err(ChalklineError::render("canvas dimensions must be > 0"));
        }

        let highlighted = highlight_target(steps, current_step);

        self.with_ctx_mut(width, height, |this, ctx| {
            let w = f64::from(width);
            let h = f64::from(height);

            ctx.set_blend_mode(peniko::BlendMode::default());
            ctx.set_paint_transform(Affine::IDENTITY);
            ctx.set_transform(Affine::IDENTITY);

            let [r, g, b, a] = this.settings.background_rgba;
            ctx.set_paint(peniko::Color::from_rgba8(r, g, b, a));
            ctx.fill_rect(&Rect::new(0.0, 0.0, w, h));

            if let Some(spacing) = this.settings.grid_spacing_px.filter(|s| *s > 1.0) {
                Self::draw_grid(ctx, spacing, w, h);
            }

            for (id, element) in model.iter() {
                this.draw_element(ctx, element, highlighted == Some(id.as_str()))?;
            }

            for (_, element) in model.iter() {
                for target in &element.connections {
                    // Dangling targets are skipped, not drawn half-way.
                    if let Some(target_element) = model.get(target) {
                        this.draw_connection(ctx, element.position, target_element.position);
                    }
                }
            }

            if let Some(step) = steps.get(current_step) {
                let caption = step.caption(current_step);
                this.draw_text_centered(
                    ctx,
                    &caption,
                    CAPTION_SIZE_PX,
                    COLOR_INK,
                    w / 2.0,
                    h - CAPTION_BOTTOM_MARGIN - f64::from(CAPTION_SIZE_PX) / 2.0,
                )?;
            }

            ctx.flush();
            let mut pixmap = vello_cpu::Pixmap::new(width, height);
            ctx.render_to_pixmap(&mut pixmap);

            Ok(FrameRGBA {
                width: u32::from(width),
                height: u32::from(height),
                data: pixmap.data_as_u8_slice().to_vec(),
                premultiplied: true,
            })
        })
    }
}

/// The element the current step asks to emphasize, if it is a highlight
/// step. Consumed only here: highlights never touch the scene model.
fn highlight_target(steps: &[AnimationStep], current_step: usize) -> Option<&str> {
    let step = steps.get(current_step)?;
    if step.action == Action::Highlight {
        step.element.as_deref()
    } else {
        None
    }
}

fn shape_path(shape: Shape, position: crate::core::Point) -> BezPath {
    let (x, y) = (position.x, position.y);
    match shape {
        Shape::Circle => Circle::new((x, y), SHAPE_RADIUS).to_path(0.1),
        Shape::Square => Rect::new(
            x - SHAPE_RADIUS,
            y - SHAPE_RADIUS,
            x + SHAPE_RADIUS,
            y + SHAPE_RADIUS,
        )
        .to_path(0.1),
        Shape::Triangle => {
            let mut path = BezPath::new();
            path.move_to((x, y - TRIANGLE_OFFSET));
            path.line_to((x - TRIANGLE_OFFSET, y + TRIANGLE_OFFSET));
            path.line_to((x + TRIANGLE_OFFSET, y + TRIANGLE_OFFSET));
            path.close_path();
            path
        }
    }
}

fn paint(c: Rgba8) -> peniko::Color {
    peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlight_target_reads_only_the_current_step() {
        let steps = vec![AnimationStep::create("A"), AnimationStep::highlight("A")];
        assert_eq!(highlight_target(&steps, 0), None);
        assert_eq!(highlight_target(&steps, 1), Some("A"));
        assert_eq!(highlight_target(&steps, 2), None);
    }

    #[test]
    fn shape_paths_are_nonempty() {
        for shape in [Shape::Circle, Shape::Square, Shape::Triangle] {
            let path = shape_path(shape, crate::core::Point::new(10.0, 10.0));
            assert!(path.elements().len() > 2);
        }
    }
}
