//! Test doubles shared by unit tests across the crate.

use std::cell::Cell;
use std::rc::Rc;

use crate::coords::{Rect, Vec2};
use crate::paint::{Color, TextureHandle, TextureId};
use crate::render::GraphicsContext;
use crate::text::{CoverageBitmap, FontFace, TextExtent, TextRasterizer};

// ── graphics ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedOp {
    Viewport(Rect),
    Color(Color),
    Texture(Option<TextureId>),
    Fan {
        positions: [Vec2; 4],
        texcoords: [Vec2; 4],
        color: Color,
        texture: Option<TextureId>,
    },
}

/// `GraphicsContext` that records every call.
#[derive(Debug)]
pub struct RecordingContext {
    pub ops: Vec<RecordedOp>,
    color: Color,
    texture: Option<TextureId>,
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self { ops: Vec::new(), color: Color::white(), texture: None }
    }
}

impl RecordingContext {
    pub fn fan_colors(&self) -> Vec<Color> {
        self.fans().map(|(_, color, _)| color).collect()
    }

    pub fn fan_textures(&self) -> Vec<Option<TextureId>> {
        self.fans().map(|(_, _, texture)| texture).collect()
    }

    pub fn fans(&self) -> impl Iterator<Item = ([Vec2; 4], Color, Option<TextureId>)> + '_ {
        self.ops.iter().filter_map(|op| match op {
            RecordedOp::Fan { positions, color, texture, .. } => Some((*positions, *color, *texture)),
            _ => None,
        })
    }
}

impl GraphicsContext for RecordingContext {
    fn set_viewport(&mut self, rect: Rect) {
        self.ops.push(RecordedOp::Viewport(rect));
    }

    fn set_color(&mut self, color: Color) {
        self.color = color;
        self.ops.push(RecordedOp::Color(color));
    }

    fn color(&self) -> Color {
        self.color
    }

    fn bind_texture(&mut self, texture: Option<&TextureHandle>) {
        self.texture = texture.map(|t| t.id());
        self.ops.push(RecordedOp::Texture(self.texture));
    }

    fn draw_fan(&mut self, positions: &[Vec2; 4], texcoords: &[Vec2; 4]) {
        self.ops.push(RecordedOp::Fan {
            positions: *positions,
            texcoords: *texcoords,
            color: self.color,
            texture: self.texture,
        });
    }
}

// ── text ──────────────────────────────────────────────────────────────────

/// Call counters shared between a `StubRasterizer` and the test body.
#[derive(Debug, Default)]
pub struct RasterCounters {
    pub measures: Cell<usize>,
    pub rasterizations: Cell<usize>,
}

/// Monospace rasterizer: every char is `px / 2` wide, every line `px` tall,
/// and every pixel is fully covered.
#[derive(Debug, Default, Clone)]
pub struct StubRasterizer {
    pub counters: Rc<RasterCounters>,
}

impl StubRasterizer {
    pub fn new() -> (Self, Rc<RasterCounters>) {
        let r = Self::default();
        let counters = r.counters.clone();
        (r, counters)
    }
}

impl TextRasterizer for StubRasterizer {
    fn line_height(&self, _face: FontFace, px: f32) -> f32 {
        px
    }

    fn measure(&self, _face: FontFace, px: f32, text: &str) -> TextExtent {
        self.counters.measures.set(self.counters.measures.get() + 1);
        let lines: Vec<&str> = text.split('\n').collect();
        let widest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        TextExtent { width: widest as f32 * px / 2.0, height: lines.len() as f32 * px }
    }

    fn rasterize(&self, face: FontFace, px: f32, text: &str) -> Option<CoverageBitmap> {
        self.counters.rasterizations.set(self.counters.rasterizations.get() + 1);
        let extent = self.measure(face, px, text);
        let width = extent.width.ceil() as u32;
        let height = extent.height.ceil() as u32;
        if width == 0 || height == 0 {
            return None;
        }
        Some(CoverageBitmap { width, height, coverage: vec![255; (width * height) as usize] })
    }
}
