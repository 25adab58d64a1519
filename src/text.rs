//! Crawl text shaping (Parley) and rasterization (`vello_cpu`).

use std::path::Path;

use crate::foundation::error::{CrawlError, CrawlResult};
use crate::raster::Raster;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl From<[u8; 4]> for TextBrushRgba8 {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self { r, g, b, a }
    }
}

/// Stateful helper for building Parley text layouts from raw font bytes.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    last_family_name: Option<String>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            last_family_name: None,
        }
    }

    /// Family name of the font registered by the most recent layout call.
    pub fn last_family_name(&self) -> Option<&str> {
        self.last_family_name.as_deref()
    }

    /// Shape `text` with the given font and lay out every line centered on the widest one.
    pub fn layout_centered(
        &mut self,
        text: &str,
        font_bytes: &[u8],
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> CrawlResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(CrawlError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            CrawlError::asset("no font families registered from font bytes")
        })?;

        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| CrawlError::asset("registered font family has no name"))?
            .to_string();
        self.last_family_name = Some(family_name.clone());

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        layout.align(
            None,
            parley::Alignment::Center,
            parley::AlignmentOptions::default(),
        );
        Ok(layout)
    }
}

/// Rasterize a laid-out block into a raster exactly as large as the block.
pub fn rasterize_layout(
    layout: &parley::Layout<TextBrushRgba8>,
    font_bytes: Vec<u8>,
) -> CrawlResult<Raster> {
    let width = layout.width().ceil().max(0.0) as u32;
    let height = layout.height().ceil().max(0.0) as u32;
    if width == 0 || height == 0 {
        return Ok(Raster::transparent(width, height));
    }
    let w: u16 = width
        .try_into()
        .map_err(|_| CrawlError::render("text raster width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| CrawlError::render("text raster height exceeds u16"))?;

    let font = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);
    let mut ctx = vello_cpu::RenderContext::new(w, h);
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let brush = run.style().brush;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                brush.r, brush.g, brush.b, brush.a,
            ));
            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(&font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }

    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);
    Raster::new(width, height, pixmap.data_as_u8_slice().to_vec())
}

/// Shape and rasterize `text` centered, in `color` (straight-alpha RGBA8).
#[tracing::instrument(skip(text, font_bytes), fields(text_len = text.len()))]
pub fn render_text_raster(
    text: &str,
    font_bytes: &[u8],
    size_px: f32,
    color: [u8; 4],
) -> CrawlResult<Raster> {
    let mut engine = TextLayoutEngine::new();
    let layout = engine.layout_centered(text, font_bytes, size_px, color.into())?;
    let raster = rasterize_layout(&layout, font_bytes.to_vec())?;
    tracing::debug!(
        width = raster.width,
        height = raster.height,
        lines = layout.lines().count(),
        family = engine.last_family_name().unwrap_or_default(),
        "text rasterized"
    );
    Ok(raster)
}

pub fn load_font(path: &Path) -> CrawlResult<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| CrawlError::asset(format!("failed to read font '{}': {e}", path.display())))
}
