//! Premultiplied RGBA8 rasters and the per-frame image operations applied to them.

use std::path::Path;

use anyhow::Context as _;
use image::imageops::FilterType;

use crate::foundation::error::{CrawlError, CrawlResult};
use crate::foundation::math::{mul_div255_u8, opacity_to_u8};

/// Row-major, tightly packed, premultiplied RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Raster {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> CrawlResult<Self> {
        if data.len() != byte_len(width, height) {
            return Err(CrawlError::render(format!(
                "raster data has {} bytes, expected {width}x{height}x4",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; byte_len(width, height)],
        }
    }

    /// Fill with a straight-alpha color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let px = premul_rgba8(rgba);
        Self {
            width,
            height,
            data: px.repeat((width as usize) * (height as usize)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }
}

fn byte_len(width: u32, height: u32) -> usize {
    (width as usize) * (height as usize) * 4
}

pub(crate) fn premul_rgba8(rgba: [u8; 4]) -> [u8; 4] {
    let [r, g, b, a] = rgba;
    let a16 = u16::from(a);
    [
        mul_div255_u8(u16::from(r), a16),
        mul_div255_u8(u16::from(g), a16),
        mul_div255_u8(u16::from(b), a16),
        a,
    ]
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

/// Decode any format the `image` crate understands into a premultiplied raster.
pub fn decode_image(bytes: &[u8]) -> CrawlResult<Raster> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut data = rgba.into_raw();
    premultiply_rgba8_in_place(&mut data);
    Ok(Raster {
        width,
        height,
        data,
    })
}

#[tracing::instrument]
pub fn load_image(path: &Path) -> CrawlResult<Raster> {
    let bytes = std::fs::read(path)
        .map_err(|e| CrawlError::asset(format!("failed to read '{}': {e}", path.display())))?;
    let img = decode_image(&bytes)
        .map_err(|e| CrawlError::asset(format!("failed to decode '{}': {e}", path.display())))?;
    tracing::debug!(width = img.width, height = img.height, "image loaded");
    Ok(img)
}

fn resample(src: &Raster, width: u32, height: u32, filter: FilterType) -> CrawlResult<Raster> {
    if src.is_empty() || width == 0 || height == 0 {
        return Ok(Raster::transparent(width, height));
    }
    if (width, height) == (src.width, src.height) {
        return Ok(src.clone());
    }
    let img = image::RgbaImage::from_raw(src.width, src.height, src.data.clone())
        .ok_or_else(|| CrawlError::render("raster buffer does not match its dimensions"))?;
    let mut data = image::imageops::resize(&img, width, height, filter).into_raw();
    // Ringing filters can push color above alpha; keep the buffer valid premultiplied.
    for px in data.chunks_exact_mut(4) {
        let a = px[3];
        px[0] = px[0].min(a);
        px[1] = px[1].min(a);
        px[2] = px[2].min(a);
    }
    Raster::new(width, height, data)
}

/// Resize to `height` rows, keeping the aspect ratio.
pub fn resize_to_height(src: &Raster, height: u32) -> CrawlResult<Raster> {
    if src.height == 0 {
        return Err(CrawlError::render("cannot resize a raster with zero height"));
    }
    let width = ((f64::from(src.width) * f64::from(height) / f64::from(src.height)).round()
        as u32)
        .max(1);
    resample(src, width, height, FilterType::Lanczos3)
}

/// Uniform scale by `factor`; each output dimension is `floor(dim * factor)`.
pub fn scale(src: &Raster, factor: f64) -> CrawlResult<Raster> {
    if !factor.is_finite() || factor < 0.0 {
        return Err(CrawlError::render("scale factor must be finite and >= 0"));
    }
    let width = (f64::from(src.width) * factor).floor() as u32;
    let height = (f64::from(src.height) * factor).floor() as u32;
    resample(src, width, height, FilterType::Triangle)
}

/// Multiply every color channel by `factor`, truncating toward zero. Alpha is untouched.
pub fn darken(src: &mut Raster, factor: f32) {
    let factor = factor.clamp(0.0, 1.0);
    for px in src.data.chunks_exact_mut(4) {
        for c in &mut px[..3] {
            *c = (f32::from(*c) * factor) as u8;
        }
    }
}

/// Rows `[y0, y0 + rows)` clamped to the raster. The result may be shorter than `rows`.
pub fn crop_rows(src: &Raster, y0: i64, rows: u32) -> Raster {
    let h = i64::from(src.height);
    let start = y0.clamp(0, h);
    let end = (y0 + i64::from(rows)).clamp(start, h);
    let stride = (src.width as usize) * 4;
    let data = src.data[(start as usize) * stride..(end as usize) * stride].to_vec();
    Raster {
        width: src.width,
        height: (end - start) as u32,
        data,
    }
}

/// Premultiplied source-over of `src` onto `dst` at signed offset `(x, y)`, clipped to `dst`.
pub fn composite_over(dst: &mut Raster, src: &Raster, x: i64, y: i64, opacity: f32) {
    let op = opacity_to_u8(opacity);
    if op == 0 || src.is_empty() || dst.is_empty() {
        return;
    }

    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + i64::from(src.width)).min(i64::from(dst.width));
    let y1 = (y + i64::from(src.height)).min(i64::from(dst.height));
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let dst_w = dst.width as usize;
    let src_w = src.width as usize;
    for dy in y0..y1 {
        let sy = (dy - y) as usize;
        let span = (x1 - x0) as usize;
        let d_off = ((dy as usize) * dst_w + x0 as usize) * 4;
        let s_off = (sy * src_w + (x0 - x) as usize) * 4;
        let d_row = &mut dst.data[d_off..d_off + span * 4];
        let s_row = &src.data[s_off..s_off + span * 4];
        for (d, s) in d_row.chunks_exact_mut(4).zip(s_row.chunks_exact(4)) {
            let out = over_px([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], op);
            d.copy_from_slice(&out);
        }
    }
}

fn over_px(dst: [u8; 4], src: [u8; 4], op: u16) -> [u8; 4] {
    if src[3] == 0 {
        return dst;
    }
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }
    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}
