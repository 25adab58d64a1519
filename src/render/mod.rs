//! Frame output type and the end-to-end render pipeline.

pub mod pipeline;

use crate::raster::Raster;

/// A rendered frame as RGBA8 pixels.
///
/// Frames are **premultiplied alpha**; the flag makes that explicit at sink boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl From<Raster> for FrameRGBA {
    fn from(r: Raster) -> Self {
        Self {
            width: r.width,
            height: r.height,
            data: r.data,
            premultiplied: true,
        }
    }
}
