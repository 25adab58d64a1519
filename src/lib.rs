//! Renders a perspective opening crawl over a darkened starfield, with a shrinking title logo
//! and a soundtrack, into an MP4.
//!
//! - Describe the movie with a [`CrawlConfig`] (the defaults are the stock intro)
//! - Build a [`CrawlScene`] from decoded assets, or let [`prepare_scene`] load them
//! - Render frames into a [`FrameSink`], or the whole movie with [`render_to_mp4`]
#![forbid(unsafe_code)]

pub mod audio;
pub mod config;
/// Encoding sinks.
pub mod encode;
mod foundation;
pub mod raster;
pub mod render;
pub mod scene;
pub mod story;
pub mod text;
pub mod warp;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex, FrameRange, Point};
pub use crate::foundation::error::{CrawlError, CrawlResult};

pub use crate::config::{AssetPaths, CrawlConfig};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::sink::{AudioInputConfig, FrameSink, InMemorySink, SinkConfig};
pub use crate::raster::Raster;
pub use crate::render::FrameRGBA;
pub use crate::render::pipeline::{
    RenderStats, RenderToMp4Opts, load_scene_assets, prepare_scene, render_to_mp4,
    render_to_sink,
};
pub use crate::scene::{CrawlScene, SceneAssets};
pub use crate::warp::{Homography, trapezoid_warp};
