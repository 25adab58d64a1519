use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::audio::media::{MIX_SAMPLE_RATE, decode_audio_f32_stereo};
use crate::audio::mix::{SoundtrackPlan, mix_soundtrack, write_pcm_f32le};
use crate::config::{AssetPaths, CrawlConfig};
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
use crate::encode::sink::{AudioInputConfig, FrameSink, SinkConfig};
use crate::foundation::core::{FrameIndex, FrameRange};
use crate::foundation::error::{CrawlError, CrawlResult};
use crate::raster::load_image;
use crate::scene::{CrawlScene, SceneAssets};
use crate::text::{load_font, render_text_raster};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames_total: u64,
    pub elapsed: Duration,
}

/// Load every image and the font from `assets_root` and rasterize the crawl text.
#[tracing::instrument(skip(config))]
pub fn load_scene_assets(config: &CrawlConfig, assets_root: &Path) -> CrawlResult<SceneAssets> {
    let paths = &config.assets;
    let background = load_image(&AssetPaths::resolve(assets_root, &paths.background))?;
    let logo = load_image(&AssetPaths::resolve(assets_root, &paths.logo))?;
    let font = load_font(&AssetPaths::resolve(assets_root, &paths.font))?;
    let text = render_text_raster(
        &config.scroll_text(),
        &font,
        config.font_size_px,
        config.text_color,
    )?;
    Ok(SceneAssets {
        background,
        logo,
        text,
    })
}

pub fn prepare_scene(config: CrawlConfig, assets_root: &Path) -> CrawlResult<CrawlScene> {
    config.validate()?;
    let assets = load_scene_assets(&config, assets_root)?;
    CrawlScene::new(config, assets)
}

/// Render `range` of `scene` into `sink`, in timeline order.
#[tracing::instrument(skip(scene, sink, audio))]
pub fn render_to_sink(
    scene: &CrawlScene,
    range: FrameRange,
    sink: &mut dyn FrameSink,
    audio: Option<AudioInputConfig>,
) -> CrawlResult<RenderStats> {
    if range.is_empty() {
        return Err(CrawlError::validation("render range must be non-empty"));
    }

    let started = Instant::now();
    let canvas = scene.canvas();
    sink.begin(SinkConfig {
        width: canvas.width,
        height: canvas.height,
        fps: scene.fps(),
        audio,
    })?;

    let total = range.len_frames();
    let report_every = u64::from(scene.fps().num).max(1) * 5;
    for f in range.start.0..range.end.0 {
        let frame = scene.render_frame(FrameIndex(f))?;
        sink.push_frame(FrameIndex(f), &frame)?;
        let done = f - range.start.0 + 1;
        if done % report_every == 0 {
            tracing::info!(done, total, "rendering");
        }
    }
    sink.end()?;

    Ok(RenderStats {
        frames_total: total,
        elapsed: started.elapsed(),
    })
}

/// Options for [`render_to_mp4`].
#[derive(Clone, Debug)]
pub struct RenderToMp4Opts {
    pub out_path: PathBuf,
    /// Overwrite `out_path` if it already exists.
    pub overwrite: bool,
    /// Mux the soundtrack; when off the MP4 has no audio stream.
    pub with_audio: bool,
}

impl RenderToMp4Opts {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            with_audio: true,
        }
    }
}

/// Render the whole movie to an MP4 using the system `ffmpeg`.
#[tracing::instrument(skip(config, opts), fields(out = %opts.out_path.display()))]
pub fn render_to_mp4(
    config: CrawlConfig,
    assets_root: &Path,
    opts: RenderToMp4Opts,
) -> CrawlResult<RenderStats> {
    if !is_ffmpeg_on_path() {
        return Err(CrawlError::encode(
            "ffmpeg is required for MP4 rendering, but was not found on PATH",
        ));
    }

    let scene = prepare_scene(config, assets_root)?;
    let range = scene.frame_range()?;

    let mut audio_tmp = TempFileGuard(None);
    let audio = if opts.with_audio {
        let cfg = scene.config();
        let src = decode_audio_f32_stereo(
            &AssetPaths::resolve(assets_root, &cfg.assets.soundtrack),
            MIX_SAMPLE_RATE,
        )?;
        let mixed = mix_soundtrack(&src, &SoundtrackPlan::from_config(cfg))?;
        let path = std::env::temp_dir().join(format!(
            "crawl_audio_mix_{}_{}.f32le",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0)
        ));
        write_pcm_f32le(&mixed, &path)?;
        audio_tmp.0 = Some(path.clone());
        Some(AudioInputConfig {
            path,
            sample_rate: src.sample_rate,
            channels: src.channels,
        })
    } else {
        None
    };

    let mut sink = FfmpegSink::new(FfmpegSinkOpts {
        overwrite: opts.overwrite,
        ..FfmpegSinkOpts::new(&opts.out_path)
    });
    let stats = render_to_sink(&scene, range, &mut sink, audio)?;
    drop(audio_tmp);

    tracing::info!(
        frames = stats.frames_total,
        elapsed_ms = stats.elapsed.as_millis() as u64,
        "wrote {}",
        opts.out_path.display()
    );
    Ok(stats)
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_file_guard_removes_file() {
        let path = std::env::temp_dir().join(format!("crawl_guard_{}.tmp", std::process::id()));
        std::fs::write(&path, b"x").unwrap();
        drop(TempFileGuard(Some(path.clone())));
        assert!(!path.exists());
    }

    #[test]
    fn missing_assets_surface_as_asset_errors() {
        let root = std::env::temp_dir().join(format!("crawl_missing_{}", std::process::id()));
        let err = load_scene_assets(&CrawlConfig::default(), &root).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("asset error:"), "{msg}");
        assert!(msg.contains("bg.jpg"), "{msg}");
    }

    #[test]
    fn mp4_opts_default_to_audio_and_overwrite() {
        let opts = RenderToMp4Opts::new("out.mp4");
        assert!(opts.overwrite);
        assert!(opts.with_audio);
    }
}
