//! Per-frame composition of background, crawl and logo.

use crate::config::CrawlConfig;
use crate::foundation::core::{Canvas, Fps, FrameIndex, FrameRange};
use crate::foundation::error::{CrawlError, CrawlResult};
use crate::raster::{self, Raster};
use crate::render::FrameRGBA;
use crate::warp;

/// Decoded inputs, before any scene-specific preparation.
#[derive(Clone, Debug)]
pub struct SceneAssets {
    pub background: Raster,
    pub logo: Raster,
    /// Crawl text block, as rasterized from the story.
    pub text: Raster,
}

/// Prepared scene: every per-movie transform is already applied, so rendering a frame only
/// does the time-dependent work.
#[derive(Clone, Debug)]
pub struct CrawlScene {
    config: CrawlConfig,
    canvas: Canvas,
    fps: Fps,
    /// Background after darkening.
    background: Raster,
    /// Logo resized to the canvas height.
    logo: Raster,
    /// Text block below `canvas.height` transparent rows; the crawl is a moving crop of this.
    scroll_surface: Raster,
}

impl CrawlScene {
    pub fn new(config: CrawlConfig, assets: SceneAssets) -> CrawlResult<Self> {
        config.validate()?;
        let canvas = config.canvas();
        let fps = config.fps()?;

        let mut background = assets.background;
        raster::darken(&mut background, config.darken_factor);

        let logo = if assets.logo.is_empty() {
            assets.logo
        } else {
            raster::resize_to_height(&assets.logo, canvas.height)?
        };

        let scroll_surface = scroll_surface(&assets.text, canvas.height)?;
        tracing::debug!(
            text_width = assets.text.width,
            text_height = assets.text.height,
            logo_width = logo.width,
            "scene prepared"
        );

        Ok(Self {
            config,
            canvas,
            fps,
            background,
            logo,
            scroll_surface,
        })
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Every frame of the movie.
    pub fn frame_range(&self) -> CrawlResult<FrameRange> {
        FrameRange::new(FrameIndex(0), self.config.total_frames()?)
    }

    /// First row of the crop window into the scroll surface at crawl-local time `t`.
    ///
    /// The window is `canvas.height` rows tall and starts half a screen plus two seconds of
    /// travel into the surface.
    pub fn scroll_window_top(&self, t: f64) -> i64 {
        let speed = self.config.text_speed_px_per_sec;
        let start = f64::from(self.canvas.height) / 2.0 + speed * 2.0;
        (speed * t + start).floor() as i64
    }

    /// Warped crawl at crawl-local time `t`.
    pub fn crawl_layer(&self, t: f64) -> CrawlResult<Raster> {
        let window = raster::crop_rows(
            &self.scroll_surface,
            self.scroll_window_top(t),
            self.canvas.height,
        );
        warp::trapezoid_warp(
            &window,
            self.config.warp_cx,
            self.config.warp_cy,
            self.canvas.height,
        )
    }

    /// Logo raster and opacity at movie time `t`, or `None` once the logo is gone.
    pub fn logo_layer(&self, t: f64) -> CrawlResult<Option<(Raster, f32)>> {
        let cfg = &self.config;
        if t >= cfg.logo_duration_sec || self.logo.is_empty() {
            return Ok(None);
        }
        let factor = (1.0 - cfg.logo_shrink_per_sec * t).max(cfg.logo_min_scale);
        let opacity = if cfg.logo_fade_out_sec > 0.0 {
            ((cfg.logo_duration_sec - t) / cfg.logo_fade_out_sec).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let scaled = raster::scale(&self.logo, factor)?;
        Ok(Some((scaled, opacity as f32)))
    }

    #[tracing::instrument(level = "trace", skip(self))]
    pub fn render_frame(&self, idx: FrameIndex) -> CrawlResult<FrameRGBA> {
        let t = self.fps.frames_to_secs(idx.0);
        let (w, h) = (self.canvas.width, self.canvas.height);
        let mut frame = Raster::solid(w, h, [0, 0, 0, 255]);

        raster::composite_over(&mut frame, &self.background, 0, 0, 1.0);

        if t >= self.config.text_start_sec {
            let crawl = self.crawl_layer(t - self.config.text_start_sec)?;
            let x = centered(w, crawl.width);
            let y = i64::from(h) - i64::from(crawl.height);
            raster::composite_over(&mut frame, &crawl, x, y, 1.0);
        }

        if let Some((logo, opacity)) = self.logo_layer(t)? {
            let x = centered(w, logo.width);
            let y = centered(h, logo.height);
            raster::composite_over(&mut frame, &logo, x, y, opacity);
        }

        Ok(frame.into())
    }
}

fn centered(outer: u32, inner: u32) -> i64 {
    (i64::from(outer) - i64::from(inner)).div_euclid(2)
}

/// Stack `height` transparent rows on top of the text block.
fn scroll_surface(text: &Raster, height: u32) -> CrawlResult<Raster> {
    let rows = text
        .height
        .checked_add(height)
        .ok_or_else(|| CrawlError::render("scroll surface height overflows"))?;
    let mut surface = Raster::transparent(text.width, rows);
    let offset = (height as usize) * (text.width as usize) * 4;
    surface.data[offset..offset + text.data.len()].copy_from_slice(&text.data);
    Ok(surface)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> CrawlConfig {
        CrawlConfig {
            width: 64,
            height: 36,
            fps: 10,
            duration_sec: 4.0,
            text_speed_px_per_sec: 8.0,
            ..CrawlConfig::default()
        }
    }

    fn scene() -> CrawlScene {
        CrawlScene::new(
            small_config(),
            SceneAssets {
                background: Raster::solid(64, 36, [100, 200, 50, 255]),
                logo: Raster::solid(20, 10, [255, 255, 0, 255]),
                text: Raster::solid(40, 80, [0, 255, 255, 255]),
            },
        )
        .unwrap()
    }

    #[test]
    fn preparation_darkens_background_and_sizes_logo() {
        let s = scene();
        assert_eq!(s.background.pixel(0, 0), [60, 120, 30, 255]);
        assert_eq!((s.logo.width, s.logo.height), (72, 36));
        assert_eq!(s.scroll_surface.height, 80 + 36);
        assert_eq!(s.scroll_surface.pixel(0, 35)[3], 0);
        assert_eq!(s.scroll_surface.pixel(0, 36)[3], 255);
    }

    #[test]
    fn scroll_window_moves_at_text_speed() {
        let s = scene();
        // start = 36 / 2 + 8 * 2 = 34
        assert_eq!(s.scroll_window_top(0.0), 34);
        assert_eq!(s.scroll_window_top(1.0), 42);
        assert_eq!(s.scroll_window_top(0.49), 37);
    }

    #[test]
    fn logo_shrinks_then_fades() {
        let s = scene();
        let (l0, o0) = s.logo_layer(0.0).unwrap().unwrap();
        assert_eq!((l0.width, l0.height), (72, 36));
        assert_eq!(o0, 1.0);

        let (l1, _) = s.logo_layer(1.0).unwrap().unwrap();
        assert_eq!((l1.width, l1.height), (36, 18));

        let (l2, o2) = s.logo_layer(2.5).unwrap().unwrap();
        assert_eq!(l2.height, 3);
        assert!((o2 - 0.5).abs() < 1e-6);

        assert!(s.logo_layer(3.0).unwrap().is_none());
    }

    #[test]
    fn first_frame_has_background_and_logo_but_no_crawl() {
        let s = scene();
        let f = s.render_frame(FrameIndex(0)).unwrap();
        assert_eq!((f.width, f.height), (64, 36));
        // Logo covers the whole height at t=0 and is centered, so the middle is yellow.
        let mid = ((18 * 64 + 32) * 4) as usize;
        assert_eq!(&f.data[mid..mid + 4], &[255, 255, 0, 255]);
        // The logo is wider than the canvas, so nothing else shows through.
        assert!(f.data.chunks_exact(4).all(|p| p[3] == 255));
    }

    #[test]
    fn crawl_appears_after_text_start() {
        let s = scene();
        let before = s.render_frame(FrameIndex(19)).unwrap();
        let after = s.render_frame(FrameIndex(35)).unwrap();

        let bg = [60u8, 120, 30, 255];
        // Near the bottom edge; the very last row is partially covered after warping.
        let low_mid = ((33 * 64 + 32) * 4) as usize;
        assert_eq!(&before.data[low_mid..low_mid + 4], &bg);
        // At crawl time 1.5s the window starts at row 46, inside the text block.
        assert_eq!(&after.data[low_mid..low_mid + 4], &[0, 255, 255, 255]);
        // Top corner stays background: the warp leaves it empty.
        assert_eq!(&after.data[0..4], &bg);
    }

    #[test]
    fn crawl_past_the_end_is_empty() {
        let s = scene();
        let layer = s.crawl_layer(100.0).unwrap();
        assert_eq!(layer.height, 36);
        assert!(layer.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn frame_range_covers_duration() {
        let r = scene().frame_range().unwrap();
        assert_eq!(r.len_frames(), 40);
    }
}
