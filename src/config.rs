//! Render parameters.
//!
//! Every field has a default matching the stock intro, so `CrawlConfig::default()` is the
//! whole configuration for a normal run. A JSON file may override any subset of fields.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{CrawlError, CrawlResult};
use crate::story;

/// Default output width in pixels.
pub const DEFAULT_WIDTH: u32 = 720;
/// Default output frame rate.
pub const DEFAULT_FPS: u32 = 30;
/// Default output file name.
pub const DEFAULT_OUT_FILE: &str = "Star Wars Intro.mp4";

/// 16:9 height for `width`, using integer division (720 -> 405).
pub fn height_for_width(width: u32) -> u32 {
    width * 9 / 16
}

/// Input files, resolved relative to the assets directory.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    pub background: PathBuf,
    pub logo: PathBuf,
    pub font: PathBuf,
    pub soundtrack: PathBuf,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            background: PathBuf::from("bg.jpg"),
            logo: PathBuf::from("star_wars_logo.png"),
            font: PathBuf::from("Xolonium-Bold.otf"),
            soundtrack: PathBuf::from("song.mp3"),
        }
    }
}

impl AssetPaths {
    /// Resolve a (possibly relative) asset path against `root`.
    pub fn resolve(root: &Path, p: &Path) -> PathBuf {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            root.join(p)
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub duration_sec: f64,

    pub text_speed_px_per_sec: f64,
    pub text_start_sec: f64,
    /// Straight-alpha RGBA8.
    pub text_color: [u8; 4],
    pub font_size_px: f32,
    pub padding_lines: usize,
    pub story: String,

    pub warp_cx: f64,
    pub warp_cy: f64,
    pub darken_factor: f32,

    pub logo_duration_sec: f64,
    pub logo_fade_out_sec: f64,
    pub logo_shrink_per_sec: f64,
    pub logo_min_scale: f64,

    pub audio_start_sec: f64,
    pub audio_volume: f32,
    pub audio_fade_out_sec: f64,

    pub assets: AssetPaths,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: height_for_width(DEFAULT_WIDTH),
            fps: DEFAULT_FPS,
            duration_sec: 60.0,
            text_speed_px_per_sec: 24.0,
            text_start_sec: 2.0,
            text_color: [0, 255, 255, 255],
            font_size_px: 25.0,
            padding_lines: 10,
            story: story::story_text(),
            warp_cx: 0.2,
            warp_cy: 0.3,
            darken_factor: 0.6,
            logo_duration_sec: 3.0,
            logo_fade_out_sec: 1.0,
            logo_shrink_per_sec: 0.5,
            logo_min_scale: 0.1,
            audio_start_sec: 0.3,
            audio_volume: 0.8,
            audio_fade_out_sec: 5.0,
            assets: AssetPaths::default(),
        }
    }
}

impl CrawlConfig {
    /// Load a config from a JSON file. Fields absent from the file keep their defaults.
    pub fn from_json_file(path: &Path) -> CrawlResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse config '{}'", path.display()))?;
        Ok(cfg)
    }

    pub fn validate(&self) -> CrawlResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CrawlError::validation("width/height must be non-zero"));
        }
        if self.width > u32::from(u16::MAX) || self.height > u32::from(u16::MAX) {
            return Err(CrawlError::validation("width/height must fit in u16"));
        }
        Fps::new(self.fps, 1)?;
        if !self.duration_sec.is_finite() || self.duration_sec <= 0.0 {
            return Err(CrawlError::validation("duration_sec must be finite and > 0"));
        }
        if !self.text_speed_px_per_sec.is_finite() || self.text_speed_px_per_sec < 0.0 {
            return Err(CrawlError::validation(
                "text_speed_px_per_sec must be finite and >= 0",
            ));
        }
        if !self.text_start_sec.is_finite() || self.text_start_sec < 0.0 {
            return Err(CrawlError::validation("text_start_sec must be finite and >= 0"));
        }
        if !self.font_size_px.is_finite() || self.font_size_px <= 0.0 {
            return Err(CrawlError::validation("font_size_px must be finite and > 0"));
        }
        if self.story.trim().is_empty() {
            return Err(CrawlError::validation("story text must not be empty"));
        }
        if !(0.0..0.5).contains(&self.warp_cx) {
            return Err(CrawlError::validation("warp_cx must be in [0, 0.5)"));
        }
        if !(0.0..1.0).contains(&self.warp_cy) {
            return Err(CrawlError::validation("warp_cy must be in [0, 1)"));
        }
        if !(0.0..=1.0).contains(&self.darken_factor) {
            return Err(CrawlError::validation("darken_factor must be in [0, 1]"));
        }
        for (name, v) in [
            ("logo_duration_sec", self.logo_duration_sec),
            ("logo_fade_out_sec", self.logo_fade_out_sec),
            ("logo_shrink_per_sec", self.logo_shrink_per_sec),
            ("audio_start_sec", self.audio_start_sec),
            ("audio_fade_out_sec", self.audio_fade_out_sec),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(CrawlError::validation(format!(
                    "{name} must be finite and >= 0"
                )));
            }
        }
        if self.logo_fade_out_sec > self.logo_duration_sec {
            return Err(CrawlError::validation(
                "logo_fade_out_sec must not exceed logo_duration_sec",
            ));
        }
        if !self.logo_min_scale.is_finite() || self.logo_min_scale <= 0.0 {
            return Err(CrawlError::validation("logo_min_scale must be finite and > 0"));
        }
        if !self.audio_volume.is_finite() || self.audio_volume < 0.0 {
            return Err(CrawlError::validation("audio_volume must be finite and >= 0"));
        }
        Ok(())
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    pub fn fps(&self) -> CrawlResult<Fps> {
        Fps::new(self.fps, 1)
    }

    /// Number of frames in the movie (`floor(duration * fps)`).
    pub fn total_frames(&self) -> CrawlResult<FrameIndex> {
        Ok(FrameIndex(
            self.fps()?.secs_to_frames_floor(self.duration_sec),
        ))
    }

    /// Crawl text with blank padding lines above and below the story.
    pub fn scroll_text(&self) -> String {
        story::pad_lines(&self.story, self.padding_lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_intro() {
        let cfg = CrawlConfig::default();
        assert_eq!((cfg.width, cfg.height), (720, 405));
        assert_eq!(cfg.total_frames().unwrap(), FrameIndex(1800));
        assert_eq!(cfg.text_color, [0, 255, 255, 255]);
        cfg.validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: CrawlConfig =
            serde_json::from_str(r#"{ "width": 320, "assets": { "font": "a.ttf" } }"#).unwrap();
        assert_eq!(cfg.width, 320);
        assert_eq!(cfg.height, 405);
        assert_eq!(cfg.assets.font, PathBuf::from("a.ttf"));
        assert_eq!(cfg.assets.background, PathBuf::from("bg.jpg"));
        assert_eq!(cfg.fps, 30);
    }

    #[test]
    fn validation_catches_bad_values() {
        let bad = [
            CrawlConfig {
                width: 0,
                ..CrawlConfig::default()
            },
            CrawlConfig {
                fps: 0,
                ..CrawlConfig::default()
            },
            CrawlConfig {
                warp_cx: 0.5,
                ..CrawlConfig::default()
            },
            CrawlConfig {
                darken_factor: 1.5,
                ..CrawlConfig::default()
            },
            CrawlConfig {
                logo_fade_out_sec: 4.0,
                ..CrawlConfig::default()
            },
            CrawlConfig {
                story: "  \n".to_string(),
                ..CrawlConfig::default()
            },
        ];
        for cfg in bad {
            assert!(cfg.validate().is_err(), "{cfg:?}");
        }
    }

    #[test]
    fn relative_asset_paths_resolve_against_root() {
        let root = Path::new("assets");
        assert_eq!(
            AssetPaths::resolve(root, Path::new("bg.jpg")),
            PathBuf::from("assets/bg.jpg")
        );
        let abs = std::env::temp_dir().join("x.png");
        assert_eq!(AssetPaths::resolve(root, &abs), abs);
    }
}
