use std::path::Path;

use crate::audio::media::AudioPcm;
use crate::config::CrawlConfig;
use crate::foundation::error::{CrawlError, CrawlResult};

/// How the soundtrack is cut and shaped for the movie.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SoundtrackPlan {
    /// Offset into the source where the movie audio begins.
    pub start_sec: f64,
    /// Length of the movie audio.
    pub duration_sec: f64,
    pub volume: f32,
    /// Linear fade to silence over the final `fade_out_sec`.
    pub fade_out_sec: f64,
}

impl SoundtrackPlan {
    pub fn from_config(cfg: &CrawlConfig) -> Self {
        Self {
            start_sec: cfg.audio_start_sec,
            duration_sec: cfg.duration_sec,
            volume: cfg.audio_volume,
            fade_out_sec: cfg.audio_fade_out_sec,
        }
    }
}

/// Cut `[start, start + duration)` out of `src`, apply volume and fade-out, and return
/// interleaved samples at `src`'s rate and channel count.
///
/// Source material that runs out before the cut ends is padded with silence.
pub fn mix_soundtrack(src: &AudioPcm, plan: &SoundtrackPlan) -> CrawlResult<Vec<f32>> {
    if src.sample_rate == 0 || src.channels == 0 {
        return Err(CrawlError::validation(
            "soundtrack sample_rate/channels must be non-zero",
        ));
    }
    let channels = usize::from(src.channels);
    let rate = f64::from(src.sample_rate);
    let out_frames = (plan.duration_sec * rate).round().max(0.0) as usize;
    let start_frame = (plan.start_sec * rate).round().max(0.0) as usize;
    let src_frames = src.frames();

    let available = src_frames.saturating_sub(start_frame).min(out_frames);
    if available < out_frames {
        tracing::warn!(
            source_sec = src.duration_sec(),
            wanted_sec = plan.start_sec + plan.duration_sec,
            "soundtrack is shorter than the movie; padding with silence"
        );
    }

    let mut out = vec![0.0f32; out_frames * channels];
    for frame in 0..available {
        let t = frame as f64 / rate;
        let gain = plan.volume * fade_out_gain(t, plan.duration_sec, plan.fade_out_sec);
        let s = (start_frame + frame) * channels;
        let d = frame * channels;
        for c in 0..channels {
            out[d + c] = (src.interleaved_f32[s + c] * gain).clamp(-1.0, 1.0);
        }
    }
    Ok(out)
}

fn fade_out_gain(t: f64, duration: f64, fade_out: f64) -> f32 {
    if fade_out <= 0.0 {
        return 1.0;
    }
    (((duration - t) / fade_out).clamp(0.0, 1.0)) as f32
}

/// Write interleaved `f32` samples as raw little-endian `.f32le`.
pub fn write_pcm_f32le(samples_interleaved: &[f32], out_path: &Path) -> CrawlResult<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            CrawlError::encode(format!(
                "failed to create audio output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    let mut bytes = Vec::<u8>::with_capacity(samples_interleaved.len() * 4);
    for &sample in samples_interleaved {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        CrawlError::encode(format!(
            "failed to write mixed audio file '{}': {e}",
            out_path.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_pcm(rate: u32, secs: u32, v: f32) -> AudioPcm {
        AudioPcm {
            sample_rate: rate,
            channels: 2,
            interleaved_f32: vec![v; (rate * secs * 2) as usize],
        }
    }

    #[test]
    fn cut_starts_at_offset_and_scales_volume() {
        let mut src = constant_pcm(10, 4, 0.5);
        // Mark the frame at 0.3s.
        src.interleaved_f32[3 * 2] = 1.0;
        let plan = SoundtrackPlan {
            start_sec: 0.3,
            duration_sec: 2.0,
            volume: 0.8,
            fade_out_sec: 0.0,
        };
        let out = mix_soundtrack(&src, &plan).unwrap();
        assert_eq!(out.len(), 20 * 2);
        assert!((out[0] - 0.8).abs() < 1e-6);
        assert!((out[1] - 0.4).abs() < 1e-6);
        assert!((out[2] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn fade_out_reaches_silence_at_the_end() {
        let src = constant_pcm(100, 3, 1.0);
        let plan = SoundtrackPlan {
            start_sec: 0.0,
            duration_sec: 2.0,
            volume: 1.0,
            fade_out_sec: 1.0,
        };
        let out = mix_soundtrack(&src, &plan).unwrap();
        // Before the fade: untouched.
        assert!((out[50 * 2] - 1.0).abs() < 1e-6);
        // Halfway through the fade.
        assert!((out[150 * 2] - 0.5).abs() < 1e-6);
        // Last frame is nearly silent.
        assert!(out[out.len() - 2] < 0.02);
    }

    #[test]
    fn short_source_is_padded_with_silence() {
        let src = constant_pcm(10, 1, 0.25);
        let plan = SoundtrackPlan {
            start_sec: 0.5,
            duration_sec: 2.0,
            volume: 1.0,
            fade_out_sec: 0.0,
        };
        let out = mix_soundtrack(&src, &plan).unwrap();
        assert_eq!(out.len(), 40);
        assert!((out[0] - 0.25).abs() < 1e-6);
        assert!((out[4 * 2] - 0.25).abs() < 1e-6);
        assert_eq!(out[5 * 2], 0.0);
        assert_eq!(out[39], 0.0);
    }

    #[test]
    fn plan_follows_config() {
        let plan = SoundtrackPlan::from_config(&CrawlConfig::default());
        assert_eq!(plan.start_sec, 0.3);
        assert_eq!(plan.duration_sec, 60.0);
        assert_eq!(plan.volume, 0.8);
        assert_eq!(plan.fade_out_sec, 5.0);
    }

    #[test]
    fn f32le_file_round_trips_length() {
        let path = std::env::temp_dir().join(format!("crawl_mix_test_{}.f32le", std::process::id()));
        write_pcm_f32le(&[0.0, 1.0, -1.0], &path).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 12);
        let _ = std::fs::remove_file(path);
    }
}
