use std::path::Path;

use crate::foundation::error::{CrawlError, CrawlResult};

/// Sample rate the soundtrack is decoded and mixed at.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

/// Interleaved `f32` PCM.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioPcm {
    pub sample_rate: u32,
    pub channels: u16,
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.interleaved_f32.len() / usize::from(self.channels)
        }
    }

    pub fn duration_sec(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frames() as f64 / f64::from(self.sample_rate)
        }
    }
}

/// Decode any audio file `ffmpeg` can read into stereo `f32` PCM at `sample_rate`.
#[tracing::instrument]
pub fn decode_audio_f32_stereo(path: &Path, sample_rate: u32) -> CrawlResult<AudioPcm> {
    if !path.is_file() {
        return Err(CrawlError::asset(format!(
            "audio file '{}' does not exist",
            path.display()
        )));
    }

    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| CrawlError::asset(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        return Err(CrawlError::asset(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let pcm = pcm_from_f32le(&out.stdout)?;
    tracing::debug!(samples = pcm.len(), "soundtrack decoded");
    Ok(AudioPcm {
        sample_rate,
        channels: 2,
        interleaved_f32: pcm,
    })
}

fn pcm_from_f32le(bytes: &[u8]) -> CrawlResult<Vec<f32>> {
    if !bytes.len().is_multiple_of(4) {
        return Err(CrawlError::asset(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f32le_bytes_parse() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0.5f32.to_le_bytes());
        bytes.extend_from_slice(&(-1.0f32).to_le_bytes());
        assert_eq!(pcm_from_f32le(&bytes).unwrap(), vec![0.5, -1.0]);
        assert!(pcm_from_f32le(&bytes[..3]).is_err());
    }

    #[test]
    fn pcm_duration_counts_frames() {
        let pcm = AudioPcm {
            sample_rate: 4,
            channels: 2,
            interleaved_f32: vec![0.0; 16],
        };
        assert_eq!(pcm.frames(), 8);
        assert!((pcm.duration_sec() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn missing_file_is_an_asset_error() {
        let err = decode_audio_f32_stereo(Path::new("definitely/not/here.mp3"), MIX_SAMPLE_RATE)
            .unwrap_err();
        assert!(err.to_string().contains("asset error:"));
    }
}
