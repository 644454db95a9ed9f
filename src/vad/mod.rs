//! Voice Activity Detection (VAD).
//!
//! A lightweight spectral heuristic, not a trained model:
//! - Slide a window across the (mono) track.
//! - A window is "voice" when its RMS clears a threshold *and* enough of its spectral
//!   magnitude falls inside the voice band (85–255 Hz by default).
//! - Contiguous voice windows become one [`VoiceSegment`].
//! - Segments separated by short pauses are merged afterwards.
//!
//! Output is ordered and non-overlapping, and identical input always yields identical
//! segments.

mod merge;
mod spectrum;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::buffer::{AudioBuffer, AudioTrack, rms, samples_to_secs};
use crate::config::VadConfig;
use crate::error::Result;

pub use merge::merge_segments;
use spectrum::BandAnalyzer;

/// A voice-active interval of a track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceSegment {
    /// Start of the interval, in seconds.
    pub start_time: f64,

    /// End of the interval, in seconds (always greater than `start_time`).
    pub end_time: f64,

    /// Detection confidence in `[0, 1]`.
    pub confidence: f64,

    /// Mean RMS of the windows that formed the segment.
    pub rms_level: f64,
}

impl VoiceSegment {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Detect voice-active segments in `track`.
///
/// Multi-channel tracks are downmixed by arithmetic mean. Absent or empty samples,
/// a zero sample rate, and tracks shorter than one window all produce an empty list.
pub fn detect_voice_activity(track: &AudioTrack, cfg: &VadConfig) -> Result<Vec<VoiceSegment>> {
    match track.to_mono() {
        Some(mono) => detect_voice_in_buffer(&mono, cfg),
        None => Ok(Vec::new()),
    }
}

/// [`detect_voice_activity`] for a buffer that is already mono.
pub fn detect_voice_in_buffer(mono: &AudioBuffer, cfg: &VadConfig) -> Result<Vec<VoiceSegment>> {
    let sample_rate = mono.sample_rate();
    let samples = mono.samples();
    let window_len = (cfg.window_secs * sample_rate as f64) as usize;
    let hop_len = (cfg.hop_secs * sample_rate as f64) as usize;

    if window_len == 0 || hop_len == 0 || samples.len() < window_len {
        return Ok(Vec::new());
    }

    let mut analyzer = BandAnalyzer::new(
        window_len,
        sample_rate,
        (cfg.voice_band_low_hz, cfg.voice_band_high_hz),
    );

    let mut raw = Vec::new();
    let mut open: Option<OpenRun> = None;

    for start in (0..=samples.len() - window_len).step_by(hop_len) {
        let window = &samples[start..start + window_len];
        let window_rms = rms(window);

        // Skip the FFT when the energy gate already rules the window out.
        let is_voice = window_rms > cfg.rms_threshold
            && analyzer.band_ratio(window)? > cfg.voice_ratio_threshold;

        let time = samples_to_secs(start, sample_rate);
        match (is_voice, open.as_mut()) {
            (true, Some(run)) => run.push(window_rms),
            (true, None) => open = Some(OpenRun::new(time, window_rms)),
            (false, Some(_)) => {
                if let Some(seg) = open.take().and_then(|run| run.close(time, cfg)) {
                    raw.push(seg);
                }
            }
            (false, None) => {}
        }
    }

    // A run still open at the end closes at the buffer's true duration.
    if let Some(seg) = open.and_then(|run| run.close(mono.duration(), cfg)) {
        raw.push(seg);
    }

    let merged = merge_segments(raw, cfg.merge_gap_secs);
    debug!(
        samples = samples.len(),
        sample_rate,
        segments = merged.len(),
        "voice activity detected"
    );
    Ok(merged)
}

/// A voice run that has started but not yet ended.
struct OpenRun {
    start_time: f64,
    rms_sum: f64,
    windows: usize,
}

impl OpenRun {
    fn new(start_time: f64, rms: f64) -> Self {
        Self {
            start_time,
            rms_sum: rms,
            windows: 1,
        }
    }

    fn push(&mut self, rms: f64) {
        self.rms_sum += rms;
        self.windows += 1;
    }

    /// Close the run at `end_time`. Zero-length runs yield nothing.
    fn close(self, end_time: f64, cfg: &VadConfig) -> Option<VoiceSegment> {
        if end_time <= self.start_time {
            return None;
        }

        let avg_rms = self.rms_sum / self.windows as f64;
        let duration = end_time - self.start_time;
        let confidence = ((avg_rms / cfg.confidence_reference_rms)
            * (duration / cfg.confidence_reference_secs))
            .clamp(0.0, 1.0);

        Some(VoiceSegment {
            start_time: self.start_time,
            end_time,
            confidence,
            rms_level: avg_rms,
        })
    }
}
