//! Sample containers shared by every mixing stage.
//!
//! - [`AudioTrack`] is what callers hand in: mono or planar multi-channel `f64` samples
//!   plus a sample rate. A track with no channels stands for "no sample data".
//! - [`AudioBuffer`] is the mono working/output buffer. Operations never mutate a buffer
//!   they were given; they always return a new one.
//!
//! Time and sample domains are converted with [`secs_to_sample`], which floors for both
//! starts and ends so that two spans sharing a timestamp also share a sample boundary.

use serde::Serialize;
use tracing::warn;

use crate::error::{Error, Result};

/// Caller-owned input track.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    channels: Vec<Vec<f64>>,
    sample_rate: u32,
}

impl AudioTrack {
    /// A single-channel track.
    pub fn mono(samples: Vec<f64>, sample_rate: u32) -> Self {
        Self {
            channels: vec![samples],
            sample_rate,
        }
    }

    /// A planar (`[channels][frames]`) track.
    pub fn planar(channels: Vec<Vec<f64>>, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
        }
    }

    /// A track built from interleaved frames (`L R L R ...`), as most decoders emit them.
    ///
    /// A trailing partial frame is dropped.
    pub fn interleaved(samples: &[f64], channel_count: usize, sample_rate: u32) -> Self {
        if channel_count == 0 {
            return Self::planar(Vec::new(), sample_rate);
        }

        let frames = samples.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (ch, &s) in channels.iter_mut().zip(frame) {
                ch.push(s);
            }
        }
        Self::planar(channels, sample_rate)
    }

    /// A track with no sample data at all.
    pub fn absent(sample_rate: u32) -> Self {
        Self::planar(Vec::new(), sample_rate)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channels(&self) -> &[Vec<f64>] {
        &self.channels
    }

    /// Whether the track carries sample data (at least one channel).
    pub fn is_present(&self) -> bool {
        !self.channels.is_empty()
    }

    /// Downmix to mono by arithmetic mean across channels.
    ///
    /// Returns `None` when the track has no channels. Channels of unequal length are
    /// truncated to the shortest one.
    pub fn to_mono(&self) -> Option<AudioBuffer> {
        let first = self.channels.first()?;

        if self.channels.len() == 1 {
            return Some(AudioBuffer::new(first.clone(), self.sample_rate));
        }

        let frames = self.channels.iter().map(Vec::len).min().unwrap_or(0);
        let longest = self.channels.iter().map(Vec::len).max().unwrap_or(0);
        if frames != longest {
            warn!(
                frames,
                longest, "channels differ in length; truncating downmix to shortest channel"
            );
        }

        let scale = 1.0 / self.channels.len() as f64;
        let mut mono = vec![0.0; frames];
        for ch in &self.channels {
            for (acc, &s) in mono.iter_mut().zip(&ch[..frames]) {
                *acc += s;
            }
        }
        mono.iter_mut().for_each(|s| *s *= scale);

        Some(AudioBuffer::new(mono, self.sample_rate))
    }

    /// Downmix, failing with [`Error::MissingData`] when there are no channels.
    pub(crate) fn require_mono(&self, what: &'static str) -> Result<AudioBuffer> {
        self.to_mono().ok_or(Error::MissingData(what))
    }
}

impl From<AudioBuffer> for AudioTrack {
    fn from(buf: AudioBuffer) -> Self {
        Self::mono(buf.samples, buf.sample_rate)
    }
}

/// Mono sample buffer with its sample rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioBuffer {
    samples: Vec<f64>,
    sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds (`0.0` when the sample rate is zero).
    pub fn duration(&self) -> f64 {
        samples_to_secs(self.samples.len(), self.sample_rate)
    }

    /// Largest absolute sample value (`0.0` for an empty buffer).
    pub fn peak(&self) -> f64 {
        peak(&self.samples)
    }

    /// Root-mean-square level of the whole buffer.
    pub fn rms(&self) -> f64 {
        rms(&self.samples)
    }
}

/// Convert seconds to a sample index, flooring. Negative or NaN times map to 0.
pub fn secs_to_sample(secs: f64, sample_rate: u32) -> usize {
    let idx = (secs * sample_rate as f64).floor();
    if idx.is_nan() || idx <= 0.0 {
        0
    } else {
        idx as usize
    }
}

/// Convert a sample count or index to seconds.
pub fn samples_to_secs(samples: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    samples as f64 / sample_rate as f64
}

/// Root-mean-square of a slice (`0.0` for an empty slice).
pub fn rms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f64).sqrt()
}

/// Largest absolute value in a slice (`0.0` for an empty slice).
pub fn peak(samples: &[f64]) -> f64 {
    samples.iter().fold(0.0_f64, |m, s| m.max(s.abs()))
}

/// `n` evenly spaced values from 0 to 1 inclusive (`[0.0]` when `n == 1`).
pub(crate) fn unit_ramp(n: usize) -> impl Iterator<Item = f64> {
    let denom = n.saturating_sub(1).max(1) as f64;
    (0..n).map(move |i| i as f64 / denom)
}
