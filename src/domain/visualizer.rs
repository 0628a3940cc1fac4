//! Amplitude visualizer math
//!
//! Converts live capture samples into the byte-scaled frequency magnitudes a
//! browser analyser reports, and those magnitudes into bar heights.

use std::f32::consts::PI;

/// Number of bars drawn while recording
pub const BAR_COUNT: usize = 20;

/// Analysis window length
pub const FFT_SIZE: usize = 256;

/// Frequency bins produced for one window
pub const BIN_COUNT: usize = FFT_SIZE / 2;

/// Height of a silent bar, keeps it visible
pub const MIN_BAR_HEIGHT_PX: f32 = 2.0;

const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;

/// One bar of the recording visualizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub height_px: f32,
    pub opacity: f32,
}

impl Bar {
    /// Bar for a byte-scaled magnitude (0..=255)
    pub fn from_level(level: u8) -> Self {
        let level = f32::from(level);
        Self {
            height_px: (level / 2.0).max(MIN_BAR_HEIGHT_PX),
            opacity: 0.1 + (level / 255.0) * 0.9,
        }
    }
}

impl Default for Bar {
    fn default() -> Self {
        Self::from_level(0)
    }
}

/// Map the first `BAR_COUNT` bins to bars; missing bins render as silence.
pub fn bars_from_levels(levels: &[u8]) -> [Bar; BAR_COUNT] {
    let mut bars = [Bar::default(); BAR_COUNT];
    for (bar, &level) in bars.iter_mut().zip(levels) {
        *bar = Bar::from_level(level);
    }
    bars
}

/// Byte-scaled magnitude spectrum of the last `FFT_SIZE` samples.
///
/// Fills `out` (up to `BIN_COUNT` entries) and returns how many were written.
/// Shorter input is treated as zero-padded at the front.
pub fn byte_frequency_data(samples: &[f32], out: &mut [u8]) -> usize {
    let bins = out.len().min(BIN_COUNT);
    let window = &samples[samples.len().saturating_sub(FFT_SIZE)..];
    let offset = FFT_SIZE - window.len();

    for (k, slot) in out.iter_mut().take(bins).enumerate() {
        let mut re = 0.0f32;
        let mut im = 0.0f32;
        for (i, &sample) in window.iter().enumerate() {
            let n = i + offset;
            let x = sample * blackman(n);
            let phase = 2.0 * PI * k as f32 * n as f32 / FFT_SIZE as f32;
            re += x * phase.cos();
            im -= x * phase.sin();
        }
        let magnitude = (re * re + im * im).sqrt() / FFT_SIZE as f32;
        *slot = magnitude_to_byte(magnitude);
    }

    bins
}

fn blackman(n: usize) -> f32 {
    let a = 0.16;
    let a0 = 0.5 * (1.0 - a);
    let a1 = 0.5;
    let a2 = 0.5 * a;
    let x = n as f32 / FFT_SIZE as f32;
    a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
}

fn magnitude_to_byte(magnitude: f32) -> u8 {
    if magnitude <= 0.0 {
        return 0;
    }
    let db = 20.0 * magnitude.log10();
    let scaled = 255.0 * (db - MIN_DECIBELS) / (MAX_DECIBELS - MIN_DECIBELS);
    scaled.clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_bar_keeps_floor() {
        let bar = Bar::from_level(0);
        assert_eq!(bar.height_px, MIN_BAR_HEIGHT_PX);
        assert!((bar.opacity - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn full_bar() {
        let bar = Bar::from_level(255);
        assert_eq!(bar.height_px, 127.5);
        assert!((bar.opacity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn bars_are_monotonic_in_level() {
        let mut previous = Bar::from_level(0);
        for level in 1..=255u8 {
            let bar = Bar::from_level(level);
            assert!(bar.height_px >= previous.height_px);
            assert!(bar.opacity > previous.opacity);
            previous = bar;
        }
    }

    #[test]
    fn bars_use_first_twenty_bins() {
        let levels: Vec<u8> = (0..64).map(|i| (i * 4) as u8).collect();
        let bars = bars_from_levels(&levels);
        assert_eq!(bars.len(), BAR_COUNT);
        assert_eq!(bars[19], Bar::from_level(76));
    }

    #[test]
    fn short_levels_pad_with_silence() {
        let bars = bars_from_levels(&[200]);
        assert_eq!(bars[0], Bar::from_level(200));
        assert_eq!(bars[1], Bar::default());
    }

    #[test]
    fn silence_has_empty_spectrum() {
        let mut out = [0u8; BAR_COUNT];
        let written = byte_frequency_data(&[0.0; FFT_SIZE], &mut out);
        assert_eq!(written, BAR_COUNT);
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn tone_peaks_at_its_bin() {
        // bin 8 of a 256-point window
        let samples: Vec<f32> = (0..FFT_SIZE)
            .map(|n| 0.05 * (2.0 * PI * 8.0 * n as f32 / FFT_SIZE as f32).sin())
            .collect();
        let mut out = [0u8; BAR_COUNT];
        byte_frequency_data(&samples, &mut out);
        let peak = out.iter().enumerate().max_by_key(|(_, &v)| v).map(|(i, _)| i);
        assert_eq!(peak, Some(8));
        assert!(out[8] > out[2]);
    }

    #[test]
    fn output_is_capped_at_bin_count() {
        let mut out = vec![0u8; BIN_COUNT + 10];
        assert_eq!(byte_frequency_data(&[0.1; 10], &mut out), BIN_COUNT);
    }
}
