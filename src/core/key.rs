//! Key estimation by chroma / key-profile correlation.
//!
//! The summed chroma profile is compared against the Krumhansl-Kessler major
//! and minor profiles under all 12 rotations. Major rotations are scanned
//! first, then minor, and a candidate replaces the current best when its
//! correlation is greater than *or equal to* it. A major/minor tie therefore
//! resolves to the minor key.

use ndarray::{Array2, Axis};

use crate::core::dsp::{bin_frequency, stft_power};

const CHROMA_FFT: usize = 4096;
const CHROMA_HOP: usize = 2048;
const MIN_FREQ: f32 = 65.0;
const MAX_FREQ: f32 = 2000.0;

pub const PITCH_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

pub const MAJOR_PROFILE: [f64; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

pub const MINOR_PROFILE: [f64; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Major,
    Minor,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeyEstimate {
    pub tonic: usize,
    pub mode: Mode,
    pub correlation: f64,
}

impl KeyEstimate {
    pub fn label(&self) -> String {
        let mode = match self.mode {
            Mode::Major => "Major",
            Mode::Minor => "Minor",
        };
        format!("{} {}", PITCH_NAMES[self.tonic], mode)
    }
}

fn pitch_class(freq: f32) -> usize {
    let midi = 69.0 + 12.0 * (freq / 440.0).log2();
    (midi.round() as i32).rem_euclid(12) as usize
}

/// Per-frame chroma, shape `[12, frames]`.
pub fn chromagram(samples: &[f32], sample_rate: u32) -> Array2<f64> {
    let power = stft_power(samples, CHROMA_FFT, CHROMA_HOP);
    let frames = power.ncols();
    let mut chroma = Array2::<f64>::zeros((12, frames));

    for (bin, row) in power.axis_iter(Axis(0)).enumerate() {
        let freq = bin_frequency(bin, CHROMA_FFT, sample_rate);
        if !(MIN_FREQ..=MAX_FREQ).contains(&freq) {
            continue;
        }
        let pc = pitch_class(freq);
        for (fr, &p) in row.iter().enumerate() {
            chroma[[pc, fr]] += p as f64;
        }
    }

    chroma
}

/// Sums chroma over time and scales so the largest bin is 1.
///
/// Returns `None` when there is no pitched energy at all.
pub fn chroma_profile(chroma: &Array2<f64>) -> Option<[f64; 12]> {
    if chroma.ncols() == 0 {
        return None;
    }
    let summed = chroma.sum_axis(Axis(1));
    let max = summed.iter().cloned().fold(0.0f64, f64::max);
    if max <= 0.0 {
        return None;
    }

    let mut profile = [0.0f64; 12];
    for (dst, v) in profile.iter_mut().zip(summed.iter()) {
        *dst = v / max;
    }
    Some(profile)
}

/// Pearson correlation between `profile` rotated so index 0 is `tonic` and
/// the key template.
pub fn rotated_correlation(profile: &[f64; 12], template: &[f64; 12], tonic: usize) -> f64 {
    let n = 12.0;
    let x: Vec<f64> = (0..12).map(|i| profile[(tonic + i) % 12]).collect();
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = template.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(template) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom < 1e-12 {
        0.0
    } else {
        cov / denom
    }
}

/// Picks the best of the 24 keys for a 12-bin profile.
pub fn estimate_key_from_profile(profile: &[f64; 12]) -> KeyEstimate {
    let mut best = KeyEstimate {
        tonic: 0,
        mode: Mode::Major,
        correlation: f64::NEG_INFINITY,
    };

    for (mode, template) in [(Mode::Major, &MAJOR_PROFILE), (Mode::Minor, &MINOR_PROFILE)] {
        for tonic in 0..12 {
            let correlation = rotated_correlation(profile, template, tonic);
            if correlation >= best.correlation {
                best = KeyEstimate {
                    tonic,
                    mode,
                    correlation,
                };
            }
        }
    }

    best
}

/// Estimates the key of a mono signal, or `None` if it holds no pitched energy.
pub fn estimate_key(samples: &[f32], sample_rate: u32) -> Option<KeyEstimate> {
    let chroma = chromagram(samples, sample_rate);
    chroma_profile(&chroma).map(|p| estimate_key_from_profile(&p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_class_of_reference_tones() {
        assert_eq!(pitch_class(440.0), 9);
        assert_eq!(pitch_class(261.63), 0);
        assert_eq!(pitch_class(277.18), 1);
        assert_eq!(pitch_class(123.47), 11);
    }

    #[test]
    fn correlation_with_itself_is_one() {
        let r = rotated_correlation(&MAJOR_PROFILE, &MAJOR_PROFILE, 0);
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn flat_profile_correlates_to_zero() {
        assert_eq!(rotated_correlation(&[1.0; 12], &MINOR_PROFILE, 3), 0.0);
    }

    #[test]
    fn labels() {
        let k = KeyEstimate {
            tonic: 1,
            mode: Mode::Minor,
            correlation: 0.5,
        };
        assert_eq!(k.label(), "C# Minor");
    }
}
