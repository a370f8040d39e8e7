use ndarray::Array2;
use num_complex::Complex32;
use once_cell::sync::Lazy;
use rustfft::{num_traits::Zero, Fft, FftPlanner};
use std::sync::Arc;

/// Sample rate all analysis runs at.
pub const ANALYSIS_RATE: u32 = 22_050;

struct FftCache {
    fft_forward: Arc<dyn Fft<f32>>,
    hann_window: Vec<f32>,
}

impl FftCache {
    fn new(n_fft: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            fft_forward: planner.plan_fft_forward(n_fft),
            hann_window: compute_hann(n_fft),
        }
    }
}

static FFT_CACHE_4096: Lazy<FftCache> = Lazy::new(|| FftCache::new(4096));
static FFT_CACHE_2048: Lazy<FftCache> = Lazy::new(|| FftCache::new(2048));

fn with_cache<R>(n_fft: usize, f: impl FnOnce(&FftCache) -> R) -> R {
    match n_fft {
        4096 => f(&FFT_CACHE_4096),
        2048 => f(&FFT_CACHE_2048),
        _ => f(&FftCache::new(n_fft)),
    }
}

pub fn compute_hann(n_fft: usize) -> Vec<f32> {
    if n_fft <= 1 {
        return vec![1.0];
    }
    let denom = (n_fft - 1) as f32;
    (0..n_fft)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f32::consts::PI * (i as f32) / denom).cos())
        .collect()
}

/// Number of full frames that fit in `len` samples.
pub fn frame_count(len: usize, n_fft: usize, hop: usize) -> usize {
    if len < n_fft || hop == 0 {
        0
    } else {
        (len - n_fft) / hop + 1
    }
}

/// Hann-windowed power spectrogram without padding.
///
/// Shape is `[n_fft / 2 + 1, frames]`; frames that would run past the end of
/// the signal are dropped.
pub fn stft_power(samples: &[f32], n_fft: usize, hop: usize) -> Array2<f32> {
    let bins = n_fft / 2 + 1;
    let frames = frame_count(samples.len(), n_fft, hop);
    let mut out = Array2::<f32>::zeros((bins, frames));

    with_cache(n_fft, |cache| {
        let mut buf = vec![Complex32::zero(); n_fft];
        for fr in 0..frames {
            let start = fr * hop;
            let frame = &samples[start..start + n_fft];
            for (i, (&s, &w)) in frame.iter().zip(&cache.hann_window).enumerate() {
                buf[i] = Complex32::new(s * w, 0.0);
            }

            cache.fft_forward.process(&mut buf);

            for bi in 0..bins {
                out[[bi, fr]] = buf[bi].norm_sqr();
            }
        }
    });

    out
}

/// Frequency in Hz of FFT bin `bin`.
pub fn bin_frequency(bin: usize, n_fft: usize, sample_rate: u32) -> f32 {
    bin as f32 * sample_rate as f32 / n_fft as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hann_endpoints_are_zero() {
        let w = compute_hann(8);
        assert!(w[0].abs() < 1e-7);
        assert!(w[7].abs() < 1e-7);
    }

    #[test]
    fn frame_count_handles_short_input() {
        assert_eq!(frame_count(100, 2048, 512), 0);
        assert_eq!(frame_count(2048, 2048, 512), 1);
        assert_eq!(frame_count(2048 + 1024, 2048, 512), 3);
    }

    #[test]
    fn sine_peaks_at_expected_bin() {
        let sr = ANALYSIS_RATE;
        let n_fft = 2048;
        // Exactly on bin 100.
        let freq = bin_frequency(100, n_fft, sr);
        let x: Vec<f32> = (0..n_fft * 2)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sr as f32).sin())
            .collect();
        let spec = stft_power(&x, n_fft, 512);
        let col = spec.column(0);
        let peak = col
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |acc, (i, &v)| if v > acc.1 { (i, v) } else { acc })
            .0;
        assert_eq!(peak, 100);
    }
}
