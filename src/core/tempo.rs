//! Global tempo estimation from an onset-strength envelope.

use ndarray::Axis;
use tracing::debug;

use crate::{
    core::dsp::stft_power,
    error::{RemixError, Result},
};

const ONSET_FFT: usize = 2048;
const ONSET_HOP: usize = 512;
const MIN_BPM: f32 = 30.0;
const MAX_BPM: f32 = 300.0;
const PRIOR_CENTER_BPM: f32 = 120.0;
const PRIOR_STD_OCTAVES: f32 = 1.0;

/// Spectral-flux onset envelope with log-compressed magnitudes.
pub fn onset_envelope(samples: &[f32]) -> Vec<f32> {
    let mag = stft_power(samples, ONSET_FFT, ONSET_HOP).mapv(|p| (1.0 + 100.0 * p.sqrt()).ln());
    let frames = mag.ncols();
    let mut env = vec![0.0f32; frames];

    for (fr, pair) in mag
        .axis_iter(Axis(1))
        .zip(mag.axis_iter(Axis(1)).skip(1))
        .enumerate()
    {
        let (prev, cur) = pair;
        env[fr + 1] = cur
            .iter()
            .zip(prev.iter())
            .map(|(c, p)| (c - p).max(0.0))
            .sum();
    }

    env
}

fn tempo_prior(bpm: f32) -> f32 {
    let octaves = (bpm / PRIOR_CENTER_BPM).log2() / PRIOR_STD_OCTAVES;
    (-0.5 * octaves * octaves).exp()
}

fn autocorrelate(x: &[f32], lag: usize) -> f32 {
    x.iter().zip(&x[lag..]).map(|(a, b)| a * b).sum()
}

/// Estimates the dominant tempo in beats per minute.
///
/// Fails when the signal is too short to cover the slowest tempo twice or
/// contains no periodic onsets.
pub fn estimate_tempo(samples: &[f32], sample_rate: u32) -> Result<f32> {
    let frame_rate = sample_rate as f32 / ONSET_HOP as f32;
    let env = onset_envelope(samples);

    let min_lag = (60.0 * frame_rate / MAX_BPM).ceil().max(1.0) as usize;
    let max_lag = ((60.0 * frame_rate / MIN_BPM).floor() as usize).min(env.len() / 2);
    if max_lag <= min_lag + 1 {
        return Err(RemixError::Analysis(format!(
            "clip too short for tempo detection ({} onset frames)",
            env.len()
        )));
    }

    let mean = env.iter().sum::<f32>() / env.len() as f32;
    let centered: Vec<f32> = env.iter().map(|v| v - mean).collect();

    let scores: Vec<f32> = (0..=max_lag + 1)
        .map(|lag| {
            if lag < min_lag || lag > max_lag {
                return 0.0;
            }
            let ac = autocorrelate(&centered, lag);
            let bpm = 60.0 * frame_rate / lag as f32;
            ac.max(0.0) * tempo_prior(bpm)
        })
        .collect();

    let (best_lag, best_score) = (min_lag..=max_lag)
        .map(|lag| (lag, scores[lag]))
        .fold((0usize, 0.0f32), |acc, cur| if cur.1 > acc.1 { cur } else { acc });

    if best_lag == 0 || best_score <= 0.0 {
        return Err(RemixError::Analysis("no rhythmic content detected".into()));
    }

    // Parabolic interpolation around the winning lag.
    let (a, b, c) = (scores[best_lag - 1], scores[best_lag], scores[best_lag + 1]);
    let denom = a - 2.0 * b + c;
    let shift = if denom.abs() > f32::EPSILON {
        (0.5 * (a - c) / denom).clamp(-0.5, 0.5)
    } else {
        0.0
    };

    let bpm = 60.0 * frame_rate / (best_lag as f32 + shift);
    debug!(best_lag, shift, bpm, "tempo estimate");
    Ok(bpm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prior_peaks_at_center() {
        assert!((tempo_prior(120.0) - 1.0).abs() < 1e-6);
        assert!(tempo_prior(60.0) < tempo_prior(100.0));
        assert!((tempo_prior(60.0) - tempo_prior(240.0)).abs() < 1e-6);
    }

    #[test]
    fn silence_has_no_tempo() {
        let silence = vec![0.0f32; 22_050 * 6];
        assert!(estimate_tempo(&silence, 22_050).is_err());
    }

    #[test]
    fn short_clip_is_rejected() {
        let x = vec![0.1f32; 4096];
        assert!(estimate_tempo(&x, 22_050).is_err());
    }
}
