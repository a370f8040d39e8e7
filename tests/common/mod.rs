#![allow(dead_code)]

use std::{f32::consts::PI, path::Path};

use phantom_trax::{write_audio, AudioData};

pub const C_MAJOR_TRIAD: [f32; 3] = [261.63, 329.63, 392.00];

/// Decaying 1 kHz bursts, one per beat.
pub fn click_track(bpm: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
    let total = (sample_rate as f32 * seconds) as usize;
    let period = 60.0 / bpm;
    (0..total)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let since_beat = t % period;
            (-since_beat / 0.02).exp() * (2.0 * PI * 1000.0 * t).sin()
        })
        .collect()
}

/// Chord struck on every beat and left to decay.
pub fn plucked_chord(freqs: &[f32], bpm: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
    let total = (sample_rate as f32 * seconds) as usize;
    let period = 60.0 / bpm;
    let n = freqs.len() as f32;
    (0..total)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let env = (-(t % period) / 0.12).exp();
            let tone: f32 = freqs.iter().map(|f| (2.0 * PI * f * t).sin()).sum();
            0.8 * env * tone / n
        })
        .collect()
}

pub fn write_mono_wav(path: &Path, samples: Vec<f32>, sample_rate: u32) {
    write_audio(
        path,
        &AudioData {
            samples,
            sample_rate,
            channels: 1,
        },
    )
    .expect("write wav fixture");
}

pub fn write_stereo_wav(path: &Path, mono: &[f32], sample_rate: u32) {
    let samples = mono.iter().flat_map(|&s| [s, s]).collect();
    write_audio(
        path,
        &AudioData {
            samples,
            sample_rate,
            channels: 2,
        },
    )
    .expect("write wav fixture");
}

/// Config pointed at a mock server, with a token.
pub fn mock_config(base_url: &str) -> phantom_trax::Config {
    let base_url = base_url.to_string();
    phantom_trax::Config::from_lookup(move |k| match k {
        "REPLICATE_API_TOKEN" => Some("r8_test_token".to_string()),
        "REPLICATE_API_BASE_URL" => Some(base_url.clone()),
        _ => None,
    })
}
