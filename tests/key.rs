mod common;

use phantom_trax::core::key::{
    estimate_key, estimate_key_from_profile, rotated_correlation, Mode, MAJOR_PROFILE,
    MINOR_PROFILE, PITCH_NAMES,
};
use tempfile::tempdir;

use common::{plucked_chord, write_mono_wav, C_MAJOR_TRIAD};

fn rotate(template: &[f64; 12], tonic: usize) -> [f64; 12] {
    let mut out = [0.0; 12];
    for (i, v) in template.iter().enumerate() {
        out[(tonic + i) % 12] = *v;
    }
    out
}

/// Deterministic pseudo-random profiles.
fn lcg_profile(seed: &mut u64) -> [f64; 12] {
    let mut p = [0.0; 12];
    for v in p.iter_mut() {
        *seed = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        *v = ((*seed >> 33) as f64) / (1u64 << 31) as f64;
    }
    p
}

#[test]
fn every_rotated_template_maps_back_to_its_key() {
    for tonic in 0..12 {
        let major = estimate_key_from_profile(&rotate(&MAJOR_PROFILE, tonic));
        assert_eq!(major.label(), format!("{} Major", PITCH_NAMES[tonic]));
        approx::assert_relative_eq!(major.correlation, 1.0, epsilon = 1e-9);

        let minor = estimate_key_from_profile(&rotate(&MINOR_PROFILE, tonic));
        assert_eq!(minor.label(), format!("{} Minor", PITCH_NAMES[tonic]));
    }
}

#[test]
fn estimate_matches_exhaustive_search() {
    let mut seed = 7u64;
    for _ in 0..200 {
        let profile = lcg_profile(&mut seed);
        let got = estimate_key_from_profile(&profile);

        let mut best = (f64::NEG_INFINITY, 0usize, Mode::Major);
        for (mode, template) in [(Mode::Major, &MAJOR_PROFILE), (Mode::Minor, &MINOR_PROFILE)] {
            for tonic in 0..12 {
                let r = rotated_correlation(&profile, template, tonic);
                if r >= best.0 {
                    best = (r, tonic, mode);
                }
            }
        }

        assert_eq!((got.tonic, got.mode), (best.1, best.2));
        approx::assert_relative_eq!(got.correlation, best.0);
    }
}

#[test]
fn later_candidate_wins_a_tie() {
    // A flat profile correlates 0 with every key; the last one scanned wins.
    let est = estimate_key_from_profile(&[1.0; 12]);
    assert_eq!(est.label(), "B Minor");
    assert_eq!(est.correlation, 0.0);
}

#[test]
fn silence_has_no_key() {
    assert!(estimate_key(&vec![0.0; 22_050 * 2], 22_050).is_none());
}

#[test]
fn c_major_triad_is_detected() {
    let samples = plucked_chord(&C_MAJOR_TRIAD, 120.0, 22_050, 4.0);
    let est = estimate_key(&samples, 22_050).expect("pitched content");
    assert_eq!(est.label(), "C Major");

    let dir = tempdir().unwrap();
    let path = dir.path().join("triad.wav");
    write_mono_wav(&path, samples, 22_050);
    let features = phantom_trax::analyze_file(&path).unwrap();
    assert_eq!(features.key, "C Major");
}
