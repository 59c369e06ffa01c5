// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;

use super::*;
use crate::{constants::NUM_POLS, tests::make_context};

/// Visibilities of 2 antennas (3 baselines) whose every baseline, timestep and
/// polarisation has the given (real) spectrum.
fn spectrum_vis(spectrum: &[f64]) -> Array4<c64> {
    Array4::from_shape_fn((3, 2, spectrum.len(), NUM_POLS), |(_, _, f, _)| {
        c64::new(spectrum[f], 0.0)
    })
}

/// A gently rippled spectrum with spikes.
fn spiky_spectrum(num_channels: usize, ripple: f64, step: usize, spikes: &[usize], spike: f64) -> Vec<f64> {
    let mut spectrum: Vec<f64> = (0..num_channels)
        .map(|k| 1.0 + ripple * ((k * step) % 5) as f64)
        .collect();
    for &s in spikes {
        spectrum[s] += spike;
    }
    spectrum
}

#[test]
fn test_window_is_clamped() {
    assert_eq!(smoothing_window(16), MIN_RFI_WINDOW);
    assert_eq!(smoothing_window(40), 10);
    assert_eq!(smoothing_window(64), 16);
    assert_eq!(smoothing_window(80), 20);
    assert_eq!(smoothing_window(4096), MAX_RFI_WINDOW);
}

#[test]
fn test_small_spectra_use_the_minimum_window() {
    // With only 16 channels, a quarter-spectrum window (4 channels) would be
    // dominated by these three adjacent spikes, and flag channels 5 and 8
    // instead.
    let spectrum = spiky_spectrum(16, 0.01, 3, &[6, 7, 8], 5.0);
    let flagger = RfiFlagger {
        kind: RfiFlaggerType::SmoothedBandpass,
        threshold: 3.0,
    };
    let replacements = flagger.detect(&spectrum);
    let chans: Vec<usize> = replacements.iter().map(|(c, _)| *c).collect();
    assert_eq!(chans, [6, 7, 8]);
}

#[test]
fn test_smoothed_bandpass_model() {
    let spectrum = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    // Window 2: channel 0 uses [0, 2), channel 3 uses [2, 5), channel 5 uses
    // [4, 6).
    let model = Array1::from(smoothed_bandpass(&spectrum, 2));
    assert_abs_diff_eq!(model, array![1.5, 2.0, 3.0, 4.0, 5.0, 5.5]);
    // Window 3: channel 2 uses [0, 4).
    let model = Array1::from(smoothed_bandpass(&spectrum, 3));
    assert_abs_diff_eq!(model, array![1.5, 2.0, 2.5, 3.5, 4.5, 5.0]);
}

#[test]
fn test_global_median() {
    let spectrum = spiky_spectrum(64, 0.1, 7, &[5, 20, 41], 10.0);
    let flagger = RfiFlagger {
        kind: RfiFlaggerType::GlobalMedian,
        threshold: 3.0,
    };
    let med = crate::math::median(&spectrum);
    let mut vis = spectrum_vis(&spectrum);
    let flags = flagger.flag_in_place(vis.view_mut());

    assert_eq!(flags.num_baselines(), 3);
    for i_bl in 0..3 {
        assert_eq!(flags.diagnostic_channels(i_bl), [5, 20, 41]);
        for i_pol in 0..NUM_POLS {
            assert_eq!(flags.channels(i_bl, i_pol), [5, 20, 41]);
        }
    }
    assert_eq!(flags.num_flagged(), 3 * 4 * 3);
    for &v in vis.slice(s![.., .., 20, ..]) {
        assert_abs_diff_eq!(v.re, med);
        assert_abs_diff_eq!(v.im, 0.0);
    }
    // Unflagged channels are untouched.
    assert_eq!(vis[[1, 1, 6, 2]], c64::new(spectrum[6], 0.0));

    // Flagging again finds nothing.
    let again = flagger.flag_in_place(vis.view_mut());
    assert!(again.is_empty());
}

#[test]
fn test_smoothed_bandpass() {
    let spectrum = spiky_spectrum(64, 0.01, 3, &[5, 20, 41], 5.0);
    let flagger = RfiFlagger {
        kind: RfiFlaggerType::SmoothedBandpass,
        threshold: 5.0,
    };
    let model = smoothed_bandpass(&spectrum, smoothing_window(64));
    let (flagged, flags) = flagger.flag(spectrum_vis(&spectrum).view());

    for i_bl in 0..3 {
        for i_pol in 0..NUM_POLS {
            assert_eq!(flags.channels(i_bl, i_pol), [5, 20, 41]);
        }
    }
    for chan in [5, 20, 41] {
        for &v in flagged.slice(s![.., .., chan, ..]) {
            assert_abs_diff_eq!(v.re, model[chan], epsilon = 1e-12);
        }
    }

    let (_, again) = flagger.flag(flagged.view());
    assert!(again.is_empty());
}

#[test]
fn test_flat_spectrum_flags_nothing() {
    // The MAD of a flat spectrum (even with a spike) is zero.
    let mut spectrum = vec![1.0; 32];
    spectrum[10] = 50.0;
    for kind in [RfiFlaggerType::GlobalMedian, RfiFlaggerType::SmoothedBandpass] {
        let flagger = RfiFlagger {
            kind,
            threshold: 3.0,
        };
        let vis = spectrum_vis(&spectrum);
        let (flagged, flags) = flagger.flag(vis.view());
        assert!(flags.is_empty());
        assert_eq!(flagged, vis);
    }
}

#[test]
fn test_rounding_noise_flags_nothing() {
    // Amplitudes of unit gains differ from 1 by rounding error only. The MAD
    // is 2 epsilon, so channels 14 epsilon away are "outliers".
    let spectrum: Vec<f64> = (0..64)
        .map(|i| match i {
            10 | 30 | 45 | 60 => 1.0 + 16.0 * f64::EPSILON,
            i if i % 2 == 0 => 1.0,
            _ => 1.0 + 2.0 * f64::EPSILON,
        })
        .collect();
    for kind in [RfiFlaggerType::GlobalMedian, RfiFlaggerType::SmoothedBandpass] {
        let flagger = RfiFlagger {
            kind,
            threshold: 3.0,
        };
        assert!(flagger.detect(&spectrum).is_empty());
    }
}

/// Deterministic uniform noise in [0, 1).
fn noise(seed: u64, n: usize) -> Vec<f64> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 11) as f64 / (1u64 << 53) as f64
        })
        .collect()
}

#[test]
fn test_flagging_output_again_finds_nothing() {
    for kind in [RfiFlaggerType::GlobalMedian, RfiFlaggerType::SmoothedBandpass] {
        let flagger = RfiFlagger {
            kind,
            threshold: 3.0,
        };
        for seed in 0..200 {
            let mut spectrum: Vec<f64> = noise(seed, 128).into_iter().map(|n| 1.0 + 0.1 * n).collect();
            for chan in (0..128).step_by(37) {
                spectrum[chan] += 2.0;
            }

            let (flagged, flags) = flagger.flag(spectrum_vis(&spectrum).view());
            for chan in [0, 37, 74, 111] {
                assert!(flags.channels(0, 0).contains(&chan), "{kind} seed {seed}");
            }
            let (_, again) = flagger.flag(flagged.view());
            assert!(again.is_empty(), "{kind} seed {seed}: {:?}", again.channels(0, 0));
        }
    }
}

#[test]
fn test_polarisations_are_independent() {
    let clean = spiky_spectrum(64, 0.1, 7, &[], 0.0);
    let dirty = spiky_spectrum(64, 0.1, 7, &[30], 10.0);
    let mut vis = Array4::from_shape_fn((3, 1, 64, NUM_POLS), |(_, _, f, p)| {
        c64::new(if p == 3 { dirty[f] } else { clean[f] }, 0.0)
    });
    let flags = RfiFlagger {
        kind: RfiFlaggerType::GlobalMedian,
        threshold: 3.0,
    }
    .flag_in_place(vis.view_mut());
    assert!(flags.diagnostic_channels(0).is_empty());
    assert_eq!(flags.channels(0, 3), [30]);
    assert_eq!(flags.num_flagged(), 3);
}

#[test]
fn test_amplitudes_are_time_averaged() {
    let mut vis = Array3::zeros((2, 2, 1));
    vis[[0, 0, 0]] = c64::new(3.0, 4.0);
    vis[[1, 0, 0]] = c64::new(0.0, -1.0);
    vis[[0, 1, 0]] = c64::new(2.0, 0.0);
    let amps = time_averaged_amplitudes(vis.view());
    assert_abs_diff_eq!(amps, array![[3.0], [1.0]]);
}

#[test]
fn test_to_antenna_flags() {
    let context = make_context(3, 8);
    // Baselines: (0,0), (1,1), (2,2), (0,1), (0,2), (1,2).
    let mut channels = vec![vec![vec![]; NUM_POLS]; 6];
    channels[1][0] = vec![0];
    channels[3][0] = vec![2, 5];
    channels[3][3] = vec![7];
    channels[4][0] = vec![1];
    channels[5][3] = vec![3];
    let flags = RfiFlags { channels };

    let antenna_flags = flags.to_antenna_flags(&context, 1).unwrap();
    assert_eq!(antenna_flags.reference_antenna, "ea01");
    let f = &antenna_flags.flagged_freqs_hz;
    assert_eq!(f.keys().collect::<Vec<_>>(), ["ea01", "ea00", "ea02"]);
    assert_eq!(f["ea01"], [vec![1e9], vec![]]);
    assert_eq!(f["ea00"], [vec![1.002e9, 1.005e9], vec![1.007e9]]);
    assert_eq!(f["ea02"], [vec![], vec![1.003e9]]);

    assert_eq!(
        flags.to_antenna_flags(&context, 5),
        Err(FlaggingError::MissingReference(5))
    );
    let context = make_context(4, 8);
    assert_eq!(
        flags.to_antenna_flags(&context, 1),
        Err(FlaggingError::NumBaselines {
            expected: 10,
            got: 6
        })
    );
}

#[test]
fn test_flagger_type_parsing() {
    assert_eq!(
        "global-median".parse::<RfiFlaggerType>(),
        Ok(RfiFlaggerType::GlobalMedian)
    );
    assert_eq!(
        "smoothed-bandpass".parse::<RfiFlaggerType>(),
        Ok(RfiFlaggerType::SmoothedBandpass)
    );
    assert_eq!(RfiFlaggerType::default(), RfiFlaggerType::SmoothedBandpass);
}
