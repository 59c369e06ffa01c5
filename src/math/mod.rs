// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Some helper mathematics.


use std::f64::consts::{PI, TAU};

/// The median of some values. The middle two values are averaged when there
/// is an even number of values. NaN is returned for no values.
pub(crate) fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// The (unscaled) median absolute deviation: median(|x - median(x)|).
pub(crate) fn median_abs_deviation(values: &[f64]) -> f64 {
    let m = median(values);
    let deviations: Vec<f64> = values.iter().map(|v| (v - m).abs()).collect();
    median(&deviations)
}

/// The sample frequencies of a discrete Fourier transform with `n` samples
/// spaced by `spacing`, re-ordered so that the zero frequency is centred (i.e.
/// numpy's `fftshift(fftfreq(n, spacing))`).
pub(crate) fn centred_fft_freqs(n: usize, spacing: f64) -> Vec<f64> {
    let scale = 1.0 / (n as f64 * spacing);
    // After shifting, index i corresponds to the (i - n/2)th frequency.
    let half = n / 2;
    (0..n).map(|i| (i as f64 - half as f64) * scale).collect()
}

/// Rotate the elements of `values` so that the zero-frequency element is at
/// the centre (numpy's `fftshift` for a single axis).
pub(crate) fn fftshift<T>(values: &mut [T]) {
    let half = values.len() / 2;
    values.rotate_right(half);
}

/// Unwrap a sequence of phases \[radians\] by adding multiples of 2π wherever
/// consecutive phases jump by more than π.
pub(crate) fn unwrap_phases(phases: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(phases.len());
    let mut correction = 0.0;
    let mut prev: Option<f64> = None;
    for &p in phases {
        if let Some(prev) = prev {
            let diff = p - prev;
            // Wrap the difference into [-π, π).
            let wrapped = (diff + PI).rem_euclid(TAU) - PI;
            // Keep a jump of exactly +π positive, like numpy does.
            let wrapped = if wrapped == -PI && diff > 0.0 {
                PI
            } else {
                wrapped
            };
            if diff.abs() >= PI {
                correction += wrapped - diff;
            }
        }
        out.push(p + correction);
        prev = Some(p);
    }
    out
}

/// Least-squares fit of a straight line. Returns (slope, intercept), or `None`
/// if there are fewer than two points or all x values are the same.
pub(crate) fn linear_fit(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let mean_x = x[..n].iter().sum::<f64>() / nf;
    let mean_y = y[..n].iter().sum::<f64>() / nf;
    let (sxy, sxx) = x[..n]
        .iter()
        .zip(y[..n].iter())
        .fold((0.0, 0.0), |(sxy, sxx), (&x, &y)| {
            let dx = x - mean_x;
            (sxy + dx * (y - mean_y), sxx + dx * dx)
        });
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some((slope, mean_y - slope * mean_x))
}
