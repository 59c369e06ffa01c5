// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::f64::consts::TAU;

use approx::assert_abs_diff_eq;
use tempfile::TempDir;

use super::*;
use crate::solutions::AntennaGains;

fn freqs_hz() -> Vec<f64> {
    (0..16).map(|i| 1e9 + i as f64 * 1e6).collect()
}

/// Phases of a delay `delay_ns`, wrapped into [0, 2π).
fn delay_phases(delay_ns: f64) -> Vec<f64> {
    freqs_hz()
        .iter()
        .map(|f| (TAU * f * delay_ns * 1e-9).rem_euclid(TAU))
        .collect()
}

fn write_record(dir: &TempDir) -> PathBuf {
    let gains = [("ea00", 0.0), ("ea03", 7.0), ("ea05", -12.0)]
        .into_iter()
        .map(|(antenna, delay)| {
            let phases = delay_phases(delay);
            let re: Vec<f64> = phases.iter().map(|p| p.cos()).collect();
            let im: Vec<f64> = phases.iter().map(|p| p.sin()).collect();
            (
                antenna.to_string(),
                AntennaGains {
                    gain_pol0_real: re.clone(),
                    gain_pol0_imag: im.clone(),
                    gain_pol1_real: re,
                    gain_pol1_imag: im,
                },
            )
        })
        .collect();
    let record = GainSolutionRecord {
        reference_antenna: "ea00".to_string(),
        freqs_hz: freqs_hz(),
        grade: Some(0.5),
        proposed_grade: None,
        gains,
    };
    let file = dir.path().join("gains.json");
    record.write_json(&file).unwrap();
    file
}

fn run(input: PathBuf, output: PathBuf) -> Result<(), CosmicCalError> {
    GainsToDelaysArgs {
        args_file: None,
        args: GainsToDelaysCliArgs {
            input: Some(input),
            output: Some(output),
        },
    }
    .run(false)
}

#[test]
fn test_delays_from_gains() {
    let dir = TempDir::new().unwrap();
    let input = write_record(&dir);
    let output = dir.path().join("delays.csv");
    run(input, output.clone()).unwrap();

    let delays = DelaySolution::read_csv(&output).unwrap();
    assert_eq!(delays.delays_ns.len(), 3);
    for (antenna, expected) in [("ea00", 0.0), ("ea03", 7.0), ("ea05", -12.0)] {
        let [d0, d1] = delays.get(antenna).unwrap();
        assert_abs_diff_eq!(d0, expected, epsilon = 1e-6);
        assert_abs_diff_eq!(d1, expected, epsilon = 1e-6);
    }
}

#[test]
fn test_delays_from_reference_phases() {
    let dir = TempDir::new().unwrap();
    let phases = ReferencePhases {
        antennas: vec!["ea01".to_string(), "ea02".to_string()],
        freqs_hz: freqs_hz(),
        phases_pol0: vec![delay_phases(3.0), delay_phases(-40.0)],
        phases_pol1: vec![delay_phases(3.5), delay_phases(-40.0)],
    };
    let input = dir.path().join("phases.json");
    phases.write_json(&input).unwrap();
    let output = dir.path().join("delays.csv");
    run(input, output.clone()).unwrap();

    let delays = DelaySolution::read_csv(&output).unwrap();
    let [d0, d1] = delays.get("ea01").unwrap();
    assert_abs_diff_eq!(d0, 3.0, epsilon = 1e-6);
    assert_abs_diff_eq!(d1, 3.5, epsilon = 1e-6);
    let [d0, d1] = delays.get("ea02").unwrap();
    assert_abs_diff_eq!(d0, -40.0, epsilon = 1e-6);
    assert_abs_diff_eq!(d1, -40.0, epsilon = 1e-6);
}

#[test]
fn test_dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let input = write_record(&dir);
    let output = dir.path().join("delays.csv");
    GainsToDelaysArgs {
        args_file: None,
        args: GainsToDelaysCliArgs {
            input: Some(input),
            output: Some(output.clone()),
        },
    }
    .run(true)
    .unwrap();
    assert!(!output.exists());
}

#[test]
fn test_bad_inputs() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("delays.csv");

    let result = run(dir.path().join("missing.json"), output.clone());
    assert!(matches!(result, Err(CosmicCalError::Solutions(_))));

    let input = dir.path().join("other.json");
    std::fs::write(&input, r#"{"foo": 1}"#).unwrap();
    let result = run(input, output.clone());
    assert!(matches!(result, Err(CosmicCalError::Solutions(_))));

    // Reference phases with a missing row.
    let input = dir.path().join("short.json");
    std::fs::write(
        &input,
        r#"{"ant_names": ["ea00", "ea02"], "freqs_hz": [1e9, 1.001e9], "phases_pol0": [[0.0, 0.1]], "phases_pol1": [[0.0, 0.1]]}"#,
    )
    .unwrap();
    let result = run(input, output.clone());
    assert!(matches!(result, Err(CosmicCalError::Solutions(_))));

    let result = GainsToDelaysArgs::default().run(false);
    assert!(matches!(result, Err(CosmicCalError::Solutions(_))));
    assert!(!output.exists());
}
