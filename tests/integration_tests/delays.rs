// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests of the `gains-to-delays` and `fixed-delays-update` subcommands, run
//! on the outputs of `simulate`.

use approx::assert_abs_diff_eq;
use tempfile::TempDir;

use cosmic_calib::{
    params::{DELAYS_FILENAME, GAINS_FILENAME, REFERENCE_PHASES_FILENAME},
    DelaySolution, FixedDelays,
};

use crate::{cosmic_calib, get_cmd_output, simulate_into};

fn gains_to_delays(input: &str, output: &str) -> DelaySolution {
    let cmd = cosmic_calib()
        .args(["gains-to-delays", "-i", input, "-o", output])
        .ok();
    assert!(cmd.is_ok(), "gains-to-delays failed: {}", cmd.err().unwrap());
    DelaySolution::read_csv(output).unwrap()
}

#[test]
fn test_gains_to_delays() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let cmd = simulate_into(tmp_dir.path(), &["--no-rfi-flagging"]);
    assert!(cmd.is_ok(), "simulate failed: {}", cmd.err().unwrap());

    // Gains carry the negated delays relative to the reference antenna.
    let gains = tmp_dir.path().join(GAINS_FILENAME).display().to_string();
    let output = tmp_dir.path().join("from_gains.csv").display().to_string();
    let delays = gains_to_delays(&gains, &output);
    for (antenna, expected) in [
        ("ea00", -20.0),
        ("ea01", 0.0),
        ("ea02", -55.0),
        ("ea03", -120.0),
    ] {
        let [d0, d1] = delays.get(antenna).unwrap();
        assert_abs_diff_eq!(d0, expected, epsilon = 1e-4);
        assert_abs_diff_eq!(d1, expected, epsilon = 1e-4);
    }

    // Reference phases are those of the (reference, antenna) baselines.
    let phases = tmp_dir
        .path()
        .join(REFERENCE_PHASES_FILENAME)
        .display()
        .to_string();
    let output = tmp_dir.path().join("from_phases.csv").display().to_string();
    let delays = gains_to_delays(&phases, &output);
    assert_eq!(delays.delays_ns.len(), 3);
    for (antenna, expected) in [("ea00", 20.0), ("ea02", 55.0), ("ea03", 120.0)] {
        let [d0, d1] = delays.get(antenna).unwrap();
        assert_abs_diff_eq!(d0, expected, epsilon = 1e-4);
        assert_abs_diff_eq!(d1, expected, epsilon = 1e-4);
    }
}

#[test]
fn test_gains_to_delays_bad_input() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let input = tmp_dir.path().join("delays.csv");
    std::fs::write(&input, "Baseline,res_pol0,res_pol1\nea00,1.0,2.0\n").unwrap();
    let cmd = cosmic_calib()
        .args(["gains-to-delays", "-i", &input.display().to_string()])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.starts_with("Error:"), "{stderr}");
}

#[test]
fn test_fixed_delays_update() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let cmd = simulate_into(tmp_dir.path(), &["--no-rfi-flagging"]);
    assert!(cmd.is_ok(), "simulate failed: {}", cmd.err().unwrap());

    let fixed = tmp_dir.path().join("fixed_delays.csv");
    std::fs::write(
        &fixed,
        ",IF0,IF1,IF2,IF3\nea00,100,100,50,50\nea01,0,0,0,0\nea02,0,10,20,30\nea03,-5,-5,-5,-5\n",
    )
    .unwrap();
    let residuals = tmp_dir.path().join(DELAYS_FILENAME);

    let cmd = cosmic_calib()
        .args([
            "fixed-delays-update",
            "--fixed-delays",
            &fixed.display().to_string(),
            "--ac",
            &residuals.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_ok(), "fixed-delays-update failed: {}", cmd.err().unwrap());

    let outputs: Vec<_> = std::fs::read_dir(tmp_dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            let name = p.file_name().unwrap().to_string_lossy().to_string();
            name.starts_with("fixed_delay_") && name.ends_with("_AC.csv")
        })
        .collect();
    assert_eq!(outputs.len(), 1);

    // The residual delays are within a lag of 20, 0, 55 and 120 ns.
    let table = FixedDelays::read_csv(&outputs[0]).unwrap();
    assert_eq!(table.find_reference().unwrap(), "ea01");
    for (antenna, expected) in [
        ("ea00", [80.0, 80.0]),
        ("ea02", [-55.0, -45.0]),
        ("ea03", [-125.0, -125.0]),
    ] {
        let delays = table.delays_ns[antenna];
        assert_abs_diff_eq!(delays[0], expected[0], epsilon = 0.5);
        assert_abs_diff_eq!(delays[1], expected[1], epsilon = 0.5);
    }
    assert_eq!(table.delays_ns["ea00"][2..], [50.0, 50.0]);
    assert_eq!(table.delays_ns["ea03"][2..], [-5.0, -5.0]);
}

#[test]
fn test_fixed_delays_update_needs_residuals() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let fixed = tmp_dir.path().join("fixed_delays.csv");
    std::fs::write(&fixed, ",IF0,IF1,IF2,IF3\nea00,0,0,0,0\n").unwrap();
    let cmd = cosmic_calib()
        .args([
            "fixed-delays-update",
            "--fixed-delays",
            &fixed.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("--ac"), "{stderr}");
}
