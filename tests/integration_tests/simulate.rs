// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests of the `simulate` subcommand.

use approx::assert_abs_diff_eq;
use tempfile::TempDir;

use cosmic_calib::{
    params::{
        ANTENNA_FLAGS_FILENAME, DELAYS_FILENAME, GAINS_FILENAME, REFERENCE_PHASES_FILENAME,
    },
    solutions::ReferencePhases,
    DelaySolution, GainSolutionRecord,
};

use crate::{cosmic_calib, get_cmd_output, simulate_into};

#[test]
fn test_simulate_writes_all_outputs() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let cmd = simulate_into(tmp_dir.path(), &["--rfi-channels", "10", "30"]);
    assert!(cmd.is_ok(), "simulate failed: {}", cmd.err().unwrap());

    let record = GainSolutionRecord::read_json(tmp_dir.path().join(GAINS_FILENAME)).unwrap();
    assert_eq!(record.reference_antenna, "ea01");
    assert_eq!(record.freqs_hz.len(), 64);
    assert_eq!(
        record.gains.keys().collect::<Vec<_>>(),
        ["ea00", "ea01", "ea02", "ea03"]
    );
    assert!(tmp_dir.path().join(ANTENNA_FLAGS_FILENAME).exists());
    assert!(tmp_dir.path().join(DELAYS_FILENAME).exists());
    let phases =
        ReferencePhases::read_json(tmp_dir.path().join(REFERENCE_PHASES_FILENAME)).unwrap();
    assert_eq!(phases.antennas, ["ea00", "ea02", "ea03"]);
}

#[test]
fn test_simulated_delays() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let cmd = simulate_into(tmp_dir.path(), &["--no-rfi-flagging"]);
    assert!(cmd.is_ok(), "simulate failed: {}", cmd.err().unwrap());
    assert!(!tmp_dir.path().join(ANTENNA_FLAGS_FILENAME).exists());

    // The lag resolution is ~0.977 ns.
    let delays = DelaySolution::read_csv(tmp_dir.path().join(DELAYS_FILENAME)).unwrap();
    for (antenna, expected) in [("ea00", 20.0), ("ea01", 0.0), ("ea02", 55.0), ("ea03", 120.0)] {
        let [d0, d1] = delays.get(antenna).unwrap();
        assert_abs_diff_eq!(d0, expected, epsilon = 0.5);
        assert_abs_diff_eq!(d1, expected, epsilon = 0.5);
    }
}

#[test]
fn test_no_delays() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let cmd = simulate_into(tmp_dir.path(), &["--no-delays"]);
    assert!(cmd.is_ok(), "simulate failed: {}", cmd.err().unwrap());
    assert!(tmp_dir.path().join(GAINS_FILENAME).exists());
    assert!(!tmp_dir.path().join(DELAYS_FILENAME).exists());
}

#[test]
fn test_dry_run_writes_nothing() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let cmd = simulate_into(tmp_dir.path(), &["--dry-run"]);
    assert!(cmd.is_ok(), "simulate failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Dry run"), "{stdout}");
    assert_eq!(std::fs::read_dir(tmp_dir.path()).unwrap().count(), 0);
}

#[test]
fn test_save_toml_reproduces_run() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let toml = tmp_dir.path().join("args.toml");
    let toml_str = toml.display().to_string();
    let first = tmp_dir.path().join("first");
    let cmd = simulate_into(&first, &["--save-toml", &toml_str, "--propose-grade"]);
    assert!(cmd.is_ok(), "simulate failed: {}", cmd.err().unwrap());
    assert!(toml.exists());

    // The saved arguments include the output directory; override it.
    let second = tmp_dir.path().join("second");
    let cmd = cosmic_calib()
        .args([
            "simulate",
            &toml_str,
            "--output-dir",
            &second.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_ok(), "simulate failed: {}", cmd.err().unwrap());

    let first = GainSolutionRecord::read_json(first.join(GAINS_FILENAME)).unwrap();
    let second = GainSolutionRecord::read_json(second.join(GAINS_FILENAME)).unwrap();
    assert!(second.proposed_grade.is_some());
    assert_eq!(first, second);
}

#[test]
fn test_bad_args() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");

    // Three delays, but four amplitudes.
    let cmd = cosmic_calib()
        .args([
            "simulate",
            "--delays=0,1,2",
            "--amplitudes=1,1,1,1",
            "--output-dir",
            &tmp_dir.path().display().to_string(),
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.starts_with("Error:"), "{stderr}");

    let cmd = simulate_into(tmp_dir.path(), &["--solver", "quantum"]);
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("quantum"), "{stderr}");

    let cmd = simulate_into(tmp_dir.path(), &["--num-iterations", "0"]);
    assert!(cmd.is_err());
}
