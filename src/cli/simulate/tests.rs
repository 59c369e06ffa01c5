// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::io::Write;

use approx::assert_abs_diff_eq;
use clap::Parser;
use indoc::indoc;

use super::*;
use crate::{flagging::RfiFlaggerType, gaincal::SolverDevice};

#[test]
fn test_defaults() {
    let params = SimulateArgs::default().parse().unwrap();
    assert_eq!(params.context.antennas.as_vec(), &[0, 1, 2, 3]);
    assert_eq!(params.context.num_channels(), DEFAULT_NUM_CHANNELS);
    assert_abs_diff_eq!(params.context.channel_width_hz, 1e6);
    assert_abs_diff_eq!(*params.context.freqs_hz.first(), 1e9);
    assert_eq!(params.num_timesteps, DEFAULT_NUM_TIMESTEPS);
    assert_eq!(params.delays_ns, [0.0; 4]);
    assert_eq!(params.amplitudes, [1.0; 4]);
    assert!(params.rfi_channels.is_empty());
    assert_eq!(params.output_dir, PathBuf::from("."));

    let cal = params.calibration;
    assert_eq!(cal.gaincal.reference_antenna, 0);
    assert_eq!(cal.gaincal.device, SolverDevice::Cpu);
    assert!(cal.gaincal.average_axes.is_empty());
    assert!(cal.estimate_delays);
    assert!(!cal.propose_grade);
    assert_eq!(cal.flagger.unwrap().kind, RfiFlaggerType::SmoothedBandpass);
}

#[test]
fn test_cli_parsing() {
    let args = SimulateArgs::try_parse_from([
        "simulate",
        "--antennas",
        "3",
        "5",
        "8",
        "--delays=0,-20.5,35",
        "--amplitudes=1,0.5,2",
        "-c",
        "32",
        "--rfi-channels",
        "4",
        "9",
        "--ref-priority",
        "8",
        "5",
        "--solver",
        "cpu-parallel",
        "--flagger",
        "global-median",
        "--time-average",
    ])
    .unwrap();
    let params = args.parse().unwrap();
    assert_eq!(params.context.antennas.as_vec(), &[3, 5, 8]);
    assert_eq!(params.delays_ns, [0.0, -20.5, 35.0]);
    assert_eq!(params.amplitudes, [1.0, 0.5, 2.0]);
    assert_eq!(params.rfi_channels, [4, 9]);
    assert_eq!(params.context.num_channels(), 32);

    let cal = params.calibration;
    assert_eq!(cal.gaincal.reference_antenna, 8);
    assert_eq!(cal.gaincal.device, SolverDevice::CpuParallel);
    assert_eq!(cal.gaincal.average_axes, [1]);
    assert_eq!(cal.flagger.unwrap().kind, RfiFlaggerType::GlobalMedian);
}

#[test]
fn test_model_length_mismatch() {
    let args = SimulateArgs {
        simulate_args: SimulateCliArgs {
            num_antennas: Some(3),
            delays: Some(vec![1.0, 2.0]),
            ..Default::default()
        },
        ..Default::default()
    };
    assert!(matches!(args.parse(), Err(CosmicCalError::Simulate(_))));
}

#[test]
fn test_no_antennas() {
    let args = SimulateArgs {
        simulate_args: SimulateCliArgs {
            antennas: Some(vec![]),
            ..Default::default()
        },
        ..Default::default()
    };
    assert!(matches!(args.parse(), Err(CosmicCalError::Simulate(_))));
}

#[test]
fn test_excluded_priority_list_is_an_error() {
    let args = SimulateArgs {
        calibrate_args: CalibrateArgs {
            ref_priority: Some(vec![2]),
            ref_exclusions: Some(vec![2]),
            ..Default::default()
        },
        ..Default::default()
    };
    assert!(matches!(args.parse(), Err(CosmicCalError::RefAnt(_))));
}

#[test]
fn test_cli_args_override_file_args() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(
        indoc! {r#"
            [simulate]
            num_antennas = 6
            num_channels = 128
            delays = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0]

            [calibrate]
            reference_antenna = 2
            propose_grade = true
        "#}
        .as_bytes(),
    )
    .unwrap();

    let path = file.path().display().to_string();
    let args = SimulateArgs::try_parse_from(["simulate", path.as_str(), "-c", "16"])
    .unwrap()
    .merge()
    .unwrap();
    assert!(args.args_file.is_none());
    assert_eq!(args.simulate_args.num_antennas, Some(6));
    assert_eq!(args.simulate_args.num_channels, Some(16));
    assert_eq!(args.calibrate_args.reference_antenna, Some(2));
    assert!(args.calibrate_args.propose_grade);

    let params = args.parse().unwrap();
    assert_eq!(params.context.num_antennas(), 6);
    assert_eq!(params.delays_ns.len(), 6);
}

#[test]
fn test_json_arg_file() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(br#"{"simulate": {"num_timesteps": 5}, "calibrate": {"no_delays": true}}"#)
        .unwrap();
    let args = SimulateArgs {
        args_file: Some(file.path().to_path_buf()),
        ..Default::default()
    }
    .merge()
    .unwrap();
    assert_eq!(args.simulate_args.num_timesteps, Some(5));
    assert!(args.calibrate_args.no_delays);
}

#[test]
fn test_bad_arg_file_extension() {
    let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    let result = SimulateArgs {
        args_file: Some(file.path().to_path_buf()),
        ..Default::default()
    }
    .merge();
    assert!(matches!(result, Err(CosmicCalError::ArgFile(_))));
}
