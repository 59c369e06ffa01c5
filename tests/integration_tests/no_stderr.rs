// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests to ensure there is no stderr output for successful commands.

use tempfile::TempDir;

use crate::{cosmic_calib, get_cmd_output, simulate_into};

#[test]
fn test_help_and_version() {
    for args in [vec!["--help"], vec!["--version"], vec!["simulate", "--help"]] {
        let cmd = cosmic_calib().args(&args).ok();
        assert!(cmd.is_ok(), "{args:?} failed: {}", cmd.err().unwrap());
        let (stdout, stderr) = get_cmd_output(cmd);
        assert!(!stdout.is_empty());
        assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
    }

    let (stdout, _) = get_cmd_output(cosmic_calib().arg("--version").ok());
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")), "{stdout}");
}

#[test]
fn test_no_subcommand_is_an_error() {
    let cmd = cosmic_calib().ok();
    assert!(cmd.is_err());
}

#[test]
fn test_simulate_no_stderr() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let cmd = simulate_into(tmp_dir.path(), &["--propose-grade", "-v"]);
    assert!(cmd.is_ok(), "simulate failed: {}", cmd.err().unwrap());
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stdout.contains("cosmic-calib simulate complete."), "{stdout}");
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
}
