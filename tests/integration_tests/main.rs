// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod delays;
mod no_stderr;
mod simulate;

use std::{path::Path, process::Output, str::from_utf8};

use assert_cmd::{output::OutputError, Command};

fn cosmic_calib() -> Command {
    Command::cargo_bin("cosmic-calib").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

/// Run `simulate` into `dir` with four antennas with delays of 0, -20, 35 and
/// 100 ns, with antenna 1 as the reference.
fn simulate_into(dir: &Path, extra_args: &[&str]) -> Result<Output, OutputError> {
    let dir = dir.display().to_string();
    #[rustfmt::skip]
    let mut args = vec![
        "simulate",
        "--delays=0,-20,35,100",
        "--amplitudes=1,0.8,1.2,0.9",
        "--reference-antenna", "1",
        "--output-dir", &dir,
    ];
    args.extend_from_slice(extra_args);
    cosmic_calib().args(&args).ok()
}
