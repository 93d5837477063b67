// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: Apache-2.0

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;

const GET_RANDOM_REQUEST: &str = "00c1 0000000e 00000046 00000010";

#[test]
fn test_missing_stream_exits_with_usage() {
    let output = cargo_bin_cmd!("tpm12-parse").assert().code(1).get_output().clone();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage:"), "usage missing: {stderr}");
    assert!(output.stdout.is_empty());
}

#[test]
fn test_unknown_command_lists_valid_names() {
    let output = cargo_bin_cmd!("tpm12-parse")
        .arg(GET_RANDOM_REQUEST)
        .arg("TPM_Bogus")
        .assert()
        .code(1)
        .get_output()
        .clone();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("TPM_Bogus is not a valid command."));
    assert!(stderr.contains("Valid commands are:"));
    assert!(stderr.contains("TPM_Unseal"));
    assert!(stderr.contains("Usage:"));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_decodes_stream_as_json() {
    let stdout = cargo_bin_cmd!("tpm12-parse")
        .arg(GET_RANDOM_REQUEST)
        .arg("Unseal")
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: Value = serde_json::from_slice(&stdout).expect("output is valid JSON");
    let packets = json.as_array().expect("output is a packet list");
    assert_eq!(packets.len(), 1);
    assert_eq!(packets[0]["param_size"], 14);
}

#[test]
fn test_invalid_hex_fails() {
    cargo_bin_cmd!("tpm12-parse").arg("00c1zz").assert().failure();
}
