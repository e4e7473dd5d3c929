mod common;

use common::{cargo_bin, write_tempfile};

#[test]
fn staged_input_is_echoed() {
    cargo_bin()
        .args(["--input", "Z", ",."])
        .assert()
        .success()
        .stdout("Z\n");
}

#[test]
fn input_can_come_from_a_file() {
    let tf = write_tempfile("hi");
    cargo_bin()
        .arg("--input-file")
        .arg(tf.path())
        .arg(",.,.")
        .assert()
        .success()
        .stdout("hi\n");
}

#[test]
fn end_of_input_writes_zero_by_default() {
    cargo_bin()
        .arg("+++,.")
        .assert()
        .success()
        .stdout("\u{0}\n");
}

#[test]
fn end_of_input_can_leave_cell_unchanged() {
    cargo_bin()
        .args(["--eof", "unchanged", "+++,."])
        .assert()
        .success()
        .stdout("\u{3}\n");
}

#[test]
fn invalid_eof_mode_is_rejected() {
    cargo_bin()
        .args(["--eof", "explode", "+."])
        .assert()
        .code(2);
}
