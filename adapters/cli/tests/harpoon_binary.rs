use std::process::{Command, Output};

fn harpoon(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_harpoon"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run the harpoon binary")
}

#[test]
fn plan_prints_first_wave() {
    let output = harpoon(&["plan", "--wave", "1"]);
    assert!(output.status.success(), "harpoon plan --wave 1 should succeed");

    let stdout = String::from_utf8(output.stdout).expect("utf-8 stdout");
    let mut lines = stdout.lines();
    assert_eq!(
        lines.next(),
        Some("wave 1: 7 mobs, max concurrent 5, 3 batches")
    );
    assert!(stdout.contains("  tier 1: 7"));
    assert!(stdout.lines().any(|line| line.starts_with("fingerprint ")));
}

#[test]
fn session_returns_to_title_screen() {
    let output = harpoon(&["session", "--waves", "2", "--step-ms", "250"]);
    assert!(output.status.success(), "harpoon session should succeed");

    let stdout = String::from_utf8(output.stdout).expect("utf-8 stdout");
    assert!(stdout.contains("wave 2: spawned 9 of 9 mobs"));
    assert!(stdout.contains("session finished on title screen after 7 state changes"));
}

#[test]
fn out_of_range_wave_fails() {
    let output = harpoon(&["plan", "--wave", "21"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8(output.stderr).expect("utf-8 stderr");
    assert!(stderr.contains("wave 21 is outside the supported range 1..=20"));
}

#[test]
fn missing_config_file_is_reported() {
    let output = harpoon(&["--config", "does/not/exist.toml", "table"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8(output.stderr).expect("utf-8 stderr");
    assert!(stderr.contains("failed to read campaign config"));
}
