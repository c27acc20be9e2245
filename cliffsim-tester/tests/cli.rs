use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "cliffsim-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_cliffsim-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("full-run-sprinter"));
}

#[test]
fn cli_runs_scenario_with_json_report() {
    let exe = env!("CARGO_BIN_EXE_cliffsim-tester");
    let output_path = temp_path("run");
    let output = Command::new(exe)
        .args([
            "--report",
            "json",
            "--scenarios",
            "crafting-linear",
            "--iterations",
            "1",
            "--seeds",
            "1",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Cliffsim Automated Tester"));

    let content = std::fs::read_to_string(output_path).expect("read report");
    let report: serde_json::Value = serde_json::from_str(&content).expect("json report");
    assert_eq!(report[0]["scenario_name"], "Crafting Linearity");
    assert_eq!(report[0]["seed"], 1);
    assert_eq!(report[0]["passed"], true);
}

#[test]
fn cli_exports_snapshots_and_journals() {
    let exe = env!("CARGO_BIN_EXE_cliffsim-tester");
    let snapshots = temp_path("snapshots");
    let journals = temp_path("journals");
    let status = Command::new(exe)
        .args([
            "--scenarios",
            "full-run-sprinter",
            "--iterations",
            "1",
            "--seeds",
            "4..5",
            "--report",
            "markdown",
            "--output",
        ])
        .arg(temp_path("report.md"))
        .arg("--snapshot-dir")
        .arg(&snapshots)
        .arg("--export-log")
        .arg(&journals)
        .status()
        .expect("run cli");
    assert!(status.success());

    for seed in [4, 5] {
        let snapshot = snapshots.join(format!("full-run-sprinter-seed-{seed}.json"));
        let document = std::fs::read_to_string(&snapshot).expect("read snapshot");
        assert!(document.contains("total_hunts"));
        let journal = journals.join(format!("full-run-sprinter-seed-{seed}.log"));
        assert!(journal.exists(), "missing {}", journal.display());
    }
}

#[test]
fn cli_rejects_malformed_seeds() {
    let exe = env!("CARGO_BIN_EXE_cliffsim-tester");
    let output = Command::new(exe)
        .args(["--scenarios", "smoke", "--seeds", "abc"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
}
