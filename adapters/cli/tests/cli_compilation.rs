use std::process::Command;

fn park_sim(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["run", "--quiet", "--bin", "park-sim", "--"])
        .args(args)
        .output()
        .expect("failed to invoke cargo run for the park-sim binary")
}

#[test]
fn cli_compiles_without_warnings() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["check", "--quiet", "--bin", "park-sim"])
        .status()
        .expect("failed to invoke cargo check for park-sim CLI binary");

    assert!(status.success(), "cargo check --bin park-sim should succeed");
}

#[test]
fn demo_scenario_runs_and_reports_every_ride() {
    let output = park_sim(&[
        "--scenario",
        "scenarios/demo.toml",
        "--ticks",
        "600",
        "--log-level",
        "warn",
    ]);
    assert!(output.status.success(), "park-sim exited with {}", output.status);

    let report = String::from_utf8_lossy(&output.stdout);
    assert!(report.contains("after 600 ticks"));
    for ride in ["Corkscrew Follies", "Hedge Maze", "Helter Skelter", "Toilets"] {
        assert!(report.contains(ride), "{ride} missing from report");
    }
}

#[test]
fn exported_share_code_loads_back() {
    let export = park_sim(&["--scenario", "scenarios/demo.toml", "--export-share-code"]);
    assert!(export.status.success());
    let code = String::from_utf8_lossy(&export.stdout).trim().to_owned();
    assert!(code.starts_with("park:v1:8x2:"), "unexpected code {code}");

    let run = park_sim(&["--share-code", &code, "--ticks", "10", "--log-level", "off"]);
    assert!(run.status.success(), "share code run exited with {}", run.status);
}
