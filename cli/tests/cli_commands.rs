use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const CATALOG: &str = r#"
[[stages]]
rows = 2
cols = 3
time_limit = 60
title = "Warmup"

[[stages]]
rows = 3
cols = 2
kind = "grid"
time_limit = 60
title = "Boxes"
"#;

fn write_catalog(dir: &Path) -> PathBuf {
    let path = dir.join("stages.toml");
    std::fs::write(&path, CATALOG).expect("write catalog");
    path
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_puzzlegift-cli"))
        .args(args)
        .env_remove("PUZZLEGIFT_STAGES")
        .env_remove("PUZZLEGIFT_IMAGES")
        .output()
        .expect("spawn cli")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "cli failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn stages_lists_catalog_with_scaled_grids() {
    let dir = tempfile::tempdir().expect("tempdir");
    let catalog = write_catalog(dir.path());
    let output = run(&[
        "stages",
        "--stages",
        catalog.to_str().expect("utf8 path"),
        "--grid",
        "2",
    ]);
    let text = stdout(&output);
    assert!(text.starts_with("2 stages"), "{text}");
    assert!(text.contains("1. Warmup [Jigsaw] 4x6 (24 pieces)"), "{text}");
    assert!(text.contains("2. Boxes [Grid] 6x4 (24 pieces)"), "{text}");
}

#[test]
fn render_json_describes_the_session() {
    let dir = tempfile::tempdir().expect("tempdir");
    let catalog = write_catalog(dir.path());
    let output = run(&[
        "render",
        "--stages",
        catalog.to_str().expect("utf8 path"),
        "--seed",
        "0x10",
        "--format",
        "json",
    ]);
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("json");
    assert_eq!(value["rows"], 2);
    assert_eq!(value["cols"], 3);
    assert_eq!(value["kind"], "jigsaw");
    assert!(value["image"].is_null());
    assert_eq!(value["pieces"].as_array().map(Vec::len), Some(6));
}

#[test]
fn render_svg_to_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let catalog = write_catalog(dir.path());
    let out = dir.path().join("frame.svg");
    let output = run(&[
        "render",
        "--stages",
        catalog.to_str().expect("utf8 path"),
        "--index",
        "1",
        "--out",
        out.to_str().expect("utf8 path"),
    ]);
    stdout(&output);
    let svg = std::fs::read_to_string(&out).expect("svg written");
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains(r#"<clipPath id="piece-clip-5">"#));
    assert!(!svg.contains("<path"));
}

#[test]
fn render_past_the_catalog_fails() {
    let output = run(&["render", "--index", "9"]);
    assert!(!output.status.success());
}

#[test]
fn bot_solves_a_small_catalog() {
    let dir = tempfile::tempdir().expect("tempdir");
    let catalog = write_catalog(dir.path());
    let output = run(&[
        "bot",
        "run",
        "--stages",
        catalog.to_str().expect("utf8 path"),
        "--seed",
        "3",
        "--all",
        "--think-min-ms",
        "0",
        "--think-max-ms",
        "0",
        "--step-ms",
        "0",
        "--miss-rate",
        "0",
    ]);
    let text = stdout(&output);
    assert!(
        text.contains("stage 1 'Warmup': 6 pieces, 6 drops (0 missed)"),
        "{text}"
    );
    assert!(text.contains("stage 2 'Boxes': 6 pieces"), "{text}");
}
