use prt_lib::PrtOutput;
use image::RgbaImage;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn write_image(path: &Path, color: [u8; 4]) {
    let img = RgbaImage::from_pixel(16, 16, image::Rgba(color));
    img.save(path).expect("write image");
}

fn prt() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_prt"));
    cmd.env_remove("PRT_LOG").env_remove("RUST_LOG");
    cmd
}

#[test]
fn compare_exit_code_passes_for_matching_images() {
    let dir = TempDir::new().expect("tempdir");
    let baseline = dir.path().join("baseline.png");
    let current = dir.path().join("current.png");
    write_image(&baseline, [10, 20, 30, 255]);
    write_image(&current, [10, 20, 30, 255]);

    let status = prt()
        .current_dir(dir.path())
        .args([
            "compare",
            baseline.to_str().unwrap(),
            current.to_str().unwrap(),
            "--format",
            "json",
        ])
        .status()
        .expect("run prt");
    assert_eq!(status.code(), Some(0));
}

#[test]
fn compare_accepts_config_flag_and_still_passes() {
    let dir = TempDir::new().expect("tempdir");
    let baseline = dir.path().join("baseline.png");
    let current = dir.path().join("current.png");
    let cfg_path = dir.path().join("custom.toml");
    write_image(&baseline, [1, 2, 3, 255]);
    write_image(&current, [1, 2, 3, 255]);
    std::fs::write(
        &cfg_path,
        format!(
            "threshold = 0.9\noutput_dir = {:?}\n",
            dir.path().join("cfg-out").to_str().unwrap()
        ),
    )
    .expect("write config");

    let status = prt()
        .args([
            "compare",
            baseline.to_str().unwrap(),
            current.to_str().unwrap(),
            "--config",
            cfg_path.to_str().unwrap(),
        ])
        .status()
        .expect("run prt");
    assert_eq!(status.code(), Some(0));
    assert!(dir.path().join("cfg-out/result.json").exists());
}

#[test]
fn compare_exit_code_fails_threshold_for_different_images() {
    let dir = TempDir::new().expect("tempdir");
    let baseline = dir.path().join("baseline.png");
    let current = dir.path().join("current.png");
    write_image(&baseline, [0, 0, 0, 255]);
    write_image(&current, [255, 255, 255, 255]);

    let output = prt()
        .args([
            "compare",
            baseline.to_str().unwrap(),
            current.to_str().unwrap(),
            "-o",
            dir.path().join("out").to_str().unwrap(),
        ])
        .output()
        .expect("run prt");
    assert_eq!(output.status.code(), Some(1));

    let parsed: PrtOutput = serde_json::from_slice(&output.stdout).expect("json output");
    match parsed {
        PrtOutput::Compare(body) => {
            assert!(!body.result.overall_pass);
            assert_eq!(body.result.overall_score, 0.0);
        }
        other => panic!("expected compare output, got {other:?}"),
    }
}

#[test]
fn compare_exit_code_is_fatal_for_dimension_mismatch() {
    let dir = TempDir::new().expect("tempdir");
    let baseline = dir.path().join("baseline.png");
    let current = dir.path().join("current.png");
    write_image(&baseline, [0, 0, 0, 255]);
    RgbaImage::from_pixel(8, 16, image::Rgba([0, 0, 0, 255]))
        .save(&current)
        .expect("write image");

    let output = prt()
        .args([
            "compare",
            baseline.to_str().unwrap(),
            current.to_str().unwrap(),
            "-o",
            dir.path().join("out").to_str().unwrap(),
        ])
        .output()
        .expect("run prt");
    assert_eq!(output.status.code(), Some(2));

    let parsed: PrtOutput = serde_json::from_slice(&output.stdout).expect("error payload");
    match parsed {
        PrtOutput::Error(err) => {
            assert!(err.error.message.contains("baseline(16x16) vs current(8x16)"));
        }
        other => panic!("expected error output, got {other:?}"),
    }
    assert!(!dir.path().join("out/result.json").exists());
}

#[test]
fn compare_exit_code_is_fatal_for_missing_image() {
    let dir = TempDir::new().expect("tempdir");
    let baseline = dir.path().join("baseline.png");
    write_image(&baseline, [0, 0, 0, 255]);

    let status = prt()
        .args([
            "compare",
            baseline.to_str().unwrap(),
            dir.path().join("missing.png").to_str().unwrap(),
            "-o",
            dir.path().join("out").to_str().unwrap(),
        ])
        .status()
        .expect("run prt");
    assert_eq!(status.code(), Some(2));
}

#[test]
fn compare_exit_code_is_fatal_for_unknown_diff_style() {
    let dir = TempDir::new().expect("tempdir");
    let baseline = dir.path().join("baseline.png");
    let current = dir.path().join("current.png");
    write_image(&baseline, [0, 0, 0, 255]);
    write_image(&current, [0, 0, 0, 255]);

    let output = prt()
        .args([
            "compare",
            baseline.to_str().unwrap(),
            current.to_str().unwrap(),
            "--diff-style",
            "rainbow",
        ])
        .output()
        .expect("run prt");
    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Unknown diff style: rainbow"));
}

#[test]
fn compare_exit_code_is_fatal_for_bad_flag_values() {
    let dir = TempDir::new().expect("tempdir");
    let baseline = dir.path().join("baseline.png");
    write_image(&baseline, [0, 0, 0, 255]);

    for extra in [
        ["--threshold", "1.5"],
        ["--color-threshold", "300"],
        ["--ignore-regions", "0,0,10"],
        ["--method", "pixel,fft"],
    ] {
        let status = prt()
            .args(["compare", baseline.to_str().unwrap(), baseline.to_str().unwrap()])
            .args(extra)
            .status()
            .expect("run prt");
        assert_eq!(status.code(), Some(2), "flags {extra:?}");
    }
}

#[test]
fn invalid_config_file_is_fatal() {
    let dir = TempDir::new().expect("tempdir");
    let baseline = dir.path().join("baseline.png");
    let cfg_path = dir.path().join("bad.toml");
    write_image(&baseline, [0, 0, 0, 255]);
    std::fs::write(&cfg_path, "unknown_key = true\n").expect("write config");

    let output = prt()
        .args([
            "compare",
            baseline.to_str().unwrap(),
            baseline.to_str().unwrap(),
            "--config",
            cfg_path.to_str().unwrap(),
        ])
        .output()
        .expect("run prt");
    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"mode\":\"error\""));
    assert!(stdout.contains("\"category\":\"config\""));
}
