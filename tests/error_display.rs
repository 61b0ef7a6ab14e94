use prt_lib::error::ErrorCategory;
use prt_lib::PrtError;

#[test]
fn config_error_display_includes_message() {
    let err = PrtError::Config("threshold must be between 0.0 and 1.0".to_string());

    assert_eq!(
        format!("{}", err),
        "Configuration error: threshold must be between 0.0 and 1.0"
    );
}

#[test]
fn io_error_display_wraps_source() {
    let io_err = std::io::Error::other("disk full");
    let err: PrtError = io_err.into();
    let rendered = format!("{}", err);

    assert!(rendered.starts_with("IO error: "));
    assert!(rendered.contains("disk full"));
}

#[test]
fn dimension_mismatch_names_both_sizes() {
    let err = PrtError::dimension_mismatch((1440, 900), (1280, 900));

    assert_eq!(
        format!("{}", err),
        "Image dimensions do not match: baseline(1440x900) vs current(1280x900)"
    );
    assert_eq!(err.to_payload().category, ErrorCategory::Image);
}

#[test]
fn unknown_diff_style_is_a_config_error() {
    let err = PrtError::UnknownDiffStyle("rainbow".to_string());

    assert!(format!("{}", err).starts_with("Unknown diff style: rainbow"));
    let payload = err.to_payload();
    assert_eq!(payload.category, ErrorCategory::Config);
    assert!(payload.remediation.is_some());
}

#[test]
fn invalid_snapshot_helper_includes_path() {
    let err = PrtError::invalid_snapshot("snapshots/home.json", "duplicate xpath /html/body");

    assert_eq!(
        format!("{}", err),
        "Invalid structure snapshot snapshots/home.json: duplicate xpath /html/body"
    );
    assert_eq!(err.to_payload().category, ErrorCategory::Snapshot);
}
