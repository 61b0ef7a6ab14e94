use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrtError {
    #[error(
        "Image dimensions do not match: baseline({}x{}) vs current({}x{})",
        baseline.0,
        baseline.1,
        current.0,
        current.1
    )]
    DimensionMismatch {
        baseline: (u32, u32),
        current: (u32, u32),
    },

    #[error("Unreadable image {}: {message}", path.display())]
    UnreadableImage { path: PathBuf, message: String },

    #[error("Unknown diff style: {0} (expected heatmap, sidebyside, overlay or blend)")]
    UnknownDiffStyle(String),

    #[error("Invalid structure snapshot {}: {message}", path.display())]
    InvalidSnapshot { path: PathBuf, message: String },

    #[error("Invalid pixel buffer: {0}")]
    InvalidPixelBuffer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PrtError {
    pub fn dimension_mismatch(baseline: (u32, u32), current: (u32, u32)) -> Self {
        PrtError::DimensionMismatch { baseline, current }
    }

    pub fn unreadable(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        PrtError::UnreadableImage {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn invalid_snapshot(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        PrtError::InvalidSnapshot {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn to_payload(&self) -> ErrorPayload {
        match self {
            PrtError::DimensionMismatch { .. } => ErrorPayload::new(
                ErrorCategory::Image,
                self.to_string(),
                "Recapture both screenshots with the same viewport and device scale factor.",
            ),
            PrtError::UnreadableImage { .. } => ErrorPayload::new(
                ErrorCategory::Image,
                self.to_string(),
                "Verify the image path exists and is a PNG, JPEG or WebP file.",
            ),
            PrtError::UnknownDiffStyle(_) => ErrorPayload::new(
                ErrorCategory::Config,
                self.to_string(),
                "Use --diff-style heatmap|sidebyside|overlay|blend.",
            ),
            PrtError::InvalidSnapshot { .. } => ErrorPayload::new(
                ErrorCategory::Snapshot,
                self.to_string(),
                "Regenerate the structure snapshot; it must be JSON with url, viewport, timestamp and elements.",
            ),
            PrtError::InvalidPixelBuffer(msg) => ErrorPayload::new(
                ErrorCategory::Image,
                msg.to_string(),
                "Pixel data length must equal width * height * channels.",
            ),
            PrtError::Io(e) => ErrorPayload::new(
                ErrorCategory::Io,
                e.to_string(),
                "Check file paths/permissions and that the output directory is writable.",
            ),
            PrtError::Image(e) => ErrorPayload::new(
                ErrorCategory::Image,
                e.to_string(),
                "Verify image path/format and readability.",
            ),
            PrtError::Serialization(e) => ErrorPayload::new(
                ErrorCategory::Io,
                e.to_string(),
                "Check JSON inputs; run with --verbose for details.",
            ),
            PrtError::Config(msg) => {
                let lower = msg.to_ascii_lowercase();
                if lower.contains("ignore region") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Ignore regions use X,Y,WIDTH,HEIGHT separated by ';' (e.g. 0,0,100,50;1340,0,100,50).",
                    )
                } else if lower.contains("threshold") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Use --threshold between 0.0 and 1.0 and --color-threshold between 0 and 255.",
                    )
                } else if lower.contains("method") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Use --method with a comma-separated subset of pixel,ssim.",
                    )
                } else {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Check flags and the config file (prt.toml).",
                    )
                }
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, PrtError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Config,
    Io,
    Image,
    Snapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ErrorPayload {
    pub fn new(category: ErrorCategory, message: String, remediation: impl Into<String>) -> Self {
        Self {
            category,
            message,
            remediation: Some(remediation.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_mismatch_message_names_both_sizes() {
        let err = PrtError::dimension_mismatch((100, 100), (100, 120));
        assert_eq!(
            err.to_string(),
            "Image dimensions do not match: baseline(100x100) vs current(100x120)"
        );
        assert_eq!(err.to_payload().category, ErrorCategory::Image);
    }

    #[test]
    fn config_payload_includes_ignore_region_hint() {
        let err = PrtError::Config("Invalid ignore region format: 1,2,3".to_string());
        let remediation = err.to_payload().remediation.unwrap_or_default();
        assert!(
            remediation.contains("X,Y,WIDTH,HEIGHT"),
            "expected region format hint, got: {remediation}"
        );
    }

    #[test]
    fn config_payload_uses_default_remediation_for_other_messages() {
        let err = PrtError::Config("Some other config issue".to_string());
        let remediation = err.to_payload().remediation.unwrap_or_default();
        assert!(
            remediation.contains("prt.toml"),
            "expected default remediation, got: {remediation}"
        );
    }

    #[test]
    fn invalid_snapshot_maps_to_snapshot_category() {
        let err = PrtError::invalid_snapshot("base.json", "missing field `elements`");
        let payload = err.to_payload();
        assert_eq!(payload.category, ErrorCategory::Snapshot);
        assert!(payload.message.contains("base.json"));
        assert!(payload.message.contains("elements"));
    }

    #[test]
    fn unknown_diff_style_lists_valid_styles() {
        let err = PrtError::UnknownDiffStyle("sparkle".to_string());
        let rendered = err.to_string();
        assert!(rendered.contains("sparkle"));
        assert!(rendered.contains("sidebyside"));
    }
}
