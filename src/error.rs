//! Error taxonomy for the analysis pipeline.
//!
//! Every variant is a designed rejection rather than a crash. The `Display`
//! text of each variant is the exact message surfaced to callers.

use serde::Serialize;
use thiserror::Error;

/// Input rejected before any hand analysis ran.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid image format. Please upload JPG, PNG, BMP, or TIFF files only.")]
    InvalidFormat,

    #[error("File size exceeds {limit_mb}MB limit.")]
    FileTooLarge {
        /// Size limit in whole mebibytes.
        limit_mb: usize,
    },

    #[error("Image resolution too low. Minimum size: 100x100 pixels.")]
    FileTooSmall,

    #[error("Image resolution too high. Maximum size: 4000x4000 pixels.")]
    FileTooLargeRes,

    #[error("Image file appears to be corrupted or unreadable.")]
    CorruptedImage,
}

/// The hand region could not be found or failed its sanity checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DetectionError {
    #[error("No hand detected in the image. Please upload a clear image of a hand.")]
    NoHandDetected,

    #[error("Only partial hand visible. Please ensure the entire hand is in the frame.")]
    PartialHand,

    #[error("Image quality too low for accurate analysis. Please upload a clearer image.")]
    UnclearImage,

    #[error("Multiple hands detected. Please upload an image with a single hand.")]
    MultipleHands,
}

/// Wire-level error category reported in the `error_type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    ValidationError,
    PreprocessingError,
    DetectionError,
    SystemError,
}

/// Terminal rejection of one `analyze` call.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Normalizing the decoded buffer failed.
    #[error("Image file appears to be corrupted or unreadable.")]
    Preprocessing,

    #[error(transparent)]
    Detection(#[from] DetectionError),

    /// A hand was found but it scored as natural.
    #[error("This appears to be a natural/biological hand, not a bionic hand.")]
    NoBionicFeatures {
        /// Bionic confidence that triggered the rejection.
        confidence: f32,
    },

    #[error("Analysis failed: {0}")]
    System(#[from] anyhow::Error),
}

impl AnalysisError {
    /// Category reported to the caller.
    pub fn error_type(&self) -> ErrorType {
        match self {
            Self::Validation(_) => ErrorType::ValidationError,
            Self::Preprocessing => ErrorType::PreprocessingError,
            Self::Detection(_) | Self::NoBionicFeatures { .. } => ErrorType::DetectionError,
            Self::System(_) => ErrorType::SystemError,
        }
    }

    /// Creates a system error from a caught panic payload.
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let text = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unexpected internal failure".to_string());
        Self::System(anyhow::anyhow!(text))
    }
}
