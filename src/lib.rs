pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod validation;

pub use config::{ConfidenceThresholds, DetectorConfig, ImageLimits, RegionLimits};
pub use detection::BionicHandDetector;
pub use error::{AnalysisError, DetectionError, ErrorType, ValidationError};
pub use models::{BoundingBox, Contour, FeatureKind, FeatureScoreSet, HandType};
pub use pipeline::{DebugConfig, PipelineContext, PipelineState, Stage};
pub use report::AnalysisResult;
pub use validation::ImageInput;

/// Analyze one upload with the default configuration.
///
/// `input` may be raw file bytes, a bare base64 string or a
/// `data:image/...;base64,` URL.
pub fn analyze_bionic_hand_image(input: impl Into<ImageInput>, filename: Option<&str>) -> AnalysisResult {
    BionicHandDetector::new().analyze(input, filename)
}
