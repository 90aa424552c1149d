mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from bionic_scan for tests
pub use bionic_scan::{
    AnalysisResult, BionicHandDetector, DetectorConfig, ErrorType, HandType, ImageInput,
};
