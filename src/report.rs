//! JSON-facing result envelope of one analysis call.

use std::time::Duration;

use serde::{Serialize, Serializer};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::detection::Analysis;
use crate::detection::classification::{DetailedAnalysis, QualityMetrics, Recommendation};
use crate::error::{AnalysisError, ErrorType};
use crate::models::{ConfidenceLevel, FeatureScoreSet, HandType, ImageInfo};

const NATURAL_HAND_SUGGESTIONS: [&str; 3] = [
    "This appears to be a natural/biological hand",
    "Please upload an image of a bionic or prosthetic hand",
    "Ensure the image clearly shows artificial/mechanical elements",
];

/// Outcome of `analyze`, tagged by `status`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AnalysisResult {
    Success(Box<AnalysisReport>),
    Error(AnalysisFailure),
}

impl AnalysisResult {
    pub fn success(analysis: Analysis, elapsed: Duration) -> Self {
        Self::Success(Box::new(AnalysisReport::new(analysis, elapsed)))
    }

    pub fn failure(error: &AnalysisError, elapsed: Duration) -> Self {
        Self::Error(AnalysisFailure::new(error, elapsed))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            Self::Success(report) => Some(report),
            Self::Error(_) => None,
        }
    }

    pub fn failure_details(&self) -> Option<&AnalysisFailure> {
        match self {
            Self::Success(_) => None,
            Self::Error(failure) => Some(failure),
        }
    }

    pub fn processing_time_ms(&self) -> f64 {
        match self {
            Self::Success(report) => report.technical_details.processing_time_ms,
            Self::Error(failure) => failure.processing_time_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub detection: DetectionSummary,
    pub analysis: AnalysisSection,
    pub recommendations: Vec<Recommendation>,
    pub technical_details: TechnicalDetails,
    pub quality_metrics: QualityMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectionSummary {
    pub bionic_detected: bool,
    pub confidence_percentage: f64,
    pub confidence_level: ConfidenceLevel,
    pub hand_type: HandType,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSection {
    pub characteristics: Vec<String>,
    pub detailed_analysis: DetailedAnalysis,
    #[serde(serialize_with = "serialize_scores")]
    pub feature_scores: FeatureScoreSet,
}

#[derive(Debug, Clone, Serialize)]
pub struct TechnicalDetails {
    pub image_info: ImageInfo,
    pub hand_detection_confidence: f64,
    pub processing_time_ms: f64,
    pub analysis_timestamp: String,
}

impl AnalysisReport {
    fn new(analysis: Analysis, elapsed: Duration) -> Self {
        let Analysis {
            image_info,
            hand,
            bionic,
            recommendations,
            quality,
        } = analysis;

        Self {
            detection: DetectionSummary {
                bionic_detected: bionic.is_bionic,
                confidence_percentage: round_to(bionic.confidence as f64 * 100.0, 1),
                confidence_level: bionic.classification.confidence_level,
                hand_type: bionic.classification.hand_type,
                description: bionic.classification.description,
            },
            analysis: AnalysisSection {
                characteristics: bionic.classification.characteristics,
                detailed_analysis: bionic.detailed_analysis,
                feature_scores: bionic.scores,
            },
            recommendations,
            technical_details: TechnicalDetails {
                image_info,
                hand_detection_confidence: round_to(hand.region.confidence as f64, 3),
                processing_time_ms: millis(elapsed),
                analysis_timestamp: timestamp(),
            },
            quality_metrics: quality,
        }
    }
}

/// Rejection envelope. The natural-hand fields are only present for the
/// low bionic confidence rejection.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisFailure {
    pub error_type: ErrorType,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub natural_hand_detected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    pub timestamp: String,
    pub processing_time_ms: f64,
}

impl AnalysisFailure {
    fn new(error: &AnalysisError, elapsed: Duration) -> Self {
        let (natural_hand_detected, confidence, suggestions) = match error {
            AnalysisError::NoBionicFeatures { confidence } => (
                Some(true),
                Some(round_to(*confidence as f64, 3)),
                Some(NATURAL_HAND_SUGGESTIONS.iter().map(|s| s.to_string()).collect()),
            ),
            _ => (None, None, None),
        };

        Self {
            error_type: error.error_type(),
            message: error.to_string(),
            natural_hand_detected,
            confidence,
            suggestions,
            timestamp: timestamp(),
            processing_time_ms: millis(elapsed),
        }
    }
}

fn serialize_scores<S: Serializer>(scores: &FeatureScoreSet, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(scores.iter().map(|(kind, score)| (kind.name(), round_to(score as f64, 3))))
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn millis(elapsed: Duration) -> f64 {
    round_to(elapsed.as_secs_f64() * 1000.0, 2)
}

fn timestamp() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}
