//! Turns the seven feature scores into a bionic confidence and a verdict.

use serde::Serialize;
use tracing::debug;

use crate::config::ConfidenceThresholds;
use crate::models::{Classification, ConfidenceLevel, FeatureKind, FeatureScoreSet, HandType};

/// Scores above this count towards the "active feature" tally.
const ACTIVE_FEATURE_SCORE: f32 = 0.4;
/// Applied when fewer than two features are active.
const FEW_FEATURES_PENALTY: f32 = 0.7;
const CHARACTERISTIC_SCORE: f32 = 0.6;

/// Characteristic reported for each strong feature, in report order.
const CHARACTERISTICS: [(FeatureKind, &str); 7] = [
    (FeatureKind::SensorPresence, "Multiple sensors detected"),
    (FeatureKind::MetallicSurface, "Metallic construction"),
    (FeatureKind::CableDetection, "Visible wiring/cables"),
    (FeatureKind::JointArticulation, "Articulated joints"),
    (FeatureKind::SurfaceTexture, "Uniform synthetic surface texture"),
    (FeatureKind::ColorPattern, "Artificial color scheme"),
    (FeatureKind::GeometricPrecision, "Precision-machined geometry"),
];

/// Human-readable breakdown of the strongest indicators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedAnalysis {
    pub surface: &'static str,
    pub joints: &'static str,
    pub sensors: &'static str,
    pub overall: &'static str,
}

impl DetailedAnalysis {
    fn from_scores(scores: &FeatureScoreSet) -> Self {
        let surface = match scores.metallic_surface {
            s if s > 0.7 => "High reflectance metallic surface detected",
            s if s > 0.4 => "Some metallic elements present",
            _ => "No significant metallic surfaces detected",
        };
        let joints = match scores.joint_articulation {
            s if s > 0.6 => "Artificial joint structures detected",
            s if s > 0.3 => "Some mechanical elements visible",
            _ => "Natural joint appearance",
        };
        let sensors = match scores.sensor_presence {
            s if s > 0.6 => "Electronic sensors and components detected",
            s if s > 0.3 => "Possible sensor elements present",
            _ => "No electronic components visible",
        };
        let overall = match scores.mean() {
            s if s > 0.7 => "Strong indicators of bionic/prosthetic device",
            s if s > 0.4 => "Some artificial characteristics present",
            _ => "Appears to be natural biological hand",
        };
        Self { surface, joints, sensors, overall }
    }
}

/// Result of classifying one score set.
#[derive(Debug, Clone, PartialEq)]
pub struct BionicAnalysis {
    pub confidence: f32,
    pub is_bionic: bool,
    pub scores: FeatureScoreSet,
    pub classification: Classification,
    pub detailed_analysis: DetailedAnalysis,
}

impl BionicAnalysis {
    pub fn active_features(&self) -> usize {
        self.scores.count_above(ACTIVE_FEATURE_SCORE)
    }
}

/// Informational product suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub model: &'static str,
    pub reason: &'static str,
    pub compatibility: u8,
    pub features: [&'static str; 3],
}

const PRO_ADVANCED: Recommendation = Recommendation {
    model: "Quantumix Pro Advanced",
    reason: "Detected advanced sensor array and sophisticated control systems",
    compatibility: 95,
    features: ["Neural interface", "Multi-sensor feedback", "AI-assisted control"],
};

const ELITE_SERIES: Recommendation = Recommendation {
    model: "Quantumix Elite Series",
    reason: "High-end bionic hand with precision control capabilities",
    compatibility: 90,
    features: ["Precision grip", "Force feedback", "Wireless connectivity"],
};

const STANDARD_PLUS: Recommendation = Recommendation {
    model: "Quantumix Standard Plus",
    reason: "Matches detected bionic hand characteristics and sensor configuration",
    compatibility: 85,
    features: ["EMG control", "Basic sensors", "Durable construction"],
};

const ADAPTIVE_MODEL: Recommendation = Recommendation {
    model: "Quantumix Adaptive Model",
    reason: "Flexible control system suitable for various bionic hand types",
    compatibility: 80,
    features: ["Adaptive learning", "Custom grip patterns", "Maintenance alerts"],
};

const ENTRY_MODEL: Recommendation = Recommendation {
    model: "Quantumix Entry Model",
    reason: "Suitable for mechanical prosthetics with upgrade potential",
    compatibility: 70,
    features: ["Basic control", "Upgrade ready", "Cost effective"],
};

const ASSESSMENT_KIT: Recommendation = Recommendation {
    model: "Quantumix Assessment Kit",
    reason: "Evaluation kit for determining optimal bionic hand configuration",
    compatibility: 60,
    features: ["Assessment tools", "Fitting analysis", "Recommendation system"],
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DetectionReliability {
    #[serde(rename = "Very Reliable")]
    VeryReliable,
    Reliable,
    #[serde(rename = "Moderately Reliable")]
    ModeratelyReliable,
    #[serde(rename = "Low Reliability")]
    LowReliability,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityMetrics {
    pub image_quality: ImageQuality,
    pub detection_reliability: DetectionReliability,
    /// Blend of bionic and detection confidence, 0-100.
    pub overall_score: f64,
}

pub struct ClassificationEngine {
    thresholds: ConfidenceThresholds,
}

impl ClassificationEngine {
    pub fn new(thresholds: ConfidenceThresholds) -> Self {
        Self { thresholds }
    }

    /// Weighted mean of the scores, damped when fewer than two features are
    /// active. Always in `[0, 1]`.
    pub fn confidence(&self, scores: &FeatureScoreSet) -> f32 {
        let (total, weights) = scores
            .iter()
            .fold((0.0f32, 0.0f32), |(total, weights), (kind, score)| {
                (total + score * kind.weight(), weights + kind.weight())
            });
        if weights <= 0.0 {
            return 0.0;
        }

        let mut confidence = total / weights;
        if scores.count_above(ACTIVE_FEATURE_SCORE) < 2 {
            confidence *= FEW_FEATURES_PENALTY;
        }
        confidence.clamp(0.0, 1.0)
    }

    /// Highest tier whose lower bound is at or below `confidence`.
    pub fn tier(&self, confidence: f32) -> HandType {
        let t = &self.thresholds;
        if confidence >= t.very_high {
            HandType::AdvancedBionicHand
        } else if confidence >= t.high {
            HandType::BionicHand
        } else if confidence >= t.medium {
            HandType::MechanicalProsthetic
        } else if confidence >= t.low {
            HandType::ProstheticDevice
        } else {
            HandType::BiologicalHand
        }
    }

    pub fn confidence_level(&self, confidence: f32) -> ConfidenceLevel {
        match self.tier(confidence) {
            HandType::AdvancedBionicHand => ConfidenceLevel::VeryHigh,
            HandType::BionicHand => ConfidenceLevel::High,
            HandType::MechanicalProsthetic => ConfidenceLevel::Medium,
            HandType::ProstheticDevice => ConfidenceLevel::Low,
            HandType::BiologicalHand => ConfidenceLevel::VeryLow,
        }
    }

    pub fn classify(&self, scores: &FeatureScoreSet) -> BionicAnalysis {
        let confidence = self.confidence(scores);
        let hand_type = self.tier(confidence);

        let characteristics = CHARACTERISTICS
            .iter()
            .filter(|(kind, _)| scores.get(*kind) > CHARACTERISTIC_SCORE)
            .map(|(_, text)| text.to_string())
            .collect();

        let classification = Classification {
            hand_type,
            description: hand_type.description().to_string(),
            characteristics,
            confidence_level: self.confidence_level(confidence),
        };
        debug!(confidence, ?hand_type, "classified hand");

        BionicAnalysis {
            confidence,
            is_bionic: confidence > self.thresholds.medium,
            scores: *scores,
            classification,
            detailed_analysis: DetailedAnalysis::from_scores(scores),
        }
    }

    /// Non-bionic results this weak are rejected instead of reported.
    pub fn is_rejected(&self, analysis: &BionicAnalysis) -> bool {
        !analysis.is_bionic && analysis.confidence < self.thresholds.rejection
    }

    /// Up to three suggestions, best match first.
    pub fn recommendations(&self, analysis: &BionicAnalysis) -> Vec<Recommendation> {
        let mut picks = match analysis.classification.hand_type {
            HandType::AdvancedBionicHand => vec![PRO_ADVANCED, ELITE_SERIES],
            HandType::BionicHand => vec![STANDARD_PLUS, ADAPTIVE_MODEL],
            _ if analysis.confidence > 0.4 => vec![ENTRY_MODEL],
            _ => vec![ASSESSMENT_KIT],
        };
        picks.sort_by(|a, b| b.compatibility.cmp(&a.compatibility));
        picks.truncate(3);
        picks
    }

    pub fn quality_metrics(&self, analysis: &BionicAnalysis, detection_confidence: f32) -> QualityMetrics {
        let image_quality = match detection_confidence {
            c if c > 0.8 => ImageQuality::Excellent,
            c if c > 0.6 => ImageQuality::Good,
            c if c > 0.4 => ImageQuality::Fair,
            _ => ImageQuality::Poor,
        };

        let active = analysis.active_features();
        let detection_reliability = match analysis.confidence {
            c if c > 0.8 && active >= 3 => DetectionReliability::VeryReliable,
            c if c > 0.6 && active >= 2 => DetectionReliability::Reliable,
            c if c > 0.4 => DetectionReliability::ModeratelyReliable,
            _ => DetectionReliability::LowReliability,
        };

        let blended = analysis.confidence as f64 * 0.7 + detection_confidence as f64 * 0.3;
        QualityMetrics {
            image_quality,
            detection_reliability,
            overall_score: (blended * 1000.0).round() / 10.0,
        }
    }
}

impl Default for ClassificationEngine {
    fn default() -> Self {
        Self::new(ConfidenceThresholds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn uniform_scores(score: f32) -> FeatureScoreSet {
        let mut scores = FeatureScoreSet::default();
        for kind in FeatureKind::ALL {
            scores.set(kind, score);
        }
        scores
    }

    #[test]
    fn all_ones_is_full_confidence() {
        let engine = ClassificationEngine::default();
        assert_relative_eq!(engine.confidence(&uniform_scores(1.0)), 1.0, epsilon = 1e-6);
        assert_eq!(engine.confidence(&uniform_scores(0.0)), 0.0);
    }

    #[test]
    fn few_active_features_are_penalized() {
        let engine = ClassificationEngine::default();
        let mut scores = FeatureScoreSet::default();
        scores.metallic_surface = 1.0;
        // one active feature: 0.25 * 0.7
        assert_relative_eq!(engine.confidence(&scores), 0.175, epsilon = 1e-6);

        scores.joint_articulation = 1.0;
        assert_relative_eq!(engine.confidence(&scores), 0.45, epsilon = 1e-6);
    }

    #[test]
    fn metallic_score_never_lowers_confidence() {
        let engine = ClassificationEngine::default();
        for base in [0.0, 0.3, 0.45, 0.8] {
            let mut scores = uniform_scores(base);
            scores.joint_articulation = 0.5;
            let mut previous = 0.0;
            for step in 0..=20 {
                scores.metallic_surface = step as f32 / 20.0;
                let confidence = engine.confidence(&scores);
                assert!(confidence >= previous, "base {base}, step {step}");
                previous = confidence;
            }
        }
    }

    #[test]
    fn tiers_switch_exactly_at_thresholds() {
        let engine = ClassificationEngine::default();
        let cases = [
            (0.0, HandType::BiologicalHand),
            (0.499, HandType::BiologicalHand),
            (0.5, HandType::ProstheticDevice),
            (0.699, HandType::ProstheticDevice),
            (0.7, HandType::MechanicalProsthetic),
            (0.849, HandType::MechanicalProsthetic),
            (0.85, HandType::BionicHand),
            (0.949, HandType::BionicHand),
            (0.95, HandType::AdvancedBionicHand),
            (1.0, HandType::AdvancedBionicHand),
        ];
        for (confidence, expected) in cases {
            assert_eq!(engine.tier(confidence), expected, "confidence {confidence}");
        }
        assert_eq!(engine.confidence_level(0.5), ConfidenceLevel::Low);
        assert_eq!(engine.confidence_level(0.96), ConfidenceLevel::VeryHigh);
    }

    #[test]
    fn tiers_are_monotonic_in_confidence() {
        let engine = ClassificationEngine::default();
        let tiers: Vec<HandType> = (0..=100).map(|i| engine.tier(i as f32 / 100.0)).collect();
        assert!(tiers.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn bionic_flag_is_strictly_above_medium() {
        let engine = ClassificationEngine::default();
        let analysis = engine.classify(&uniform_scores(0.7));
        assert!(!analysis.is_bionic || analysis.confidence > 0.7);
        assert!(engine.classify(&uniform_scores(0.9)).is_bionic);
    }

    #[test]
    fn weak_natural_hand_is_rejected() {
        let engine = ClassificationEngine::default();
        let analysis = engine.classify(&uniform_scores(0.1));
        assert!(engine.is_rejected(&analysis));
        assert_eq!(analysis.classification.hand_type, HandType::BiologicalHand);
        assert_eq!(analysis.detailed_analysis.overall, "Appears to be natural biological hand");
    }

    #[test]
    fn characteristics_follow_report_order() {
        let engine = ClassificationEngine::default();
        let mut scores = FeatureScoreSet::default();
        scores.geometric_precision = 0.9;
        scores.metallic_surface = 0.9;
        scores.sensor_presence = 0.61;
        scores.cable_detection = 0.6;
        let analysis = engine.classify(&scores);
        assert_eq!(
            analysis.classification.characteristics,
            vec![
                "Multiple sensors detected",
                "Metallic construction",
                "Precision-machined geometry"
            ]
        );
    }

    #[test]
    fn recommendations_depend_on_tier() {
        let engine = ClassificationEngine::default();

        let advanced = engine.recommendations(&engine.classify(&uniform_scores(1.0)));
        assert_eq!(advanced.len(), 2);
        assert_eq!(advanced[0].model, "Quantumix Pro Advanced");
        assert!(advanced[0].compatibility >= advanced[1].compatibility);

        let mid = engine.recommendations(&engine.classify(&uniform_scores(0.6)));
        assert_eq!(mid, vec![ENTRY_MODEL]);

        let low = engine.recommendations(&engine.classify(&uniform_scores(0.2)));
        assert_eq!(low, vec![ASSESSMENT_KIT]);
    }

    #[test]
    fn quality_metrics_blend_both_confidences() {
        let engine = ClassificationEngine::default();
        let analysis = engine.classify(&uniform_scores(1.0));
        let metrics = engine.quality_metrics(&analysis, 0.9);
        assert_eq!(metrics.image_quality, ImageQuality::Excellent);
        assert_eq!(metrics.detection_reliability, DetectionReliability::VeryReliable);
        assert_relative_eq!(metrics.overall_score, 97.0, epsilon = 1e-6);

        let weak = engine.classify(&uniform_scores(0.0));
        let metrics = engine.quality_metrics(&weak, 0.3);
        assert_eq!(metrics.image_quality, ImageQuality::Poor);
        assert_eq!(metrics.detection_reliability, DetectionReliability::LowReliability);
    }
}
