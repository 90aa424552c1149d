//! Hand localization: three independent detectors fused by confidence,
//! followed by a plausibility check of the winning region.

use image::{DynamicImage, GrayImage, RgbImage};
use tracing::debug;

use crate::config::RegionLimits;
use crate::detection::{contours, preprocessing};
use crate::error::{AnalysisError, DetectionError};
use crate::models::{BoundingBox, DetectionMethod, HandRegion};
use crate::pipeline::{PipelineContext, Stage};

const SKIN_LOWER: [u8; 3] = [0, 20, 70];
const SKIN_UPPER: [u8; 3] = [20, 255, 255];

/// Contour and edge candidates must score strictly above these.
const CONTOUR_FLOOR: f32 = 0.3;
const EDGE_FLOOR: f32 = 0.3;

/// Outcome of one sub-detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Candidate {
    Detected {
        region: BoundingBox,
        confidence: f32,
        method: DetectionMethod,
    },
    NotDetected {
        confidence: f32,
        method: DetectionMethod,
    },
}

impl Candidate {
    pub fn confidence(&self) -> f32 {
        match self {
            Candidate::Detected { confidence, .. } | Candidate::NotDetected { confidence, .. } => {
                *confidence
            }
        }
    }

    pub fn method(&self) -> DetectionMethod {
        match self {
            Candidate::Detected { method, .. } | Candidate::NotDetected { method, .. } => *method,
        }
    }

    pub fn is_detected(&self) -> bool {
        matches!(self, Candidate::Detected { .. })
    }

    fn rejected(method: DetectionMethod) -> Self {
        Candidate::NotDetected { confidence: 0.0, method }
    }
}

/// Runs the contour, skin-color and edge detectors over the working image.
pub struct HandRegionDetector<'a> {
    context: &'a PipelineContext,
    reject_multiple_hands: bool,
    min_hand_area_ratio: f32,
}

impl<'a> HandRegionDetector<'a> {
    pub fn new(context: &'a PipelineContext) -> Self {
        Self {
            context,
            reject_multiple_hands: false,
            min_hand_area_ratio: RegionLimits::default().min_area_ratio,
        }
    }

    /// Reject frames where the skin mask holds two or more regions each
    /// covering at least `min_area_ratio` of the frame.
    pub fn with_multiple_hand_check(mut self, enabled: bool, min_area_ratio: f32) -> Self {
        self.reject_multiple_hands = enabled;
        self.min_hand_area_ratio = min_area_ratio;
        self
    }

    /// Pick the most confident accepted candidate. Ties go to the earlier
    /// detector in contour, skin-color, edge order.
    pub fn detect(&self, image: &RgbImage) -> Result<HandRegion, AnalysisError> {
        let gray = preprocessing::to_grayscale(image);

        let candidates = [
            self.detect_contours(&gray)?,
            self.detect_skin_color(image)?,
            self.detect_edges(&gray)?,
        ];
        for candidate in &candidates {
            debug!(
                method = candidate.method().name(),
                confidence = candidate.confidence(),
                detected = candidate.is_detected(),
                "region candidate"
            );
        }

        fuse(&candidates).ok_or(AnalysisError::Detection(DetectionError::NoHandDetected))
    }

    /// Largest external region of the adaptive-threshold image.
    fn detect_contours(&self, gray: &GrayImage) -> Result<Candidate, AnalysisError> {
        let method = DetectionMethod::ContourAnalysis;
        let blurred = preprocessing::apply_blur(gray, preprocessing::BLUR_SIGMA_5X5);
        let binary = preprocessing::adaptive_threshold(&blurred, 2.0, 2.0);
        self.save(Stage::RegionDetecting, "contour_threshold", &binary)?;

        let (width, height) = gray.dimensions();
        // a border hugging the whole frame is the background itself
        let found: Vec<_> = contours::find_external_contours(&binary)
            .into_iter()
            .filter(|c| !c.bounding_box().spans(width, height))
            .collect();
        let Some(largest) = contours::largest(&found) else {
            return Ok(Candidate::rejected(method));
        };

        let area_ratio = (largest.area() / image_area(width, height)) as f32;
        if area_ratio < 0.05 {
            return Ok(Candidate::rejected(method));
        }

        let region = largest.bounding_box();
        let aspect = if region.height > 0 {
            region.width as f32 / region.height as f32
        } else {
            0.0
        };
        let confidence = contour_confidence(area_ratio, aspect);
        debug!(area_ratio, aspect, confidence, "contour candidate");

        Ok(accept_if(confidence > CONTOUR_FLOOR, region, confidence, method))
    }

    /// Largest skin-toned region in HSV space.
    fn detect_skin_color(&self, image: &RgbImage) -> Result<Candidate, AnalysisError> {
        let method = DetectionMethod::SkinColorDetection;
        let hsv = preprocessing::to_hsv(image);
        let raw = preprocessing::in_range(&hsv, SKIN_LOWER, SKIN_UPPER);
        let mask = preprocessing::denoise_mask(&raw, 2);
        self.save(Stage::RegionDetecting, "skin_mask", &mask)?;

        let (width, height) = image.dimensions();
        let found = contours::find_external_contours(&mask);

        if self.reject_multiple_hands {
            let frame = image_area(width, height);
            let large = found
                .iter()
                .filter(|c| (c.area() / frame) as f32 >= self.min_hand_area_ratio)
                .count();
            if large >= 2 {
                debug!(regions = large, "multiple hand-sized skin regions");
                return Err(DetectionError::MultipleHands.into());
            }
        }

        let Some(largest) = contours::largest(&found) else {
            return Ok(Candidate::rejected(method));
        };

        let area_ratio = (largest.area() / image_area(width, height)) as f32;
        let confidence = (area_ratio * 8.0).min(0.9);
        debug!(area_ratio, confidence, "skin candidate");

        if confidence < 0.4 {
            return Ok(Candidate::NotDetected { confidence, method });
        }
        Ok(Candidate::Detected {
            region: largest.bounding_box(),
            confidence,
            method,
        })
    }

    /// Largest non-circular closed edge outline.
    fn detect_edges(&self, gray: &GrayImage) -> Result<Candidate, AnalysisError> {
        let method = DetectionMethod::EdgeDetection;
        let blurred = preprocessing::apply_blur(gray, preprocessing::BLUR_SIGMA_3X3);
        let edges = preprocessing::detect_edges(&blurred, 50.0, 150.0);
        self.save(Stage::RegionDetecting, "edges", &edges)?;

        let found: Vec<_> = contours::find_external_contours(&edges)
            .into_iter()
            .filter(|c| c.area() > 1000.0)
            .collect();
        let Some(best) = contours::largest(&found) else {
            return Ok(Candidate::rejected(method));
        };

        let area = best.area();
        let perimeter = best.perimeter();
        if area == 0.0 || perimeter == 0.0 {
            return Ok(Candidate::rejected(method));
        }

        let circularity = best.circularity() as f32;
        let confidence = edge_confidence(circularity);
        debug!(circularity, confidence, "edge candidate");

        Ok(accept_if(confidence > EDGE_FLOOR, best.bounding_box(), confidence, method))
    }

    fn save(&self, stage: Stage, name: &str, img: &GrayImage) -> Result<(), AnalysisError> {
        if !self.context.debug_enabled() {
            return Ok(());
        }
        self.context
            .save_debug_image(Some(stage), name, &DynamicImage::ImageLuma8(img.clone()))?;
        Ok(())
    }
}

/// Large regions score up to 0.8, scaled down as width/height drifts from 0.8.
fn contour_confidence(area_ratio: f32, aspect: f32) -> f32 {
    (area_ratio * 10.0).min(0.8) * (1.0 - (aspect - 0.8).abs())
}

/// Hand outlines are ragged, so the less circular the better.
fn edge_confidence(circularity: f32) -> f32 {
    ((1.0 - circularity) * 2.0).min(0.85)
}

fn image_area(width: u32, height: u32) -> f64 {
    (width as f64 * height as f64).max(1.0)
}

fn accept_if(accepted: bool, region: BoundingBox, confidence: f32, method: DetectionMethod) -> Candidate {
    if accepted {
        Candidate::Detected { region, confidence, method }
    } else {
        Candidate::NotDetected { confidence, method }
    }
}

/// Highest-confidence accepted candidate; the earliest wins a tie.
pub fn fuse(candidates: &[Candidate]) -> Option<HandRegion> {
    let mut best: Option<HandRegion> = None;
    for candidate in candidates {
        if let Candidate::Detected { region, confidence, method } = *candidate {
            if best.is_none_or(|b| confidence > b.confidence) {
                best = Some(HandRegion { bbox: region, confidence, method });
            }
        }
    }
    best
}

/// Region measurements that passed the plausibility checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedRegion {
    pub region: HandRegion,
    pub area_ratio: f32,
    /// Height over width.
    pub aspect_ratio: f32,
}

/// Reject regions that leave the frame, are too small or too large relative
/// to it, or have an implausible height/width ratio.
pub fn validate_region(
    image_width: u32,
    image_height: u32,
    region: HandRegion,
    limits: &RegionLimits,
) -> Result<ValidatedRegion, DetectionError> {
    let bbox = region.bbox;
    if !bbox.fits_within(image_width, image_height) {
        return Err(DetectionError::PartialHand);
    }

    let area_ratio = (bbox.area() as f64 / image_area(image_width, image_height)) as f32;
    if area_ratio < limits.min_area_ratio {
        return Err(DetectionError::PartialHand);
    }
    if area_ratio > limits.max_area_ratio {
        return Err(DetectionError::UnclearImage);
    }

    let aspect_ratio = bbox.aspect_ratio();
    if aspect_ratio < limits.min_aspect || aspect_ratio > limits.max_aspect {
        return Err(DetectionError::NoHandDetected);
    }

    Ok(ValidatedRegion {
        region,
        area_ratio,
        aspect_ratio,
    })
}
