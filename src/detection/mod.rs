pub mod circles;
pub mod classification;
pub mod contours;
pub mod features;
pub mod hand_region;
pub mod lines;
pub mod preprocessing;

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::time::Instant;

use image::DynamicImage;
use tracing::{debug, info};

use crate::config::DetectorConfig;
use crate::error::AnalysisError;
use crate::models::ImageInfo;
use crate::pipeline::{DebugConfig, PipelineContext, PipelineRun, Stage};
use crate::report::AnalysisResult;
use crate::validation::{ImageInput, ImageValidator, ValidatedImage};
use classification::{BionicAnalysis, ClassificationEngine, QualityMetrics, Recommendation};
use features::{BionicFeatureScorer, HandCrop};
use hand_region::{HandRegionDetector, ValidatedRegion};

/// Everything a successful call produced, before it is shaped into a report.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub image_info: ImageInfo,
    pub hand: ValidatedRegion,
    pub bionic: BionicAnalysis,
    pub recommendations: Vec<Recommendation>,
    pub quality: QualityMetrics,
}

/// Main analysis pipeline orchestrator
///
/// Holds only configuration; every call allocates its own buffers, so one
/// detector can serve concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct BionicHandDetector {
    pub config: DetectorConfig,
    context: PipelineContext,
}

impl BionicHandDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: DetectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Dump intermediate images of every stage under `output_dir`, which must
    /// be empty or absent.
    pub fn with_debug(mut self, output_dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        self.context.debug = Some(DebugConfig::new(output_dir.into())?);
        Ok(self)
    }

    /// Run the whole pipeline and wrap the outcome in the wire envelope.
    /// Never panics: unexpected failures become `system_error` results.
    pub fn analyze(&self, input: impl Into<ImageInput>, filename: Option<&str>) -> AnalysisResult {
        let started = Instant::now();
        let input = input.into();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run(input, filename)))
            .unwrap_or_else(|payload| Err(AnalysisError::from_panic(payload.as_ref())));

        match outcome {
            Ok(analysis) => {
                info!(
                    hand_type = ?analysis.bionic.classification.hand_type,
                    confidence = analysis.bionic.confidence,
                    "analysis complete"
                );
                AnalysisResult::success(analysis, started.elapsed())
            }
            Err(err) => {
                info!(error_type = ?err.error_type(), %err, "analysis rejected");
                AnalysisResult::failure(&err, started.elapsed())
            }
        }
    }

    /// Run the pipeline, returning the typed rejection on failure.
    pub fn run(&self, input: ImageInput, filename: Option<&str>) -> Result<Analysis, AnalysisError> {
        let mut run = PipelineRun::start();
        let result = self.run_stages(&mut run, input, filename);
        match &result {
            Ok(_) => run.succeed(),
            Err(err) => run.reject(err.to_string()),
        }
        debug!(
            state = ?run.state(),
            completed = ?run.completed(),
            elapsed_ms = run.elapsed().as_secs_f64() * 1000.0,
            "pipeline finished"
        );
        result
    }

    fn run_stages(
        &self,
        run: &mut PipelineRun,
        input: ImageInput,
        filename: Option<&str>,
    ) -> Result<Analysis, AnalysisError> {
        run.enter(Stage::Validating);
        let validator = ImageValidator::new(self.config.image.clone());
        let ValidatedImage { image, info } = validator.validate(input, filename)?;
        let working = validator.normalize(&image)?;
        drop(image);
        if self.context.debug_enabled() {
            self.context
                .save_debug_image(None, "normalized", &DynamicImage::ImageRgb8(working.clone()))?;
        }

        run.enter(Stage::RegionDetecting);
        let hand = HandRegionDetector::new(&self.context)
            .with_multiple_hand_check(
                self.config.reject_multiple_hands,
                self.config.region.min_area_ratio,
            )
            .detect(&working)?;
        debug!(method = hand.method.name(), confidence = hand.confidence, bbox = ?hand.bbox, "hand region");

        run.enter(Stage::RegionValidating);
        let (width, height) = working.dimensions();
        let hand = hand_region::validate_region(width, height, hand, &self.config.region)?;

        run.enter(Stage::Scoring);
        let crop = HandCrop::new(&working, &hand.region.bbox);
        drop(working);
        if self.context.debug_enabled() {
            self.save_crop_debug(&crop)?;
        }
        let scores = BionicFeatureScorer::new().score_crop(&crop);

        run.enter(Stage::Classifying);
        let engine = ClassificationEngine::new(self.config.thresholds.clone());
        let bionic = engine.classify(&scores);
        if engine.is_rejected(&bionic) {
            return Err(AnalysisError::NoBionicFeatures {
                confidence: bionic.confidence,
            });
        }

        let recommendations = engine.recommendations(&bionic);
        let quality = engine.quality_metrics(&bionic, hand.region.confidence);

        Ok(Analysis {
            image_info: info,
            hand,
            bionic,
            recommendations,
            quality,
        })
    }

    fn save_crop_debug(&self, crop: &HandCrop) -> anyhow::Result<()> {
        self.context.save_debug_image(
            Some(Stage::RegionValidating),
            "hand_region",
            &DynamicImage::ImageRgb8(crop.rgb.clone()),
        )?;
        self.context
            .save_debug_image(Some(Stage::Scoring), "gray", &DynamicImage::ImageLuma8(crop.gray.clone()))?;
        let edges = preprocessing::detect_edges(&crop.gray, 50.0, 150.0);
        self.context
            .save_debug_image(Some(Stage::Scoring), "edges", &DynamicImage::ImageLuma8(edges))
    }
}
