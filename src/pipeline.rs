use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use image::DynamicImage;
use tracing::debug;

/// Processing stages of one analysis call, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Validating,
    RegionDetecting,
    RegionValidating,
    Scoring,
    Classifying,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Validating,
        Stage::RegionDetecting,
        Stage::RegionValidating,
        Stage::Scoring,
        Stage::Classifying,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Validating => "validating",
            Stage::RegionDetecting => "region_detecting",
            Stage::RegionValidating => "region_validating",
            Stage::Scoring => "scoring",
            Stage::Classifying => "classifying",
        }
    }

    /// Debug directory for this stage, e.g. `01_region_detecting`.
    fn directory_name(&self) -> String {
        let index = Stage::ALL.iter().position(|s| s == self).unwrap_or(0);
        format!("{:02}_{}", index, self.name())
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where one call currently is. Every call ends in `Success` or `Rejected`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    Running(Stage),
    Success,
    Rejected { stage: Option<Stage>, reason: String },
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Success | PipelineState::Rejected { .. })
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
    /// Whether debug mode is enabled
    pub enabled: bool,
}

impl DebugConfig {
    /// Use `output_dir` for debug images. The directory must be empty or
    /// non-existent; it is created when missing.
    pub fn new(output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        Ok(Self {
            output_dir,
            enabled: true,
        })
    }
}

/// Context available to every stage
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    pub debug: Option<DebugConfig>,
}

impl PipelineContext {
    pub fn debug_enabled(&self) -> bool {
        self.debug.as_ref().is_some_and(|d| d.enabled)
    }

    /// Save an intermediate image under `<stage dir>/<name>.png` when debug
    /// mode is on. `stage` of `None` writes to `00_input`.
    pub fn save_debug_image(&self, stage: Option<Stage>, name: &str, image: &DynamicImage) -> Result<()> {
        let Some(debug_config) = &self.debug else {
            return Ok(());
        };
        if !debug_config.enabled {
            return Ok(());
        }

        let dir_name = match stage {
            Some(stage) => stage.directory_name(),
            None => "00_input".to_string(),
        };
        let dir = debug_config.output_dir.join(&dir_name);
        std::fs::create_dir_all(&dir)?;

        let filename = format!("{}.png", name.to_lowercase().replace(' ', "_"));
        image
            .save(dir.join(&filename))
            .map_err(|e| anyhow::anyhow!("Failed to save debug image: {}", e))?;

        debug!("saved debug image {}/{}", dir_name, filename);
        Ok(())
    }
}

/// State tracker for one call: records stage transitions and elapsed time.
#[derive(Debug)]
pub struct PipelineRun {
    state: PipelineState,
    completed: Vec<Stage>,
    started: Instant,
}

impl PipelineRun {
    pub fn start() -> Self {
        Self {
            state: PipelineState::Start,
            completed: Vec::new(),
            started: Instant::now(),
        }
    }

    /// Enter `stage`, marking the previous one as completed.
    pub fn enter(&mut self, stage: Stage) {
        if let PipelineState::Running(previous) = self.state {
            self.completed.push(previous);
        }
        debug!(%stage, "entering stage");
        self.state = PipelineState::Running(stage);
    }

    pub fn succeed(&mut self) {
        if let PipelineState::Running(previous) = self.state {
            self.completed.push(previous);
        }
        self.state = PipelineState::Success;
    }

    pub fn reject(&mut self, reason: impl Into<String>) {
        let stage = match self.state {
            PipelineState::Running(stage) => Some(stage),
            _ => None,
        };
        let reason = reason.into();
        debug!(stage = stage.map(|s| s.name()), %reason, "pipeline rejected");
        self.state = PipelineState::Rejected { stage, reason };
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn completed(&self) -> &[Stage] {
        &self.completed
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn run_records_completed_stages() {
        let mut run = PipelineRun::start();
        assert_eq!(run.state(), &PipelineState::Start);
        run.enter(Stage::Validating);
        run.enter(Stage::RegionDetecting);
        run.reject("no hand");

        assert_eq!(run.completed(), &[Stage::Validating]);
        assert_eq!(
            run.state(),
            &PipelineState::Rejected {
                stage: Some(Stage::RegionDetecting),
                reason: "no hand".to_string()
            }
        );
        assert!(run.state().is_terminal());
    }

    #[test]
    fn successful_run_completes_every_stage() {
        let mut run = PipelineRun::start();
        for stage in Stage::ALL {
            run.enter(stage);
        }
        run.succeed();
        assert_eq!(run.completed(), &Stage::ALL);
        assert_eq!(run.state(), &PipelineState::Success);
    }

    #[test]
    fn debug_dir_must_be_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("stale.txt"), b"x").unwrap();
        assert!(DebugConfig::new(dir.path().to_path_buf()).is_err());
    }

    #[test]
    fn debug_images_land_in_stage_directories() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("debug");
        let context = PipelineContext {
            debug: Some(DebugConfig::new(out.clone()).unwrap()),
        };
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([1])));

        context.save_debug_image(None, "normalized", &img).unwrap();
        context
            .save_debug_image(Some(Stage::RegionDetecting), "Skin Mask", &img)
            .unwrap();

        assert!(out.join("00_input/normalized.png").exists());
        assert!(out.join("01_region_detecting/skin_mask.png").exists());
    }

    #[test]
    fn disabled_context_writes_nothing() {
        let context = PipelineContext::default();
        let img = DynamicImage::ImageLuma8(GrayImage::new(2, 2));
        assert!(!context.debug_enabled());
        context.save_debug_image(Some(Stage::Scoring), "gray", &img).unwrap();
    }
}
