//! Seven independent bionic-feature heuristics over the cropped hand region.
//!
//! Each scorer returns a plain score in `[0, 1]`. A scorer that fails
//! internally degrades to its fallback score instead of aborting the stage.

use anyhow::{Result, ensure};
use image::{GrayImage, RgbImage};
use tracing::{debug, warn};

use crate::detection::circles::{self, CircleParams};
use crate::detection::preprocessing::{self, HsvImage};
use crate::detection::{contours, lines};
use crate::models::{BoundingBox, FeatureKind, FeatureScoreSet};

/// LBP sampling radius in pixels.
const LBP_RADIUS: usize = 3;
/// LBP samples per pixel; one bit each, so codes fit in a byte.
const LBP_POINTS: usize = 8;

/// The hand crop in the color spaces the scorers read.
pub struct HandCrop {
    pub rgb: RgbImage,
    pub gray: GrayImage,
    pub hsv: HsvImage,
}

impl HandCrop {
    pub fn new(image: &RgbImage, region: &BoundingBox) -> Self {
        let rgb = region.crop(image);
        Self::from_rgb(rgb)
    }

    pub fn from_rgb(rgb: RgbImage) -> Self {
        let gray = preprocessing::to_grayscale(&rgb);
        let hsv = preprocessing::to_hsv(&rgb);
        Self { rgb, gray, hsv }
    }

    fn pixel_count(&self) -> usize {
        self.rgb.width() as usize * self.rgb.height() as usize
    }

    fn ensure_nonempty(&self) -> Result<usize> {
        let total = self.pixel_count();
        ensure!(total > 0, "empty hand region");
        Ok(total)
    }
}

type Scorer = fn(&HandCrop) -> Result<f32>;

#[derive(Debug, Default)]
pub struct BionicFeatureScorer;

impl BionicFeatureScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score every feature over `region` of `image`.
    pub fn score(&self, image: &RgbImage, region: &BoundingBox) -> FeatureScoreSet {
        self.score_crop(&HandCrop::new(image, region))
    }

    pub fn score_crop(&self, crop: &HandCrop) -> FeatureScoreSet {
        let mut scores = FeatureScoreSet::default();
        for kind in FeatureKind::ALL {
            scores.set(kind, guarded(kind, crop, scorer_for(kind)));
        }
        debug!(?scores, "feature scores");
        scores
    }
}

fn scorer_for(kind: FeatureKind) -> Scorer {
    match kind {
        FeatureKind::MetallicSurface => metallic_surface,
        FeatureKind::JointArticulation => joint_articulation,
        FeatureKind::SensorPresence => sensor_presence,
        FeatureKind::CableDetection => cable_detection,
        FeatureKind::SurfaceTexture => surface_texture,
        FeatureKind::ColorPattern => color_pattern,
        FeatureKind::GeometricPrecision => geometric_precision,
    }
}

/// Run one scorer, collapsing failures and non-finite results to the fallback.
fn guarded(kind: FeatureKind, crop: &HandCrop, scorer: Scorer) -> f32 {
    match scorer(crop) {
        Ok(score) if score.is_finite() => score.clamp(0.0, 1.0),
        Ok(score) => {
            warn!(feature = kind.name(), score, "non-finite feature score, using fallback");
            kind.fallback_score()
        }
        Err(err) => {
            warn!(feature = kind.name(), error = %err, "feature scorer failed, using fallback");
            kind.fallback_score()
        }
    }
}

fn fraction(count: usize, total: usize) -> f32 {
    count as f32 / total as f32
}

/// Bright reflective pixels blended with near-white, low-saturation pixels.
fn metallic_surface(crop: &HandCrop) -> Result<f32> {
    let total = crop.ensure_nonempty()?;

    let bright = crop.gray.pixels().filter(|p| p[0] > 200).count();
    let silver = preprocessing::in_range(&crop.hsv, [0, 0, 180], [180, 30, 255]);
    let silver_ratio = preprocessing::nonzero_fraction(&silver);

    let score = (fraction(bright, total) * 0.6 + silver_ratio * 0.4) * 2.0;
    Ok(score.min(1.0))
}

/// Axis-aligned straight segments and finger-segment circles.
fn joint_articulation(crop: &HandCrop) -> Result<f32> {
    crop.ensure_nonempty()?;

    let edges = preprocessing::detect_edges(&crop.gray, 50.0, 150.0);
    let found = lines::find_lines(&edges, 30);
    if found.is_empty() {
        return Ok(0.2);
    }

    let structured = found
        .iter()
        .filter(|l| l.is_horizontal(15.0) || l.is_vertical(15.0))
        .count();
    let line_score = (structured as f32 / 20.0).min(1.0);

    let circles = circles::hough_circles(&crop.gray, &CircleParams::joints());
    let circle_score = (circles.len() as f32 / 10.0).min(1.0);

    Ok(line_score * 0.7 + circle_score * 0.3)
}

/// Small circles (LEDs, sensors) and small angular components.
fn sensor_presence(crop: &HandCrop) -> Result<f32> {
    crop.ensure_nonempty()?;

    let small_circles = circles::hough_circles(&crop.gray, &CircleParams::sensors())
        .iter()
        .filter(|c| c.radius < 10.0)
        .count();
    let sensor_score = (small_circles as f32 / 8.0).min(1.0);

    // any nonzero gray level counts as foreground here
    let components = contours::find_external_contours(&crop.gray)
        .iter()
        .filter(|c| {
            let area = c.area();
            area > 50.0 && area < 500.0 && c.perimeter() > 0.0 && c.circularity() < 0.7
        })
        .count();
    let component_score = (components as f32 / 10.0).min(1.0);

    Ok(sensor_score * 0.6 + component_score * 0.4)
}

/// Edge density plus bundles of parallel lines.
fn cable_detection(crop: &HandCrop) -> Result<f32> {
    crop.ensure_nonempty()?;

    let edges = preprocessing::detect_edges(&crop.gray, 30.0, 100.0);
    let enhanced = preprocessing::close_horizontal(&edges, 1);
    let edge_density = preprocessing::nonzero_fraction(&enhanced);

    let found = lines::find_lines(&enhanced, 20);
    let cable_score = if found.is_empty() {
        0.0
    } else {
        (lines::count_parallel_pairs(&found, 0.2) as f32 / 5.0).min(1.0)
    };

    Ok((edge_density * 3.0 + cable_score * 0.5).min(1.0))
}

/// Uniform, low-variance local texture reads as manufactured.
fn surface_texture(crop: &HandCrop) -> Result<f32> {
    let total = crop.ensure_nonempty()?;
    let codes = local_binary_pattern(&crop.gray)?;

    let mut histogram = [0usize; 256];
    for &code in &codes {
        histogram[code as usize] += 1;
    }
    let entropy: f64 = histogram
        .iter()
        .map(|&count| {
            let p = count as f64 / total as f64;
            -p * (p + 1e-10).log2()
        })
        .sum();
    let uniformity = 1.0 - entropy / 8.0;

    let mean = codes.iter().map(|&c| c as f64).sum::<f64>() / total as f64;
    let variance = codes
        .iter()
        .map(|&c| (c as f64 - mean).powi(2))
        .sum::<f64>()
        / total as f64;
    let variance_score = (variance / 10_000.0).min(1.0);

    let score = uniformity * 0.7 + (1.0 - variance_score) * 0.3;
    Ok(score.min(1.0) as f32)
}

/// Row-major LBP codes, one per pixel. Each interior pixel compares eight
/// bilinearly sampled neighbors on a circle of radius 3 against itself, first
/// sample in the most significant bit. Pixels whose samples leave the image
/// keep code 0.
pub fn local_binary_pattern(gray: &GrayImage) -> Result<Vec<u8>> {
    let (width, height) = (gray.width() as usize, gray.height() as usize);
    ensure!(
        width > 2 * LBP_RADIUS && height > 2 * LBP_RADIUS,
        "region too small for texture analysis"
    );

    let at = |row: usize, col: usize| gray.get_pixel(col as u32, row as u32)[0] as f64;
    let radius = LBP_RADIUS as f64;
    let offsets: Vec<(f64, f64)> = (0..LBP_POINTS)
        .map(|k| {
            let angle = 2.0 * std::f64::consts::PI * k as f64 / LBP_POINTS as f64;
            (radius * angle.cos(), radius * angle.sin())
        })
        .collect();

    let mut codes = vec![0u8; width * height];
    for i in LBP_RADIUS..height - LBP_RADIUS {
        for j in LBP_RADIUS..width - LBP_RADIUS {
            let center = at(i, j);
            let mut code = 0u8;
            let mut sampled = 0;

            for &(di, dj) in &offsets {
                let x = i as f64 + di;
                let y = j as f64 + dj;
                let (x1, y1) = (x.floor() as usize, y.floor() as usize);
                let (x2, y2) = (x1 + 1, y1 + 1);
                if x2 >= height || y2 >= width {
                    continue;
                }

                let value = at(x1, y1) * (x2 as f64 - x) * (y2 as f64 - y)
                    + at(x2, y1) * (x - x1 as f64) * (y2 as f64 - y)
                    + at(x1, y2) * (x2 as f64 - x) * (y - y1 as f64)
                    + at(x2, y2) * (x - x1 as f64) * (y - y1 as f64);

                code = (code << 1) | u8::from(value + 1e-9 >= center);
                sampled += 1;
            }

            if sampled == LBP_POINTS {
                codes[i * width + j] = code;
            }
        }
    }

    Ok(codes)
}

/// Flat coloring, grayish tones and metallic shine.
fn color_pattern(crop: &HandCrop) -> Result<f32> {
    let total = crop.ensure_nonempty()?;

    let mut channel_variance = 0.0f64;
    for c in 0..3 {
        let mean = crop.rgb.pixels().map(|p| p[c] as f64).sum::<f64>() / total as f64;
        let variance = crop
            .rgb
            .pixels()
            .map(|p| (p[c] as f64 - mean).powi(2))
            .sum::<f64>()
            / total as f64;
        channel_variance += variance / 3.0;
    }
    let variance_score = 1.0 - (channel_variance as f32 / 2000.0).min(1.0);

    let grayish = crop
        .rgb
        .pixels()
        .step_by(10)
        .filter(|p| {
            let [r, g, b] = p.0;
            r.abs_diff(g) < 30 && g.abs_diff(b) < 30 && r.abs_diff(b) < 30
        })
        .count();
    let gray_ratio = fraction(grayish * 10, total);

    let shiny = crop.hsv.pixels().filter(|p| p[2] > 180 && p[1] < 50).count();
    let metallic_ratio = fraction(shiny, total);

    let score = variance_score * 0.4 + gray_ratio * 0.4 + metallic_ratio * 2.0 * 0.2;
    Ok(score.min(1.0))
}

/// How regular the outlines in the crop are.
fn geometric_precision(crop: &HandCrop) -> Result<f32> {
    crop.ensure_nonempty()?;

    let edges = preprocessing::detect_edges(&crop.gray, 50.0, 150.0);
    let outlines = contours::find_contours_min_area(&edges, 100.0);

    let scores: Vec<f32> = outlines
        .iter()
        .filter(|c| c.perimeter() > 0.0)
        .map(|c| {
            let circularity = c.circularity();
            if (0.7..=1.3).contains(&circularity) || c.convexity() > 0.9 {
                0.8
            } else if c.approx_vertex_count(0.02) >= 4 {
                0.7
            } else {
                0.3
            }
        })
        .collect();

    if scores.is_empty() {
        return Ok(0.3);
    }
    let mean = scores.iter().sum::<f32>() / scores.len() as f32;
    Ok(mean.min(1.0))
}
