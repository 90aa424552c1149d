use image::RgbImage;
use imageproc::geometry::{approximate_polygon_dp, arc_length, convex_hull};
use imageproc::point::Point;
use serde::Serialize;

/// Axis-aligned rectangle in working-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Height over width, the hand orientation measure.
    pub fn aspect_ratio(&self) -> f32 {
        if self.width == 0 {
            return 0.0;
        }
        self.height as f32 / self.width as f32
    }

    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x as u64 + self.width as u64 <= width as u64
            && self.y as u64 + self.height as u64 <= height as u64
    }

    pub fn spans(&self, width: u32, height: u32) -> bool {
        self.x == 0 && self.y == 0 && self.width >= width && self.height >= height
    }

    /// Copy the region out of `img`. The box must fit within the image.
    pub fn crop(&self, img: &RgbImage) -> RgbImage {
        image::imageops::crop_imm(img, self.x, self.y, self.width, self.height).to_image()
    }
}

/// Outer border of a connected region, as traced by the contour finder.
#[derive(Debug, Clone)]
pub struct Contour {
    pub points: Vec<Point<i32>>,
}

impl Contour {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    /// Enclosed polygon area (shoelace formula).
    pub fn area(&self) -> f64 {
        polygon_area(&self.points)
    }

    /// Closed border length.
    pub fn perimeter(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        arc_length(&self.points, true)
    }

    /// `4π·area / perimeter²`: 1.0 for a disc, lower for ragged shapes.
    pub fn circularity(&self) -> f64 {
        let perimeter = self.perimeter();
        if perimeter == 0.0 {
            return 0.0;
        }
        4.0 * std::f64::consts::PI * self.area() / (perimeter * perimeter)
    }

    /// Area relative to the area of the convex hull.
    pub fn convexity(&self) -> f64 {
        if self.points.len() < 3 {
            return 0.0;
        }
        let hull = convex_hull(self.points.as_slice());
        let hull_area = polygon_area(&hull);
        if hull_area > 0.0 {
            self.area() / hull_area
        } else {
            0.0
        }
    }

    /// Vertex count after Douglas-Peucker simplification with a tolerance of
    /// `epsilon_fraction` of the perimeter.
    pub fn approx_vertex_count(&self, epsilon_fraction: f64) -> usize {
        if self.points.len() < 3 {
            return self.points.len();
        }
        let epsilon = epsilon_fraction * self.perimeter();
        if epsilon <= 0.0 {
            return self.points.len();
        }
        approximate_polygon_dp(&self.points, epsilon, true).len()
    }

    /// Inclusive bounding box of the border points.
    pub fn bounding_box(&self) -> BoundingBox {
        let mut min_x = i32::MAX;
        let mut min_y = i32::MAX;
        let mut max_x = i32::MIN;
        let mut max_y = i32::MIN;

        for p in &self.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        if self.points.is_empty() {
            return BoundingBox::new(0, 0, 0, 0);
        }

        let min_x = min_x.max(0) as u32;
        let min_y = min_y.max(0) as u32;
        BoundingBox::new(
            min_x,
            min_y,
            (max_x.max(0) as u32) - min_x + 1,
            (max_y.max(0) as u32) - min_y + 1,
        )
    }
}

fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    (twice_area.abs() as f64) / 2.0
}

/// Accepted container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Bmp,
    Tiff,
}

impl ImageFormat {
    /// Maps a sniffed container format onto the allowlist.
    pub fn from_container(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::Bmp => Some(Self::Bmp),
            image::ImageFormat::Tiff => Some(Self::Tiff),
            _ => None,
        }
    }
}

/// Metadata of the accepted input, reported back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageInfo {
    pub format: ImageFormat,
    /// `[width, height]` of the input before normalization.
    pub size: (u32, u32),
    /// Pixel layout name (`RGB`, `RGBA`, `L`, ...).
    pub mode: String,
    pub file_size_bytes: usize,
    /// SHA-256 of the input bytes, hex encoded.
    pub hash: String,
}

/// Which sub-detector produced a hand region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    ContourAnalysis,
    SkinColorDetection,
    EdgeDetection,
}

impl DetectionMethod {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ContourAnalysis => "contour_analysis",
            Self::SkinColorDetection => "skin_color_detection",
            Self::EdgeDetection => "edge_detection",
        }
    }
}

/// Best hand bounding box with the confidence of the detector that found it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandRegion {
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub method: DetectionMethod,
}

/// The seven bionic indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    MetallicSurface,
    JointArticulation,
    SensorPresence,
    CableDetection,
    SurfaceTexture,
    ColorPattern,
    GeometricPrecision,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 7] = [
        FeatureKind::MetallicSurface,
        FeatureKind::JointArticulation,
        FeatureKind::SensorPresence,
        FeatureKind::CableDetection,
        FeatureKind::SurfaceTexture,
        FeatureKind::ColorPattern,
        FeatureKind::GeometricPrecision,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::MetallicSurface => "metallic_surface",
            Self::JointArticulation => "joint_articulation",
            Self::SensorPresence => "sensor_presence",
            Self::CableDetection => "cable_detection",
            Self::SurfaceTexture => "surface_texture",
            Self::ColorPattern => "color_pattern",
            Self::GeometricPrecision => "geometric_precision",
        }
    }

    /// Weight in the bionic confidence sum.
    pub fn weight(&self) -> f32 {
        match self {
            Self::MetallicSurface => 0.25,
            Self::JointArticulation => 0.20,
            Self::SensorPresence => 0.15,
            Self::CableDetection => 0.15,
            Self::SurfaceTexture => 0.10,
            Self::ColorPattern => 0.10,
            Self::GeometricPrecision => 0.05,
        }
    }

    /// Score used when the scorer itself fails.
    pub fn fallback_score(&self) -> f32 {
        match self {
            Self::SurfaceTexture | Self::ColorPattern | Self::GeometricPrecision => 0.3,
            _ => 0.0,
        }
    }
}

/// One score in `[0, 1]` per feature. Every field is always populated.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeatureScoreSet {
    pub metallic_surface: f32,
    pub joint_articulation: f32,
    pub sensor_presence: f32,
    pub cable_detection: f32,
    pub surface_texture: f32,
    pub color_pattern: f32,
    pub geometric_precision: f32,
}

impl FeatureScoreSet {
    pub fn get(&self, kind: FeatureKind) -> f32 {
        match kind {
            FeatureKind::MetallicSurface => self.metallic_surface,
            FeatureKind::JointArticulation => self.joint_articulation,
            FeatureKind::SensorPresence => self.sensor_presence,
            FeatureKind::CableDetection => self.cable_detection,
            FeatureKind::SurfaceTexture => self.surface_texture,
            FeatureKind::ColorPattern => self.color_pattern,
            FeatureKind::GeometricPrecision => self.geometric_precision,
        }
    }

    pub fn set(&mut self, kind: FeatureKind, score: f32) {
        let slot = match kind {
            FeatureKind::MetallicSurface => &mut self.metallic_surface,
            FeatureKind::JointArticulation => &mut self.joint_articulation,
            FeatureKind::SensorPresence => &mut self.sensor_presence,
            FeatureKind::CableDetection => &mut self.cable_detection,
            FeatureKind::SurfaceTexture => &mut self.surface_texture,
            FeatureKind::ColorPattern => &mut self.color_pattern,
            FeatureKind::GeometricPrecision => &mut self.geometric_precision,
        };
        *slot = score;
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeatureKind, f32)> + '_ {
        FeatureKind::ALL.iter().map(move |&kind| (kind, self.get(kind)))
    }

    /// Number of features scoring strictly above `threshold`.
    pub fn count_above(&self, threshold: f32) -> usize {
        self.iter().filter(|(_, score)| *score > threshold).count()
    }

    pub fn mean(&self) -> f32 {
        self.iter().map(|(_, score)| score).sum::<f32>() / FeatureKind::ALL.len() as f32
    }
}

/// Classification tiers, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandType {
    BiologicalHand,
    ProstheticDevice,
    MechanicalProsthetic,
    BionicHand,
    AdvancedBionicHand,
}

impl HandType {
    pub fn description(&self) -> &'static str {
        match self {
            Self::AdvancedBionicHand => {
                "Advanced bionic prosthetic with multiple sensors and actuators"
            }
            Self::BionicHand => "Bionic prosthetic hand with electronic control systems",
            Self::MechanicalProsthetic => "Mechanical prosthetic or simple bionic hand",
            Self::ProstheticDevice => "Basic prosthetic device or assistive technology",
            Self::BiologicalHand => "Natural biological hand",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ConfidenceLevel {
    #[serde(rename = "Very Low")]
    VeryLow,
    Low,
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

/// Categorical verdict derived from the bionic confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub hand_type: HandType,
    pub description: String,
    pub characteristics: Vec<String>,
    pub confidence_level: ConfidenceLevel,
}
