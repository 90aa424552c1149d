/// Input acceptance and normalization limits.
#[derive(Debug, Clone)]
pub struct ImageLimits {
    /// Smallest accepted width or height in pixels.
    pub min_dimension: u32,
    /// Largest accepted width or height in pixels.
    pub max_dimension: u32,
    /// Largest accepted payload in bytes (after base64 decoding).
    pub max_file_size: usize,
    /// Longest side of the normalized working image.
    pub working_size: u32,
    /// Contrast enhancement factor (1.0 leaves the image unchanged).
    pub contrast: f32,
    /// Sharpness enhancement factor (1.0 leaves the image unchanged).
    pub sharpness: f32,
}

impl Default for ImageLimits {
    fn default() -> Self {
        Self {
            min_dimension: 100,
            max_dimension: 4000,
            max_file_size: 10 * 1024 * 1024,
            working_size: 1024,
            contrast: 1.2,
            sharpness: 1.1,
        }
    }
}

/// Plausibility bounds for a detected hand region.
#[derive(Debug, Clone)]
pub struct RegionLimits {
    pub min_area_ratio: f32,
    pub max_area_ratio: f32,
    /// Minimum height / width.
    pub min_aspect: f32,
    /// Maximum height / width.
    pub max_aspect: f32,
}

impl Default for RegionLimits {
    fn default() -> Self {
        Self {
            min_area_ratio: 0.1,
            max_area_ratio: 0.8,
            min_aspect: 0.8,
            max_aspect: 2.0,
        }
    }
}

/// Bionic confidence tier boundaries, each inclusive from below.
#[derive(Debug, Clone)]
pub struct ConfidenceThresholds {
    pub very_high: f32,
    pub high: f32,
    pub medium: f32,
    pub low: f32,
    /// Non-bionic results below this are rejected instead of reported.
    pub rejection: f32,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            very_high: 0.95,
            high: 0.85,
            medium: 0.70,
            low: 0.50,
            rejection: 0.3,
        }
    }
}

/// All tunables of one detector instance.
#[derive(Debug, Clone, Default)]
pub struct DetectorConfig {
    pub image: ImageLimits,
    pub region: RegionLimits,
    pub thresholds: ConfidenceThresholds,
    /// Reject frames holding more than one large skin region.
    pub reject_multiple_hands: bool,
}

impl DetectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reject_multiple_hands(mut self, reject: bool) -> Self {
        self.reject_multiple_hands = reject;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds_are_ordered() {
        let t = ConfidenceThresholds::default();
        assert!(t.very_high > t.high);
        assert!(t.high > t.medium);
        assert!(t.medium > t.low);
        assert!(t.low > t.rejection);
    }

    #[test]
    fn default_file_limit_is_ten_mebibytes() {
        assert_eq!(ImageLimits::default().max_file_size, 10_485_760);
    }
}
