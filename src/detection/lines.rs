use image::GrayImage;
use imageproc::hough::{detect_lines, LineDetectionOptions, PolarLine};

/// Straight line found by the Hough transform, described by its direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    /// Direction of the line in degrees, in `[0, 180)`. 0 is horizontal.
    pub direction_degrees: f32,
}

impl Line {
    fn from_polar(polar: &PolarLine) -> Self {
        // the polar angle describes the normal; the line runs perpendicular to it
        let direction = (polar.angle_in_degrees as f32 + 90.0) % 180.0;
        Self { direction_degrees: direction }
    }

    pub fn direction_radians(&self) -> f32 {
        self.direction_degrees.to_radians()
    }

    pub fn is_horizontal(&self, tolerance_degrees: f32) -> bool {
        self.direction_degrees < tolerance_degrees
            || self.direction_degrees > 180.0 - tolerance_degrees
    }

    pub fn is_vertical(&self, tolerance_degrees: f32) -> bool {
        (self.direction_degrees - 90.0).abs() < tolerance_degrees
    }
}

/// Detect lines in a binary edge image. `vote_threshold` is the number of
/// edge pixels a line needs.
pub fn find_lines(edges: &GrayImage, vote_threshold: u32) -> Vec<Line> {
    let options = LineDetectionOptions {
        vote_threshold,
        suppression_radius: 8,
    };
    detect_lines(edges, options).iter().map(Line::from_polar).collect()
}

/// Count line pairs whose directions differ by less than `max_difference` radians.
pub fn count_parallel_pairs(lines: &[Line], max_difference: f32) -> usize {
    let mut pairs = 0;
    for (i, a) in lines.iter().enumerate() {
        for b in &lines[i + 1..] {
            if (a.direction_radians() - b.direction_radians()).abs() < max_difference {
                pairs += 1;
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn polar_normal_maps_to_direction() {
        let horizontal = Line::from_polar(&PolarLine { r: 10.0, angle_in_degrees: 90 });
        assert_eq!(horizontal.direction_degrees, 0.0);
        assert!(horizontal.is_horizontal(15.0));

        let vertical = Line::from_polar(&PolarLine { r: 10.0, angle_in_degrees: 0 });
        assert_eq!(vertical.direction_degrees, 90.0);
        assert!(vertical.is_vertical(15.0));
        assert!(!vertical.is_horizontal(15.0));
    }

    #[test]
    fn finds_drawn_horizontal_line() {
        let mut edges = GrayImage::new(100, 100);
        for x in 0..100 {
            edges.put_pixel(x, 40, Luma([255]));
        }
        let lines = find_lines(&edges, 30);
        assert!(!lines.is_empty());
        assert!(lines.iter().any(|l| l.is_horizontal(15.0)));
    }

    #[test]
    fn empty_edges_have_no_lines() {
        let edges = GrayImage::new(50, 50);
        assert!(find_lines(&edges, 20).is_empty());
    }

    #[test]
    fn parallel_pairs_counted_once() {
        let lines = [
            Line { direction_degrees: 0.0 },
            Line { direction_degrees: 5.0 },
            Line { direction_degrees: 90.0 },
        ];
        assert_eq!(count_parallel_pairs(&lines, 0.2), 1);
    }
}
