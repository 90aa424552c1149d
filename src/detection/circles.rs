use image::GrayImage;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use crate::detection::preprocessing;

/// Parameters of the gradient Hough circle transform.
#[derive(Debug, Clone)]
pub struct CircleParams {
    /// Minimum distance between accepted centers.
    pub min_dist: f32,
    /// Upper Canny threshold; the lower one is half of it.
    pub edge_threshold: f32,
    /// Minimum number of center votes.
    pub accumulator_threshold: u32,
    pub min_radius: u32,
    pub max_radius: u32,
}

impl CircleParams {
    /// Finger-segment sized circles.
    pub fn joints() -> Self {
        Self {
            min_dist: 20.0,
            edge_threshold: 50.0,
            accumulator_threshold: 30,
            min_radius: 5,
            max_radius: 30,
        }
    }

    /// Small LED / sensor sized circles.
    pub fn sensors() -> Self {
        Self {
            min_dist: 15.0,
            edge_threshold: 50.0,
            accumulator_threshold: 25,
            min_radius: 3,
            max_radius: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub votes: u32,
}

/// Detect circles in a grayscale image.
///
/// Every edge pixel votes for the centers lying along its gradient direction
/// (both ways) at each radius in range. Centers are accumulator local maxima
/// above the vote threshold, strongest first, kept only when they are at
/// least `min_dist` from every stronger center. The radius of a center is the
/// most common edge distance within range.
pub fn hough_circles(gray: &GrayImage, params: &CircleParams) -> Vec<Circle> {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 || params.max_radius < params.min_radius {
        return Vec::new();
    }

    let edges = preprocessing::detect_edges(
        gray,
        params.edge_threshold / 2.0,
        params.edge_threshold,
    );
    let gx = horizontal_sobel(gray);
    let gy = vertical_sobel(gray);

    let w = width as usize;
    let h = height as usize;
    let mut accumulator = vec![0u32; w * h];
    let mut edge_points = Vec::new();

    for (x, y, pixel) in edges.enumerate_pixels() {
        if pixel[0] == 0 {
            continue;
        }
        edge_points.push((x as f32, y as f32));

        let dx = gx.get_pixel(x, y)[0] as f32;
        let dy = gy.get_pixel(x, y)[0] as f32;
        let magnitude = (dx * dx + dy * dy).sqrt();
        if magnitude == 0.0 {
            continue;
        }
        let (ux, uy) = (dx / magnitude, dy / magnitude);

        for r in params.min_radius..=params.max_radius {
            for sign in [-1.0f32, 1.0] {
                let cx = (x as f32 + sign * r as f32 * ux).round();
                let cy = (y as f32 + sign * r as f32 * uy).round();
                if cx < 0.0 || cy < 0.0 || cx >= width as f32 || cy >= height as f32 {
                    continue;
                }
                accumulator[cy as usize * w + cx as usize] += 1;
            }
        }
    }

    let mut centers = Vec::new();
    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let idx = y * w + x;
            let votes = accumulator[idx];
            if votes > params.accumulator_threshold
                && votes > accumulator[idx - 1]
                && votes >= accumulator[idx + 1]
                && votes > accumulator[idx - w]
                && votes >= accumulator[idx + w]
            {
                centers.push((x as f32, y as f32, votes));
            }
        }
    }
    centers.sort_by(|a, b| b.2.cmp(&a.2));

    let min_dist_sq = params.min_dist * params.min_dist;
    let mut circles: Vec<Circle> = Vec::new();
    for (cx, cy, votes) in centers {
        let crowded = circles.iter().any(|c| {
            let (dx, dy) = (c.x - cx, c.y - cy);
            dx * dx + dy * dy < min_dist_sq
        });
        if crowded {
            continue;
        }
        if let Some(radius) = modal_radius(&edge_points, cx, cy, params) {
            circles.push(Circle { x: cx, y: cy, radius, votes });
        }
    }

    circles
}

fn modal_radius(edge_points: &[(f32, f32)], cx: f32, cy: f32, params: &CircleParams) -> Option<f32> {
    let bins = (params.max_radius - params.min_radius + 1) as usize;
    let mut histogram = vec![0u32; bins];
    for &(x, y) in edge_points {
        let distance = ((x - cx).powi(2) + (y - cy).powi(2)).sqrt().round() as u32;
        if distance >= params.min_radius && distance <= params.max_radius {
            histogram[(distance - params.min_radius) as usize] += 1;
        }
    }

    let mut best: Option<(usize, u32)> = None;
    for (i, &count) in histogram.iter().enumerate() {
        if count > best.map_or(0, |(_, c)| c) {
            best = Some((i, count));
        }
    }
    best.map(|(i, _)| (i as u32 + params.min_radius) as f32)
}
