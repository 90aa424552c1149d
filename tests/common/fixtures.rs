use std::io::Cursor;

use bionic_scan::ConfidenceThresholds;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

/// Skin tone that stays inside the skin HSV range after normalization.
pub const SKIN: Rgb<u8> = Rgb([220, 170, 140]);
/// Blue-gray backdrop outside the skin range.
pub const BACKGROUND: Rgb<u8> = Rgb([60, 90, 140]);
pub const MID_GRAY: Rgb<u8> = Rgb([128, 128, 128]);

pub fn uniform_image(width: u32, height: u32, color: Rgb<u8>) -> RgbImage {
    RgbImage::from_pixel(width, height, color)
}

/// `BACKGROUND` frame with `SKIN` rectangles given as `(x, y, width, height)`.
pub fn skin_rects_image(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let inside = rects
            .iter()
            .any(|&(rx, ry, rw, rh)| x >= rx && x < rx + rw && y >= ry && y < ry + rh);
        if inside { SKIN } else { BACKGROUND }
    })
}

/// A single skin rectangle covering about 40% of a 300x300 frame with a
/// height/width ratio of 1.2.
pub fn skin_hand_image() -> RgbImage {
    skin_rects_image(300, 300, &[(65, 48, 170, 204)])
}

/// Light-gray 180x250 plate ruled with a dark 20px grid on a dark-blue
/// 400x400 backdrop: a rigid, jointed-looking panel with no skin tones.
pub fn grid_plate_image() -> RgbImage {
    const BACKDROP: Rgb<u8> = Rgb([20, 30, 90]);
    const PLATE: Rgb<u8> = Rgb([200, 200, 200]);
    const RULE: Rgb<u8> = Rgb([40, 40, 40]);
    let (left, top, width, height) = (110, 75, 180, 250);

    RgbImage::from_fn(400, 400, |x, y| {
        if x < left || x >= left + width || y < top || y >= top + height {
            return BACKDROP;
        }
        let on_rule = |offset: u32| offset % 20 >= 10 && offset % 20 < 12;
        if on_rule(x - left) || on_rule(y - top) { RULE } else { PLATE }
    })
}

/// Deterministic high-entropy image that compresses poorly.
pub fn noise_image(width: u32, height: u32) -> RgbImage {
    let mut state = 0x2545_f491u32;
    RgbImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [r, g, b, _] = state.to_le_bytes();
        Rgb([r, g, b])
    })
}

pub fn encode(image: RgbImage, format: ImageFormat) -> Vec<u8> {
    let image = match format {
        ImageFormat::Gif => DynamicImage::ImageRgba8(DynamicImage::ImageRgb8(image).to_rgba8()),
        _ => DynamicImage::ImageRgb8(image),
    };
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, format)
        .expect("Failed to encode test image");
    out.into_inner()
}

pub fn png_bytes(image: RgbImage) -> Vec<u8> {
    encode(image, ImageFormat::Png)
}

pub fn jpeg_bytes(image: RgbImage) -> Vec<u8> {
    encode(image, ImageFormat::Jpeg)
}

/// Valid JPEG padded with trailing bytes to `total_len`.
pub fn padded_jpeg(total_len: usize) -> Vec<u8> {
    let mut bytes = jpeg_bytes(uniform_image(200, 200, MID_GRAY));
    bytes.resize(total_len, 0);
    bytes
}

/// PNG cut off halfway through its pixel data; the header still parses.
pub fn truncated_png() -> Vec<u8> {
    let mut bytes = png_bytes(noise_image(200, 200));
    bytes.truncate(bytes.len() / 2);
    bytes
}

/// Bytes that do not start with any known image signature.
pub fn junk_bytes(len: usize) -> Vec<u8> {
    let mut state = 0x9e37_79b9u32;
    let mut bytes = vec![0x13, 0x37];
    while bytes.len() < len {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        bytes.push((state >> 24) as u8);
    }
    bytes
}

/// Detector that reports every detected hand instead of rejecting weak
/// (natural-looking) ones.
pub fn detector_without_rejection() -> bionic_scan::BionicHandDetector {
    let config = bionic_scan::DetectorConfig {
        thresholds: ConfidenceThresholds {
            rejection: 0.0,
            ..ConfidenceThresholds::default()
        },
        ..bionic_scan::DetectorConfig::default()
    };
    bionic_scan::BionicHandDetector::new().with_config(config)
}

pub fn to_json(result: &bionic_scan::AnalysisResult) -> serde_json::Value {
    serde_json::to_value(result).expect("Failed to serialize result")
}
