use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::{Mask, close, grayscale_close, open};

/// HSV pixels stored in an RGB container: H in 0..180, S and V in 0..=255.
pub type HsvImage = RgbImage;

/// Sigma of a 5x5 Gaussian kernel with automatic sigma.
pub const BLUR_SIGMA_5X5: f32 = 1.1;
/// Sigma of a 3x3 Gaussian kernel with automatic sigma.
pub const BLUR_SIGMA_3X3: f32 = 0.8;

/// Convert image to grayscale
pub fn to_grayscale(img: &RgbImage) -> GrayImage {
    image::imageops::grayscale(img)
}

/// Apply Gaussian blur to reduce noise
pub fn apply_blur(img: &GrayImage, sigma: f32) -> GrayImage {
    gaussian_blur_f32(img, sigma)
}

/// Detect edges using Canny edge detector
pub fn detect_edges(img: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    canny(img, low_threshold, high_threshold)
}

/// Binarize against a Gaussian-weighted local mean: a pixel becomes white when
/// it is brighter than `mean - c`.
pub fn adaptive_threshold(img: &GrayImage, sigma: f32, c: f32) -> GrayImage {
    let local_mean = gaussian_blur_f32(img, sigma);
    let mut out = GrayImage::new(img.width(), img.height());
    for (x, y, pixel) in img.enumerate_pixels() {
        let threshold = local_mean.get_pixel(x, y)[0] as f32 - c;
        let value = if pixel[0] as f32 > threshold { 255 } else { 0 };
        out.put_pixel(x, y, Luma([value]));
    }
    out
}

/// Convert one RGB pixel to 8-bit HSV.
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(|c| c as f32);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v > 0.0 { diff / v * 255.0 } else { 0.0 };

    let mut h = if diff == 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / diff
    } else if v == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }

    [
        ((h / 2.0).round() as u32 % 180) as u8,
        s.round().min(255.0) as u8,
        v as u8,
    ]
}

pub fn to_hsv(img: &RgbImage) -> HsvImage {
    let mut out = RgbImage::new(img.width(), img.height());
    for (x, y, pixel) in img.enumerate_pixels() {
        out.put_pixel(x, y, Rgb(rgb_to_hsv(pixel.0)));
    }
    out
}

/// Mask of pixels whose every channel lies within the inclusive bounds.
pub fn in_range(img: &HsvImage, lower: [u8; 3], upper: [u8; 3]) -> GrayImage {
    let mut mask = GrayImage::new(img.width(), img.height());
    for (x, y, pixel) in img.enumerate_pixels() {
        let inside = (0..3).all(|i| pixel[i] >= lower[i] && pixel[i] <= upper[i]);
        if inside {
            mask.put_pixel(x, y, Luma([255]));
        }
    }
    mask
}

/// Morphological open followed by close, removing specks then filling pinholes.
pub fn denoise_mask(mask: &GrayImage, radius: u8) -> GrayImage {
    let opened = open(mask, Norm::LInf, radius);
    close(&opened, Norm::LInf, radius)
}

/// Morphological close along rows only, bridging horizontal gaps of up to
/// `2 * radius` pixels while leaving vertical gaps open.
pub fn close_horizontal(mask: &GrayImage, radius: u8) -> GrayImage {
    let row = GrayImage::from_pixel(2 * radius as u32 + 1, 1, Luma([255]));
    grayscale_close(mask, &Mask::from_image(&row, radius, 0))
}

/// Fraction of pixels that are nonzero.
pub fn nonzero_fraction(img: &GrayImage) -> f32 {
    let total = img.width() as usize * img.height() as usize;
    if total == 0 {
        return 0.0;
    }
    img.pixels().filter(|p| p[0] > 0).count() as f32 / total as f32
}

/// Stretch every channel away from the mean gray level by `factor`.
pub fn enhance_contrast(img: &RgbImage, factor: f32) -> RgbImage {
    let gray = to_grayscale(img);
    let total = gray.width() as u64 * gray.height() as u64;
    if total == 0 {
        return img.clone();
    }
    let sum: u64 = gray.pixels().map(|p| p[0] as u64).sum();
    let mean = (sum as f32 / total as f32 + 0.5).floor();

    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        for c in pixel.0.iter_mut() {
            *c = blend(mean, *c as f32, factor);
        }
    }
    out
}

/// Push every pixel away from its 3x3 smoothed value by `factor`.
/// Border pixels are copied unchanged.
pub fn enhance_sharpness(img: &RgbImage, factor: f32) -> RgbImage {
    let (width, height) = img.dimensions();
    let mut sharpened = img.clone();
    if width < 3 || height < 3 {
        return sharpened;
    }

    // Smoothing kernel: center weight 5, neighbors 1, normalized by 13
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut out = [0u8; 3];
            for (c, slot) in out.iter_mut().enumerate() {
                let mut acc = 0.0f32;
                for dy in 0..3 {
                    for dx in 0..3 {
                        let weight = if dx == 1 && dy == 1 { 5.0 } else { 1.0 };
                        acc += weight * img.get_pixel(x + dx - 1, y + dy - 1)[c] as f32;
                    }
                }
                let smoothed = (acc / 13.0).round();
                *slot = blend(smoothed, img.get_pixel(x, y)[c] as f32, factor);
            }
            sharpened.put_pixel(x, y, Rgb(out));
        }
    }

    sharpened
}

fn blend(base: f32, value: f32, factor: f32) -> u8 {
    (base + factor * (value - base)).round().clamp(0.0, 255.0) as u8
}
