//! Integration tests for input acceptance.
//!
//! Tests cover:
//! - Resolution bounds in both directions
//! - Container format allowlist
//! - Payload size limit and corrupted payloads
//! - Base64 and data URL inputs, including line-wrapped payloads

mod common;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bionic_scan::validation::ImageValidator;
use bionic_scan::{ImageLimits, ValidationError, analyze_bionic_hand_image};
use image::ImageFormat;

use common::*;

fn validate(bytes: Vec<u8>) -> Result<(), ValidationError> {
    ImageValidator::new(ImageLimits::default())
        .validate(bytes.into(), None)
        .map(|_| ())
}

#[test]
fn test_out_of_range_resolutions_are_rejected() {
    let too_small = [(99, 150), (150, 99), (50, 50)];
    for (width, height) in too_small {
        let bytes = png_bytes(uniform_image(width, height, MID_GRAY));
        assert_eq!(
            validate(bytes),
            Err(ValidationError::FileTooSmall),
            "{width}x{height}"
        );
    }

    let too_large = [(4001, 120), (120, 4001)];
    for (width, height) in too_large {
        let bytes = png_bytes(uniform_image(width, height, MID_GRAY));
        assert_eq!(
            validate(bytes),
            Err(ValidationError::FileTooLargeRes),
            "{width}x{height}"
        );
    }
}

#[test]
fn test_boundary_resolutions_are_accepted() {
    for (width, height) in [(100, 100), (4000, 100), (100, 4000)] {
        let bytes = png_bytes(uniform_image(width, height, MID_GRAY));
        assert_eq!(validate(bytes), Ok(()), "{width}x{height}");
    }
}

#[test]
fn test_every_allowed_format_is_accepted() {
    for format in [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Bmp, ImageFormat::Tiff] {
        let bytes = encode(uniform_image(120, 120, SKIN), format);
        assert_eq!(validate(bytes), Ok(()), "{format:?}");
    }
}

#[test]
fn test_gif_and_webp_are_invalid_formats() {
    for format in [ImageFormat::Gif, ImageFormat::WebP] {
        let bytes = encode(uniform_image(120, 120, SKIN), format);
        assert_eq!(
            validate(bytes),
            Err(ValidationError::InvalidFormat),
            "{format:?}"
        );
    }
}

#[test]
fn test_small_image_reports_fixed_message() -> anyhow::Result<()> {
    let result = analyze_bionic_hand_image(png_bytes(uniform_image(50, 50, MID_GRAY)), None);
    let json = to_json(&result);

    assert_eq!(json["status"], "error");
    assert_eq!(json["error_type"], "validation_error");
    assert_eq!(
        json["message"],
        "Image resolution too low. Minimum size: 100x100 pixels."
    );
    Ok(())
}

#[test]
fn test_oversized_jpeg_is_rejected_before_decoding() {
    let result = analyze_bionic_hand_image(padded_jpeg(11 * 1024 * 1024), Some("big.jpg"));
    let json = to_json(&result);

    assert_eq!(json["status"], "error");
    assert_eq!(json["error_type"], "validation_error");
    assert_eq!(json["message"], "File size exceeds 10MB limit.");
}

#[test]
fn test_random_bytes_are_corrupted() {
    let result = analyze_bionic_hand_image(junk_bytes(4096), Some("noise.bin"));
    let json = to_json(&result);

    assert_eq!(json["status"], "error");
    assert_eq!(json["error_type"], "validation_error");
    assert_eq!(
        json["message"],
        "Image file appears to be corrupted or unreadable."
    );
}

#[test]
fn test_truncated_png_is_corrupted() {
    assert_eq!(validate(truncated_png()), Err(ValidationError::CorruptedImage));
}

#[test]
fn test_data_url_reaches_detection() {
    let encoded = STANDARD.encode(png_bytes(uniform_image(200, 200, MID_GRAY)));
    let result = analyze_bionic_hand_image(format!("data:image/png;base64,{encoded}"), None);
    let json = to_json(&result);

    // decoding succeeded; the flat frame then fails hand detection
    assert_eq!(json["error_type"], "detection_error");
}

#[test]
fn test_line_wrapped_data_url_reaches_detection() {
    let encoded = STANDARD.encode(png_bytes(uniform_image(200, 200, MID_GRAY)));
    let wrapped = encoded
        .as_bytes()
        .chunks(76)
        .map(|line| String::from_utf8_lossy(line).into_owned())
        .collect::<Vec<_>>()
        .join("\n");
    let result = analyze_bionic_hand_image(format!("data:image/png;base64,{wrapped}\n"), None);
    let json = to_json(&result);

    assert_eq!(json["error_type"], "detection_error");
}

#[test]
fn test_undecodable_base64_is_corrupted() {
    let result = analyze_bionic_hand_image(ImageInput::from("data:image/png;base64,@@@@"), None);
    let failure = result.failure_details().expect("expected a rejection");
    assert_eq!(failure.error_type, ErrorType::ValidationError);
    assert_eq!(
        failure.message,
        "Image file appears to be corrupted or unreadable."
    );
}
