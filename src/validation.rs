//! Input decoding, acceptance checks and normalization.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, ImageReader, RgbImage};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::ImageLimits;
use crate::detection::preprocessing;
use crate::error::{AnalysisError, ValidationError};
use crate::models::{ImageFormat, ImageInfo};

/// Raw upload: either the file bytes or a base64 payload (bare or data URL).
#[derive(Debug, Clone)]
pub enum ImageInput {
    Bytes(Vec<u8>),
    Encoded(String),
}

impl ImageInput {
    /// Resolve the payload to file bytes.
    pub fn into_bytes(self) -> Result<Vec<u8>, ValidationError> {
        match self {
            Self::Bytes(bytes) => Ok(bytes),
            Self::Encoded(text) => {
                let text = text.trim();
                let payload = if text.starts_with("data:image/") {
                    text.split_once(',')
                        .map(|(_, data)| data)
                        .ok_or(ValidationError::CorruptedImage)?
                } else {
                    text
                };
                // MIME encoders wrap at 76 columns
                let payload: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
                STANDARD
                    .decode(payload)
                    .map_err(|_| ValidationError::CorruptedImage)
            }
        }
    }
}

impl From<Vec<u8>> for ImageInput {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for ImageInput {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<String> for ImageInput {
    fn from(text: String) -> Self {
        Self::Encoded(text)
    }
}

impl From<&str> for ImageInput {
    fn from(text: &str) -> Self {
        Self::Encoded(text.to_string())
    }
}

/// Decoded input together with its reported metadata.
#[derive(Debug, Clone)]
pub struct ValidatedImage {
    pub image: DynamicImage,
    pub info: ImageInfo,
}

pub struct ImageValidator {
    limits: ImageLimits,
}

impl ImageValidator {
    pub fn new(limits: ImageLimits) -> Self {
        Self { limits }
    }

    /// Decode and bounds-check an upload.
    ///
    /// Checks run in a fixed order: payload size, container format,
    /// minimum resolution, maximum resolution, then full decode.
    pub fn validate(
        &self,
        input: ImageInput,
        filename: Option<&str>,
    ) -> Result<ValidatedImage, ValidationError> {
        let bytes = input.into_bytes()?;
        debug!(filename = filename.unwrap_or("<unnamed>"), bytes = bytes.len(), "validating upload");

        if bytes.len() > self.limits.max_file_size {
            return Err(ValidationError::FileTooLarge {
                limit_mb: self.limits.max_file_size / (1024 * 1024),
            });
        }

        let reader = ImageReader::new(Cursor::new(bytes.as_slice()))
            .with_guessed_format()
            .map_err(|_| ValidationError::CorruptedImage)?;
        let container = reader.format().ok_or(ValidationError::CorruptedImage)?;
        let format = ImageFormat::from_container(container).ok_or(ValidationError::InvalidFormat)?;

        let (width, height) = reader
            .into_dimensions()
            .map_err(|_| ValidationError::CorruptedImage)?;

        if width < self.limits.min_dimension || height < self.limits.min_dimension {
            return Err(ValidationError::FileTooSmall);
        }
        if width > self.limits.max_dimension || height > self.limits.max_dimension {
            return Err(ValidationError::FileTooLargeRes);
        }

        let image = image::load_from_memory_with_format(&bytes, container)
            .map_err(|_| ValidationError::CorruptedImage)?;

        let info = ImageInfo {
            format,
            size: (width, height),
            mode: color_mode(image.color()),
            file_size_bytes: bytes.len(),
            hash: hex::encode(Sha256::digest(&bytes)),
        };

        debug!(?format, width, height, mode = %info.mode, "upload accepted");
        Ok(ValidatedImage { image, info })
    }

    /// Produce the working image: 3-channel RGB, longest side capped at the
    /// working size, then mildly contrast- and sharpness-enhanced.
    pub fn normalize(&self, image: &DynamicImage) -> Result<RgbImage, AnalysisError> {
        let mut rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(AnalysisError::Preprocessing);
        }

        let longest = width.max(height);
        if longest > self.limits.working_size {
            let ratio = self.limits.working_size as f32 / longest as f32;
            let new_width = (width as f32 * ratio) as u32;
            let new_height = (height as f32 * ratio) as u32;
            if new_width == 0 || new_height == 0 {
                return Err(AnalysisError::Preprocessing);
            }
            rgb = image::imageops::resize(&rgb, new_width, new_height, FilterType::Lanczos3);
        }

        let contrasted = preprocessing::enhance_contrast(&rgb, self.limits.contrast);
        Ok(preprocessing::enhance_sharpness(&contrasted, self.limits.sharpness))
    }
}

fn color_mode(color: ColorType) -> String {
    match color {
        ColorType::L8 => "L",
        ColorType::La8 => "LA",
        ColorType::Rgb8 => "RGB",
        ColorType::Rgba8 => "RGBA",
        ColorType::L16 => "I;16",
        ColorType::La16 => "LA;16",
        ColorType::Rgb16 => "RGB;16",
        ColorType::Rgba16 => "RGBA;16",
        ColorType::Rgb32F | ColorType::Rgba32F => "F",
        _ => "RGB",
    }
    .to_string()
}
