use std::io::Cursor;

use anyhow::{Context, Result};
use image::{
    codecs::{
        gif::{GifDecoder, GifEncoder, Repeat},
        png::{CompressionType, FilterType as PngFilter, PngEncoder},
    },
    imageops::{self, FilterType},
    AnimationDecoder, DynamicImage, Frame, GenericImageView, ImageFormat, ImageReader,
};

use super::{ImageFormatKind, UploadError};

/// NeuQuant sampling factor for GIF re-encoding (1 = slowest, 30 = fastest).
const GIF_ENCODE_SPEED: i32 = 10;

/// Resize and re-encode parameters for one upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    pub max_width: u32,
    pub max_height: u32,
    /// 1-100, used by the JPEG and WebP encoders.
    pub quality: u8,
    /// 0-9, used by the PNG encoder.
    pub png_compression_level: u8,
}

impl Default for TransformOptions {
    fn default() -> Self {
        TransformOptions {
            max_width: 1920,
            max_height: 1080,
            quality: 85,
            png_compression_level: 6,
        }
    }
}

#[derive(Debug)]
pub struct TransformedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub resized: bool,
}

/// Downscales an accepted image to fit the configured box and re-encodes it
/// once, in its own format.
pub fn transform(
    bytes: &[u8],
    kind: ImageFormatKind,
    options: &TransformOptions,
) -> Result<TransformedImage, UploadError> {
    if kind == ImageFormatKind::Gif {
        return transform_gif(bytes, options);
    }

    let img = image::load_from_memory_with_format(bytes, kind.image_format())
        .map_err(|e| UploadError::Undecodable(e.to_string()))?;

    let (width, height) = img.dimensions();
    let (target_width, target_height) =
        fit_within(width, height, options.max_width, options.max_height);

    let resized = (target_width, target_height) != (width, height);
    let img = if resized {
        img.resize_exact(target_width, target_height, FilterType::Lanczos3)
    } else {
        img
    };

    let encoded = match kind {
        ImageFormatKind::Jpeg => encode_jpeg(&img, options.quality),
        ImageFormatKind::Png => encode_png(&img, options.png_compression_level),
        ImageFormatKind::Webp => Ok(encode_webp(&img, options.quality)),
        ImageFormatKind::Gif => encode_gif([Frame::new(img.to_rgba8())]),
    }
    .map_err(|e| UploadError::Internal(format!("Image encoding failed: {e:#}")))?;

    tracing::debug!(
        format = kind.mime_type(),
        original_width = width,
        original_height = height,
        width = target_width,
        height = target_height,
        original_bytes = bytes.len(),
        encoded_bytes = encoded.len(),
        "Image transformed"
    );

    Ok(TransformedImage {
        bytes: encoded,
        width: target_width,
        height: target_height,
        resized,
    })
}

/// GIFs that already fit are stored byte for byte. Larger ones are resized
/// frame by frame, keeping each frame's delay.
fn transform_gif(bytes: &[u8], options: &TransformOptions) -> Result<TransformedImage, UploadError> {
    let (width, height) = ImageReader::with_format(Cursor::new(bytes), ImageFormat::Gif)
        .into_dimensions()
        .map_err(|e| UploadError::Undecodable(e.to_string()))?;

    let (target_width, target_height) =
        fit_within(width, height, options.max_width, options.max_height);

    if (target_width, target_height) == (width, height) {
        return Ok(TransformedImage {
            bytes: bytes.to_vec(),
            width,
            height,
            resized: false,
        });
    }

    let frames = GifDecoder::new(Cursor::new(bytes))
        .and_then(|decoder| decoder.into_frames().collect_frames())
        .map_err(|e| UploadError::Undecodable(e.to_string()))?;
    let frame_count = frames.len();

    let resized_frames = frames.into_iter().map(|frame| {
        let delay = frame.delay();
        let buffer = imageops::resize(frame.buffer(), target_width, target_height, FilterType::Lanczos3);
        Frame::from_parts(buffer, 0, 0, delay)
    });

    let encoded = encode_gif(resized_frames)
        .map_err(|e| UploadError::Internal(format!("Image encoding failed: {e:#}")))?;

    tracing::debug!(
        format = ImageFormatKind::Gif.mime_type(),
        frames = frame_count,
        original_width = width,
        original_height = height,
        width = target_width,
        height = target_height,
        original_bytes = bytes.len(),
        encoded_bytes = encoded.len(),
        "Animated image transformed"
    );

    Ok(TransformedImage {
        bytes: encoded,
        width: target_width,
        height: target_height,
        resized: true,
    })
}

/// Largest size that fits inside `max_width` x `max_height` with the same
/// aspect ratio. Never upscales.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let scale = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );

    let new_width = ((width as f64 * scale).round() as u32).clamp(1, max_width);
    let new_height = ((height as f64 * scale).round() as u32).clamp(1, max_height);
    (new_width, new_height)
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
    comp.set_size(width as usize, height as usize);
    comp.set_quality(quality as f32);
    comp.set_optimize_coding(true);

    let mut comp = comp.start_compress(Vec::new()).context("start jpeg compression")?;
    comp.write_scanlines(&rgb).context("write jpeg scanlines")?;
    comp.finish().context("finish jpeg compression")
}

fn encode_png(img: &DynamicImage, compression_level: u8) -> Result<Vec<u8>> {
    let compression = match compression_level {
        0..=3 => CompressionType::Fast,
        4..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    };

    let mut buffer = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut buffer, compression, PngFilter::Adaptive);
    img.write_with_encoder(encoder).context("encode png")?;
    Ok(buffer)
}

fn encode_gif(frames: impl IntoIterator<Item = Frame>) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut buffer, GIF_ENCODE_SPEED);
        encoder.set_repeat(Repeat::Infinite).context("set gif repeat")?;
        encoder.encode_frames(frames).context("encode gif frames")?;
    }
    Ok(buffer)
}

fn encode_webp(img: &DynamicImage, quality: u8) -> Vec<u8> {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let encoder = webp::Encoder::from_rgba(&rgba, width, height);
    encoder.encode(quality as f32).to_vec()
}
