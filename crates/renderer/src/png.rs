//! PNG encoding for RGBA bitmaps (color type 6, 8 bits per channel).

use std::io::Write;

use crate::error::{RenderError, Result};

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Create a PNG image from RGBA pixel data.
///
/// # Arguments
/// - `pixels`: RGBA pixel data (4 bytes per pixel), top row first
/// - `width`: Image width in pixels
/// - `height`: Image height in pixels
pub fn create_png(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    let too_large = || RenderError::ImageTooLarge { width, height };
    let expected = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(too_large)?;
    if pixels.len() != expected {
        return Err(RenderError::PixelBufferSize {
            width,
            height,
            expected,
            actual: pixels.len(),
        });
    }

    // PNG dimensions are 31-bit
    let png_dim = |n: usize| {
        u32::try_from(n)
            .ok()
            .filter(|n| *n <= i32::MAX as u32)
            .ok_or_else(too_large)
    };
    let (png_width, png_height) = (png_dim(width)?, png_dim(height)?);

    let mut png = Vec::new();
    png.extend_from_slice(&SIGNATURE);

    // IHDR chunk
    let mut ihdr_data = Vec::with_capacity(13);
    ihdr_data.extend_from_slice(&png_width.to_be_bytes());
    ihdr_data.extend_from_slice(&png_height.to_be_bytes());
    ihdr_data.push(8); // bit depth
    ihdr_data.push(6); // color type (RGBA)
    ihdr_data.push(0); // compression method
    ihdr_data.push(0); // filter method
    ihdr_data.push(0); // interlace method
    write_chunk(&mut png, b"IHDR", &ihdr_data);

    let idat_data = deflate_idat(pixels, width, height).map_err(RenderError::Compression)?;
    write_chunk(&mut png, b"IDAT", &idat_data);

    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Write a PNG chunk: length, type, data, CRC over type and data.
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Deflate scanlines, each prefixed with filter type 0.
fn deflate_idat(pixels: &[u8], width: usize, height: usize) -> std::io::Result<Vec<u8>> {
    let row_bytes = width * 4;
    let mut uncompressed = Vec::with_capacity(height * (1 + row_bytes));
    for y in 0..height {
        uncompressed.push(0);
        uncompressed.extend_from_slice(&pixels[y * row_bytes..(y + 1) * row_bytes]);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(&uncompressed)?;
    encoder.finish()
}
