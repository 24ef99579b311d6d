//! PNG encoding for rendered frames.
//!
//! Frames with at most 256 distinct colors are written as indexed PNG
//! (color type 3, with a tRNS chunk when any entry is translucent). Anything
//! richer falls back to 8-bit RGBA (color type 6).

use std::collections::HashMap;
use std::io::Write;

use tiny_skia::Pixmap;

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];
const MAX_PALETTE_SIZE: usize = 256;

/// Color type written to IHDR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PngColorType {
    Indexed = 3,
    Rgba = 6,
}

/// Encode a rasterized canvas. Pixels are demultiplied first.
pub fn encode_pixmap(pixmap: &Pixmap) -> Result<Vec<u8>, String> {
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    encode_rgba(&rgba, pixmap.width(), pixmap.height())
}

/// Encode straight RGBA pixels, picking the smallest color type that fits.
pub fn encode_rgba(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, String> {
    let expected = width as usize * height as usize * 4;
    if pixels.len() != expected {
        return Err(format!(
            "expected {} bytes for {}x{} RGBA, got {}",
            expected,
            width,
            height,
            pixels.len()
        ));
    }

    match extract_palette(pixels) {
        Some((palette, indices)) => encode_indexed(width, height, &palette, &indices),
        None => encode_truecolor(pixels, width, height),
    }
}

/// Color type `encode_rgba` would choose for these pixels.
pub fn preferred_color_type(pixels: &[u8]) -> PngColorType {
    if extract_palette(pixels).is_some() {
        PngColorType::Indexed
    } else {
        PngColorType::Rgba
    }
}

fn extract_palette(pixels: &[u8]) -> Option<(Vec<[u8; 4]>, Vec<u8>)> {
    let mut lookup: HashMap<[u8; 4], u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices = Vec::with_capacity(pixels.len() / 4);

    for px in pixels.chunks_exact(4) {
        let key = [px[0], px[1], px[2], px[3]];
        let index = match lookup.get(&key) {
            Some(&i) => i,
            None => {
                if palette.len() == MAX_PALETTE_SIZE {
                    return None;
                }
                let i = palette.len() as u8;
                palette.push(key);
                lookup.insert(key, i);
                i
            }
        };
        indices.push(index);
    }

    Some((palette, indices))
}

fn encode_indexed(width: u32, height: u32, palette: &[[u8; 4]], indices: &[u8]) -> Result<Vec<u8>, String> {
    let mut png = SIGNATURE.to_vec();
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, PngColorType::Indexed));

    let plte: Vec<u8> = palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    if palette.iter().any(|c| c[3] < 255) {
        let trns: Vec<u8> = palette.iter().map(|c| c[3]).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    write_chunk(&mut png, b"IDAT", &deflate_scanlines(indices, width as usize, height as usize)?);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn encode_truecolor(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, String> {
    let mut png = SIGNATURE.to_vec();
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, PngColorType::Rgba));
    write_chunk(&mut png, b"IDAT", &deflate_scanlines(pixels, width as usize * 4, height as usize)?);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn ihdr(width: u32, height: u32, color_type: PngColorType) -> [u8; 13] {
    let mut data = [0u8; 13];
    data[0..4].copy_from_slice(&width.to_be_bytes());
    data[4..8].copy_from_slice(&height.to_be_bytes());
    data[8] = 8; // bit depth
    data[9] = color_type as u8;
    // compression, filter and interlace methods stay 0
    data
}

/// Zlib-compress rows of `row_bytes`, each prefixed with filter type 0.
fn deflate_scanlines(data: &[u8], row_bytes: usize, rows: usize) -> Result<Vec<u8>, String> {
    let mut raw = Vec::with_capacity(rows * (row_bytes + 1));
    for row in data.chunks_exact(row_bytes).take(rows) {
        raw.push(0);
        raw.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder
        .write_all(&raw)
        .and_then(|_| encoder.finish())
        .map_err(|e| format!("IDAT compression failed: {}", e))
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}
