use crate::{div_round_up, raw, DecodeError, PixelFormat, PixelFormatInfo, Result};

/// Decodes `width` x `height` pixels of linear block data to BGRA8.
///
/// The output always contains `width * height * 4` bytes.
/// Formats without a decoder return [DecodeError::NotImplemented].
/// Data smaller than the block grid returns [DecodeError::CorruptData] before any decoding.
pub fn decode_blocks(
    bytes: &[u8],
    width: usize,
    height: usize,
    info: &PixelFormatInfo,
) -> Result<Vec<u8>> {
    let format = info.format;
    if !format.is_decodable() {
        return Err(DecodeError::NotImplemented(format));
    }

    let expected_size = info.surface_size(width, height, 1);
    if bytes.len() < expected_size {
        return Err(DecodeError::CorruptData {
            expected_size,
            actual_size: bytes.len(),
        });
    }

    if width == 0 || height == 0 {
        return Ok(Vec::new());
    }

    let pixel_count = width * height;
    match format {
        PixelFormat::Dxt1 => decode_u32(format, pixel_count, |image| {
            texture2ddecoder::decode_bc1(bytes, width, height, image)
        }),
        PixelFormat::Dxt5 => decode_u32(format, pixel_count, |image| {
            texture2ddecoder::decode_bc3(bytes, width, height, image)
        }),
        PixelFormat::Bc4 => decode_u32(format, pixel_count, |image| {
            texture2ddecoder::decode_bc4(bytes, width, height, image)
        }),
        PixelFormat::Bc5 => decode_u32(format, pixel_count, |image| {
            texture2ddecoder::decode_bc5(bytes, width, height, image)
        }),
        PixelFormat::Bc6h => Ok(decode_bc6h(bytes, width, height)),
        PixelFormat::Bc7 => decode_u32(format, pixel_count, |image| {
            texture2ddecoder::decode_bc7(bytes, width, height, image)
        }),
        PixelFormat::Astc4x4
        | PixelFormat::Astc6x6
        | PixelFormat::Astc8x8
        | PixelFormat::Astc10x10
        | PixelFormat::Astc12x12 => decode_u32(format, pixel_count, |image| {
            texture2ddecoder::decode_astc(
                bytes,
                width,
                height,
                info.block_size_x as usize,
                info.block_size_y as usize,
                image,
            )
        }),
        PixelFormat::Etc1 => decode_u32(format, pixel_count, |image| {
            texture2ddecoder::decode_etc1(bytes, width, height, image)
        }),
        PixelFormat::Etc2Rgb => decode_u32(format, pixel_count, |image| {
            texture2ddecoder::decode_etc2_rgb(bytes, width, height, image)
        }),
        PixelFormat::Etc2Rgba => decode_u32(format, pixel_count, |image| {
            texture2ddecoder::decode_etc2_rgba8(bytes, width, height, image)
        }),
        PixelFormat::R8 | PixelFormat::A8 | PixelFormat::G8 => {
            Ok(raw::r8_to_bgra8(bytes, pixel_count))
        }
        // R16F is stored and converted as unorm16 like G16.
        PixelFormat::G16 | PixelFormat::R16F | PixelFormat::R16FFilter => {
            Ok(raw::r16_unorm_to_bgra8(bytes, pixel_count))
        }
        PixelFormat::B8G8R8A8 => Ok(raw::bgra8_to_bgra8(bytes, pixel_count)),
        PixelFormat::FloatRgb => Ok(raw::r11g11b10_float_to_bgra8(bytes, pixel_count)),
        PixelFormat::FloatRgba => Ok(raw::rgba16_float_to_bgra8(bytes, pixel_count)),
        _ => Err(DecodeError::NotImplemented(format)),
    }
}

// The block decoders write one u32 per pixel with blue in the lowest byte.
fn decode_u32<E: std::fmt::Debug>(
    format: PixelFormat,
    pixel_count: usize,
    decode: impl FnOnce(&mut [u32]) -> std::result::Result<(), E>,
) -> Result<Vec<u8>> {
    let mut image = vec![0u32; pixel_count];
    decode(&mut image).map_err(|e| DecodeError::Decoder {
        format,
        reason: format!("{:?}", e),
    })?;
    Ok(image.iter().flat_map(|pixel| pixel.to_le_bytes()).collect())
}

// Signed BC6H decoded to RGB floats and clamped to [0,1].
// Partial blocks at the edges are cropped.
fn decode_bc6h(bytes: &[u8], width: usize, height: usize) -> Vec<u8> {
    const PITCH: usize = 4 * 3;

    let blocks_x = div_round_up(width, 4);
    let mut output = vec![0u8; width * height * 4];
    let mut block_rgb = [0f32; 4 * 4 * 3];

    for (i, block) in bytes
        .chunks_exact(16)
        .take(blocks_x * div_round_up(height, 4))
        .enumerate()
    {
        bcdec_rs::bc6h_float(block, &mut block_rgb, PITCH, true);

        let (block_x, block_y) = (i % blocks_x, i / blocks_x);
        for y in 0..4 {
            let py = block_y * 4 + y;
            if py >= height {
                break;
            }
            for x in 0..4 {
                let px = block_x * 4 + x;
                if px >= width {
                    break;
                }
                let rgb = &block_rgb[y * PITCH + x * 3..y * PITCH + x * 3 + 3];
                let offset = (py * width + px) * 4;
                output[offset..offset + 4].copy_from_slice(&[
                    raw::unorm_to_u8(rgb[2]),
                    raw::unorm_to_u8(rgb[1]),
                    raw::unorm_to_u8(rgb[0]),
                    255,
                ]);
            }
        }
    }

    output
}
