//! Conversions from uncompressed formats to BGRA8.
//!
//! Single channel formats write their value to red and leave green and blue at zero.
//! Float values are clamped to `[0,1]` before conversion.
use half::f16;

pub fn unorm_to_u8(value: f32) -> u8 {
    // NaN maps to 0.
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn map_pixels<const N: usize>(
    bytes: &[u8],
    pixel_count: usize,
    f: impl Fn([u8; N]) -> [u8; 4],
) -> Vec<u8> {
    let mut output = Vec::with_capacity(pixel_count * 4);
    for pixel in bytes.chunks_exact(N).take(pixel_count) {
        let mut value = [0u8; N];
        value.copy_from_slice(pixel);
        output.extend_from_slice(&f(value));
    }
    output
}

pub fn r8_to_bgra8(bytes: &[u8], pixel_count: usize) -> Vec<u8> {
    map_pixels(bytes, pixel_count, |[r]: [u8; 1]| [0, 0, r, 255])
}

pub fn r16_unorm_to_bgra8(bytes: &[u8], pixel_count: usize) -> Vec<u8> {
    map_pixels(bytes, pixel_count, |r: [u8; 2]| {
        [0, 0, (u16::from_le_bytes(r) >> 8) as u8, 255]
    })
}

pub fn bgra8_to_bgra8(bytes: &[u8], pixel_count: usize) -> Vec<u8> {
    bytes[..pixel_count * 4].to_vec()
}

pub fn rgba16_float_to_bgra8(bytes: &[u8], pixel_count: usize) -> Vec<u8> {
    map_pixels(bytes, pixel_count, |p: [u8; 8]| {
        let channel = |i: usize| unorm_to_u8(f16::from_le_bytes([p[i * 2], p[i * 2 + 1]]).to_f32());
        [channel(2), channel(1), channel(0), channel(3)]
    })
}

pub fn r11g11b10_float_to_bgra8(bytes: &[u8], pixel_count: usize) -> Vec<u8> {
    map_pixels(bytes, pixel_count, |p: [u8; 4]| {
        let packed = u32::from_le_bytes(p);
        let r = float11_to_f32(packed & 0x7ff);
        let g = float11_to_f32((packed >> 11) & 0x7ff);
        let b = float10_to_f32((packed >> 22) & 0x3ff);
        [unorm_to_u8(b), unorm_to_u8(g), unorm_to_u8(r), 255]
    })
}

// The small floats share the exponent bias of half floats.
// Widen the mantissa to 10 bits and reuse the half conversion.
fn float11_to_f32(value: u32) -> f32 {
    let exponent = (value >> 6) & 0x1f;
    let mantissa = value & 0x3f;
    f16::from_bits(((exponent << 10) | (mantissa << 4)) as u16).to_f32()
}

fn float10_to_f32(value: u32) -> f32 {
    let exponent = (value >> 5) & 0x1f;
    let mantissa = value & 0x1f;
    f16::from_bits(((exponent << 10) | (mantissa << 5)) as u16).to_f32()
}
