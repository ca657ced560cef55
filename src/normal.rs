/// Recomputes the blue channel of a two channel normal map in place.
///
/// X and Y are read from red and green and mapped from `[0,255]` to `[-1,1]`.
/// Blue is set to `sqrt(max(0, 1 - x^2 - y^2))` scaled from `[0,1]` to `[0,255]`.
/// Alpha is left unchanged. Only the first `width * height` pixels are modified.
pub fn reconstruct_normal_z(pixels: &mut [u8], width: usize, height: usize) {
    let pixel_count = (width * height).min(pixels.len() / 4);
    for pixel in pixels[..pixel_count * 4].chunks_exact_mut(4) {
        let x = pixel[2] as f32 / 255.0 * 2.0 - 1.0;
        let y = pixel[1] as f32 / 255.0 * 2.0 - 1.0;
        let z = (1.0 - x * x - y * y).max(0.0).sqrt();
        pixel[0] = (z * 255.0).round().min(255.0) as u8;
    }
}
