//! 2D Z-order curve helpers.
//!
//! Tiled layouts order blocks or tiles along a Morton curve,
//! where the even bits of an index hold X and the odd bits hold Y.

/// Compacts the even bits of `x` into the low 16 bits.
pub const fn reverse_morton_code2(x: u32) -> u32 {
    let mut x = x & 0x55555555;
    x = (x ^ (x >> 1)) & 0x33333333;
    x = (x ^ (x >> 2)) & 0x0f0f0f0f;
    x = (x ^ (x >> 4)) & 0x00ff00ff;
    x = (x ^ (x >> 8)) & 0x0000ffff;
    x
}

/// Spreads the low 16 bits of `x` into the even bits.
pub const fn morton_code2(x: u32) -> u32 {
    let mut x = x & 0x0000ffff;
    x = (x ^ (x << 8)) & 0x00ff00ff;
    x = (x ^ (x << 4)) & 0x0f0f0f0f;
    x = (x ^ (x << 2)) & 0x33333333;
    x = (x ^ (x << 1)) & 0x55555555;
    x
}

/// Decodes a linear tile index to its `(x, y)` tile coordinates.
pub const fn tile_coordinates(address: u32) -> (u32, u32) {
    (reverse_morton_code2(address), reverse_morton_code2(address >> 1))
}

/// Encodes `(x, y)` tile coordinates to a linear tile index.
pub const fn tile_address(x: u32, y: u32) -> u32 {
    morton_code2(x) | (morton_code2(y) << 1)
}
