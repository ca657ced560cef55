//! # texture_decode
//! texture_decode converts the GPU texture data found in cooked game packages
//! into linear BGRA8 pixels on the CPU.
//!
//! # Getting Started
//! Regular textures store each mipmap as a single block compressed surface.
//! The package parser hands over the raw bytes and dimensions for a mipmap.
/*!
```rust no_run
use texture_decode::{decode_mip, DecodeOptions, PixelFormat, Platform, TextureMip};
# fn main() -> Result<(), texture_decode::DecodeError> {
# let data = vec![0u8; 16];
let mip = TextureMip::new(256, 256, 1, data);
let options = DecodeOptions {
    platform: Platform::NintendoSwitch,
    ..Default::default()
};
let image = decode_mip(Some(&mip), PixelFormat::Bc7.into(), false, &options)?;
assert_eq!(image.data.len(), 256 * 256 * 4);
# Ok(())
# }
```
*/
//! # Virtual Textures
//! Virtual textures split each mipmap into square tiles stored in chunks.
//! Only the tiles that exist are decoded and composited into a single image.
//! See [vt::VirtualTexture::decode].
//!
//! # Pixel Layout
//! All decoded images use 4 bytes per pixel in B, G, R, A order without any row padding.
//! Compressed formats with dimensions that aren't a multiple of the block size
//! are cropped to the requested dimensions except for BC7, which decodes the padded surface.
mod decode;
mod deswizzle;
mod format;
mod morton;
mod normal;
mod raw;
mod texture;

pub mod vt;

pub use decode::decode_blocks;
pub use deswizzle::{deswizzle, Platform};
pub use format::{lookup, supported_info, PixelFormat, PixelFormatInfo};
pub use morton::{morton_code2, reverse_morton_code2, tile_address, tile_coordinates};
pub use normal::reconstruct_normal_z;
pub use texture::{decode_mip, decode_mip_layers, DecodeOptions, DecodedImage, Texture, TextureMip};

/// Errors than can occur while decoding a texture.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The requested mipmap is missing or has no data.
    #[error("The requested mipmap is missing or contains no data.")]
    MissingMip,

    /// The format value is not a known pixel format or is marked as unsupported.
    #[error("The pixel format {format} is not supported.")]
    UnsupportedFormat { format: u32 },

    /// The pixel format is known but has no decoder.
    #[error("No decoder is implemented for pixel format {0:?}.")]
    NotImplemented(PixelFormat),

    /// The source data does not contain enough bytes for the expected block grid.
    #[error("Not enough data. Expected {expected_size} bytes but found {actual_size} bytes.")]
    CorruptData {
        expected_size: usize,
        actual_size: usize,
    },

    /// The Tegra X1 block linear layout could not be untiled.
    #[error("Failed to deswizzle surface: {0}")]
    Deswizzle(#[from] tegra_swizzle::SwizzleError),

    /// A block decoder rejected the input.
    #[error("Failed to decode {format:?} data: {reason}")]
    Decoder { format: PixelFormat, reason: String },

    /// Compressed tile data could not be inflated.
    #[error("Failed to inflate tile data: {0}")]
    Inflate(#[from] std::io::Error),

    /// The tile does not resolve to a location in the chunk table.
    #[error("Tile address {address} in mip {level} does not resolve to any chunk.")]
    UnresolvedTile { level: u32, address: u32 },

    /// The tile location lies outside the chunk data.
    #[error("Tile data at offset {offset} with length {length} exceeds chunk {chunk_index} of {chunk_size} bytes.")]
    TileOutOfBounds {
        chunk_index: usize,
        offset: usize,
        length: usize,
        chunk_size: usize,
    },

    /// A single virtual texture tile failed to decode.
    #[error("Failed to decode tile {address} of layer {layer} in mip {level}: {source}")]
    TileDecode {
        level: u32,
        address: u32,
        layer: usize,
        #[source]
        source: Box<DecodeError>,
    },
}

pub type Result<T> = std::result::Result<T, DecodeError>;

/// Calculates the division of `x` by `d` but rounds up rather than truncating.
///
/// # Examples
/// Use this function when calculating dimensions for block compressed formats like BC7.
/**
```rust
# use texture_decode::div_round_up;
assert_eq!(2, div_round_up(8, 4));
assert_eq!(3, div_round_up(10, 4));
```
 */
#[inline]
pub const fn div_round_up(x: usize, d: usize) -> usize {
    (x + d - 1) / d
}

#[inline]
const fn round_up(x: usize, n: usize) -> usize {
    div_round_up(x, n) * n
}
