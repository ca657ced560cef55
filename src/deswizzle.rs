//! Conversion of console tiled layouts to linear block order.
use std::borrow::Cow;

use crate::{div_round_up, morton::tile_coordinates, DecodeError, PixelFormatInfo, Result};

/// The platform the texture data was cooked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum Platform {
    /// Desktop and mobile data is already in linear block order.
    #[default]
    DesktopMobile,
    /// Blocks are grouped into 8x8 block tiles with Morton order inside each tile.
    XboxAndPlaystation,
    /// Tegra X1 block linear layout.
    NintendoSwitch,
}

impl Platform {
    pub const fn is_tiled(self) -> bool {
        !matches!(self, Platform::DesktopMobile)
    }
}

// The size of an XBPS tile in blocks along each dimension.
const TILE_DIMENSION: usize = 8;

/// Reorders the blocks in `bytes` to linear row major order for a surface of
/// `width` x `height` x `depth` pixels.
///
/// Linear platforms return `bytes` unchanged.
/// Tiled platforms fail with [DecodeError::CorruptData] if `bytes` contains fewer
/// blocks than the surface dimensions require.
pub fn deswizzle<'a>(
    platform: Platform,
    bytes: &'a [u8],
    width: usize,
    height: usize,
    depth: usize,
    info: &PixelFormatInfo,
) -> Result<Cow<'a, [u8]>> {
    if !platform.is_tiled() {
        return Ok(Cow::Borrowed(bytes));
    }

    let block_bytes = info.block_bytes as usize;
    if block_bytes == 0 || info.block_size_x == 0 || info.block_size_y == 0 {
        return Err(DecodeError::UnsupportedFormat {
            format: info.format.into(),
        });
    }

    // Whole blocks only to match how the data was validated when cooked.
    let whole_blocks = (width / info.block_size_x as usize) * (height / info.block_size_y as usize);
    let total_blocks = bytes.len() / block_bytes;
    if whole_blocks > total_blocks {
        return Err(DecodeError::CorruptData {
            expected_size: whole_blocks * block_bytes,
            actual_size: bytes.len(),
        });
    }

    let blocks_x = div_round_up(width, info.block_size_x as usize);
    let blocks_y = div_round_up(height, info.block_size_y as usize);
    let depth = depth.max(1);

    match platform {
        Platform::DesktopMobile => Ok(Cow::Borrowed(bytes)),
        Platform::XboxAndPlaystation => Ok(Cow::Owned(deswizzle_tiles(
            bytes,
            blocks_x,
            blocks_y,
            depth,
            block_bytes,
        ))),
        Platform::NintendoSwitch => {
            let block_height = tegra_swizzle::block_height_mip0(blocks_y);
            let linear = tegra_swizzle::swizzle::deswizzle_block_linear(
                blocks_x,
                blocks_y,
                depth,
                bytes,
                block_height,
                block_bytes,
            )?;
            Ok(Cow::Owned(linear))
        }
    }
}

fn deswizzle_tiles(
    bytes: &[u8],
    blocks_x: usize,
    blocks_y: usize,
    depth: usize,
    block_bytes: usize,
) -> Vec<u8> {
    let tiles_x = div_round_up(blocks_x, TILE_DIMENSION);
    let tiles_y = div_round_up(blocks_y, TILE_DIMENSION);
    let tile_blocks = TILE_DIMENSION * TILE_DIMENSION;

    // Tiled layers are padded to whole tiles.
    let tiled_layer_size = tiles_x * tiles_y * tile_blocks * block_bytes;
    let linear_layer_size = blocks_x * blocks_y * block_bytes;

    // The depth is untrusted, so only layers with source data are allocated.
    let depth = depth.min((bytes.len() / tiled_layer_size.max(1)).max(1));

    // Blocks missing from the source are left zeroed.
    let mut output = vec![0u8; linear_layer_size * depth];

    for z in 0..depth {
        for tile_y in 0..tiles_y {
            for tile_x in 0..tiles_x {
                let tile_index = tile_y * tiles_x + tile_x;
                for i in 0..tile_blocks {
                    let (x, y) = tile_coordinates(i as u32);
                    let block_x = tile_x * TILE_DIMENSION + x as usize;
                    let block_y = tile_y * TILE_DIMENSION + y as usize;
                    if block_x >= blocks_x || block_y >= blocks_y {
                        continue;
                    }

                    let src = z * tiled_layer_size + (tile_index * tile_blocks + i) * block_bytes;
                    let dst = z * linear_layer_size + (block_y * blocks_x + block_x) * block_bytes;
                    if let Some(block) = bytes.get(src..src + block_bytes) {
                        output[dst..dst + block_bytes].copy_from_slice(block);
                    }
                }
            }
        }
    }

    output
}
