//! Virtual texture tile lookup and reconstruction.
//!
//! A virtual texture stores each mip as a sparse set of square tiles.
//! Tiles are addressed by the Morton code of their tile coordinates
//! and every layer of a tile is stored as its own entry in a chunk.
//! Each tile includes a border of extra pixels used for filtering that is
//! removed when compositing the final image.
mod reconstruct;
mod tiles;

pub use tiles::{TileMask, TileOffsetData, TileOffsetTable};

use crate::{div_round_up, raw::unorm_to_u8, DecodeError, Result};

/// How the data for a single layer of a chunk is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VirtualTextureCodec {
    Black,
    OpaqueBlack,
    White,
    Flat,
    /// Block data ready to decode.
    #[default]
    RawGpu,
    /// Zlib compressed block data.
    ZippedGpu,
    Crunch,
}

/// A linear RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LinearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl LinearColor {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Quantizes each channel to 8 bits without any sRGB conversion.
    pub fn to_bgra8(self) -> [u8; 4] {
        [
            unorm_to_u8(self.b),
            unorm_to_u8(self.g),
            unorm_to_u8(self.r),
            unorm_to_u8(self.a),
        ]
    }
}

/// A single layer of a virtual texture like base color or normals.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VtLayer {
    /// The engine pixel format value of the layer's tiles.
    pub format: u32,
    /// The color to use for regions without any tiles.
    pub fallback_color: Option<LinearColor>,
}

/// A chunk of tile data with one codec per layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VtChunk {
    pub codecs: Vec<VirtualTextureCodec>,
    pub data: Vec<u8>,
}

/// The cooked data for a virtual texture.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VirtualTexture {
    /// The width of mip 0 in pixels.
    pub width: u32,
    /// The height of mip 0 in pixels.
    pub height: u32,
    pub num_mips: u32,
    /// The width and height of a tile in pixels without borders.
    pub tile_size: u32,
    /// The number of border pixels on each side of a tile.
    pub tile_border_size: u32,
    pub layers: Vec<VtLayer>,
    pub tile_offsets: TileOffsetTable,
    /// The index of the first tile of each mip with a final entry for the end of the last mip.
    pub tile_index_per_mip: Vec<u32>,
    /// The index of the first tile of each chunk with a final entry for the end of the last chunk.
    pub tile_index_per_chunk: Vec<u32>,
    /// The byte offset of each tile in its chunk.
    pub tile_offset_in_chunk: Vec<u32>,
    pub chunks: Vec<VtChunk>,
}

/// The canvas and addressing information for a single mip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MipGeometry {
    pub width_in_tiles: u32,
    pub height_in_tiles: u32,
    /// One past the largest tile address to check for this mip.
    pub max_address: u32,
    /// The width of the reconstructed image in pixels.
    pub width: u32,
    /// The height of the reconstructed image in pixels.
    pub height: u32,
}

/// The location of the stored data for one layer of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLocation {
    pub chunk_index: usize,
    /// The byte offset of the tile in the chunk data.
    pub offset: usize,
    /// The stored size in bytes, which may be compressed.
    pub length: usize,
}

fn ceil_log2(x: u32) -> u32 {
    if x <= 1 {
        0
    } else {
        32 - (x - 1).leading_zeros()
    }
}

impl VirtualTexture {
    /// Returns `true` if the texture has enough data to decode any tiles.
    pub fn is_initialized(&self) -> bool {
        !self.chunks.is_empty() && !self.layers.is_empty() && self.tile_size > 0
    }

    pub fn num_layers(&self) -> u32 {
        self.layers.len() as u32
    }

    /// The stored tile size in pixels including the border on both sides.
    pub fn physical_tile_size(&self) -> u32 {
        self.tile_size + 2 * self.tile_border_size
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self.tile_offsets, TileOffsetTable::Legacy)
    }

    /// The width of mip 0 in tiles.
    pub fn width_in_tiles(&self) -> u32 {
        div_round_up(self.width as usize, self.tile_size.max(1) as usize) as u32
    }

    /// The height of mip 0 in tiles.
    pub fn height_in_tiles(&self) -> u32 {
        div_round_up(self.height as usize, self.tile_size.max(1) as usize) as u32
    }

    /// Calculates the addressing range and image dimensions for `level`.
    pub fn mip_geometry(&self, level: u32) -> Result<MipGeometry> {
        let (width_in_tiles, height_in_tiles, max_address) = match &self.tile_offsets {
            TileOffsetTable::Legacy => {
                if level >= self.num_mips {
                    return Err(DecodeError::MissingMip);
                }
                let start = self.mip_tile_index(level)?;
                let end = self.mip_tile_index((level + 1).min(self.num_mips))?;
                (
                    self.width_in_tiles(),
                    self.height_in_tiles(),
                    end.saturating_sub(start).max(1),
                )
            }
            TileOffsetTable::Modern(mips) => {
                let mip = mips.get(level as usize).ok_or(DecodeError::MissingMip)?;
                (mip.width, mip.height, mip.max_address)
            }
        };

        let mut width = width_in_tiles.saturating_mul(self.tile_size);
        let mut height = height_in_tiles.saturating_mul(self.tile_size);

        // Legacy dimensions are always for mip 0.
        // Modern mips smaller than a tile still report a single tile.
        let max_level = ceil_log2(width_in_tiles.max(height_in_tiles));
        if max_level == 0 || self.is_legacy() {
            let shift = match &self.tile_offsets {
                TileOffsetTable::Legacy => level,
                TileOffsetTable::Modern(mips) => {
                    let base_level = mips
                        .first()
                        .map(|m| ceil_log2(m.width.max(m.height)))
                        .unwrap_or_default();
                    level.saturating_sub(base_level)
                }
            };
            width = width.checked_shr(shift).unwrap_or(0);
            height = height.checked_shr(shift).unwrap_or(0);
        }

        Ok(MipGeometry {
            width_in_tiles,
            height_in_tiles,
            max_address,
            width,
            height,
        })
    }

    fn mip_tile_index(&self, level: u32) -> Result<u32> {
        self.tile_index_per_mip
            .get(level as usize)
            .copied()
            .ok_or(DecodeError::MissingMip)
    }

    /// The index of the first layer of the tile at `address` in the flat list of stored tiles.
    pub fn tile_index(&self, level: u32, address: u32) -> Option<u32> {
        let base = *self.tile_index_per_mip.get(level as usize)?;
        match &self.tile_offsets {
            TileOffsetTable::Legacy => {
                let index = address
                    .checked_mul(self.num_layers())?
                    .checked_add(base)?;
                let next = *self.tile_index_per_mip.get(level as usize + 1)?;
                (index < next).then_some(index)
            }
            TileOffsetTable::Modern(mips) => {
                let offset = mips.get(level as usize)?.tile_offset(address)?;
                offset.checked_mul(self.num_layers())?.checked_add(base)
            }
        }
    }

    /// Returns `true` if the tile at `address` has stored data.
    pub fn is_valid_address(&self, level: u32, address: u32) -> bool {
        match &self.tile_offsets {
            TileOffsetTable::Legacy => self
                .tile_index(level, address)
                .and_then(|i| self.tile_offset_in_chunk.get(i as usize))
                .map_or(false, |offset| *offset != u32::MAX),
            TileOffsetTable::Modern(mips) => mips
                .get(level as usize)
                .and_then(|m| m.tile_offset(address))
                .is_some(),
        }
    }

    /// Builds the set of addresses with stored data for `level`.
    pub fn tile_mask(&self, level: u32) -> Result<TileMask> {
        let geometry = self.mip_geometry(level)?;
        let mut mask = TileMask::new(geometry.max_address);
        for address in 0..geometry.max_address {
            if self.is_valid_address(level, address) {
                mask.insert(address);
            }
        }
        Ok(mask)
    }

    /// Finds the chunk and byte range for `layer` of the tile at `address`.
    pub fn tile_location(&self, level: u32, address: u32, layer: u32) -> Option<TileLocation> {
        let tile_index = self.tile_index(level, address)?.checked_add(layer)?;

        let chunk_index = self
            .tile_index_per_chunk
            .partition_point(|i| *i <= tile_index)
            .checked_sub(1)?;
        let chunk = self.chunks.get(chunk_index)?;

        let chunk_end = self
            .tile_index_per_chunk
            .get(chunk_index + 1)
            .copied()
            .unwrap_or(u32::MAX)
            .min(self.tile_offset_in_chunk.len() as u32);
        if tile_index >= chunk_end {
            return None;
        }

        let offset = *self.tile_offset_in_chunk.get(tile_index as usize)?;
        if offset == u32::MAX {
            return None;
        }

        // The tile ends at the next stored tile in the same chunk or the end of the chunk.
        let end = self.tile_offset_in_chunk[tile_index as usize + 1..chunk_end as usize]
            .iter()
            .find(|o| **o != u32::MAX)
            .map(|o| *o as usize)
            .unwrap_or(chunk.data.len());

        Some(TileLocation {
            chunk_index,
            offset: offset as usize,
            length: end.saturating_sub(offset as usize),
        })
    }
}
