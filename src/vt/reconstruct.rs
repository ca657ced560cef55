use std::io::Read;

use flate2::read::ZlibDecoder;
use rayon::prelude::*;
use tracing::{debug, warn};

use super::{MipGeometry, TileMask, VirtualTexture, VirtualTextureCodec};
use crate::{
    decode_blocks, div_round_up, morton::tile_coordinates, normal::reconstruct_normal_z,
    supported_info, DecodeError, DecodedImage, PixelFormatInfo, Result,
};

impl VirtualTexture {
    /// Reconstructs the image for mip `level` from every stored tile.
    ///
    /// Regions without tiles use the first layer fallback color.
    /// Layers are composited in order, so later layers overwrite earlier ones.
    /// Tiles that fail to decode are logged and skipped.
    pub fn decode(&self, level: u32, is_normal_map: bool) -> Result<DecodedImage> {
        let mask = self.tile_mask(level)?;
        self.decode_masked(level, &mask, is_normal_map)
    }

    /// Reconstructs the image for mip `level` using only the addresses in `mask`.
    pub fn decode_masked(
        &self,
        level: u32,
        mask: &TileMask,
        is_normal_map: bool,
    ) -> Result<DecodedImage> {
        let geometry = self.mip_geometry(level)?;
        let mut data = self.fallback_canvas(&geometry);

        let addresses: Vec<u32> = mask
            .iter()
            .filter(|a| *a < geometry.max_address)
            .collect();
        debug!(
            level,
            width = geometry.width,
            height = geometry.height,
            tiles = addresses.len(),
            layers = self.layers.len(),
            "reconstructing virtual texture mip"
        );

        for (layer, vt_layer) in self.layers.iter().enumerate() {
            // A layer format without a decoder would fail for every tile.
            let info = supported_info(vt_layer.format)?;
            if !info.format.is_decodable() {
                return Err(DecodeError::NotImplemented(info.format));
            }

            let tiles: Vec<_> = addresses
                .par_iter()
                .map_init(Vec::new, |scratch, &address| {
                    let tile = self.decode_tile(
                        level,
                        address,
                        layer as u32,
                        info,
                        is_normal_map,
                        scratch,
                    );
                    (address, tile)
                })
                .collect();

            for (address, tile) in tiles {
                match tile {
                    Ok(pixels) => self.composite(&mut data, &geometry, address, &pixels),
                    Err(e) => {
                        let error = DecodeError::TileDecode {
                            level,
                            address,
                            layer,
                            source: Box::new(e),
                        };
                        warn!(level, address, layer, "skipping tile: {}", error);
                    }
                }
            }
        }

        Ok(DecodedImage {
            width: geometry.width,
            height: geometry.height,
            data,
        })
    }

    fn fallback_canvas(&self, geometry: &MipGeometry) -> Vec<u8> {
        let pixel_count = geometry.width as usize * geometry.height as usize;
        match self.layers.iter().find_map(|l| l.fallback_color) {
            Some(color) => color.to_bgra8().repeat(pixel_count),
            None => vec![0u8; pixel_count * 4],
        }
    }

    /// Decodes a single layer of a tile and removes its border.
    fn decode_tile(
        &self,
        level: u32,
        address: u32,
        layer: u32,
        info: &PixelFormatInfo,
        is_normal_map: bool,
        scratch: &mut Vec<u8>,
    ) -> Result<Vec<u8>> {
        let location = self
            .tile_location(level, address, layer)
            .ok_or(DecodeError::UnresolvedTile { level, address })?;
        let chunk = &self.chunks[location.chunk_index];

        let physical = self.physical_tile_size() as usize;
        let packed_size = div_round_up(physical, info.block_size_x as usize)
            * div_round_up(physical, info.block_size_y as usize)
            * info.block_bytes as usize;

        let out_of_bounds = || DecodeError::TileOutOfBounds {
            chunk_index: location.chunk_index,
            offset: location.offset,
            length: location.length,
            chunk_size: chunk.data.len(),
        };

        scratch.clear();
        scratch.resize(packed_size, 0);

        let codec = chunk
            .codecs
            .get(layer as usize)
            .copied()
            .unwrap_or_default();
        match codec {
            VirtualTextureCodec::ZippedGpu => {
                let compressed = chunk
                    .data
                    .get(location.offset..location.offset + location.length)
                    .ok_or_else(out_of_bounds)?;
                ZlibDecoder::new(compressed).read_exact(scratch.as_mut_slice())?;
            }
            _ => {
                let stored = chunk
                    .data
                    .get(location.offset..location.offset + packed_size)
                    .ok_or_else(out_of_bounds)?;
                scratch.copy_from_slice(stored);
            }
        }

        let mut pixels = decode_blocks(scratch.as_slice(), physical, physical, info)?;
        if is_normal_map {
            reconstruct_normal_z(&mut pixels, physical, physical);
        }

        let border = self.tile_border_size as usize;
        let tile_size = self.tile_size as usize;
        if border == 0 {
            return Ok(pixels);
        }

        let mut cropped = Vec::with_capacity(tile_size * tile_size * 4);
        for y in 0..tile_size {
            let start = ((y + border) * physical + border) * 4;
            cropped.extend_from_slice(&pixels[start..start + tile_size * 4]);
        }
        Ok(cropped)
    }

    /// Copies the rows of a decoded tile to its position in the canvas.
    fn composite(&self, data: &mut [u8], geometry: &MipGeometry, address: u32, pixels: &[u8]) {
        let tile_size = self.tile_size as usize;
        let width = geometry.width as usize;
        let height = geometry.height as usize;

        let (tile_x, tile_y) = tile_coordinates(address);
        let x0 = tile_x as usize * tile_size;
        let y0 = tile_y as usize * tile_size;
        if x0 >= width || y0 >= height {
            return;
        }

        let copy_width = tile_size.min(width - x0);
        let copy_height = tile_size.min(height - y0);
        for y in 0..copy_height {
            let src = y * tile_size * 4;
            let dst = ((y0 + y) * width + x0) * 4;
            data[dst..dst + copy_width * 4].copy_from_slice(&pixels[src..src + copy_width * 4]);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::{write::ZlibEncoder, Compression};

    use super::*;
    use crate::{
        vt::{LinearColor, TileOffsetData, TileOffsetTable, VtChunk, VtLayer},
        PixelFormat,
    };

    const RED: [u8; 4] = [0, 0, 255, 255];

    fn solid_tile(pixel: [u8; 4], size: usize) -> Vec<u8> {
        pixel.repeat(size * size)
    }

    fn bgra_layer(fallback: Option<LinearColor>) -> VtLayer {
        VtLayer {
            format: PixelFormat::B8G8R8A8.into(),
            fallback_color: fallback,
        }
    }

    fn single_tile_vt(data: Vec<u8>, codec: VirtualTextureCodec) -> VirtualTexture {
        // A 2x2 tile mip with only the tile at address 0 present.
        VirtualTexture {
            width: 8,
            height: 8,
            num_mips: 1,
            tile_size: 4,
            tile_border_size: 0,
            layers: vec![bgra_layer(Some(LinearColor::new(0.0, 0.0, 1.0, 1.0)))],
            tile_offsets: TileOffsetTable::Legacy,
            tile_index_per_mip: vec![0, 4],
            tile_index_per_chunk: vec![0, 4],
            tile_offset_in_chunk: vec![0, u32::MAX, u32::MAX, u32::MAX],
            chunks: vec![VtChunk {
                codecs: vec![codec],
                data,
            }],
        }
    }

    fn pixel(image: &DecodedImage, x: usize, y: usize) -> [u8; 4] {
        let i = (y * image.width as usize + x) * 4;
        image.data[i..i + 4].try_into().unwrap()
    }

    #[test]
    fn single_tile_with_fallback() {
        let vt = single_tile_vt(solid_tile(RED, 4), VirtualTextureCodec::RawGpu);
        let image = vt.decode(0, false).unwrap();
        assert_eq!((8, 8), (image.width, image.height));
        assert_eq!(8 * 8 * 4, image.data.len());

        let blue = [255, 0, 0, 255];
        for y in 0..8 {
            for x in 0..8 {
                let expected = if x < 4 && y < 4 { RED } else { blue };
                assert_eq!(expected, pixel(&image, x, y), "({x}, {y})");
            }
        }
    }

    #[test]
    fn zipped_tile() {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&solid_tile(RED, 4)).unwrap();
        let compressed = encoder.finish().unwrap();

        let vt = single_tile_vt(compressed, VirtualTextureCodec::ZippedGpu);
        let image = vt.decode(0, false).unwrap();
        assert_eq!(RED, pixel(&image, 0, 0));
        assert_eq!(RED, pixel(&image, 3, 3));
    }

    #[test]
    fn corrupt_zipped_tile_is_skipped() {
        let vt = single_tile_vt(vec![0xFF; 16], VirtualTextureCodec::ZippedGpu);
        let image = vt.decode(0, false).unwrap();
        assert_eq!([255, 0, 0, 255], pixel(&image, 0, 0));
    }

    #[test]
    fn short_chunk_is_skipped() {
        let vt = single_tile_vt(vec![0xFF; 8], VirtualTextureCodec::RawGpu);
        let image = vt.decode(0, false).unwrap();
        assert_eq!([255, 0, 0, 255], pixel(&image, 0, 0));
    }

    #[test]
    fn masked_out_tile_keeps_fallback() {
        let vt = single_tile_vt(solid_tile(RED, 4), VirtualTextureCodec::RawGpu);
        let mask = TileMask::new(4);
        let image = vt.decode_masked(0, &mask, false).unwrap();
        assert!(image.data.chunks_exact(4).all(|p| p == [255, 0, 0, 255]));
    }

    #[test]
    fn no_fallback_is_transparent_black() {
        let mut vt = single_tile_vt(solid_tile(RED, 4), VirtualTextureCodec::RawGpu);
        vt.layers[0].fallback_color = None;
        let image = vt.decode(0, false).unwrap();
        assert_eq!(RED, pixel(&image, 0, 0));
        assert_eq!([0, 0, 0, 0], pixel(&image, 7, 7));
    }

    #[test]
    fn unsupported_layer_format() {
        let mut vt = single_tile_vt(solid_tile(RED, 4), VirtualTextureCodec::RawGpu);
        vt.layers[0].format = 200;
        assert!(matches!(
            vt.decode(0, false),
            Err(DecodeError::UnsupportedFormat { format: 200 })
        ));
    }

    #[test]
    fn layer_format_without_decoder() {
        let mut vt = single_tile_vt(solid_tile(RED, 4), VirtualTextureCodec::RawGpu);
        vt.layers[0].format = PixelFormat::Dxt3.into();
        assert!(matches!(
            vt.decode(0, false),
            Err(DecodeError::NotImplemented(PixelFormat::Dxt3))
        ));
    }

    #[test]
    fn legacy_mip_tiles_are_clipped() {
        // Mip 0 is 3x1 tiles of 4 pixels, so mip 1 is a 6x2 canvas.
        // Address 1 is at x 4 and is cut to 2x2. Address 2 is at y 4 and is not drawn.
        let green = [0, 255, 0, 255];
        let white = [255, 255, 255, 255];
        let data = [solid_tile(RED, 4), solid_tile(green, 4), solid_tile(white, 4)].concat();

        let vt = VirtualTexture {
            width: 12,
            height: 4,
            num_mips: 2,
            tile_size: 4,
            tile_border_size: 0,
            layers: vec![bgra_layer(None)],
            tile_offsets: TileOffsetTable::Legacy,
            tile_index_per_mip: vec![0, 4, 8],
            tile_index_per_chunk: vec![0, 8],
            tile_offset_in_chunk: vec![
                u32::MAX,
                u32::MAX,
                u32::MAX,
                u32::MAX,
                0,
                64,
                128,
                u32::MAX,
            ],
            chunks: vec![VtChunk {
                codecs: vec![VirtualTextureCodec::RawGpu],
                data,
            }],
        };

        let mask = vt.tile_mask(1).unwrap();
        assert_eq!(vec![0, 1, 2], mask.iter().collect::<Vec<_>>());

        let image = vt.decode(1, false).unwrap();
        assert_eq!((6, 2), (image.width, image.height));
        let row = [RED.repeat(4), green.repeat(2)].concat();
        assert_eq!(row.repeat(2), image.data);
    }

    #[test]
    fn border_is_cropped() {
        // A 2x2 tile with a 1 pixel border is stored as 4x4.
        let mut stored = solid_tile([0, 255, 0, 255], 4);
        for y in 1..3 {
            for x in 1..3 {
                let i = (y * 4 + x) * 4;
                stored[i..i + 4].copy_from_slice(&RED);
            }
        }

        let vt = VirtualTexture {
            width: 2,
            height: 2,
            num_mips: 1,
            tile_size: 2,
            tile_border_size: 1,
            layers: vec![bgra_layer(None)],
            tile_offsets: TileOffsetTable::Legacy,
            tile_index_per_mip: vec![0, 1],
            tile_index_per_chunk: vec![0, 1],
            tile_offset_in_chunk: vec![0],
            chunks: vec![VtChunk {
                codecs: vec![VirtualTextureCodec::RawGpu],
                data: stored,
            }],
        };
        let image = vt.decode(0, false).unwrap();
        assert_eq!((2, 2), (image.width, image.height));
        assert_eq!(RED.repeat(4), image.data);
    }

    #[test]
    fn modern_second_tile() {
        // A 2x1 tile mip with only the tile at address 1 present.
        let vt = VirtualTexture {
            width: 8,
            height: 4,
            num_mips: 1,
            tile_size: 4,
            tile_border_size: 0,
            layers: vec![bgra_layer(None)],
            tile_offsets: TileOffsetTable::Modern(vec![TileOffsetData {
                width: 2,
                height: 1,
                max_address: 2,
                addresses: vec![0, 1],
                offsets: vec![u32::MAX, 0],
            }]),
            tile_index_per_mip: vec![0, 1],
            tile_index_per_chunk: vec![0, 1],
            tile_offset_in_chunk: vec![0],
            chunks: vec![VtChunk {
                codecs: Vec::new(),
                data: solid_tile(RED, 4),
            }],
        };
        let image = vt.decode(0, false).unwrap();
        assert_eq!((8, 4), (image.width, image.height));
        assert_eq!([0, 0, 0, 0], pixel(&image, 3, 0));
        assert_eq!(RED, pixel(&image, 4, 0));
        assert_eq!(RED, pixel(&image, 7, 3));
    }

    #[test]
    fn later_layers_overwrite() {
        let green = [0, 255, 0, 255];
        let mut data = solid_tile(RED, 4);
        data.extend(solid_tile(green, 4));

        let vt = VirtualTexture {
            width: 4,
            height: 4,
            num_mips: 1,
            tile_size: 4,
            tile_border_size: 0,
            layers: vec![bgra_layer(None), bgra_layer(None)],
            tile_offsets: TileOffsetTable::Legacy,
            tile_index_per_mip: vec![0, 2],
            tile_index_per_chunk: vec![0, 2],
            tile_offset_in_chunk: vec![0, 64],
            chunks: vec![VtChunk {
                codecs: vec![VirtualTextureCodec::RawGpu; 2],
                data,
            }],
        };
        let image = vt.decode(0, false).unwrap();
        assert_eq!(green.repeat(16), image.data);
    }

    #[test]
    fn normal_map_tiles() {
        // X and Y of 128 are close to 0, so Z is close to 1.
        let vt = single_tile_vt(
            solid_tile([0, 128, 128, 255], 4),
            VirtualTextureCodec::RawGpu,
        );
        let image = vt.decode(0, true).unwrap();
        assert_eq!([255, 128, 128, 255], pixel(&image, 0, 0));
        // The fallback color is not a decoded tile.
        assert_eq!([255, 0, 0, 255], pixel(&image, 4, 4));
    }

    #[test]
    fn missing_mip() {
        let vt = single_tile_vt(solid_tile(RED, 4), VirtualTextureCodec::RawGpu);
        assert!(matches!(vt.decode(1, false), Err(DecodeError::MissingMip)));
    }
}
