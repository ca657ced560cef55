use tracing::debug;

use crate::{
    decode_blocks, deswizzle, format::supported_info, reconstruct_normal_z, round_up,
    vt::VirtualTexture, DecodeError, PixelFormat, PixelFormatInfo, Platform, Result,
};

/// A single mipmap of a regular texture.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextureMip {
    pub size_x: u32,
    pub size_y: u32,
    /// The depth for volume textures or the layer count for texture arrays.
    pub size_z: u32,
    pub data: Vec<u8>,
}

impl TextureMip {
    pub fn new(size_x: u32, size_y: u32, size_z: u32, data: Vec<u8>) -> Self {
        Self {
            size_x,
            size_y,
            size_z,
            data,
        }
    }

    fn has_data(&self) -> bool {
        !self.data.is_empty()
    }
}

/// Settings for decoding a regular texture mipmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeOptions {
    /// The platform used to interpret the memory layout of the mip data.
    pub platform: Platform,
    /// The layer to select for volume textures and texture arrays.
    pub layer: u32,
}

/// Decoded pixels with 4 bytes per pixel in B, G, R, A order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// A texture and its serialized mipmaps as handed over by the package parser.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Texture {
    /// The engine pixel format value.
    pub format: u32,
    pub is_normal_map: bool,
    pub mips: Vec<TextureMip>,
    pub virtual_texture: Option<VirtualTexture>,
    /// The first mip level present in the cooked data.
    pub first_mip_to_serialize: u32,
}

impl Texture {
    /// The first mipmap that has data.
    pub fn first_mip(&self) -> Option<&TextureMip> {
        self.mips.iter().find(|m| m.has_data())
    }

    /// The largest mipmap with data that fits within `max_size` in both dimensions.
    /// Falls back to [Texture::first_mip] if no mipmap is small enough.
    pub fn mip_by_max_size(&self, max_size: u32) -> Option<&TextureMip> {
        self.mips
            .iter()
            .find(|m| m.has_data() && m.size_x <= max_size && m.size_y <= max_size)
            .or_else(|| self.first_mip())
    }

    /// Decodes the texture using the virtual texture data if present or the first mipmap otherwise.
    pub fn decode(&self, options: &DecodeOptions) -> Result<DecodedImage> {
        match &self.virtual_texture {
            Some(vt) if vt.is_initialized() => {
                debug!(
                    level = self.first_mip_to_serialize,
                    "decoding virtual texture"
                );
                vt.decode(self.first_mip_to_serialize, self.is_normal_map)
            }
            _ => decode_mip(
                self.first_mip(),
                self.format,
                self.is_normal_map,
                options,
            ),
        }
    }

    /// Decodes the largest mipmap that fits within `max_size`.
    pub fn decode_with_max_size(
        &self,
        max_size: u32,
        options: &DecodeOptions,
    ) -> Result<DecodedImage> {
        decode_mip(
            self.mip_by_max_size(max_size),
            self.format,
            self.is_normal_map,
            options,
        )
    }

    /// Decodes each layer of the first mipmap as a separate image.
    pub fn decode_layers(&self, platform: Platform) -> Result<Vec<DecodedImage>> {
        decode_mip_layers(self.first_mip(), self.format, self.is_normal_map, platform)
    }
}

/// Decodes a single mipmap of a regular texture.
///
/// The steps are applied in order.
/// 1. A missing or empty mip fails with [DecodeError::MissingMip].
/// 2. `format` must be a known and supported engine pixel format value.
/// 3. BC7 dimensions are rounded up to a multiple of 4, so the result uses the padded size.
/// 4. Tiled console data is converted to linear order.
/// 5. The blocks are decoded to BGRA8.
/// 6. Normal maps have their Z component reconstructed into blue.
/// 7. The layer `options.layer` is selected.
///
/// If the selected layer lies outside the decoded data, all decoded layers are returned
/// stacked vertically instead.
pub fn decode_mip(
    mip: Option<&TextureMip>,
    format: u32,
    is_normal_map: bool,
    options: &DecodeOptions,
) -> Result<DecodedImage> {
    let mip = mip.filter(|m| m.has_data()).ok_or(DecodeError::MissingMip)?;
    let info = supported_info(format)?;
    let (width, height, depth) = decoded_size(mip, info);

    let pixels = decode_surface(
        mip,
        info,
        width,
        height,
        depth,
        is_normal_map,
        options.platform,
    )?;

    let layer_size = width * height * 4;
    let window = layer_size
        .checked_mul(options.layer as usize)
        .and_then(|start| Some((start, start.checked_add(layer_size)?)))
        .filter(|(_, end)| *end <= pixels.len());
    let Some((start, end)) = window else {
        debug!(
            layer = options.layer,
            decoded_layers = pixels.len() / layer_size.max(1),
            "layer out of range, returning every decoded layer"
        );
        let stacked_height = pixels.len() / (width * 4).max(1);
        return Ok(DecodedImage {
            width: width as u32,
            height: stacked_height as u32,
            data: pixels,
        });
    };

    Ok(DecodedImage {
        width: width as u32,
        height: height as u32,
        data: pixels[start..end].to_vec(),
    })
}

/// Decodes every layer of a mipmap for texture arrays and volume textures.
///
/// Layers are decoded until the decoded data no longer covers a full layer.
pub fn decode_mip_layers(
    mip: Option<&TextureMip>,
    format: u32,
    is_normal_map: bool,
    platform: Platform,
) -> Result<Vec<DecodedImage>> {
    let mip = mip.filter(|m| m.has_data()).ok_or(DecodeError::MissingMip)?;
    let info = supported_info(format)?;
    let (width, height, depth) = decoded_size(mip, info);

    let pixels = decode_surface(mip, info, width, height, depth, is_normal_map, platform)?;

    let layer_size = width * height * 4;
    if layer_size == 0 {
        return Ok(Vec::new());
    }

    Ok(pixels
        .chunks_exact(layer_size)
        .take(depth)
        .map(|layer| DecodedImage {
            width: width as u32,
            height: height as u32,
            data: layer.to_vec(),
        })
        .collect())
}

fn decoded_size(mip: &TextureMip, info: &PixelFormatInfo) -> (usize, usize, usize) {
    let (width, height, depth) = (
        mip.size_x as usize,
        mip.size_y as usize,
        (mip.size_z as usize).max(1),
    );
    if info.format == PixelFormat::Bc7 {
        (round_up(width, 4), round_up(height, 4), round_up(depth, 4))
    } else {
        (width, height, depth)
    }
}

// Decodes consecutive layers until the data runs out.
// Only the first layer is required to be complete.
fn decode_surface(
    mip: &TextureMip,
    info: &PixelFormatInfo,
    width: usize,
    height: usize,
    depth: usize,
    is_normal_map: bool,
    platform: Platform,
) -> Result<Vec<u8>> {
    let linear = deswizzle(
        platform,
        &mip.data,
        mip.size_x as usize,
        mip.size_y as usize,
        (mip.size_z as usize).max(1),
        info,
    )?;

    let layer_bytes = info.surface_size(width, height, 1);
    let mut pixels = decode_blocks(&linear, width, height, info)?;
    for layer in 1..depth {
        let start = layer * layer_bytes;
        match linear.get(start..start + layer_bytes) {
            Some(bytes) if layer_bytes > 0 => {
                pixels.extend_from_slice(&decode_blocks(bytes, width, height, info)?)
            }
            _ => break,
        }
    }

    if is_normal_map {
        let rows = pixels.len() / (width * 4).max(1);
        reconstruct_normal_z(&mut pixels, width, rows);
    }

    Ok(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BC1_RED: [u8; 8] = [0x00, 0xF8, 0x00, 0x00, 0, 0, 0, 0];

    fn bc7_white_block() -> [u8; 16] {
        let mut block = [0u8; 16];
        block[0] = 0xC0;
        block[1..8].fill(0xFF);
        block[8] = 0x01;
        block
    }

    #[test]
    fn missing_mip() {
        let options = DecodeOptions::default();
        assert!(matches!(
            decode_mip(None, PixelFormat::Dxt1.into(), false, &options),
            Err(DecodeError::MissingMip)
        ));

        let empty = TextureMip::new(4, 4, 1, Vec::new());
        assert!(matches!(
            decode_mip(Some(&empty), PixelFormat::Dxt1.into(), false, &options),
            Err(DecodeError::MissingMip)
        ));
    }

    #[test]
    fn unsupported_format_index() {
        let mip = TextureMip::new(4, 4, 1, vec![0u8; 64]);
        let options = DecodeOptions::default();
        assert!(matches!(
            decode_mip(Some(&mip), 73, false, &options),
            Err(DecodeError::UnsupportedFormat { format: 73 })
        ));
        assert!(matches!(
            decode_mip(Some(&mip), PixelFormat::Unknown.into(), false, &options),
            Err(DecodeError::UnsupportedFormat { format: 0 })
        ));
    }

    #[test]
    fn not_implemented_format() {
        let mip = TextureMip::new(4, 4, 1, vec![0u8; 64]);
        let result = decode_mip(
            Some(&mip),
            PixelFormat::A32B32G32R32F.into(),
            false,
            &DecodeOptions::default(),
        );
        assert!(matches!(
            result,
            Err(DecodeError::NotImplemented(PixelFormat::A32B32G32R32F))
        ));
    }

    #[test]
    fn bc7_pads_to_block_size() {
        let mip = TextureMip::new(5, 5, 1, bc7_white_block().repeat(4));
        let image = decode_mip(
            Some(&mip),
            PixelFormat::Bc7.into(),
            false,
            &DecodeOptions::default(),
        )
        .unwrap();
        assert_eq!((8, 8), (image.width, image.height));
        assert_eq!(8 * 8 * 4, image.data.len());
        assert!(image.data.chunks_exact(4).all(|p| p == [255, 255, 255, 255]));
    }

    #[test]
    fn bc1_keeps_requested_size() {
        let mip = TextureMip::new(5, 5, 1, BC1_RED.repeat(4));
        let image = decode_mip(
            Some(&mip),
            PixelFormat::Dxt1.into(),
            false,
            &DecodeOptions::default(),
        )
        .unwrap();
        assert_eq!((5, 5), (image.width, image.height));
        assert_eq!(5 * 5 * 4, image.data.len());
    }

    #[test]
    fn normal_map_blue() {
        let mip = TextureMip::new(2, 2, 1, vec![128u8; 4]);
        let image = decode_mip(
            Some(&mip),
            PixelFormat::R8.into(),
            true,
            &DecodeOptions::default(),
        )
        .unwrap();
        // Red is 128 and green is 0, so z = sqrt(1 - 1) = 0.
        assert!(image.data.chunks_exact(4).all(|p| p == [0, 0, 128, 255]));

        let data: Vec<u8> = [0u8, 128, 128, 255].repeat(4);
        let mip = TextureMip::new(2, 2, 1, data);
        let image = decode_mip(
            Some(&mip),
            PixelFormat::B8G8R8A8.into(),
            true,
            &DecodeOptions::default(),
        )
        .unwrap();
        assert!(image.data.chunks_exact(4).all(|p| p == [255, 128, 128, 255]));
    }

    #[test]
    fn select_layer() {
        let mip = TextureMip::new(2, 1, 3, vec![1, 1, 2, 2, 3, 3]);
        let options = DecodeOptions {
            layer: 1,
            ..Default::default()
        };
        let image = decode_mip(Some(&mip), PixelFormat::R8.into(), false, &options).unwrap();
        assert_eq!((2, 1), (image.width, image.height));
        assert_eq!(vec![0, 0, 2, 255, 0, 0, 2, 255], image.data);
    }

    #[test]
    fn layer_out_of_range_returns_all_layers() {
        let mip = TextureMip::new(2, 1, 2, vec![1, 1, 2, 2]);
        let options = DecodeOptions {
            layer: 5,
            ..Default::default()
        };
        let image = decode_mip(Some(&mip), PixelFormat::R8.into(), false, &options).unwrap();
        assert_eq!((2, 2), (image.width, image.height));
        assert_eq!(2 * 2 * 4, image.data.len());
    }

    #[test]
    fn largest_layer_returns_all_layers() {
        let mip = TextureMip::new(4, 4, 2, vec![7; 4 * 4 * 2]);
        let options = DecodeOptions {
            layer: u32::MAX,
            ..Default::default()
        };
        let image = decode_mip(Some(&mip), PixelFormat::R8.into(), false, &options).unwrap();
        assert_eq!((4, 8), (image.width, image.height));
        assert_eq!(4 * 8 * 4, image.data.len());
    }

    #[test]
    fn layers_stop_at_missing_data() {
        // BC7 pads the depth of 1 up to 4 but only one layer has data.
        let mip = TextureMip::new(4, 4, 1, bc7_white_block().to_vec());
        let layers = decode_mip_layers(
            Some(&mip),
            PixelFormat::Bc7.into(),
            false,
            Platform::DesktopMobile,
        )
        .unwrap();
        assert_eq!(1, layers.len());

        let mip = TextureMip::new(1, 1, 3, vec![10, 20, 30]);
        let layers = decode_mip_layers(
            Some(&mip),
            PixelFormat::A8.into(),
            false,
            Platform::DesktopMobile,
        )
        .unwrap();
        let red: Vec<_> = layers.iter().map(|l| l.data[2]).collect();
        assert_eq!(vec![10, 20, 30], red);
    }

    #[test]
    fn texture_first_mip_skips_empty() {
        let texture = Texture {
            format: PixelFormat::R8.into(),
            mips: vec![
                TextureMip::new(4, 4, 1, Vec::new()),
                TextureMip::new(2, 2, 1, vec![9; 4]),
            ],
            ..Default::default()
        };
        assert_eq!(2, texture.first_mip().unwrap().size_x);

        let image = texture.decode(&DecodeOptions::default()).unwrap();
        assert_eq!((2, 2), (image.width, image.height));
    }

    #[test]
    fn texture_mip_by_max_size() {
        let texture = Texture {
            format: PixelFormat::R8.into(),
            mips: vec![
                TextureMip::new(16, 16, 1, vec![1; 256]),
                TextureMip::new(8, 8, 1, vec![2; 64]),
                TextureMip::new(4, 4, 1, vec![3; 16]),
            ],
            ..Default::default()
        };
        assert_eq!(8, texture.mip_by_max_size(10).unwrap().size_x);
        assert_eq!(16, texture.mip_by_max_size(2).unwrap().size_x);

        let image = texture.decode_with_max_size(4, &DecodeOptions::default()).unwrap();
        assert_eq!((4, 4), (image.width, image.height));
        assert_eq!(3, image.data[2]);
    }

    #[test]
    fn texture_prefers_virtual_texture() {
        use crate::vt::{TileOffsetTable, VirtualTexture, VtChunk, VtLayer};

        let texture = Texture {
            format: PixelFormat::R8.into(),
            mips: vec![TextureMip::new(4, 4, 1, vec![1; 16])],
            virtual_texture: Some(VirtualTexture {
                width: 4,
                height: 4,
                num_mips: 1,
                tile_size: 4,
                layers: vec![VtLayer {
                    format: PixelFormat::B8G8R8A8.into(),
                    fallback_color: None,
                }],
                tile_offsets: TileOffsetTable::Legacy,
                tile_index_per_mip: vec![0, 1],
                tile_index_per_chunk: vec![0, 1],
                tile_offset_in_chunk: vec![0],
                chunks: vec![VtChunk {
                    codecs: Vec::new(),
                    data: [1u8, 2, 3, 4].repeat(16),
                }],
                ..Default::default()
            }),
            ..Default::default()
        };
        let image = texture.decode(&DecodeOptions::default()).unwrap();
        assert_eq!((4, 4), (image.width, image.height));
        assert_eq!([1u8, 2, 3, 4].repeat(16), image.data);
    }

    #[test]
    fn texture_without_mips() {
        let texture = Texture::default();
        assert!(matches!(
            texture.decode(&DecodeOptions::default()),
            Err(DecodeError::MissingMip)
        ));
    }
}
