use crate::{div_round_up, DecodeError};

// Generates the enum and the registry table from a single list
// so the table index always matches the engine value.
macro_rules! pixel_formats {
    ($($name:ident = $index:literal => ($x:literal, $y:literal, $z:literal, $bytes:literal, $components:literal, $supported:literal)),* $(,)?) => {
        /// The engine's pixel format enumeration in serialized order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
        #[repr(u32)]
        pub enum PixelFormat {
            $($name = $index),*
        }

        static PIXEL_FORMATS: &[PixelFormatInfo] = &[
            $(PixelFormatInfo {
                format: PixelFormat::$name,
                block_size_x: $x,
                block_size_y: $y,
                block_size_z: $z,
                block_bytes: $bytes,
                num_components: $components,
                supported: $supported,
            }),*
        ];
    };
}

pixel_formats! {
    Unknown = 0 => (0, 0, 0, 0, 0, false),
    A32B32G32R32F = 1 => (1, 1, 1, 16, 4, true),
    B8G8R8A8 = 2 => (1, 1, 1, 4, 4, true),
    G8 = 3 => (1, 1, 1, 1, 1, true),
    G16 = 4 => (1, 1, 1, 2, 1, true),
    Dxt1 = 5 => (4, 4, 1, 8, 3, true),
    Dxt3 = 6 => (4, 4, 1, 16, 4, true),
    Dxt5 = 7 => (4, 4, 1, 16, 4, true),
    Uyvy = 8 => (2, 1, 1, 4, 4, false),
    FloatRgb = 9 => (1, 1, 1, 4, 3, true),
    FloatRgba = 10 => (1, 1, 1, 8, 4, true),
    DepthStencil = 11 => (1, 1, 1, 4, 1, false),
    ShadowDepth = 12 => (1, 1, 1, 4, 1, false),
    R32Float = 13 => (1, 1, 1, 4, 1, true),
    G16R16 = 14 => (1, 1, 1, 4, 2, true),
    G16R16F = 15 => (1, 1, 1, 4, 2, true),
    G16R16FFilter = 16 => (1, 1, 1, 4, 2, true),
    G32R32F = 17 => (1, 1, 1, 8, 2, true),
    A2B10G10R10 = 18 => (1, 1, 1, 4, 4, true),
    A16B16G16R16 = 19 => (1, 1, 1, 8, 4, true),
    D24 = 20 => (1, 1, 1, 4, 1, true),
    R16F = 21 => (1, 1, 1, 2, 1, true),
    R16FFilter = 22 => (1, 1, 1, 2, 1, true),
    Bc5 = 23 => (4, 4, 1, 16, 2, true),
    V8U8 = 24 => (1, 1, 1, 2, 2, true),
    A1 = 25 => (1, 1, 1, 1, 1, false),
    FloatR11G11B10 = 26 => (1, 1, 1, 4, 3, true),
    A8 = 27 => (1, 1, 1, 1, 1, true),
    R32Uint = 28 => (1, 1, 1, 4, 1, true),
    R32Sint = 29 => (1, 1, 1, 4, 1, true),
    Pvrtc2 = 30 => (8, 4, 1, 8, 4, false),
    Pvrtc4 = 31 => (4, 4, 1, 8, 4, false),
    R16Uint = 32 => (1, 1, 1, 2, 1, true),
    R16Sint = 33 => (1, 1, 1, 2, 1, true),
    R16G16B16A16Uint = 34 => (1, 1, 1, 8, 4, true),
    R16G16B16A16Sint = 35 => (1, 1, 1, 8, 4, true),
    R5G6B5Unorm = 36 => (1, 1, 1, 2, 3, true),
    R8G8B8A8 = 37 => (1, 1, 1, 4, 4, true),
    A8R8G8B8 = 38 => (1, 1, 1, 4, 4, true),
    Bc4 = 39 => (4, 4, 1, 8, 1, true),
    R8G8 = 40 => (1, 1, 1, 2, 2, true),
    AtcRgb = 41 => (4, 4, 1, 8, 3, false),
    AtcRgbaE = 42 => (4, 4, 1, 16, 4, false),
    AtcRgbaI = 43 => (4, 4, 1, 16, 4, false),
    X24G8 = 44 => (1, 1, 1, 1, 1, false),
    Etc1 = 45 => (4, 4, 1, 8, 3, true),
    Etc2Rgb = 46 => (4, 4, 1, 8, 3, true),
    Etc2Rgba = 47 => (4, 4, 1, 16, 4, true),
    R32G32B32A32Uint = 48 => (1, 1, 1, 16, 4, true),
    R16G16Uint = 49 => (1, 1, 1, 4, 4, true),
    Astc4x4 = 50 => (4, 4, 1, 16, 4, true),
    Astc6x6 = 51 => (6, 6, 1, 16, 4, true),
    Astc8x8 = 52 => (8, 8, 1, 16, 4, true),
    Astc10x10 = 53 => (10, 10, 1, 16, 4, true),
    Astc12x12 = 54 => (12, 12, 1, 16, 4, true),
    Bc6h = 55 => (4, 4, 1, 16, 3, true),
    Bc7 = 56 => (4, 4, 1, 16, 4, true),
    R8Uint = 57 => (1, 1, 1, 1, 1, true),
    L8 = 58 => (1, 1, 1, 1, 1, true),
    Xgxr8 = 59 => (1, 1, 1, 4, 4, true),
    R8G8B8A8Uint = 60 => (1, 1, 1, 4, 4, true),
    R8G8B8A8Snorm = 61 => (1, 1, 1, 4, 4, true),
    R16G16B16A16Unorm = 62 => (1, 1, 1, 8, 4, true),
    R16G16B16A16Snorm = 63 => (1, 1, 1, 8, 4, true),
    PlatformHdr0 = 64 => (0, 0, 0, 0, 0, false),
    PlatformHdr1 = 65 => (0, 0, 0, 0, 0, false),
    PlatformHdr2 = 66 => (0, 0, 0, 0, 0, false),
    Nv12 = 67 => (1, 1, 1, 1, 1, false),
    R32G32Uint = 68 => (1, 1, 1, 8, 2, true),
    Etc2R11Eac = 69 => (4, 4, 1, 8, 1, true),
    Etc2Rg11Eac = 70 => (4, 4, 1, 16, 2, true),
    R8 = 71 => (1, 1, 1, 1, 1, true),
    B5G5R5A1Unorm = 72 => (1, 1, 1, 2, 4, true),
}

impl PixelFormat {
    /// Converts the serialized engine value to a known format.
    pub fn from_index(index: u32) -> Option<Self> {
        lookup(index).map(|info| info.format)
    }

    /// Returns `true` if [crate::decode_blocks] has a decoder for this format.
    pub const fn is_decodable(self) -> bool {
        matches!(
            self,
            PixelFormat::Dxt1
                | PixelFormat::Dxt5
                | PixelFormat::Bc4
                | PixelFormat::Bc5
                | PixelFormat::Bc6h
                | PixelFormat::Bc7
                | PixelFormat::Astc4x4
                | PixelFormat::Astc6x6
                | PixelFormat::Astc8x8
                | PixelFormat::Astc10x10
                | PixelFormat::Astc12x12
                | PixelFormat::Etc1
                | PixelFormat::Etc2Rgb
                | PixelFormat::Etc2Rgba
                | PixelFormat::R8
                | PixelFormat::A8
                | PixelFormat::G8
                | PixelFormat::R16F
                | PixelFormat::R16FFilter
                | PixelFormat::G16
                | PixelFormat::B8G8R8A8
                | PixelFormat::FloatRgb
                | PixelFormat::FloatRgba
        )
    }

    /// The registry entry for this format.
    pub fn info(self) -> &'static PixelFormatInfo {
        &PIXEL_FORMATS[self as usize]
    }
}

impl From<PixelFormat> for u32 {
    fn from(format: PixelFormat) -> Self {
        format as u32
    }
}

/// Block layout information for a single [PixelFormat].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormatInfo {
    pub format: PixelFormat,
    pub block_size_x: u32,
    pub block_size_y: u32,
    pub block_size_z: u32,
    /// The size of a single block in bytes or the bytes per pixel for uncompressed formats.
    pub block_bytes: u32,
    pub num_components: u32,
    pub supported: bool,
}

impl PixelFormatInfo {
    /// Returns `true` if the entry describes data that can be sized and decoded.
    pub const fn is_supported(&self) -> bool {
        self.supported && self.block_bytes > 0
    }

    /// The number of blocks needed to cover `width` x `height` pixels.
    /// Partial blocks at the edges count as whole blocks.
    pub fn block_count(&self, width: usize, height: usize) -> usize {
        if self.block_size_x == 0 || self.block_size_y == 0 {
            return 0;
        }
        div_round_up(width, self.block_size_x as usize)
            * div_round_up(height, self.block_size_y as usize)
    }

    /// The size in bytes of a surface with the given dimensions in pixels.
    pub fn surface_size(&self, width: usize, height: usize, depth: usize) -> usize {
        let depth_blocks = if self.block_size_z == 0 {
            0
        } else {
            div_round_up(depth, self.block_size_z as usize)
        };
        self.block_count(width, height) * depth_blocks * self.block_bytes as usize
    }
}

/// Looks up the registry entry for the engine pixel format value `format_index`.
/// Returns `None` for values outside the known enumeration.
pub fn lookup(format_index: u32) -> Option<&'static PixelFormatInfo> {
    PIXEL_FORMATS.get(format_index as usize)
}

/// Looks up `format_index` and rejects entries that are unknown, unsupported, or zero sized.
pub fn supported_info(format_index: u32) -> Result<&'static PixelFormatInfo, DecodeError> {
    lookup(format_index)
        .filter(|info| info.is_supported())
        .ok_or(DecodeError::UnsupportedFormat {
            format: format_index,
        })
}
