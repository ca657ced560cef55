use texture_decode::{PixelFormat, Platform};

/// Command line names for the formats with a decoder.
pub const FORMAT_NAMES: &[(&str, PixelFormat)] = &[
    ("bc1", PixelFormat::Dxt1),
    ("bc3", PixelFormat::Dxt5),
    ("bc4", PixelFormat::Bc4),
    ("bc5", PixelFormat::Bc5),
    ("bc6h", PixelFormat::Bc6h),
    ("bc7", PixelFormat::Bc7),
    ("astc4x4", PixelFormat::Astc4x4),
    ("astc6x6", PixelFormat::Astc6x6),
    ("astc8x8", PixelFormat::Astc8x8),
    ("astc10x10", PixelFormat::Astc10x10),
    ("astc12x12", PixelFormat::Astc12x12),
    ("etc1", PixelFormat::Etc1),
    ("etc2rgb", PixelFormat::Etc2Rgb),
    ("etc2rgba", PixelFormat::Etc2Rgba),
    ("r8", PixelFormat::R8),
    ("a8", PixelFormat::A8),
    ("g8", PixelFormat::G8),
    ("r16f", PixelFormat::R16F),
    ("r16ffilter", PixelFormat::R16FFilter),
    ("g16", PixelFormat::G16),
    ("bgra8", PixelFormat::B8G8R8A8),
    ("floatrgb", PixelFormat::FloatRgb),
    ("floatrgba", PixelFormat::FloatRgba),
];

/// Parses a format name like `bc7` or a raw pixel format value like `17`.
pub fn parse_format(s: &str) -> Result<u32, String> {
    let name = s.to_lowercase();
    if let Some((_, format)) = FORMAT_NAMES.iter().find(|(n, _)| *n == name) {
        return Ok((*format).into());
    }

    // Allow any format value to see how the library handles it.
    name.parse()
        .map_err(|_| format!("Unrecognized format {:?}", s))
}

pub fn parse_platform(s: &str) -> Result<Platform, String> {
    match s.to_lowercase().as_str() {
        "desktop" | "mobile" => Ok(Platform::DesktopMobile),
        "xbps" | "xbox" | "playstation" => Ok(Platform::XboxAndPlaystation),
        "switch" => Ok(Platform::NintendoSwitch),
        _ => Err(format!("Unrecognized platform {:?}", s)),
    }
}
