#![no_main]
use libfuzzer_sys::fuzz_target;

extern crate arbitrary;
use arbitrary::{Arbitrary, Result, Unstructured};
use texture_decode::vt::{
    TileOffsetData, TileOffsetTable, VirtualTexture, VirtualTextureCodec, VtChunk, VtLayer,
};
use texture_decode::PixelFormat;

#[derive(Debug)]
struct Input {
    vt: VirtualTexture,
    level: u32,
}

fn vec_of<'a>(u: &mut Unstructured<'a>, max_len: usize, max_value: u32) -> Result<Vec<u32>> {
    let len = u.int_in_range(0..=max_len)?;
    (0..len)
        .map(|_| {
            // Include missing tile sentinels.
            if u.ratio(1, 8)? {
                Ok(u32::MAX)
            } else {
                u.int_in_range(0..=max_value)
            }
        })
        .collect()
}

impl<'a> Arbitrary<'a> for Input {
    fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self> {
        let tile_offsets = if u.arbitrary()? {
            let mips = (0..u.int_in_range(0..=4)?)
                .map(|_| {
                    let mut addresses = vec_of(u, 8, 64)?;
                    addresses.retain(|a| *a != u32::MAX);
                    addresses.sort_unstable();
                    Ok(TileOffsetData {
                        width: u.int_in_range(0..=8)?,
                        height: u.int_in_range(0..=8)?,
                        max_address: u.int_in_range(0..=64)?,
                        offsets: vec_of(u, addresses.len(), 64)?,
                        addresses,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            TileOffsetTable::Modern(mips)
        } else {
            TileOffsetTable::Legacy
        };

        let layers = (0..u.int_in_range(0..=3)?)
            .map(|_| {
                let format: PixelFormat = u.arbitrary()?;
                Ok(VtLayer {
                    format: format.into(),
                    fallback_color: None,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let chunks = (0..u.int_in_range(0..=2)?)
            .map(|_| {
                let codec = if u.arbitrary()? {
                    VirtualTextureCodec::ZippedGpu
                } else {
                    VirtualTextureCodec::RawGpu
                };
                Ok(VtChunk {
                    codecs: vec![codec; layers.len()],
                    data: vec![0u8; u.int_in_range(0..=65536)?],
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut tile_index_per_mip = vec_of(u, 6, 128)?;
        tile_index_per_mip.sort_unstable();
        let mut tile_index_per_chunk = vec_of(u, 3, 128)?;
        tile_index_per_chunk.sort_unstable();

        Ok(Input {
            vt: VirtualTexture {
                width: u.int_in_range(0..=1024)?,
                height: u.int_in_range(0..=1024)?,
                num_mips: u.int_in_range(0..=5)?,
                tile_size: u.int_in_range(0..=64)?,
                tile_border_size: u.int_in_range(0..=4)?,
                layers,
                tile_offsets,
                tile_index_per_mip,
                tile_index_per_chunk,
                tile_offset_in_chunk: vec_of(u, 128, 65536)?,
                chunks,
            },
            level: u.int_in_range(0..=5)?,
        })
    }
}

fuzz_target!(|input: Input| {
    // This should never panic even for inconsistent tables.
    let _ = input.vt.decode(input.level, false);
});
