#![no_main]
use libfuzzer_sys::fuzz_target;

extern crate arbitrary;
use arbitrary::{Arbitrary, Result, Unstructured};
use texture_decode::{decode_mip, DecodeOptions, Platform, TextureMip};

#[derive(Debug)]
struct Input {
    width: u32,
    height: u32,
    depth: u32,
    format: u32,
    platform: Platform,
    layer: u32,
    is_normal_map: bool,
    input_size: usize,
}

impl<'a> Arbitrary<'a> for Input {
    fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self> {
        Ok(Input {
            width: u.int_in_range(0..=1024)?,
            height: u.int_in_range(0..=1024)?,
            depth: u.int_in_range(0..=8)?,
            // Include values past the end of the format registry.
            format: u.int_in_range(0..=80)?,
            platform: u.arbitrary()?,
            layer: u.int_in_range(0..=8)?,
            is_normal_map: u.arbitrary()?,
            input_size: u.int_in_range(0..=4194304)?,
        })
    }
}

fuzz_target!(|input: Input| {
    let mip = TextureMip::new(
        input.width,
        input.height,
        input.depth,
        vec![0u8; input.input_size],
    );
    let options = DecodeOptions {
        platform: input.platform,
        layer: input.layer,
    };

    // This should never panic even if the input size is incorrect.
    let _ = decode_mip(Some(&mip), input.format, input.is_normal_map, &options);
});
