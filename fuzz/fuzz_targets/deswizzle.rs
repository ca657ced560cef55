#![no_main]
use libfuzzer_sys::fuzz_target;

extern crate arbitrary;
use arbitrary::{Arbitrary, Result, Unstructured};
use texture_decode::{deswizzle, PixelFormat, Platform};

#[derive(Debug)]
struct Input {
    width: usize,
    height: usize,
    depth: usize,
    format: PixelFormat,
    platform: Platform,
    input_size: usize,
}

impl<'a> Arbitrary<'a> for Input {
    fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self> {
        Ok(Input {
            width: u.int_in_range(0..=4096)?,
            height: u.int_in_range(0..=4096)?,
            depth: u.int_in_range(0..=4)?,
            format: u.arbitrary()?,
            platform: u.arbitrary()?,
            input_size: u.int_in_range(0..=16777216)?,
        })
    }
}

fuzz_target!(|input: Input| {
    let swizzled = vec![0u8; input.input_size];

    // This should never panic even if the input size is incorrect.
    let _ = deswizzle(
        input.platform,
        &swizzled,
        input.width,
        input.height,
        input.depth,
        input.format.info(),
    );
});
