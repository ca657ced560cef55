use std::error::Error;
use std::path::Path;

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use texture_decode::{
    decode_mip, decode_mip_layers, lookup, DecodeOptions, DecodedImage, TextureMip,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod formats;

use formats::{parse_format, parse_platform, FORMAT_NAMES};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let matches = App::new("texture_decode")
        .version("0.1")
        .author("SMG")
        .about("Decode cooked texture mipmaps to raw BGRA8 pixels.")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("decode")
                .arg(
                    Arg::with_name("input")
                        .short("i")
                        .long("input")
                        .help("The mipmap data")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .help("The output file for the BGRA8 pixels")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("format")
                        .short("f")
                        .long("format")
                        .help("The format name like bc7 or the pixel format value")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("width")
                        .short("w")
                        .long("width")
                        .help("The mipmap width in pixels")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("height")
                        .short("h")
                        .long("height")
                        .help("The mipmap height in pixels")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("depth")
                        .short("d")
                        .long("depth")
                        .help("The mipmap depth or layer count")
                        .required(false)
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("layer")
                        .long("layer")
                        .help("The layer to decode")
                        .required(false)
                        .takes_value(true)
                        .conflicts_with("all-layers"),
                )
                .arg(
                    Arg::with_name("all-layers")
                        .long("all-layers")
                        .help("Write each decoded layer to its own file"),
                )
                .arg(
                    Arg::with_name("platform")
                        .short("p")
                        .long("platform")
                        .help("The platform the data was cooked for")
                        .required(false)
                        .takes_value(true)
                        .possible_values(&["desktop", "xbps", "switch"])
                        .case_insensitive(true),
                )
                .arg(
                    Arg::with_name("normal")
                        .long("normal")
                        .help("Reconstruct the blue channel of a two channel normal map"),
                ),
        )
        .subcommand(
            SubCommand::with_name("formats").about("List the format names with a decoder"),
        )
        .get_matches();

    let result = match matches.subcommand() {
        ("decode", Some(sub_m)) => decode(sub_m),
        ("formats", Some(_)) => {
            print_formats();
            Ok(())
        }
        _ => Ok(()),
    };

    if let Err(e) = result {
        eprintln!("texture_decode: {}", e);
        std::process::exit(1);
    }
}

fn decode(sub_m: &ArgMatches) -> Result<(), Box<dyn Error>> {
    // Required arguments are validated by clap.
    let input = sub_m.value_of("input").unwrap();
    let output = Path::new(sub_m.value_of("output").unwrap());
    let format = parse_format(sub_m.value_of("format").unwrap())?;
    let width: u32 = sub_m.value_of("width").unwrap().parse()?;
    let height: u32 = sub_m.value_of("height").unwrap().parse()?;
    let depth = sub_m
        .value_of("depth")
        .map(str::parse::<u32>)
        .transpose()?
        .unwrap_or(1);
    let layer = sub_m
        .value_of("layer")
        .map(str::parse::<u32>)
        .transpose()?
        .unwrap_or(0);
    let platform = sub_m
        .value_of("platform")
        .map(parse_platform)
        .transpose()?
        .unwrap_or_default();
    let is_normal_map = sub_m.is_present("normal");

    let mip = TextureMip::new(width, height, depth, std::fs::read(input)?);

    let start = std::time::Instant::now();
    if sub_m.is_present("all-layers") {
        let images = decode_mip_layers(Some(&mip), format, is_normal_map, platform)?;
        info!(layers = images.len(), elapsed = ?start.elapsed(), "decoded mipmap layers");

        let stem = output.with_extension("");
        let extension = output
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");
        for (i, image) in images.iter().enumerate() {
            let path = Path::new(&format!("{}_{}", stem.display(), i)).with_extension(extension);
            write_image(&path, image)?;
        }
    } else {
        let options = DecodeOptions { platform, layer };
        let image = decode_mip(Some(&mip), format, is_normal_map, &options)?;
        info!(elapsed = ?start.elapsed(), "decoded mipmap");
        write_image(output, &image)?;
    }

    Ok(())
}

fn write_image(path: &Path, image: &DecodedImage) -> Result<(), Box<dyn Error>> {
    std::fs::write(path, &image.data)?;
    println!(
        "{}: {}x{} BGRA8 ({} bytes)",
        path.display(),
        image.width,
        image.height,
        image.data.len()
    );
    Ok(())
}

fn print_formats() {
    for (name, format) in FORMAT_NAMES {
        let value: u32 = (*format).into();
        if let Some(info) = lookup(value) {
            println!(
                "{:<12}{:>4}  {}x{}x{} blocks, {} bytes",
                name,
                value,
                info.block_size_x,
                info.block_size_y,
                info.block_size_z,
                info.block_bytes
            );
        }
    }
}
