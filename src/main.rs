use bgcode::{
    ChecksumKind, CompressionKind, Document, GCodeEncoding, Thumbnail, ThumbnailFormat,
    WriteOptions,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bgcode", version = "1.0.0", about = "Binary G-code container codec CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode ASCII G-code (and optional metadata/thumbnails) into a .bgcode container
    Encode {
        /// Path to an ASCII G-code file
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Checksum kind written to the stream header: crc32 (default) or none
        #[arg(long, default_value = "crc32")]
        checksum: String,
        /// Payload compression: none (default), deflate, heatshrink11-4, heatshrink12-4
        #[arg(long, default_value = "none")]
        compress: String,
        /// G-code payload encoding: none (default), meatpack, meatpack-comments
        #[arg(long, default_value = "none")]
        gcode_encoding: String,
        /// `key=value` printer metadata pair, repeatable
        #[arg(long = "printer-meta", value_parser = parse_kv)]
        printer_meta: Vec<(String, String)>,
        /// `key=value` print metadata pair, repeatable
        #[arg(long = "print-meta", value_parser = parse_kv)]
        print_meta: Vec<(String, String)>,
        /// `key=value` slicer metadata pair, repeatable
        #[arg(long = "slicer-meta", value_parser = parse_kv)]
        slicer_meta: Vec<(String, String)>,
        /// `path:format:width:height` thumbnail spec, repeatable
        #[arg(long = "thumbnail", value_parser = parse_thumbnail_spec)]
        thumbnails: Vec<ThumbnailSpec>,
    },
    /// Decode a .bgcode container back to ASCII G-code
    Decode {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print the metadata and block summary of a .bgcode container
    Info { input: PathBuf },
    /// Extract embedded thumbnails from a .bgcode container
    Thumbnails {
        input: PathBuf,
        #[arg(short = 'C', long, default_value = ".")]
        output_dir: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Commands::Encode {
            input,
            output,
            checksum,
            compress,
            gcode_encoding,
            printer_meta,
            print_meta,
            slicer_meta,
            thumbnails,
        } => {
            let ascii = std::fs::read(&input)?;
            let mut doc = Document { gcode: ascii, ..Document::default() };
            doc.printer_metadata = printer_meta;
            doc.print_metadata = print_meta;
            doc.slicer_metadata = slicer_meta;
            for spec in &thumbnails {
                let data = std::fs::read(&spec.path)?;
                doc.thumbnails.push(Thumbnail {
                    format: spec.format,
                    width: spec.width,
                    height: spec.height,
                    data,
                });
            }

            let options = WriteOptions {
                checksum_kind: parse_checksum_kind(&checksum)?,
                compression: parse_compression_kind(&compress)?,
                gcode_encoding: parse_gcode_encoding(&gcode_encoding)?,
                ..WriteOptions::default()
            };
            doc.write(&output, options)?;
            let size = std::fs::metadata(&output)?.len();
            println!("Encoded: {}  ({} B on disk)", output.display(), size);
        }

        Commands::Decode { input, output } => {
            let doc = Document::read(&input, None)?;
            std::fs::write(&output, &doc.gcode)?;
            println!("Decoded {} B of G-code → {}", doc.gcode.len(), output.display());
        }

        Commands::Info { input } => {
            let doc = Document::read(&input, None)?;
            println!("── bgcode container ─────────────────────────────────────");
            println!("  Path              {}", input.display());
            print_metadata_section("File metadata", &doc.file_metadata);
            print_metadata_section("Printer metadata", &doc.printer_metadata);
            print_metadata_section("Print metadata", &doc.print_metadata);
            print_metadata_section("Slicer metadata", &doc.slicer_metadata);
            println!("  Thumbnails        {}", doc.thumbnails.len());
            for (i, t) in doc.thumbnails.iter().enumerate() {
                println!("    [{i}] {:?} {}x{} ({} B)", t.format, t.width, t.height, t.data.len());
            }
            println!("  G-code size       {} B", doc.gcode.len());
        }

        Commands::Thumbnails { input, output_dir } => {
            let doc = Document::read(&input, None)?;
            std::fs::create_dir_all(&output_dir)?;
            for (i, t) in doc.thumbnails.iter().enumerate() {
                let ext = match t.format {
                    ThumbnailFormat::Png => "png",
                    ThumbnailFormat::Jpg => "jpg",
                    ThumbnailFormat::Qoi => "qoi",
                };
                let path = output_dir.join(format!("thumbnail_{i}_{}x{}.{ext}", t.width, t.height));
                std::fs::write(&path, &t.data)?;
                println!("  wrote  {}", path.display());
            }
            println!("Extracted {} thumbnail(s) → {}", doc.thumbnails.len(), output_dir.display());
        }
    }

    Ok(())
}

fn print_metadata_section(label: &str, pairs: &[(String, String)]) {
    println!("  {label:<17} {} entries", pairs.len());
    for (k, v) in pairs {
        println!("    {k} = {v}");
    }
}

#[derive(Clone)]
struct ThumbnailSpec {
    path: PathBuf,
    format: ThumbnailFormat,
    width: u16,
    height: u16,
}

fn parse_thumbnail_spec(s: &str) -> Result<ThumbnailSpec, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 4 {
        return Err("expected path:format:width:height".to_string());
    }
    let (path, format, width, height) = (parts[0], parts[1], parts[2], parts[3]);
    let format = match format {
        "png" => ThumbnailFormat::Png,
        "jpg" | "jpeg" => ThumbnailFormat::Jpg,
        "qoi" => ThumbnailFormat::Qoi,
        other => return Err(format!("unknown thumbnail format '{other}'")),
    };
    let width = width.parse::<u16>().map_err(|e| e.to_string())?;
    let height = height.parse::<u16>().map_err(|e| e.to_string())?;
    Ok(ThumbnailSpec { path: PathBuf::from(path), format, width, height })
}

fn parse_kv(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| "expected key=value".to_string())
}

fn parse_checksum_kind(s: &str) -> Result<ChecksumKind, String> {
    match s {
        "crc32" => Ok(ChecksumKind::Crc32),
        "none" => Ok(ChecksumKind::None),
        other => Err(format!("unknown checksum kind '{other}'")),
    }
}

fn parse_compression_kind(s: &str) -> Result<CompressionKind, String> {
    match s {
        "none" => Ok(CompressionKind::None),
        "deflate" => Ok(CompressionKind::Deflate),
        "heatshrink11-4" => Ok(CompressionKind::Heatshrink11_4),
        "heatshrink12-4" => Ok(CompressionKind::Heatshrink12_4),
        other => Err(format!("unknown compression kind '{other}'")),
    }
}

fn parse_gcode_encoding(s: &str) -> Result<GCodeEncoding, String> {
    match s {
        "none" => Ok(GCodeEncoding::None),
        "meatpack" => Ok(GCodeEncoding::MeatPack),
        "meatpack-comments" => Ok(GCodeEncoding::MeatPackComments),
        other => Err(format!("unknown gcode encoding '{other}'")),
    }
}

