//! CLI tool for slideview - turns a DZI manifest into a viewer tile source
//!
//! Usage:
//!   slideview_cli <slide.dzi>                            # JSON to stdout
//!   slideview_cli <slide.dzi> --url /dzi/case1/slide_files/
//!   slideview_cli <slide.dzi> -o tile_source.json        # JSON to file

#![allow(clippy::exit)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use slideview::TileSource;

/// Default tile root: `foo.dzi` tiles live next to it in `foo_files/`.
fn default_tile_url(manifest: &str) -> String {
    let stem = Path::new(manifest)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("slide");
    format!("{stem}_files/")
}

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: slideview_cli <slide.dzi> [--url tile-root] [-o output.json]");
        std::process::exit(1);
    }

    let input_path = &args[1];
    let mut url = default_tile_url(input_path);
    let mut output_path = None;
    let mut rest = args[2..].iter();
    while let Some(flag) = rest.next() {
        match (flag.as_str(), rest.next()) {
            ("--url", Some(value)) => url = value.clone(),
            ("-o", Some(value)) => output_path = Some(value.clone()),
            _ => {
                eprintln!("Unrecognized argument: {flag}");
                std::process::exit(1);
            }
        }
    }

    // Read manifest
    let xml = match fs::read_to_string(input_path) {
        Ok(x) => x,
        Err(e) => {
            eprintln!("Error reading {}: {}", input_path, e);
            std::process::exit(1);
        }
    };

    // Parse manifest
    let source = match TileSource::from_dzi_xml(&xml, url) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error parsing {}: {}", input_path, e);
            std::process::exit(1);
        }
    };
    log::info!(
        "{}: {}x{} px, tile size {}, overlap {}",
        input_path,
        source.width,
        source.height,
        source.tile_size,
        source.overlap
    );

    // Serialize to JSON
    let json = match serde_json::to_string_pretty(&source.to_document()) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("Error serializing JSON: {}", e);
            std::process::exit(1);
        }
    };

    // Output
    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(&path, &json) {
                eprintln!("Error writing {}: {}", path, e);
                std::process::exit(1);
            }
            eprintln!("Written: {}", path);
        }
        None => {
            io::stdout().write_all(json.as_bytes()).unwrap();
            println!();
        }
    }
}
