//! Entry point for the pdbload tool.
//!
//! This file handles high-level application flow:
//! 1. Parse command-line arguments using `clap`.
//! 2. Map and parse the target binary image.
//! 3. Resolve the PDB's public function symbols into the image.
//! 4. Print the resolution report.
//!
//! Error handling is done via `anyhow`.

use anyhow::{Context, Result};
use clap::Parser;
use memmap2::Mmap;
use std::fs::File;
use tracing_subscriber::EnvFilter;

use pdbload::config::Config;
use pdbload::demangle::MsvcDemangler;
use pdbload::image::PeImage;
use pdbload::reader::PdbReader;
use pdbload::resolver::SymbolResolver;

fn main() -> Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .init();

    let file = File::open(&config.binary)
        .with_context(|| format!("failed to open {}", config.binary.display()))?;
    let mmap = unsafe { Mmap::map(&file)? };
    let mut image = PeImage::parse(&mmap)
        .with_context(|| format!("failed to parse {}", config.binary.display()))?;

    let pdb_path = config.pdb_path();
    tracing::info!("loading debug info from {}", pdb_path.display());

    let resolver = SymbolResolver::new(PdbReader, MsvcDemangler);
    let report = resolver.resolve(&mut image, &pdb_path)?;

    println!("{report}");
    Ok(())
}
