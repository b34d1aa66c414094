//! Configuration module.
//!
//! This module defines the command-line interface (CLI) for `pdbload`
//! using `clap`. It handles the target binary path, the optional explicit
//! container path, and logging.

use clap::Parser;
use std::path::PathBuf;

/// Name functions in a binary from its PDB debug info.
///
/// Loads the global symbol stream of a PDB, translates each public
/// function symbol to a virtual address in the binary image, and assigns
/// the demangled symbol name to the function at that address.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// The binary image to annotate
    pub binary: PathBuf,

    /// Debug-info container; defaults to the binary path with a .pdb extension
    #[arg(long)]
    pub pdb: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", help = "Set the logging level")]
    pub log_level: String,
}

impl Config {
    /// The container path: the explicit override, or the binary path with
    /// its extension swapped.
    pub fn pdb_path(&self) -> PathBuf {
        self.pdb
            .clone()
            .unwrap_or_else(|| self.binary.with_extension("pdb"))
    }
}
