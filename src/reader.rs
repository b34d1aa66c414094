//! Debug-info container loading.
//!
//! The on-disk stream layout is owned entirely by the `pdb` crate; this
//! module reduces a parsed container to the pieces a resolution pass
//! needs: section header streams and the global symbol stream.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use pdb::{FallibleIterator, SymbolData, PDB};

use crate::sections::{SectionDescriptor, SectionTable};
use crate::symbol::{GlobalSymbol, SymbolKind};

/// The parts of a parsed debug-info container consumed by the resolver.
#[derive(Debug, Clone, Default)]
pub struct DebugInfo {
    /// The original section header stream, present when the container was
    /// produced with address remapping.
    pub original_sections: Option<SectionTable>,
    /// The (possibly remapped) section header stream.
    pub sections: Option<SectionTable>,
    /// The global symbol stream, in container order.
    pub symbols: Option<Vec<GlobalSymbol>>,
}

impl DebugInfo {
    /// Select the section table for a resolution pass: the original stream
    /// when present, otherwise the remapped one. The choice is made once
    /// per container.
    pub fn section_table(&self) -> Option<&SectionTable> {
        self.original_sections.as_ref().or(self.sections.as_ref())
    }
}

/// Loads a debug-info container from disk.
pub trait DebugInfoReader {
    fn load(&self, path: &Path) -> Result<DebugInfo>;
}

/// Reader for Microsoft PDB containers, backed by the `pdb` crate.
pub struct PdbReader;

impl DebugInfoReader for PdbReader {
    fn load(&self, path: &Path) -> Result<DebugInfo> {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let mut pdb =
            PDB::open(file).with_context(|| format!("failed to parse {}", path.display()))?;

        let sections = pdb
            .sections()
            .context("failed to read section headers")?
            .map(|headers| {
                SectionTable::new(
                    headers
                        .iter()
                        .map(|header| SectionDescriptor {
                            name: header.name().to_string(),
                            virtual_address: header.virtual_address,
                        })
                        .collect(),
                )
            });

        let symbols = match pdb.global_symbols() {
            Ok(table) => {
                Some(read_symbols(&table).context("failed to read global symbol stream")?)
            }
            Err(pdb::Error::StreamNameNotFound | pdb::Error::StreamNotFound(_)) => None,
            Err(err) => return Err(err).context("failed to open global symbol stream"),
        };

        Ok(DebugInfo {
            // The crate exposes the post-remap headers; containers built
            // without remapping carry the same addresses either way.
            original_sections: None,
            sections,
            symbols,
        })
    }
}

fn read_symbols(table: &pdb::SymbolTable<'_>) -> Result<Vec<GlobalSymbol>> {
    let mut symbols = Vec::new();
    let mut iter = table.iter();
    while let Some(symbol) = iter.next()? {
        match symbol.parse() {
            Ok(SymbolData::Public(data)) => symbols.push(GlobalSymbol {
                kind: Some(if data.function {
                    SymbolKind::Function
                } else {
                    SymbolKind::Other(symbol.raw_kind())
                }),
                segment: Some(data.offset.section),
                offset: Some(data.offset.offset),
                name: Some(data.name.to_string().into_owned()),
            }),
            // Other record kinds never name functions; keep them in the
            // stream with their raw discriminant so the resolver sees the
            // container as-is.
            _ => symbols.push(GlobalSymbol {
                kind: Some(SymbolKind::Other(symbol.raw_kind())),
                ..GlobalSymbol::default()
            }),
        }
    }
    Ok(symbols)
}
