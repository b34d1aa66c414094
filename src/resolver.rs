//! Core symbol resolution logic.
//!
//! This module contains the `SymbolResolver` which orchestrates the whole
//! resolution pass:
//! 1. Container Loading: parse the debug-info container.
//! 2. Section Table Selection: original stream, else the remapped fallback.
//! 3. Symbol Walk: translate each public function symbol to an address in
//!    the image and assign its demangled name.
//! 4. Re-analysis: one blocking barrier after the walk.
//!
//! A failure on one symbol never aborts the pass; it is tallied in the
//! `ResolutionReport` instead.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use thiserror::Error;

use crate::demangle::{NameDemangler, NameResult};
use crate::image::BinaryImage;
use crate::reader::DebugInfoReader;
use crate::sections::SectionTable;
use crate::symbol::{GlobalSymbol, SymbolKind};

/// Errors that abort an entire resolution pass.
///
/// All of them occur while loading the container, before the image has
/// been touched.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to load debug-info container")]
    ContainerLoad(#[source] anyhow::Error),
    #[error("container carries no section header stream")]
    MissingSectionTable,
    #[error("container carries no global symbol stream")]
    MissingSymbolStream,
}

/// Why a single symbol was skipped. Skips never abort the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SkipReason {
    /// The record is missing its kind, segment, offset, or name.
    MissingAttribute,
    /// Segment index 0 or past the end of the section table.
    UnresolvedSegment,
    /// The image produced no function at the computed address.
    NoFunctionAtAddress,
    /// The demangler rejected the mangled name.
    Demangle,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::MissingAttribute => "missing record attribute",
            SkipReason::UnresolvedSegment => "unresolved segment index",
            SkipReason::NoFunctionAtAddress => "no function at address",
            SkipReason::Demangle => "demangling failed",
        };
        f.write_str(text)
    }
}

/// Outcome of resolving one symbol record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A function exists at the symbol's address and carries its name.
    Named,
    /// The record is not a public function symbol; not an error.
    NotAFunction,
    /// The record could not be resolved; the pass continues.
    Skipped(SkipReason),
}

/// Summary of one resolution pass.
#[derive(Debug, Default)]
pub struct ResolutionReport {
    /// Records seen in the global symbol stream.
    pub symbols_seen: usize,
    /// Functions that ended up created and named.
    pub functions_named: usize,
    /// Skip tallies by reason.
    pub skips: BTreeMap<SkipReason, usize>,
}

impl ResolutionReport {
    pub fn skipped(&self) -> usize {
        self.skips.values().sum()
    }

    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Named => self.functions_named += 1,
            Outcome::NotAFunction => {}
            Outcome::Skipped(reason) => *self.skips.entry(reason).or_default() += 1,
        }
    }
}

impl fmt::Display for ResolutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "named {} functions from {} symbols",
            self.functions_named, self.symbols_seen
        )?;
        if !self.skips.is_empty() {
            let details: Vec<String> = self
                .skips
                .iter()
                .map(|(reason, count)| format!("{reason}: {count}"))
                .collect();
            write!(f, ", skipped {} ({})", self.skipped(), details.join(", "))?;
        }
        Ok(())
    }
}

/// Drives the end-to-end translation from debug-info symbols to named
/// functions in a binary image.
pub struct SymbolResolver<R, D> {
    reader: R,
    demangler: D,
}

impl<R: DebugInfoReader, D: NameDemangler> SymbolResolver<R, D> {
    pub fn new(reader: R, demangler: D) -> Self {
        Self { reader, demangler }
    }

    /// Run one resolution pass over `image` using the container at `path`.
    ///
    /// The container is not validated against the image (no GUID or
    /// timestamp matching): a mismatched pair produces misnamed functions
    /// at wrong addresses, not a failure.
    pub fn resolve(
        &self,
        image: &mut impl BinaryImage,
        path: &Path,
    ) -> Result<ResolutionReport, ResolveError> {
        let debug_info = self.reader.load(path).map_err(ResolveError::ContainerLoad)?;
        let sections = debug_info
            .section_table()
            .ok_or(ResolveError::MissingSectionTable)?;
        let symbols = debug_info
            .symbols
            .as_deref()
            .ok_or(ResolveError::MissingSymbolStream)?;

        let mut report = ResolutionReport {
            symbols_seen: symbols.len(),
            ..ResolutionReport::default()
        };
        for symbol in symbols {
            let outcome = self.resolve_one(symbol, sections, image);
            if let Outcome::Skipped(reason) = outcome {
                tracing::debug!("skipping symbol {:?}: {}", symbol, reason);
            }
            report.record(outcome);
        }

        image.wait_for_analysis();
        Ok(report)
    }

    /// Resolve a single symbol record against `sections` and `image`.
    pub fn resolve_one(
        &self,
        symbol: &GlobalSymbol,
        sections: &SectionTable,
        image: &mut impl BinaryImage,
    ) -> Outcome {
        match symbol.kind {
            Some(SymbolKind::Function) => {}
            Some(_) => return Outcome::NotAFunction,
            None => return Outcome::Skipped(SkipReason::MissingAttribute),
        }

        let (Some(segment), Some(offset)) = (symbol.segment, symbol.offset) else {
            return Outcome::Skipped(SkipReason::MissingAttribute);
        };
        let Some(section) = sections.by_segment(segment) else {
            return Outcome::Skipped(SkipReason::UnresolvedSegment);
        };

        let address = image.image_base() + u64::from(offset) + u64::from(section.virtual_address);
        let arch = image.architecture();
        image.ensure_function_at(address, arch);
        let Some(function) = image.function_at(address, arch) else {
            return Outcome::Skipped(SkipReason::NoFunctionAtAddress);
        };

        let Some(mangled) = symbol.name.as_deref() else {
            return Outcome::Skipped(SkipReason::MissingAttribute);
        };
        let result = match self.demangler.demangle(arch, mangled) {
            Ok(result) => result,
            Err(err) => {
                tracing::debug!("failed to demangle {}: {:#}", mangled, err);
                return Outcome::Skipped(SkipReason::Demangle);
            }
        };
        if let NameResult::Candidates(names) = &result {
            tracing::debug!("demangler returned multiple candidates: {:?}", names);
        }
        let Some(name) = result.into_name() else {
            return Outcome::Skipped(SkipReason::Demangle);
        };

        function.set_name(name);
        Outcome::Named
    }
}
