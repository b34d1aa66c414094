//! Symbol name demangling.
//!
//! Public symbols in a PDB carry compiler-encoded (mangled) names. The
//! resolver hands each mangled name to a `NameDemangler` together with the
//! image's architecture and assigns the recovered name to the function.

use anyhow::{bail, Result};
use symbolic::common::{Language, Name, NameMangling};
use symbolic::demangle::{Demangle, DemangleOptions};

use crate::image::Architecture;

/// Result of demangling one symbol name.
///
/// Demanglers do not agree on an output shape: some produce a single
/// rendered name, others an ordered list of candidates. Callers normalize
/// with [`NameResult::into_name`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameResult {
    Single(String),
    Candidates(Vec<String>),
}

impl NameResult {
    /// Collapse to one name; the first candidate wins.
    pub fn into_name(self) -> Option<String> {
        match self {
            NameResult::Single(name) => Some(name),
            NameResult::Candidates(names) => names.into_iter().next(),
        }
    }
}

/// Recovers human-readable identifiers from mangled symbol names.
pub trait NameDemangler {
    fn demangle(&self, arch: Architecture, mangled: &str) -> Result<NameResult>;
}

/// Demangler for MSVC-mangled names, backed by `symbolic`.
pub struct MsvcDemangler;

impl NameDemangler for MsvcDemangler {
    fn demangle(&self, _arch: Architecture, mangled: &str) -> Result<NameResult> {
        // Plain C names carry no mangling; keep them as-is.
        if !mangled.starts_with('?') {
            return Ok(NameResult::Single(mangled.to_string()));
        }

        let name = Name::new(mangled, NameMangling::Mangled, Language::Unknown);
        match name.demangle(DemangleOptions::complete()) {
            Some(demangled) => Ok(NameResult::Single(demangled)),
            None => bail!("unable to demangle {mangled}"),
        }
    }
}
