//! Binary image function table.
//!
//! The resolver annotates an already-loaded binary through the
//! `BinaryImage` trait: it asks for functions to exist at addresses it
//! computed and assigns their display names. The image owns the function
//! table and decides which addresses are valid.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use object::read::{Object, ObjectSection};
use object::SectionKind;

/// CPU architecture of a loaded image, forwarded to the demangler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    X86,
    X86_64,
    Arm64,
    Unknown,
}

/// A function known to the image, keyed by its start address.
#[derive(Debug, Clone)]
pub struct Function {
    address: u64,
    name: Option<String>,
}

impl Function {
    pub fn new(address: u64) -> Self {
        Self { address, name: None }
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set the display name. Later assignments overwrite earlier ones.
    pub fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }
}

/// The mutable view of a loaded binary that the resolver annotates.
///
/// The resolver is the sole mutator of the image for the duration of a
/// pass; exclusivity is expressed through `&mut` rather than locking.
pub trait BinaryImage {
    /// Base virtual address the image is loaded at.
    fn image_base(&self) -> u64;

    /// Architecture of the image, used as demangling context.
    fn architecture(&self) -> Architecture;

    /// Ensure a function exists at `address`. Idempotent; an address the
    /// image considers invalid is left without a function.
    fn ensure_function_at(&mut self, address: u64, arch: Architecture);

    /// The function starting at `address`, if the image has one.
    fn function_at(&mut self, address: u64, arch: Architecture) -> Option<&mut Function>;

    /// Block until any re-analysis triggered by function changes completes.
    fn wait_for_analysis(&mut self);
}

/// An offline PE image parsed with `object`.
///
/// Stands in for a live analysis database: it tracks a function table in
/// memory and accepts functions only inside executable sections.
pub struct PeImage {
    base: u64,
    architecture: Architecture,
    text_ranges: Vec<(u64, u64)>,
    functions: BTreeMap<u64, Function>,
}

impl PeImage {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let file = object::File::parse(data).context("failed to parse binary image")?;

        let architecture = match file.architecture() {
            object::Architecture::I386 => Architecture::X86,
            object::Architecture::X86_64 => Architecture::X86_64,
            object::Architecture::Aarch64 => Architecture::Arm64,
            other => {
                tracing::debug!("unrecognized image architecture {:?}", other);
                Architecture::Unknown
            }
        };

        let mut text_ranges = Vec::new();
        for section in file.sections() {
            if section.kind() == SectionKind::Text {
                let start = section.address();
                text_ranges.push((start, start + section.size()));
            }
        }

        Ok(Self {
            base: file.relative_address_base(),
            architecture,
            text_ranges,
            functions: BTreeMap::new(),
        })
    }

    fn is_executable(&self, address: u64) -> bool {
        self.text_ranges
            .iter()
            .any(|&(start, end)| address >= start && address < end)
    }

    /// Functions currently known to the image, in address order.
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.values()
    }
}

impl BinaryImage for PeImage {
    fn image_base(&self) -> u64 {
        self.base
    }

    fn architecture(&self) -> Architecture {
        self.architecture
    }

    fn ensure_function_at(&mut self, address: u64, _arch: Architecture) {
        if !self.is_executable(address) {
            tracing::debug!("no executable section covers {:#x}", address);
            return;
        }
        self.functions
            .entry(address)
            .or_insert_with(|| Function::new(address));
    }

    fn function_at(&mut self, address: u64, _arch: Architecture) -> Option<&mut Function> {
        self.functions.get_mut(&address)
    }

    fn wait_for_analysis(&mut self) {
        // Offline table; nothing re-analyzes in the background.
    }
}
