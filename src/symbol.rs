//! Global symbol records.
//!
//! A `GlobalSymbol` is one entry of the container's global symbol stream.
//! Records in the wild are frequently incomplete, so every attribute is an
//! explicit `Option`: a missing attribute makes that one record
//! unresolvable without affecting the rest of the stream.

/// Discriminant of a global symbol record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// A public function symbol, the only kind the resolver acts on.
    Function,
    /// Any other record kind, carrying the raw discriminant from the stream.
    Other(u16),
}

/// A single record from the global symbol stream.
#[derive(Debug, Clone, Default)]
pub struct GlobalSymbol {
    pub kind: Option<SymbolKind>,
    /// 1-based index into the section table.
    pub segment: Option<u16>,
    /// Offset relative to the start of the containing segment.
    pub offset: Option<u32>,
    /// Mangled name as stored in the container.
    pub name: Option<String>,
}
