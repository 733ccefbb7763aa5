//! Interned symbols.
//!
//! A symbol is the global handle for a declaration. Occurrences across
//! files and packages resolve to the same [`SymbolId`], which is `Copy`,
//! hashable, and safe to use as a map key for the lifetime of the program.

use std::collections::HashMap;
use std::fmt;

/// Identity of one declared symbol within a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sym_{}", self.0)
    }
}

/// What kind of declaration a symbol stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Var,
    Const,
    Func,
    Method,
    Type,
    /// Predeclared identifier from the universe scope.
    Builtin,
}

/// Resolved data for one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolData {
    pub name: String,
    pub kind: SymbolKind,
    /// Effective path of the defining package; `None` for universe symbols.
    pub package: Option<String>,
}

/// Program-wide symbol interner.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<SymbolData>,
    index: HashMap<(Option<String>, String, SymbolKind), SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Intern a symbol, returning the existing id when the same
    /// (package, name, kind) triple was seen before.
    pub fn intern(
        &mut self,
        package: Option<&str>,
        name: &str,
        kind: SymbolKind,
    ) -> SymbolId {
        let key = (package.map(str::to_string), name.to_string(), kind);
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(SymbolData {
            name: name.to_string(),
            kind,
            package: package.map(str::to_string),
        });
        self.index.insert(key, id);
        id
    }

    /// Look up a symbol without interning.
    pub fn find(&self, package: Option<&str>, name: &str, kind: SymbolKind) -> Option<SymbolId> {
        let key = (package.map(str::to_string), name.to_string(), kind);
        self.index.get(&key).copied()
    }

    pub fn data(&self, id: SymbolId) -> &SymbolData {
        &self.symbols[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let mut table = SymbolTable::new();
        let a = table.intern(Some("root/a"), "B", SymbolKind::Var);
        let b = table.intern(Some("root/a"), "B", SymbolKind::Var);
        assert_eq!(a, b);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn kind_distinguishes_symbols() {
        let mut table = SymbolTable::new();
        let var = table.intern(Some("root/a"), "B", SymbolKind::Var);
        let func = table.intern(Some("root/a"), "B", SymbolKind::Func);
        assert_ne!(var, func);
    }

    #[test]
    fn universe_symbols_have_no_package() {
        let mut table = SymbolTable::new();
        let id = table.intern(None, "len", SymbolKind::Builtin);
        assert_eq!(table.data(id).package, None);
    }
}
