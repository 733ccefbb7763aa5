//! Program and package model.
//!
//! A [`Program`] owns the set of in-scope packages, keyed and iterated by
//! effective path so every pass sees packages in the same lexicographic
//! order. Each [`Package`] owns its syntax, the maps the binder and checker
//! produced for it, and the classification sets populated by the discovery
//! passes.
//!
//! Classification sets index syntax nodes by [`NodeId`], never by structural
//! equality: ids stay valid while nodes move, and mutation passes look them
//! up against the live tree.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

use statelift_syntax::ast::File;
use statelift_syntax::{NodeId, NodeIdGen};

use crate::symbol::{SymbolId, SymbolTable};
use crate::types::SemType;

/// One import of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRef {
    /// Canonical path as resolved (may contain a vendor segment).
    pub path: String,
    /// Short name of the imported package (its package clause).
    pub name: String,
}

/// One entry of a package's initialization order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitEntry {
    /// Variable name being initialized.
    pub name: String,
    /// Symbol of the variable.
    pub sym: SymbolId,
    /// Node id of the initializer expression.
    pub expr: NodeId,
}

/// One package of the program.
#[derive(Debug, Default)]
pub struct Package {
    /// Canonical import path (may contain a vendor segment).
    pub path: String,
    /// Vendor-stripped path; the identity used everywhere.
    pub effective_path: String,
    /// Short package name from the package clause.
    pub name: String,
    /// On-disk directory.
    pub dir: PathBuf,
    /// Primary file set: non-test files, plus same-package test files when
    /// tests are loaded. Sorted by file name.
    pub files: Vec<File>,
    /// External-test-package files (`package x_test`), when tests are loaded.
    pub test_files: Vec<File>,

    /// Declaring identifier → symbol.
    pub defs: HashMap<NodeId, SymbolId>,
    /// Referencing identifier → symbol.
    pub uses: HashMap<NodeId, SymbolId>,
    /// Expression / written-type node → semantic type.
    pub expr_types: HashMap<NodeId, SemType>,
    /// Package-level initializers in initialization order.
    pub init_order: Vec<InitEntry>,
    /// Imports keyed by effective path.
    pub imports: BTreeMap<String, ImportRef>,

    // Classification sets, populated by the discovery passes and read-only
    // afterwards.
    /// Symbols of package-level variables.
    pub pkg_vars: HashSet<SymbolId>,
    /// Package-level `var` declaration nodes (to be deleted).
    pub pkg_var_decls: HashSet<NodeId>,
    /// Package-level value-spec nodes within those declarations.
    pub pkg_var_specs: HashSet<NodeId>,
    /// Symbols of top-level functions.
    pub funcs: HashSet<SymbolId>,
    /// Declaration nodes of top-level functions.
    pub func_decls: HashSet<NodeId>,
    /// Declaration nodes of methods.
    pub method_decls: HashSet<NodeId>,
    /// Type-spec nodes whose defining syntax is a struct literal.
    pub struct_specs: HashSet<NodeId>,
    /// Type-spec nodes for every other named type.
    pub alias_specs: HashSet<NodeId>,
    /// Identifier occurrences resolving to a package-level variable.
    pub var_uses: HashSet<NodeId>,
    /// Callee identifier occurrences resolving to a top-level function.
    pub func_uses: HashSet<NodeId>,
    /// Effective path of an imported package → its field name in this
    /// package's generated state struct.
    pub import_field_names: BTreeMap<String, String>,
}

impl Package {
    pub fn new(path: &str, effective_path: &str) -> Self {
        Package {
            path: path.to_string(),
            effective_path: effective_path.to_string(),
            ..Package::default()
        }
    }

    /// All files subject to analysis and rewriting, primary set first.
    pub fn all_files(&self) -> impl Iterator<Item = &File> {
        self.files.iter().chain(self.test_files.iter())
    }

    pub fn all_files_mut(&mut self) -> impl Iterator<Item = &mut File> {
        self.files.iter_mut().chain(self.test_files.iter_mut())
    }
}

/// The whole in-scope program.
#[derive(Debug, Default)]
pub struct Program {
    /// Effective path of the entry package.
    pub entry: String,
    /// Packages keyed by effective path; iteration order is the pass order.
    pub packages: BTreeMap<String, Package>,
    /// Program-wide symbol interner.
    pub symbols: SymbolTable,
    /// Node id allocator; synthesis draws generated nodes from it.
    pub ids: NodeIdGen,
}

impl Program {
    pub fn new(entry: &str) -> Self {
        Program {
            entry: entry.to_string(),
            ..Program::default()
        }
    }

    pub fn package(&self, effective_path: &str) -> Option<&Package> {
        self.packages.get(effective_path)
    }

    pub fn package_mut(&mut self, effective_path: &str) -> Option<&mut Package> {
        self.packages.get_mut(effective_path)
    }

    /// The package defining `sym`, when it is one of ours.
    pub fn defining_package(&self, sym: SymbolId) -> Option<&Package> {
        let data = self.symbols.data(sym);
        data.package
            .as_deref()
            .and_then(|path| self.packages.get(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolKind;

    #[test]
    fn packages_iterate_in_effective_path_order() {
        let mut program = Program::new("root/main");
        for path in ["root/main", "root/a", "root/b"] {
            program
                .packages
                .insert(path.to_string(), Package::new(path, path));
        }
        let order: Vec<&str> = program.packages.keys().map(String::as_str).collect();
        assert_eq!(order, vec!["root/a", "root/b", "root/main"]);
    }

    #[test]
    fn defining_package_resolves_through_symbols() {
        let mut program = Program::new("root/a");
        program
            .packages
            .insert("root/a".to_string(), Package::new("root/a", "root/a"));
        let sym = program
            .symbols
            .intern(Some("root/a"), "B", SymbolKind::Var);
        assert_eq!(
            program.defining_package(sym).map(|p| p.effective_path.as_str()),
            Some("root/a")
        );
    }
}
