//! Discovery passes.
//!
//! Each pass walks the program read-only and records node ids or symbols
//! into the owning package's classification sets. All discovery completes
//! before any mutation: the sets index nodes by identity, and those
//! identities are what the rewrite passes look up against the live tree.
//!
//! Variable discovery skips `_test.go` files even when tests are loaded;
//! every other pass covers the test files too, so use sites in tests are
//! rewritten along with the rest.

use std::collections::{HashMap, HashSet};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use statelift_core::error::{LiftError, LiftResult};
use statelift_core::program::Program;
use statelift_core::symbol::SymbolId;
use statelift_syntax::ast::{CallExpr, Decl, Expr, Ident, NodeId, TypeExpr};
use statelift_syntax::walk::{walk_file, Visitor};

/// Find every package-level variable declaration, its value specs, and the
/// symbol each non-wildcard name defines.
pub(crate) fn vars(program: &mut Program, cancel: &CancellationToken) -> LiftResult<()> {
    for (effective, pkg) in program.packages.iter_mut() {
        if cancel.is_cancelled() {
            return Err(LiftError::Canceled);
        }
        for file in &pkg.files {
            if file.name.ends_with("_test.go") {
                continue;
            }
            for decl in &file.decls {
                let Decl::Var(var) = decl else { continue };
                pkg.pkg_var_decls.insert(var.id);
                for spec in &var.specs {
                    pkg.pkg_var_specs.insert(spec.id);
                    for name in &spec.names {
                        if name.is_wildcard() {
                            continue;
                        }
                        match pkg.defs.get(&name.id) {
                            Some(&sym) => {
                                pkg.pkg_vars.insert(sym);
                            }
                            None => {
                                return Err(LiftError::MissingSymbol {
                                    name: name.name.clone(),
                                })
                            }
                        }
                    }
                }
            }
        }
        debug!(path = %effective, vars = pkg.pkg_vars.len(), "discovered package vars");
    }
    Ok(())
}

/// Find every identifier occurrence that resolves to a package-level
/// variable of any in-scope package.
pub(crate) fn var_uses(program: &mut Program, cancel: &CancellationToken) -> LiftResult<()> {
    let all_vars: HashSet<SymbolId> = program
        .packages
        .values()
        .flat_map(|pkg| pkg.pkg_vars.iter().copied())
        .collect();

    for (effective, pkg) in program.packages.iter_mut() {
        if cancel.is_cancelled() {
            return Err(LiftError::Canceled);
        }
        let mut found = UseCollector {
            uses: &pkg.uses,
            wanted: &all_vars,
            hits: HashSet::new(),
        };
        for file in pkg.files.iter().chain(pkg.test_files.iter()) {
            walk_file(&mut found, file);
        }
        debug!(path = %effective, uses = found.hits.len(), "discovered var uses");
        pkg.var_uses = found.hits;
    }
    Ok(())
}

/// Classify every function declaration: methods (non-empty receiver list)
/// and top-level functions, with their defining symbols.
pub(crate) fn funcs_and_methods(
    program: &mut Program,
    cancel: &CancellationToken,
) -> LiftResult<()> {
    for (effective, pkg) in program.packages.iter_mut() {
        if cancel.is_cancelled() {
            return Err(LiftError::Canceled);
        }
        for file in &pkg.files {
            for decl in &file.decls {
                let Decl::Func(fd) = decl else { continue };
                if fd.is_method() {
                    pkg.method_decls.insert(fd.id);
                } else {
                    pkg.func_decls.insert(fd.id);
                    if let Some(&sym) = pkg.defs.get(&fd.name.id) {
                        pkg.funcs.insert(sym);
                    }
                }
            }
        }
        debug!(
            path = %effective,
            funcs = pkg.func_decls.len(),
            methods = pkg.method_decls.len(),
            "discovered functions"
        );
    }
    Ok(())
}

/// Find every call expression whose callee is an identifier resolving to a
/// discovered top-level function.
pub(crate) fn func_uses(program: &mut Program, cancel: &CancellationToken) -> LiftResult<()> {
    let all_funcs: HashSet<SymbolId> = program
        .packages
        .values()
        .flat_map(|pkg| pkg.funcs.iter().copied())
        .collect();

    for (effective, pkg) in program.packages.iter_mut() {
        if cancel.is_cancelled() {
            return Err(LiftError::Canceled);
        }
        let mut found = CalleeCollector {
            uses: &pkg.uses,
            wanted: &all_funcs,
            hits: HashSet::new(),
        };
        for file in pkg.files.iter().chain(pkg.test_files.iter()) {
            walk_file(&mut found, file);
        }
        debug!(path = %effective, uses = found.hits.len(), "discovered func uses");
        pkg.func_uses = found.hits;
    }
    Ok(())
}

/// Classify every named type declaration: struct types are extended in
/// place, everything else is wrapped.
pub(crate) fn types(program: &mut Program, cancel: &CancellationToken) -> LiftResult<()> {
    for (effective, pkg) in program.packages.iter_mut() {
        if cancel.is_cancelled() {
            return Err(LiftError::Canceled);
        }
        for file in &pkg.files {
            for decl in &file.decls {
                let Decl::Type(td) = decl else { continue };
                for spec in &td.specs {
                    match spec.ty {
                        TypeExpr::Struct(_) => {
                            pkg.struct_specs.insert(spec.id);
                        }
                        _ => {
                            pkg.alias_specs.insert(spec.id);
                        }
                    }
                }
            }
        }
        debug!(
            path = %effective,
            structs = pkg.struct_specs.len(),
            aliases = pkg.alias_specs.len(),
            "discovered types"
        );
    }
    Ok(())
}

struct UseCollector<'a> {
    uses: &'a HashMap<NodeId, SymbolId>,
    wanted: &'a HashSet<SymbolId>,
    hits: HashSet<NodeId>,
}

impl<'a> Visitor for UseCollector<'a> {
    fn visit_ident(&mut self, ident: &Ident) {
        if let Some(sym) = self.uses.get(&ident.id) {
            if self.wanted.contains(sym) {
                self.hits.insert(ident.id);
            }
        }
    }
}

struct CalleeCollector<'a> {
    uses: &'a HashMap<NodeId, SymbolId>,
    wanted: &'a HashSet<SymbolId>,
    hits: HashSet<NodeId>,
}

impl<'a> Visitor for CalleeCollector<'a> {
    fn visit_call(&mut self, call: &CallExpr) {
        if let Expr::Ident(ident) = call.fun.as_ref() {
            if let Some(sym) = self.uses.get(&ident.id) {
                if self.wanted.contains(sym) {
                    self.hits.insert(ident.id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::load_fixture;
    use tokio_util::sync::CancellationToken;

    fn discover_all(program: &mut Program) {
        let cancel = CancellationToken::new();
        vars(program, &cancel).unwrap();
        var_uses(program, &cancel).unwrap();
        funcs_and_methods(program, &cancel).unwrap();
        func_uses(program, &cancel).unwrap();
        types(program, &cancel).unwrap();
    }

    #[test]
    fn package_vars_by_package() {
        let mut program = load_fixture(
            &[
                (
                    "main/main.go",
                    "package main\n\nimport \"root/a\"\n\nvar N, M int\n\nfunc main() { a.A() }\n",
                ),
                ("a/a.go", "package a\n\nvar A string\n\nfunc A() {}\n"),
            ],
            "root/main",
        );
        discover_all(&mut program);

        let mut out = Vec::new();
        for (path, pkg) in &program.packages {
            let mut names: Vec<String> = pkg
                .pkg_vars
                .iter()
                .map(|&sym| program.symbols.data(sym).name.clone())
                .collect();
            names.sort();
            out.push(format!("{}: {:?}", path, names));
        }
        assert_eq!(
            out.join(", "),
            "root/a: [\"A\"], root/main: [\"M\", \"N\"]"
        );
    }

    #[test]
    fn wildcard_names_define_no_symbol() {
        let mut program = load_fixture(
            &[("a/a.go", "package a\n\nvar _, B = 1, 2\n")],
            "root/a",
        );
        discover_all(&mut program);
        let pkg = program.package("root/a").unwrap();
        assert_eq!(pkg.pkg_vars.len(), 1);
    }

    #[test]
    fn var_uses_cross_package() {
        let mut program = load_fixture(
            &[
                (
                    "a/a.go",
                    "package a\n\nimport \"root/b\"\n\nfunc A() int { return b.V }\n",
                ),
                ("b/b.go", "package b\n\nvar V int\n"),
            ],
            "root/a",
        );
        discover_all(&mut program);
        assert_eq!(program.package("root/a").unwrap().var_uses.len(), 1);
        assert_eq!(program.package("root/b").unwrap().var_uses.len(), 0);
    }

    #[test]
    fn local_shadowing_is_not_a_var_use() {
        let mut program = load_fixture(
            &[(
                "a/a.go",
                "package a\n\nvar B int\n\nfunc F() int {\n\tB := 2\n\treturn B\n}\n",
            )],
            "root/a",
        );
        discover_all(&mut program);
        assert_eq!(program.package("root/a").unwrap().var_uses.len(), 0);
    }

    #[test]
    fn assignment_to_package_var_is_a_use() {
        let mut program = load_fixture(
            &[(
                "a/a.go",
                "package a\n\nvar B int\n\nfunc F() {\n\tB = 2\n}\n",
            )],
            "root/a",
        );
        discover_all(&mut program);
        assert_eq!(program.package("root/a").unwrap().var_uses.len(), 1);
    }

    #[test]
    fn funcs_and_methods_are_disjoint() {
        let mut program = load_fixture(
            &[(
                "a/a.go",
                "package a\n\ntype T struct {\n\ti int\n}\n\nfunc F() {}\n\nfunc (t *T) M() {}\n",
            )],
            "root/a",
        );
        discover_all(&mut program);
        let pkg = program.package("root/a").unwrap();
        assert_eq!(pkg.func_decls.len(), 1);
        assert_eq!(pkg.method_decls.len(), 1);
        assert!(pkg.func_decls.is_disjoint(&pkg.method_decls));
    }

    #[test]
    fn qualified_and_bare_callees_are_func_uses() {
        let mut program = load_fixture(
            &[
                (
                    "a/a.go",
                    "package a\n\nimport \"root/b\"\n\nfunc A() {\n\tb.B()\n\thelper()\n}\n\nfunc helper() {}\n",
                ),
                ("b/b.go", "package b\n\nfunc B() {}\n"),
            ],
            "root/a",
        );
        discover_all(&mut program);
        assert_eq!(program.package("root/a").unwrap().func_uses.len(), 2);
    }

    #[test]
    fn struct_and_alias_classification_is_disjoint() {
        let mut program = load_fixture(
            &[(
                "a/a.go",
                "package a\n\ntype T struct {\n\ti int\n}\n\ntype Count int\n",
            )],
            "root/a",
        );
        discover_all(&mut program);
        let pkg = program.package("root/a").unwrap();
        assert_eq!(pkg.struct_specs.len(), 1);
        assert_eq!(pkg.alias_specs.len(), 1);
        assert!(pkg.struct_specs.is_disjoint(&pkg.alias_specs));
    }

    #[test]
    fn vars_in_test_files_are_skipped() {
        let mut program = crate::test_helpers::load_fixture_with_tests(
            &[
                ("a/a.go", "package a\n\nvar B int\n"),
                ("a/a_test.go", "package a\n\nvar testOnly int\n"),
            ],
            "root/a",
        );
        discover_all(&mut program);
        assert_eq!(program.package("root/a").unwrap().pkg_vars.len(), 1);
    }
}
