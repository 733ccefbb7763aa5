//! Mutation passes.
//!
//! Applied strictly after analysis, in a fixed order; each pass is a
//! mechanical edit keyed by a classification set populated earlier. The
//! order matters because the sets index nodes by identity: declarations
//! must be consumed before the pass that deletes them.
//!
//! Identifiers qualified by a path whose package is not part of the
//! program never appear in the classification sets, so references into the
//! standard library or third-party code are left untouched.

use std::collections::BTreeMap;

use tracing::debug;

use statelift_core::program::Program;
use statelift_syntax::ast::*;
use statelift_syntax::walk::map_exprs_in_file;

const STATE_TYPE: &str = "PackageState";
const STATE_LOCAL: &str = "pstate";
const RECEIVER_FALLBACK: &str = "recv";

fn state_pointer(ids: &mut NodeIdGen) -> TypeExpr {
    TypeExpr::Pointer(Box::new(TypeExpr::Name(Ident::new(ids.fresh(), STATE_TYPE))))
}

/// Prepend a `pstate *PackageState` field to every named struct type.
pub(crate) fn add_struct_fields(program: &mut Program) {
    let Program { packages, ids, .. } = program;
    for (effective, pkg) in packages.iter_mut() {
        let mut count = 0usize;
        for file in pkg.files.iter_mut().chain(pkg.test_files.iter_mut()) {
            for decl in &mut file.decls {
                let Decl::Type(td) = decl else { continue };
                for spec in &mut td.specs {
                    if !pkg.struct_specs.contains(&spec.id) {
                        continue;
                    }
                    let TypeExpr::Struct(st) = &mut spec.ty else {
                        continue;
                    };
                    st.fields.insert(
                        0,
                        StructField {
                            id: ids.fresh(),
                            names: vec![Ident::new(ids.fresh(), STATE_LOCAL)],
                            ty: state_pointer(ids),
                            tag: None,
                            comments: Vec::new(),
                            blank_before: false,
                        },
                    );
                    count += 1;
                }
            }
        }
        debug!(path = %effective, structs = count, "added struct state fields");
    }
}

/// Replace every non-struct named type `T = X` body with a struct wrapping
/// the original type in a `Value` field next to the state pointer.
pub(crate) fn wrap_aliases(program: &mut Program) {
    let Program { packages, ids, .. } = program;
    for (effective, pkg) in packages.iter_mut() {
        let mut count = 0usize;
        for file in pkg.files.iter_mut().chain(pkg.test_files.iter_mut()) {
            for decl in &mut file.decls {
                let Decl::Type(td) = decl else { continue };
                for spec in &mut td.specs {
                    if !pkg.alias_specs.contains(&spec.id) {
                        continue;
                    }
                    let original = std::mem::replace(
                        &mut spec.ty,
                        TypeExpr::Struct(StructType { fields: Vec::new() }),
                    );
                    spec.ty = TypeExpr::Struct(StructType {
                        fields: vec![
                            StructField {
                                id: ids.fresh(),
                                names: vec![Ident::new(ids.fresh(), STATE_LOCAL)],
                                ty: state_pointer(ids),
                                tag: None,
                                comments: Vec::new(),
                                blank_before: false,
                            },
                            StructField {
                                id: ids.fresh(),
                                names: vec![Ident::new(ids.fresh(), "Value")],
                                ty: original,
                                tag: None,
                                comments: Vec::new(),
                                blank_before: false,
                            },
                        ],
                    });
                    count += 1;
                }
            }
        }
        debug!(path = %effective, aliases = count, "wrapped alias types");
    }
}

/// Prepend a leading `pstate *PackageState` parameter to every top-level
/// function.
pub(crate) fn update_func_signatures(program: &mut Program) {
    let Program { packages, ids, .. } = program;
    for (effective, pkg) in packages.iter_mut() {
        let mut count = 0usize;
        for file in pkg.files.iter_mut().chain(pkg.test_files.iter_mut()) {
            for decl in &mut file.decls {
                let Decl::Func(fd) = decl else { continue };
                if !pkg.func_decls.contains(&fd.id) {
                    continue;
                }
                fd.sig.params.insert(
                    0,
                    Param {
                        id: ids.fresh(),
                        names: vec![Ident::new(ids.fresh(), STATE_LOCAL)],
                        ty: state_pointer(ids),
                        variadic: false,
                    },
                );
                count += 1;
            }
        }
        debug!(path = %effective, funcs = count, "updated function signatures");
    }
}

/// Prepend the state binding to every method body: name the receiver when
/// it has no name, then bind `pstate := <recv>.pstate` and discard it once
/// so methods that never read package state still compile clean.
pub(crate) fn update_method_bodies(program: &mut Program) {
    let Program { packages, ids, .. } = program;
    for (effective, pkg) in packages.iter_mut() {
        let mut count = 0usize;
        for file in pkg.files.iter_mut().chain(pkg.test_files.iter_mut()) {
            for decl in &mut file.decls {
                let Decl::Func(fd) = decl else { continue };
                if !pkg.method_decls.contains(&fd.id) {
                    continue;
                }
                let Some(recv) = &mut fd.recv else { continue };
                let Some(body) = &mut fd.body else { continue };
                if recv.name.is_none() {
                    recv.name = Some(Ident::new(ids.fresh(), RECEIVER_FALLBACK));
                }
                let recv_name = recv
                    .name
                    .as_ref()
                    .map(|n| n.name.clone())
                    .unwrap_or_else(|| RECEIVER_FALLBACK.to_string());

                let bind = Stmt::Assign {
                    id: ids.fresh(),
                    lhs: vec![Expr::Ident(Ident::new(ids.fresh(), STATE_LOCAL))],
                    op: AssignOp::Define,
                    rhs: vec![Expr::Selector {
                        id: ids.fresh(),
                        x: Box::new(Expr::Ident(Ident::new(ids.fresh(), &recv_name))),
                        sel: Ident::new(ids.fresh(), STATE_LOCAL),
                    }],
                };
                let discard = Stmt::Assign {
                    id: ids.fresh(),
                    lhs: vec![Expr::Ident(Ident::new(ids.fresh(), "_"))],
                    op: AssignOp::Assign,
                    rhs: vec![Expr::Ident(Ident::new(ids.fresh(), STATE_LOCAL))],
                };
                body.stmts.insert(0, bind);
                body.stmts.insert(1, discard);
                count += 1;
            }
        }
        debug!(path = %effective, methods = count, "updated method bodies");
    }
}

/// Prepend the state argument to every call whose callee identifier was
/// classified as a use of a top-level function. Same-package callees take
/// `pstate`; cross-package callees take `pstate.<importField>`.
pub(crate) fn update_call_sites(program: &mut Program) {
    let Program { packages, ids, .. } = program;
    for (effective, pkg) in packages.iter_mut() {
        let func_uses = pkg.func_uses.clone();
        let import_fields = pkg.import_field_names.clone();
        let mut count = 0usize;
        for file in pkg.files.iter_mut().chain(pkg.test_files.iter_mut()) {
            map_exprs_in_file(file, &mut |expr| match expr {
                Expr::Call(mut call) => {
                    let qualifier = match call.fun.as_ref() {
                        Expr::Ident(ident) if func_uses.contains(&ident.id) => {
                            Some(ident.path.clone())
                        }
                        _ => None,
                    };
                    if let Some(path) = qualifier {
                        let arg = state_argument(ids, path.as_deref(), &import_fields);
                        call.args.insert(0, arg);
                        count += 1;
                    }
                    Expr::Call(call)
                }
                other => other,
            });
        }
        debug!(path = %effective, calls = count, "updated call sites");
    }
}

fn state_argument(
    ids: &mut NodeIdGen,
    callee_path: Option<&str>,
    import_fields: &BTreeMap<String, String>,
) -> Expr {
    match callee_path {
        None => Expr::Ident(Ident::new(ids.fresh(), STATE_LOCAL)),
        Some(path) => {
            let field = import_fields
                .get(path)
                .cloned()
                .unwrap_or_else(|| path.rsplit('/').next().unwrap_or(path).to_string());
            Expr::Selector {
                id: ids.fresh(),
                x: Box::new(Expr::Ident(Ident::new(ids.fresh(), STATE_LOCAL))),
                sel: Ident::new(ids.fresh(), field),
            }
        }
    }
}

/// Delete every package-level variable declaration.
pub(crate) fn delete_var_decls(program: &mut Program) {
    for (effective, pkg) in program.packages.iter_mut() {
        let mut count = 0usize;
        for file in &mut pkg.files {
            let before = file.decls.len();
            let decls = std::mem::take(&mut file.decls);
            file.decls = decls
                .into_iter()
                .filter(|decl| match decl {
                    Decl::Var(var) => !pkg.pkg_var_decls.contains(&var.id),
                    _ => true,
                })
                .collect();
            count += before - file.decls.len();
        }
        debug!(path = %effective, decls = count, "deleted package-level var declarations");
    }
}

/// Rewrite every recorded variable use into a field selection on the
/// state value: `B` becomes `pstate.B`, `b.V` becomes `pstate.b.V` with
/// the qualifier path cleared.
pub(crate) fn rewrite_var_uses(program: &mut Program) {
    let Program { packages, ids, .. } = program;
    for (effective, pkg) in packages.iter_mut() {
        let var_uses = pkg.var_uses.clone();
        let import_fields = pkg.import_field_names.clone();
        let mut count = 0usize;
        for file in pkg.files.iter_mut().chain(pkg.test_files.iter_mut()) {
            map_exprs_in_file(file, &mut |expr| match expr {
                Expr::Ident(ident) if var_uses.contains(&ident.id) => {
                    count += 1;
                    let base = state_argument(ids, ident.path.as_deref(), &import_fields);
                    Expr::Selector {
                        id: ids.fresh(),
                        x: Box::new(base),
                        sel: Ident {
                            id: ident.id,
                            name: ident.name,
                            path: None,
                        },
                    }
                }
                other => other,
            });
        }
        debug!(path = %effective, uses = count, "rewrote variable uses");
    }
}

/// Rename the entry package's `main` to the library-callable `Main`. Only
/// the first receiverless `main` is renamed.
pub(crate) fn rename_entry_point(program: &mut Program) {
    let entry = program.entry.clone();
    let Some(pkg) = program.packages.get_mut(&entry) else {
        return;
    };
    for file in &mut pkg.files {
        for decl in &mut file.decls {
            if let Decl::Func(fd) = decl {
                if fd.recv.is_none() && fd.name.name == "main" {
                    fd.name.name = "Main".to_string();
                    debug!(path = %entry, file = %file.name, "renamed entry point");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discover;
    use crate::statefile;
    use crate::test_helpers::load_fixture;
    use tokio_util::sync::CancellationToken;

    fn prepare(files: &[(&str, &str)], entry: &str) -> Program {
        let mut program = load_fixture(files, entry);
        let cancel = CancellationToken::new();
        discover::vars(&mut program, &cancel).unwrap();
        discover::var_uses(&mut program, &cancel).unwrap();
        discover::funcs_and_methods(&mut program, &cancel).unwrap();
        discover::func_uses(&mut program, &cancel).unwrap();
        discover::types(&mut program, &cancel).unwrap();
        statefile::synthesize(&mut program).unwrap();
        program
    }

    fn find_func<'p>(program: &'p Program, pkg: &str, name: &str) -> &'p FuncDecl {
        program
            .package(pkg)
            .unwrap()
            .files
            .iter()
            .flat_map(|f| f.decls.iter())
            .find_map(|d| match d {
                Decl::Func(fd) if fd.name.name == name => Some(fd),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn functions_gain_a_leading_state_parameter() {
        let mut program = prepare(&[("a/a.go", "package a\n\nfunc A(x int) {}\n")], "root/a");
        update_func_signatures(&mut program);
        let fd = find_func(&program, "root/a", "A");
        assert_eq!(fd.sig.params.len(), 2);
        assert_eq!(fd.sig.params[0].names[0].name, "pstate");
    }

    #[test]
    fn methods_get_the_state_prelude() {
        let mut program = prepare(
            &[(
                "a/a.go",
                "package a\n\ntype T struct {\n\ti int\n}\n\nfunc (t *T) M() {}\n",
            )],
            "root/a",
        );
        update_method_bodies(&mut program);
        let fd = find_func(&program, "root/a", "M");
        let body = fd.body.as_ref().unwrap();
        assert_eq!(body.stmts.len(), 2);
        assert!(matches!(
            &body.stmts[0],
            Stmt::Assign {
                op: AssignOp::Define,
                ..
            }
        ));
    }

    #[test]
    fn unnamed_receivers_are_named() {
        let mut program = prepare(
            &[(
                "a/a.go",
                "package a\n\ntype T struct {\n\ti int\n}\n\nfunc (*T) M() {}\n",
            )],
            "root/a",
        );
        update_method_bodies(&mut program);
        let fd = find_func(&program, "root/a", "M");
        assert_eq!(fd.recv.as_ref().unwrap().name.as_ref().unwrap().name, "recv");
    }

    #[test]
    fn struct_types_gain_the_state_field() {
        let mut program = prepare(
            &[("a/a.go", "package a\n\ntype T struct {\n\ti int\n}\n")],
            "root/a",
        );
        add_struct_fields(&mut program);
        let pkg = program.package("root/a").unwrap();
        let spec = pkg
            .files
            .iter()
            .flat_map(|f| f.decls.iter())
            .find_map(|d| match d {
                Decl::Type(td) if td.specs[0].name.name == "T" => Some(&td.specs[0]),
                _ => None,
            })
            .unwrap();
        let TypeExpr::Struct(st) = &spec.ty else {
            panic!("expected struct");
        };
        assert_eq!(st.fields[0].names[0].name, "pstate");
        assert_eq!(st.fields.len(), 2);
    }

    #[test]
    fn aliases_are_wrapped_with_value_field() {
        let mut program = prepare(&[("a/a.go", "package a\n\ntype Count int\n")], "root/a");
        wrap_aliases(&mut program);
        let pkg = program.package("root/a").unwrap();
        let spec = pkg
            .files
            .iter()
            .flat_map(|f| f.decls.iter())
            .find_map(|d| match d {
                Decl::Type(td) if td.specs[0].name.name == "Count" => Some(&td.specs[0]),
                _ => None,
            })
            .unwrap();
        let TypeExpr::Struct(st) = &spec.ty else {
            panic!("expected wrapped struct");
        };
        assert_eq!(st.fields.len(), 2);
        assert_eq!(st.fields[1].names[0].name, "Value");
        assert!(matches!(st.fields[1].ty, TypeExpr::Name(_)));
    }

    #[test]
    fn var_decls_are_deleted_and_uses_rewritten() {
        let mut program = prepare(
            &[(
                "a/a.go",
                "package a\n\nvar B int\n\nfunc F() int { return B }\n",
            )],
            "root/a",
        );
        delete_var_decls(&mut program);
        rewrite_var_uses(&mut program);
        let pkg = program.package("root/a").unwrap();
        let has_var = pkg
            .files
            .iter()
            .flat_map(|f| f.decls.iter())
            .any(|d| matches!(d, Decl::Var(_)));
        assert!(!has_var);
        let fd = find_func(&program, "root/a", "F");
        match &fd.body.as_ref().unwrap().stmts[0] {
            Stmt::Return { results, .. } => {
                assert!(matches!(&results[0], Expr::Selector { .. }));
            }
            other => panic!("expected return, got {:?}", other),
        }
    }

    #[test]
    fn entry_main_is_renamed_once() {
        let mut program = prepare(
            &[(
                "main/main.go",
                "package main\n\nfunc main() {}\n\nfunc helper() {}\n",
            )],
            "root/main",
        );
        rename_entry_point(&mut program);
        let pkg = program.package("root/main").unwrap();
        let names: Vec<&str> = pkg
            .files
            .iter()
            .flat_map(|f| f.decls.iter())
            .filter_map(|d| match d {
                Decl::Func(fd) => Some(fd.name.name.as_str()),
                _ => None,
            })
            .collect();
        assert!(names.contains(&"Main"));
        assert!(!names.contains(&"main"));
    }
}
