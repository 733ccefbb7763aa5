//! Per-package state file synthesis.
//!
//! Every in-scope package gains one generated file, `package-state.go`,
//! holding a `PackageState` struct and its `NewPackageState` constructor.
//!
//! Struct fields come in two groups. Import fields point at the state of
//! every imported in-scope package, named by the unique-name picker seeded
//! with the imported package's short name (names assigned in effective-path
//! order, fields emitted sorted by field name). Variable fields carry the
//! package's former package-level variables: one multi-name field per
//! written-out type, one field per name where the type was inferred,
//! wildcards dropped, sorted by first name.
//!
//! The constructor takes one `*PackageState` parameter per imported
//! package, assigns them into the matching fields, then replays the
//! package's initialization order as `pstate.<name> = <initializer>`
//! assignments. The initializer expressions are transplanted unchanged,
//! node identities intact, so the later rewrite passes adjust them exactly
//! like any other use site.

use std::collections::HashMap;

use itertools::Itertools;
use tracing::debug;

use statelift_core::error::{LiftError, LiftResult};
use statelift_core::names::UniqueNamePicker;
use statelift_core::program::Program;
use statelift_core::types::SemType;
use statelift_syntax::ast::*;

use crate::lift::STATE_FILE;
use crate::typeconv::type_to_syntax;

const STATE_TYPE: &str = "PackageState";
const STATE_LOCAL: &str = "pstate";

/// Generate the state file for every package.
pub(crate) fn synthesize(program: &mut Program) -> LiftResult<()> {
    let paths: Vec<String> = program.packages.keys().cloned().collect();
    for effective in &paths {
        synthesize_package(program, effective)?;
    }
    Ok(())
}

fn synthesize_package(program: &mut Program, effective: &str) -> LiftResult<()> {
    let Program { packages, ids, .. } = program;

    // Import fields: names are assigned iterating imports by effective
    // path; self-imports through vendoring are excluded.
    let (import_fields, var_fields) = {
        let Some(pkg) = packages.get(effective) else {
            return Ok(());
        };

        let mut picker = UniqueNamePicker::new();
        let mut import_fields: Vec<(String, String)> = Vec::new();
        for (import_path, _) in pkg.imports.iter() {
            if import_path == effective {
                continue;
            }
            let Some(imported) = packages.get(import_path) else {
                continue;
            };
            let field = picker.pick(&imported.name);
            import_fields.push((import_path.clone(), field));
        }

        let mut var_fields: Vec<(Vec<String>, SemType)> = Vec::new();
        for file in &pkg.files {
            for decl in &file.decls {
                let Decl::Var(var) = decl else { continue };
                for spec in &var.specs {
                    if !pkg.pkg_var_specs.contains(&spec.id) {
                        continue;
                    }
                    if spec.ty.is_some() {
                        // One field declares every name of the written type.
                        let names: Vec<String> = spec
                            .names
                            .iter()
                            .filter(|n| !n.is_wildcard())
                            .map(|n| n.name.clone())
                            .collect();
                        if names.is_empty() {
                            continue;
                        }
                        let sem = pkg.expr_types.get(&spec.id).ok_or_else(|| {
                            LiftError::load(format!(
                                "{}: missing type for variable specification",
                                effective
                            ))
                        })?;
                        var_fields.push((names, sem.clone()));
                    } else {
                        // Inferred types are per name/value pair.
                        for (name, value) in spec.names.iter().zip(spec.values.iter()) {
                            if name.is_wildcard() {
                                continue;
                            }
                            let sem =
                                pkg.expr_types.get(&value.node_id()).ok_or_else(|| {
                                    LiftError::load(format!(
                                        "{}: missing type for initializer of {}",
                                        effective, name.name
                                    ))
                                })?;
                            var_fields.push((vec![name.name.clone()], sem.clone()));
                        }
                    }
                }
            }
        }
        (import_fields, var_fields)
    };

    // Build struct fields: import fields sorted by field name, variable
    // fields sorted by first name, each group under its banner comment.
    let mut fields: Vec<StructField> = Vec::new();
    for (import_path, field_name) in import_fields
        .iter()
        .sorted_by(|a, b| a.1.cmp(&b.1))
    {
        fields.push(StructField {
            id: ids.fresh(),
            names: vec![Ident::new(ids.fresh(), field_name)],
            ty: TypeExpr::Pointer(Box::new(TypeExpr::Name(Ident::qualified(
                ids.fresh(),
                STATE_TYPE,
                import_path,
            )))),
            tag: None,
            comments: Vec::new(),
            blank_before: false,
        });
    }
    if let Some(first) = fields.first_mut() {
        first.comments.push("// Package imports".to_string());
    }

    let import_count = fields.len();
    for (names, sem) in var_fields
        .iter()
        .sorted_by(|a, b| a.0.first().cmp(&b.0.first()))
    {
        let ty = type_to_syntax(sem, effective, ids).map_err(LiftError::from)?;
        fields.push(StructField {
            id: ids.fresh(),
            names: names
                .iter()
                .map(|name| Ident::new(ids.fresh(), name))
                .collect(),
            ty,
            tag: None,
            comments: Vec::new(),
            blank_before: false,
        });
    }
    if let Some(first_var) = fields.get_mut(import_count) {
        first_var.comments.push("// Package level vars".to_string());
        first_var.blank_before = import_count > 0;
    }

    let state_type = Decl::Type(TypeDecl {
        id: ids.fresh(),
        grouped: false,
        specs: vec![TypeSpec {
            id: ids.fresh(),
            name: Ident::new(ids.fresh(), STATE_TYPE),
            assign: false,
            ty: TypeExpr::Struct(StructType { fields }),
            comments: Vec::new(),
        }],
        comments: Vec::new(),
    });

    // Take the initializer expressions out of the original declarations;
    // the declarations themselves are deleted by a later pass.
    let Some(pkg) = packages.get_mut(effective) else {
        return Ok(());
    };
    let mut initializers: HashMap<NodeId, Expr> = HashMap::new();
    for file in &mut pkg.files {
        for decl in &mut file.decls {
            let Decl::Var(var) = decl else { continue };
            for spec in &mut var.specs {
                if !pkg.pkg_var_specs.contains(&spec.id) {
                    continue;
                }
                let values = std::mem::take(&mut spec.values);
                for (name, value) in spec.names.iter().zip(values.into_iter()) {
                    if name.is_wildcard() {
                        continue;
                    }
                    initializers.insert(value.node_id(), value);
                }
            }
        }
    }

    // Constructor: allocate, wire imports, replay the initialization order.
    let mut params: Vec<Param> = Vec::new();
    let mut body: Vec<Stmt> = Vec::new();

    body.push(Stmt::Assign {
        id: ids.fresh(),
        lhs: vec![Expr::Ident(Ident::new(ids.fresh(), STATE_LOCAL))],
        op: AssignOp::Define,
        rhs: vec![Expr::Unary {
            id: ids.fresh(),
            op: UnaryOp::Amp,
            x: Box::new(Expr::Composite {
                id: ids.fresh(),
                ty: Some(TypeExpr::Name(Ident::new(ids.fresh(), STATE_TYPE))),
                elts: Vec::new(),
            }),
        }],
    });

    for (import_path, field_name) in &import_fields {
        let param_name = format!("{}{}", field_name, STATE_TYPE);
        params.push(Param {
            id: ids.fresh(),
            names: vec![Ident::new(ids.fresh(), &param_name)],
            ty: TypeExpr::Pointer(Box::new(TypeExpr::Name(Ident::qualified(
                ids.fresh(),
                STATE_TYPE,
                import_path,
            )))),
            variadic: false,
        });
        body.push(Stmt::Assign {
            id: ids.fresh(),
            lhs: vec![selector(ids, STATE_LOCAL, field_name)],
            op: AssignOp::Assign,
            rhs: vec![Expr::Ident(Ident::new(ids.fresh(), &param_name))],
        });
    }

    for entry in &pkg.init_order {
        let Some(value) = initializers.remove(&entry.expr) else {
            return Err(LiftError::MissingSymbol {
                name: entry.name.clone(),
            });
        };
        body.push(Stmt::Assign {
            id: ids.fresh(),
            lhs: vec![selector(ids, STATE_LOCAL, &entry.name)],
            op: AssignOp::Assign,
            rhs: vec![value],
        });
    }

    body.push(Stmt::Return {
        id: ids.fresh(),
        results: vec![Expr::Ident(Ident::new(ids.fresh(), STATE_LOCAL))],
    });

    let constructor = Decl::Func(FuncDecl {
        id: ids.fresh(),
        name: Ident::new(ids.fresh(), "NewPackageState"),
        recv: None,
        sig: Signature {
            params,
            results: vec![Param {
                id: ids.fresh(),
                names: Vec::new(),
                ty: TypeExpr::Pointer(Box::new(TypeExpr::Name(Ident::new(
                    ids.fresh(),
                    STATE_TYPE,
                )))),
                variadic: false,
            }],
        },
        body: Some(Block {
            id: ids.fresh(),
            stmts: body,
        }),
        comments: Vec::new(),
    });

    pkg.import_field_names = import_fields.into_iter().collect();
    pkg.files.push(File {
        id: ids.fresh(),
        name: STATE_FILE.to_string(),
        package: pkg.name.clone(),
        doc: Vec::new(),
        imports: Vec::new(),
        decls: vec![state_type, constructor],
    });
    debug!(path = %effective, "state file synthesized");
    Ok(())
}

fn selector(ids: &mut NodeIdGen, base: &str, field: &str) -> Expr {
    Expr::Selector {
        id: ids.fresh(),
        x: Box::new(Expr::Ident(Ident::new(ids.fresh(), base))),
        sel: Ident::new(ids.fresh(), field),
    }
}
