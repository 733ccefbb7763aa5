//! Typing of package-level variable declarations and initialization order.
//!
//! The transformer only consumes types for the declarations it lifts into
//! state structs, so checking is scoped to exactly that: written type
//! expressions of package-level `var` declarations, and initializer
//! inference where the type is omitted. Function bodies are never typed.
//!
//! Initialization order is declaration order (files sorted by name),
//! topologically adjusted so an initializer reading another package-level
//! variable of the same package runs after that variable's own
//! initializer. Cycles are load failures.

use std::collections::{HashMap, HashSet};

use tokio_util::sync::CancellationToken;

use statelift_core::error::{LiftError, LiftResult};
use statelift_core::program::{InitEntry, Program};
use statelift_core::symbol::{SymbolId, SymbolKind, SymbolTable};
use statelift_core::types::{BasicKind, ChanDir, SemField, SemParam, SemType};
use statelift_syntax::ast::{
    CallExpr, ChanDir as SynChanDir, Decl, Expr, Ident, Lit, LitKind, NodeId, Signature, TypeExpr,
};
use statelift_syntax::walk::{walk_expr, Visitor};

use super::LoadError;

/// Named-type definitions across the program: (effective path, name) → the
/// defining type expression.
type TypeDefs = HashMap<(String, String), TypeExpr>;

/// Top-level function signatures: (effective path, name) → signature.
type FuncSigs = HashMap<(String, String), Signature>;

/// Type every package-level variable declaration and record each package's
/// initialization order. `order` is the topological package order from
/// discovery, which guarantees imported packages are typed first.
pub(crate) fn check_program(
    program: &mut Program,
    order: &[String],
    cancel: &CancellationToken,
) -> LiftResult<()> {
    let mut type_defs = TypeDefs::new();
    let mut func_sigs = FuncSigs::new();
    for (effective, pkg) in &program.packages {
        for file in &pkg.files {
            for decl in &file.decls {
                match decl {
                    Decl::Type(td) => {
                        for spec in &td.specs {
                            type_defs.insert(
                                (effective.clone(), spec.name.name.clone()),
                                spec.ty.clone(),
                            );
                        }
                    }
                    Decl::Func(fd) if fd.recv.is_none() => {
                        func_sigs.insert(
                            (effective.clone(), fd.name.name.clone()),
                            fd.sig.clone(),
                        );
                    }
                    _ => {}
                }
            }
        }
    }

    let mut var_types: HashMap<(String, String), SemType> = HashMap::new();

    for effective in order {
        if cancel.is_cancelled() {
            return Err(LiftError::Canceled);
        }
        check_package(program, effective, &type_defs, &func_sigs, &mut var_types)?;
    }
    Ok(())
}

/// One package-level initializer before ordering.
struct RawInit {
    name: String,
    sym: SymbolId,
    expr: NodeId,
    /// The spec carried a written type, so inference is unnecessary.
    typed: bool,
    value: Expr,
}

fn check_package(
    program: &mut Program,
    effective: &str,
    type_defs: &TypeDefs,
    func_sigs: &FuncSigs,
    var_types: &mut HashMap<(String, String), SemType>,
) -> LiftResult<()> {
    // Immutable phase: collect specs, resolve written types, gather raw
    // initializer entries with cloned expressions.
    let (written, raws, package_vars) = {
        let Some(pkg) = program.packages.get(effective) else {
            return Ok(());
        };
        let checker = Checker {
            type_defs,
            func_sigs,
            var_types,
            uses: &pkg.uses,
            symbols: &program.symbols,
        };

        // spec node → (semantic type, variable names)
        let mut written: Vec<(NodeId, SemType, Vec<String>)> = Vec::new();
        let mut raws: Vec<RawInit> = Vec::new();
        let mut package_vars: HashSet<SymbolId> = HashSet::new();

        for file in &pkg.files {
            if file.name.ends_with("_test.go") {
                continue;
            }
            for decl in &file.decls {
                let Decl::Var(var) = decl else { continue };
                for spec in &var.specs {
                    let typed = spec.ty.is_some();
                    if let Some(ty) = &spec.ty {
                        let sem = checker.resolve_type(ty, effective)?;
                        let names: Vec<String> = spec
                            .names
                            .iter()
                            .filter(|n| !n.is_wildcard())
                            .map(|n| n.name.clone())
                            .collect();
                        written.push((spec.id, sem, names));
                    }
                    if !spec.values.is_empty() && spec.values.len() != spec.names.len() {
                        return Err(LoadError::Type {
                            message: format!(
                                "{}: initializer count does not match variable count",
                                effective
                            ),
                        }
                        .into());
                    }
                    for name in &spec.names {
                        if name.is_wildcard() {
                            continue;
                        }
                        if let Some(&sym) = pkg.defs.get(&name.id) {
                            package_vars.insert(sym);
                        }
                    }
                    for (name, value) in spec.names.iter().zip(spec.values.iter()) {
                        if name.is_wildcard() {
                            continue;
                        }
                        let Some(&sym) = pkg.defs.get(&name.id) else {
                            return Err(LiftError::MissingSymbol {
                                name: name.name.clone(),
                            });
                        };
                        raws.push(RawInit {
                            name: name.name.clone(),
                            sym,
                            expr: value.node_id(),
                            typed,
                            value: value.clone(),
                        });
                    }
                }
            }
        }
        (written, raws, package_vars)
    };

    // Record written types for all declared names.
    for (spec_id, sem, names) in &written {
        for name in names {
            var_types.insert((effective.to_string(), name.clone()), sem.clone());
        }
        if let Some(pkg) = program.packages.get_mut(effective) {
            pkg.expr_types.insert(*spec_id, sem.clone());
        }
    }

    // Order initializers, then infer the untyped ones in that order so a
    // reference to an earlier variable always finds its type.
    let ordered = order_inits(effective, raws, &package_vars, program)?;

    let mut entries = Vec::new();
    let mut inferred: Vec<(NodeId, SemType)> = Vec::new();
    {
        let Some(pkg) = program.packages.get(effective) else {
            return Ok(());
        };
        for raw in &ordered {
            if !raw.typed {
                let checker = Checker {
                    type_defs,
                    func_sigs,
                    var_types,
                    uses: &pkg.uses,
                    symbols: &program.symbols,
                };
                let sem = checker.infer(&raw.value, effective)?;
                var_types.insert((effective.to_string(), raw.name.clone()), sem.clone());
                inferred.push((raw.expr, sem));
            }
            entries.push(InitEntry {
                name: raw.name.clone(),
                sym: raw.sym,
                expr: raw.expr,
            });
        }
    }

    if let Some(pkg) = program.packages.get_mut(effective) {
        for (expr, sem) in inferred {
            pkg.expr_types.insert(expr, sem);
        }
        pkg.init_order = entries;
    }
    Ok(())
}

/// Stable topological sort of initializer entries by same-package variable
/// dependencies.
fn order_inits(
    effective: &str,
    raws: Vec<RawInit>,
    package_vars: &HashSet<SymbolId>,
    program: &Program,
) -> LiftResult<Vec<RawInit>> {
    let uses = match program.packages.get(effective) {
        Some(pkg) => &pkg.uses,
        None => return Ok(raws),
    };
    let initialized: HashSet<SymbolId> = raws.iter().map(|r| r.sym).collect();

    let deps: Vec<HashSet<SymbolId>> = raws
        .iter()
        .map(|raw| {
            let mut collector = DepCollector {
                uses,
                package_vars,
                deps: HashSet::new(),
            };
            walk_expr(&mut collector, &raw.value);
            collector
                .deps
                .into_iter()
                .filter(|sym| initialized.contains(sym) && *sym != raw.sym)
                .collect()
        })
        .collect();

    let mut emitted: HashSet<SymbolId> = HashSet::new();
    let mut pending: Vec<Option<RawInit>> = raws.into_iter().map(Some).collect();
    let mut ordered = Vec::new();
    loop {
        let mut advanced = false;
        for i in 0..pending.len() {
            let ready = pending[i].is_some() && deps[i].iter().all(|sym| emitted.contains(sym));
            if !ready {
                continue;
            }
            if let Some(raw) = pending[i].take() {
                emitted.insert(raw.sym);
                ordered.push(raw);
                advanced = true;
            }
        }
        if pending.iter().all(Option::is_none) {
            return Ok(ordered);
        }
        if !advanced {
            return Err(LoadError::Type {
                message: format!("{}: initialization cycle", effective),
            }
            .into());
        }
    }
}

struct DepCollector<'a> {
    uses: &'a HashMap<NodeId, SymbolId>,
    package_vars: &'a HashSet<SymbolId>,
    deps: HashSet<SymbolId>,
}

impl<'a> Visitor for DepCollector<'a> {
    fn visit_ident(&mut self, ident: &Ident) {
        if let Some(&sym) = self.uses.get(&ident.id) {
            if self.package_vars.contains(&sym) {
                self.deps.insert(sym);
            }
        }
    }
}

// ----------------------------------------------------------------------
// Type resolution and inference
// ----------------------------------------------------------------------

struct Checker<'a> {
    type_defs: &'a TypeDefs,
    func_sigs: &'a FuncSigs,
    var_types: &'a HashMap<(String, String), SemType>,
    uses: &'a HashMap<NodeId, SymbolId>,
    symbols: &'a SymbolTable,
}

impl<'a> Checker<'a> {
    fn type_error(&self, message: String) -> LiftError {
        LoadError::Type { message }.into()
    }

    /// Resolve a written type expression to its semantic type. `pkg` is the
    /// effective path of the package the expression appears in.
    fn resolve_type(&self, ty: &TypeExpr, pkg: &str) -> LiftResult<SemType> {
        match ty {
            TypeExpr::Name(ident) => self.resolve_named(ident, pkg),
            TypeExpr::Pointer(inner) => {
                Ok(SemType::Pointer(Box::new(self.resolve_type(inner, pkg)?)))
            }
            TypeExpr::Array { len: None, elem } => {
                Ok(SemType::Slice(Box::new(self.resolve_type(elem, pkg)?)))
            }
            TypeExpr::Array {
                len: Some(len),
                elem,
            } => {
                let len = const_len(len)
                    .ok_or_else(|| self.type_error(format!("{}: unsupported array length", pkg)))?;
                Ok(SemType::Array {
                    len,
                    elem: Box::new(self.resolve_type(elem, pkg)?),
                })
            }
            TypeExpr::Map { key, value } => Ok(SemType::Map {
                key: Box::new(self.resolve_type(key, pkg)?),
                value: Box::new(self.resolve_type(value, pkg)?),
            }),
            TypeExpr::Chan { dir, elem } => Ok(SemType::Chan {
                dir: match dir {
                    SynChanDir::Both => ChanDir::Both,
                    SynChanDir::Send => ChanDir::Send,
                    SynChanDir::Recv => ChanDir::Recv,
                },
                elem: Box::new(self.resolve_type(elem, pkg)?),
            }),
            TypeExpr::Func(sig) => self.resolve_signature(sig, pkg),
            TypeExpr::Struct(st) => {
                let mut fields = Vec::new();
                for field in &st.fields {
                    let sem = self.resolve_type(&field.ty, pkg)?;
                    if field.names.is_empty() {
                        let name = embedded_name(&field.ty).ok_or_else(|| {
                            self.type_error(format!("{}: unsupported embedded field", pkg))
                        })?;
                        fields.push(SemField {
                            name,
                            ty: sem,
                        });
                    } else {
                        for name in &field.names {
                            fields.push(SemField {
                                name: name.name.clone(),
                                ty: sem.clone(),
                            });
                        }
                    }
                }
                Ok(SemType::Struct(fields))
            }
            TypeExpr::Interface(it) => {
                let mut embeds = Vec::new();
                let mut methods = Vec::new();
                for elem in &it.elems {
                    match elem {
                        statelift_syntax::ast::InterfaceElem::Embedded(ty) => {
                            embeds.push(self.resolve_type(ty, pkg)?);
                        }
                        statelift_syntax::ast::InterfaceElem::Method { name, sig, .. } => {
                            methods.push(SemParam {
                                name: name.name.clone(),
                                ty: self.resolve_signature(sig, pkg)?,
                            });
                        }
                    }
                }
                Ok(SemType::Interface { embeds, methods })
            }
        }
    }

    fn resolve_named(&self, ident: &Ident, pkg: &str) -> LiftResult<SemType> {
        if let Some(path) = &ident.path {
            return Ok(SemType::Named {
                package: Some(path.clone()),
                name: ident.name.clone(),
            });
        }
        if let Some(kind) = BasicKind::from_name(&ident.name) {
            return Ok(SemType::Basic(kind));
        }
        if ident.name == "error" {
            return Ok(SemType::Named {
                package: None,
                name: "error".to_string(),
            });
        }
        if self
            .type_defs
            .contains_key(&(pkg.to_string(), ident.name.clone()))
        {
            return Ok(SemType::Named {
                package: Some(pkg.to_string()),
                name: ident.name.clone(),
            });
        }
        Err(self.type_error(format!("{}: unknown type {}", pkg, ident.name)))
    }

    fn resolve_signature(&self, sig: &Signature, pkg: &str) -> LiftResult<SemType> {
        let mut params = Vec::new();
        for param in &sig.params {
            let mut sem = self.resolve_type(&param.ty, pkg)?;
            if param.variadic {
                sem = SemType::Slice(Box::new(sem));
            }
            if param.names.is_empty() {
                params.push(SemParam {
                    name: String::new(),
                    ty: sem,
                });
            } else {
                for name in &param.names {
                    params.push(SemParam {
                        name: name.name.clone(),
                        ty: sem.clone(),
                    });
                }
            }
        }
        let mut results = Vec::new();
        for result in &sig.results {
            let sem = self.resolve_type(&result.ty, pkg)?;
            if result.names.is_empty() {
                results.push(SemParam {
                    name: String::new(),
                    ty: sem,
                });
            } else {
                for name in &result.names {
                    results.push(SemParam {
                        name: name.name.clone(),
                        ty: sem.clone(),
                    });
                }
            }
        }
        Ok(SemType::Signature { params, results })
    }

    /// Underlying type of a named type defined in the program, following
    /// alias chains.
    fn underlying(&self, package: &str, name: &str) -> LiftResult<SemType> {
        let mut seen = HashSet::new();
        let mut pkg = package.to_string();
        let mut name = name.to_string();
        loop {
            if !seen.insert((pkg.clone(), name.clone())) {
                return Err(self.type_error(format!("{}: type cycle through {}", pkg, name)));
            }
            let Some(def) = self.type_defs.get(&(pkg.clone(), name.clone())) else {
                return Err(self.type_error(format!("{}: unknown type {}", pkg, name)));
            };
            let sem = self.resolve_type(def, &pkg)?;
            match sem {
                SemType::Named {
                    package: Some(next_pkg),
                    name: next_name,
                } => {
                    pkg = next_pkg;
                    name = next_name;
                }
                other => return Ok(other),
            }
        }
    }

    /// Infer the semantic type of a package-level initializer expression.
    fn infer(&self, expr: &Expr, pkg: &str) -> LiftResult<SemType> {
        match expr {
            Expr::Lit(lit) => Ok(SemType::Basic(lit_kind(lit))),
            Expr::Ident(ident) => self.infer_ident(ident, pkg),
            Expr::Paren { x, .. } => self.infer(x, pkg),
            Expr::Unary { op, x, .. } => {
                use statelift_syntax::ast::UnaryOp;
                match op {
                    UnaryOp::Amp => Ok(SemType::Pointer(Box::new(self.infer(x, pkg)?))),
                    UnaryOp::Star => match self.infer(x, pkg)? {
                        SemType::Pointer(elem) => Ok(*elem),
                        other => {
                            Err(self.type_error(format!("{}: cannot dereference {}", pkg, other)))
                        }
                    },
                    UnaryOp::Recv => match self.deref_named(self.infer(x, pkg)?)? {
                        SemType::Chan { elem, .. } => Ok(*elem),
                        other => {
                            Err(self.type_error(format!("{}: receive from {}", pkg, other)))
                        }
                    },
                    UnaryOp::Not => Ok(self.infer(x, pkg)?),
                    UnaryOp::Minus | UnaryOp::Plus | UnaryOp::Caret => self.infer(x, pkg),
                }
            }
            Expr::Binary { op, x, y, .. } => {
                use statelift_syntax::ast::BinaryOp;
                match op {
                    BinaryOp::Eq
                    | BinaryOp::Ne
                    | BinaryOp::Lt
                    | BinaryOp::Le
                    | BinaryOp::Gt
                    | BinaryOp::Ge => Ok(SemType::Basic(BasicKind::UntypedBool)),
                    BinaryOp::Shl | BinaryOp::Shr => self.infer(x, pkg),
                    _ => {
                        let left = self.infer(x, pkg)?;
                        if is_untyped(&left) {
                            let right = self.infer(y, pkg)?;
                            if is_untyped(&right) {
                                Ok(left)
                            } else {
                                Ok(right)
                            }
                        } else {
                            Ok(left)
                        }
                    }
                }
            }
            Expr::Composite { ty: Some(ty), .. } => self.resolve_type(ty, pkg),
            Expr::Composite { ty: None, .. } => {
                Err(self.type_error(format!("{}: untyped composite literal", pkg)))
            }
            Expr::Call(call) => self.infer_call(call, pkg),
            Expr::Selector { x, sel, .. } => {
                let base = self.deref_named(self.infer(x, pkg)?)?;
                match base {
                    SemType::Struct(fields) => fields
                        .iter()
                        .find(|f| f.name == sel.name)
                        .map(|f| f.ty.clone())
                        .ok_or_else(|| {
                            self.type_error(format!("{}: no field {}", pkg, sel.name))
                        }),
                    other => Err(self.type_error(format!(
                        "{}: cannot select {} from {}",
                        pkg, sel.name, other
                    ))),
                }
            }
            Expr::Index { x, .. } => match self.deref_named(self.infer(x, pkg)?)? {
                SemType::Map { value, .. } => Ok(*value),
                SemType::Slice(elem) | SemType::Array { elem, .. } => Ok(*elem),
                SemType::Pointer(inner) => match *inner {
                    SemType::Array { elem, .. } => Ok(*elem),
                    other => Err(self.type_error(format!("{}: cannot index {}", pkg, other))),
                },
                SemType::Basic(BasicKind::String | BasicKind::UntypedString) => {
                    Ok(SemType::Basic(BasicKind::Uint8))
                }
                other => Err(self.type_error(format!("{}: cannot index {}", pkg, other))),
            },
            Expr::FuncLit { sig, .. } => self.resolve_signature(sig, pkg),
            Expr::TypeLit { .. } => {
                Err(self.type_error(format!("{}: type used as value", pkg)))
            }
        }
    }

    /// Resolve a named type to its underlying form when field or element
    /// access needs it; everything else passes through. One pointer level
    /// is stripped first.
    fn deref_named(&self, sem: SemType) -> LiftResult<SemType> {
        let sem = match sem {
            SemType::Pointer(inner) => *inner,
            other => other,
        };
        match sem {
            SemType::Named {
                package: Some(package),
                name,
            } => self.underlying(&package, &name),
            other => Ok(other),
        }
    }

    fn infer_ident(&self, ident: &Ident, pkg: &str) -> LiftResult<SemType> {
        if let Some(&sym) = self.uses.get(&ident.id) {
            let data = self.symbols.data(sym);
            let home = data.package.clone().unwrap_or_default();
            return match data.kind {
                SymbolKind::Var => self
                    .var_types
                    .get(&(home.clone(), data.name.clone()))
                    .cloned()
                    .ok_or_else(|| {
                        self.type_error(format!("{}: {} used before its type is known", pkg, data.name))
                    }),
                SymbolKind::Func => {
                    let Some(sig) = self.func_sigs.get(&(home.clone(), data.name.clone())) else {
                        return Err(
                            self.type_error(format!("{}: unknown function {}", pkg, data.name))
                        );
                    };
                    self.resolve_signature(sig, &home)
                }
                SymbolKind::Type => {
                    Err(self.type_error(format!("{}: type {} used as value", pkg, data.name)))
                }
                SymbolKind::Const => Err(self.type_error(format!(
                    "{}: constant {} in an inferred initializer is unsupported",
                    pkg, data.name
                ))),
                SymbolKind::Method | SymbolKind::Builtin => {
                    Err(self.type_error(format!("{}: cannot use {} as value", pkg, data.name)))
                }
            };
        }
        match ident.name.as_str() {
            "nil" => Ok(SemType::Basic(BasicKind::UntypedNil)),
            "true" | "false" => Ok(SemType::Basic(BasicKind::UntypedBool)),
            "iota" => Ok(SemType::Basic(BasicKind::UntypedInt)),
            name => Err(self.type_error(format!("{}: unresolved identifier {}", pkg, name))),
        }
    }

    fn infer_call(&self, call: &CallExpr, pkg: &str) -> LiftResult<SemType> {
        let callee = match call.fun.as_ref() {
            Expr::Ident(ident) => ident,
            Expr::Paren { x, .. } => match x.as_ref() {
                Expr::Ident(ident) => ident,
                _ => {
                    return Err(
                        self.type_error(format!("{}: unsupported callee in initializer", pkg))
                    )
                }
            },
            Expr::FuncLit { sig, .. } => {
                return self.signature_result(&self.resolve_signature(sig, pkg)?, pkg);
            }
            _ => {
                return Err(self.type_error(format!("{}: unsupported callee in initializer", pkg)))
            }
        };

        if let Some(&sym) = self.uses.get(&callee.id) {
            let data = self.symbols.data(sym);
            let home = data.package.clone().unwrap_or_default();
            return match data.kind {
                SymbolKind::Func => {
                    let Some(sig) = self.func_sigs.get(&(home.clone(), data.name.clone())) else {
                        return Err(
                            self.type_error(format!("{}: unknown function {}", pkg, data.name))
                        );
                    };
                    self.signature_result(&self.resolve_signature(sig, &home)?, pkg)
                }
                SymbolKind::Type => Ok(SemType::Named {
                    package: Some(home),
                    name: data.name.clone(),
                }),
                SymbolKind::Var => {
                    let sem = self
                        .var_types
                        .get(&(home.clone(), data.name.clone()))
                        .cloned()
                        .ok_or_else(|| {
                            self.type_error(format!(
                                "{}: {} used before its type is known",
                                pkg, data.name
                            ))
                        })?;
                    self.signature_result(&sem, pkg)
                }
                _ => Err(self.type_error(format!("{}: cannot call {}", pkg, data.name))),
            };
        }

        // Unresolved callee: predeclared builtin or basic-type conversion.
        if let Some(kind) = BasicKind::from_name(&callee.name) {
            return Ok(SemType::Basic(kind));
        }
        match callee.name.as_str() {
            "len" | "cap" | "copy" => Ok(SemType::Basic(BasicKind::Int)),
            "make" => match call.args.first() {
                Some(Expr::TypeLit { ty, .. }) => self.resolve_type(ty, pkg),
                _ => Err(self.type_error(format!("{}: make needs a type argument", pkg))),
            },
            "new" => match call.args.first() {
                Some(Expr::TypeLit { ty, .. }) => {
                    Ok(SemType::Pointer(Box::new(self.resolve_type(ty, pkg)?)))
                }
                Some(Expr::Ident(ident)) => {
                    Ok(SemType::Pointer(Box::new(self.resolve_named(ident, pkg)?)))
                }
                _ => Err(self.type_error(format!("{}: new needs a type argument", pkg))),
            },
            "append" => match call.args.first() {
                Some(first) => self.infer(first, pkg),
                None => Err(self.type_error(format!("{}: append without arguments", pkg))),
            },
            name => Err(self.type_error(format!(
                "{}: unsupported call to {} in initializer",
                pkg, name
            ))),
        }
    }

    fn signature_result(&self, sem: &SemType, pkg: &str) -> LiftResult<SemType> {
        match sem {
            SemType::Signature { results, .. } => match results.len() {
                0 => Err(self.type_error(format!("{}: call has no value", pkg))),
                1 => Ok(results[0].ty.clone()),
                _ => Ok(SemType::Tuple(
                    results.iter().map(|r| r.ty.clone()).collect(),
                )),
            },
            other => Err(self.type_error(format!("{}: cannot call {}", pkg, other))),
        }
    }
}

fn lit_kind(lit: &Lit) -> BasicKind {
    match lit.kind {
        LitKind::Int => BasicKind::UntypedInt,
        LitKind::Float => BasicKind::UntypedFloat,
        LitKind::Char => BasicKind::UntypedRune,
        LitKind::Str => BasicKind::UntypedString,
    }
}

fn is_untyped(sem: &SemType) -> bool {
    matches!(
        sem,
        SemType::Basic(
            BasicKind::UntypedBool
                | BasicKind::UntypedInt
                | BasicKind::UntypedRune
                | BasicKind::UntypedFloat
                | BasicKind::UntypedComplex
                | BasicKind::UntypedString
                | BasicKind::UntypedNil
        )
    )
}

/// Evaluate a constant array length: an integer literal, possibly
/// underscore-separated.
fn const_len(expr: &Expr) -> Option<u64> {
    match expr {
        Expr::Lit(lit) if lit.kind == LitKind::Int => {
            lit.text.replace('_', "").parse().ok()
        }
        Expr::Paren { x, .. } => const_len(x),
        _ => None,
    }
}

/// Field name of an embedded struct field.
fn embedded_name(ty: &TypeExpr) -> Option<String> {
    match ty {
        TypeExpr::Name(ident) => Some(ident.name.clone()),
        TypeExpr::Pointer(inner) => embedded_name(inner),
        _ => None,
    }
}
