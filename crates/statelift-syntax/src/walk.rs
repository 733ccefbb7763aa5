//! Traversal utilities: a read-only visitor for analysis passes and an
//! expression mapper for mutation passes.
//!
//! Traversal is depth-first in source order. The visitor's hooks are
//! pre-order; the expression mapper is post-order (children are rebuilt
//! before the parent is offered to the callback), so a callback replacing a
//! node never re-visits its own output.

use crate::ast::*;

/// Read-only visitor. Implement the hooks you need; all default to no-ops.
///
/// `visit_ident` fires for identifiers in expression position and for
/// qualified names in type position, the occurrences name resolution
/// decorates. Declaration-site names are not reported through it.
pub trait Visitor {
    fn visit_ident(&mut self, _ident: &Ident) {}
    fn visit_expr(&mut self, _expr: &Expr) {}
    fn visit_call(&mut self, _call: &CallExpr) {}
    fn visit_stmt(&mut self, _stmt: &Stmt) {}
    fn visit_var_decl(&mut self, _decl: &VarDecl) {}
    fn visit_func_decl(&mut self, _decl: &FuncDecl) {}
    fn visit_type_spec(&mut self, _spec: &TypeSpec) {}
    fn visit_type(&mut self, _ty: &TypeExpr) {}
}

/// Walk one file, invoking the visitor's hooks.
pub fn walk_file<V: Visitor>(v: &mut V, file: &File) {
    for decl in &file.decls {
        walk_decl(v, decl);
    }
}

/// Walk a top-level declaration.
pub fn walk_decl<V: Visitor>(v: &mut V, decl: &Decl) {
    match decl {
        Decl::Var(var) => walk_var_decl(v, var),
        Decl::Const(konst) => {
            for spec in &konst.specs {
                if let Some(ty) = &spec.ty {
                    walk_type(v, ty);
                }
                for value in &spec.values {
                    walk_expr(v, value);
                }
            }
        }
        Decl::Type(td) => {
            for spec in &td.specs {
                v.visit_type_spec(spec);
                walk_type(v, &spec.ty);
            }
        }
        Decl::Func(fd) => walk_func_decl(v, fd),
    }
}

fn walk_var_decl<V: Visitor>(v: &mut V, decl: &VarDecl) {
    v.visit_var_decl(decl);
    for spec in &decl.specs {
        if let Some(ty) = &spec.ty {
            walk_type(v, ty);
        }
        for value in &spec.values {
            walk_expr(v, value);
        }
    }
}

fn walk_func_decl<V: Visitor>(v: &mut V, decl: &FuncDecl) {
    v.visit_func_decl(decl);
    if let Some(recv) = &decl.recv {
        walk_type(v, &recv.ty);
    }
    walk_signature(v, &decl.sig);
    if let Some(body) = &decl.body {
        walk_block(v, body);
    }
}

fn walk_signature<V: Visitor>(v: &mut V, sig: &Signature) {
    for param in sig.params.iter().chain(sig.results.iter()) {
        walk_type(v, &param.ty);
    }
}

/// Walk a type expression.
pub fn walk_type<V: Visitor>(v: &mut V, ty: &TypeExpr) {
    v.visit_type(ty);
    match ty {
        TypeExpr::Name(ident) => {
            if ident.path.is_some() {
                v.visit_ident(ident);
            }
        }
        TypeExpr::Pointer(inner) => walk_type(v, inner),
        TypeExpr::Array { len, elem } => {
            if let Some(len) = len {
                walk_expr(v, len);
            }
            walk_type(v, elem);
        }
        TypeExpr::Map { key, value } => {
            walk_type(v, key);
            walk_type(v, value);
        }
        TypeExpr::Chan { elem, .. } => walk_type(v, elem),
        TypeExpr::Func(sig) => walk_signature(v, sig),
        TypeExpr::Struct(st) => {
            for field in &st.fields {
                walk_type(v, &field.ty);
            }
        }
        TypeExpr::Interface(it) => {
            for elem in &it.elems {
                match elem {
                    InterfaceElem::Embedded(ty) => walk_type(v, ty),
                    InterfaceElem::Method { sig, .. } => walk_signature(v, sig),
                }
            }
        }
    }
}

/// Walk a statement.
pub fn walk_stmt<V: Visitor>(v: &mut V, stmt: &Stmt) {
    v.visit_stmt(stmt);
    match stmt {
        Stmt::VarDecl(decl) => walk_var_decl(v, decl),
        Stmt::ConstDecl(decl) => {
            for spec in &decl.specs {
                for value in &spec.values {
                    walk_expr(v, value);
                }
            }
        }
        Stmt::Expr { x, .. } => walk_expr(v, x),
        Stmt::Assign { lhs, rhs, .. } => {
            for e in lhs.iter().chain(rhs.iter()) {
                walk_expr(v, e);
            }
        }
        Stmt::Return { results, .. } => {
            for e in results {
                walk_expr(v, e);
            }
        }
        Stmt::If(ifs) => {
            if let Some(init) = &ifs.init {
                walk_stmt(v, init);
            }
            walk_expr(v, &ifs.cond);
            walk_block(v, &ifs.then);
            if let Some(els) = &ifs.els {
                walk_stmt(v, els);
            }
        }
        Stmt::For(fs) => {
            if let Some(init) = &fs.init {
                walk_stmt(v, init);
            }
            if let Some(cond) = &fs.cond {
                walk_expr(v, cond);
            }
            if let Some(post) = &fs.post {
                walk_stmt(v, post);
            }
            walk_block(v, &fs.body);
        }
        Stmt::Range(rs) => {
            for e in rs.key.iter().chain(rs.value.iter()) {
                walk_expr(v, e);
            }
            walk_expr(v, &rs.x);
            walk_block(v, &rs.body);
        }
        Stmt::Block(block) => walk_block(v, block),
        Stmt::Go { call, .. } | Stmt::Defer { call, .. } => walk_call(v, call),
        Stmt::Send { chan, value, .. } => {
            walk_expr(v, chan);
            walk_expr(v, value);
        }
        Stmt::IncDec { x, .. } => walk_expr(v, x),
        Stmt::Branch { .. } => {}
    }
}

/// Walk a block.
pub fn walk_block<V: Visitor>(v: &mut V, block: &Block) {
    for stmt in &block.stmts {
        walk_stmt(v, stmt);
    }
}

fn walk_call<V: Visitor>(v: &mut V, call: &CallExpr) {
    v.visit_call(call);
    walk_expr(v, &call.fun);
    for arg in &call.args {
        walk_expr(v, arg);
    }
}

/// Walk an expression.
pub fn walk_expr<V: Visitor>(v: &mut V, expr: &Expr) {
    v.visit_expr(expr);
    match expr {
        Expr::Ident(ident) => v.visit_ident(ident),
        Expr::Lit(_) => {}
        Expr::Composite { ty, elts, .. } => {
            if let Some(ty) = ty {
                walk_type(v, ty);
            }
            for elt in elts {
                if let Some(key) = &elt.key {
                    walk_expr(v, key);
                }
                walk_expr(v, &elt.value);
            }
        }
        Expr::Call(call) => walk_call(v, call),
        Expr::Selector { x, .. } => walk_expr(v, x),
        Expr::Index { x, index, .. } => {
            walk_expr(v, x);
            walk_expr(v, index);
        }
        Expr::Unary { x, .. } | Expr::Paren { x, .. } => walk_expr(v, x),
        Expr::Binary { x, y, .. } => {
            walk_expr(v, x);
            walk_expr(v, y);
        }
        Expr::FuncLit { sig, body, .. } => {
            walk_signature(v, sig);
            walk_block(v, body);
        }
        Expr::TypeLit { ty, .. } => walk_type(v, ty),
    }
}

// ----------------------------------------------------------------------
// Expression mapping (mutation)
// ----------------------------------------------------------------------

/// Rebuild every expression in a file bottom-up through `f`.
///
/// Covers var/const initializers, function bodies, and nested function
/// literals. Type positions are not mapped; the rewrites that target types
/// address their nodes directly.
pub fn map_exprs_in_file(file: &mut File, f: &mut impl FnMut(Expr) -> Expr) {
    for decl in &mut file.decls {
        match decl {
            Decl::Var(var) => {
                for spec in &mut var.specs {
                    for value in &mut spec.values {
                        take_map(value, f);
                    }
                }
            }
            Decl::Const(konst) => {
                for spec in &mut konst.specs {
                    for value in &mut spec.values {
                        take_map(value, f);
                    }
                }
            }
            Decl::Type(_) => {}
            Decl::Func(fd) => {
                if let Some(body) = &mut fd.body {
                    map_exprs_in_block(body, f);
                }
            }
        }
    }
}

/// Rebuild every expression in a block bottom-up through `f`.
pub fn map_exprs_in_block(block: &mut Block, f: &mut impl FnMut(Expr) -> Expr) {
    for stmt in &mut block.stmts {
        map_exprs_in_stmt(stmt, f);
    }
}

fn map_exprs_in_stmt(stmt: &mut Stmt, f: &mut impl FnMut(Expr) -> Expr) {
    match stmt {
        Stmt::VarDecl(decl) => {
            for spec in &mut decl.specs {
                for value in &mut spec.values {
                    take_map(value, f);
                }
            }
        }
        Stmt::ConstDecl(decl) => {
            for spec in &mut decl.specs {
                for value in &mut spec.values {
                    take_map(value, f);
                }
            }
        }
        Stmt::Expr { x, .. } => take_map(x, f),
        Stmt::Assign { lhs, rhs, .. } => {
            for e in lhs.iter_mut().chain(rhs.iter_mut()) {
                take_map(e, f);
            }
        }
        Stmt::Return { results, .. } => {
            for e in results {
                take_map(e, f);
            }
        }
        Stmt::If(ifs) => {
            if let Some(init) = &mut ifs.init {
                map_exprs_in_stmt(init, f);
            }
            take_map(&mut ifs.cond, f);
            map_exprs_in_block(&mut ifs.then, f);
            if let Some(els) = &mut ifs.els {
                map_exprs_in_stmt(els, f);
            }
        }
        Stmt::For(fs) => {
            if let Some(init) = &mut fs.init {
                map_exprs_in_stmt(init, f);
            }
            if let Some(cond) = &mut fs.cond {
                take_map(cond, f);
            }
            if let Some(post) = &mut fs.post {
                map_exprs_in_stmt(post, f);
            }
            map_exprs_in_block(&mut fs.body, f);
        }
        Stmt::Range(rs) => {
            for e in rs.key.iter_mut().chain(rs.value.iter_mut()) {
                take_map(e, f);
            }
            take_map(&mut rs.x, f);
            map_exprs_in_block(&mut rs.body, f);
        }
        Stmt::Block(block) => map_exprs_in_block(block, f),
        Stmt::Go { call, .. } | Stmt::Defer { call, .. } => {
            // The operand is offered to `f` as a call expression so call
            // rewrites apply here too. A callback must keep calls calls in
            // this position; any other shape is discarded.
            let placeholder = CallExpr {
                id: call.id,
                fun: Box::new(Expr::Lit(Lit {
                    id: NodeId(u32::MAX),
                    kind: LitKind::Int,
                    text: String::new(),
                })),
                args: Vec::new(),
                ellipsis: false,
            };
            let taken = std::mem::replace(call, placeholder);
            if let Expr::Call(mapped) = map_expr(Expr::Call(taken), f) {
                *call = mapped;
            }
        }
        Stmt::Send { chan, value, .. } => {
            take_map(chan, f);
            take_map(value, f);
        }
        Stmt::IncDec { x, .. } => take_map(x, f),
        Stmt::Branch { .. } => {}
    }
}

fn take_map(slot: &mut Expr, f: &mut impl FnMut(Expr) -> Expr) {
    let placeholder = Expr::Lit(Lit {
        id: NodeId(u32::MAX),
        kind: LitKind::Int,
        text: String::new(),
    });
    let expr = std::mem::replace(slot, placeholder);
    *slot = map_expr(expr, f);
}

fn map_call(call: &mut CallExpr, f: &mut impl FnMut(Expr) -> Expr) {
    take_map(&mut call.fun, f);
    for arg in &mut call.args {
        take_map(arg, f);
    }
}

/// Rebuild one expression bottom-up through `f`.
pub fn map_expr(expr: Expr, f: &mut impl FnMut(Expr) -> Expr) -> Expr {
    let rebuilt = match expr {
        Expr::Composite { id, ty, elts } => Expr::Composite {
            id,
            ty,
            elts: elts
                .into_iter()
                .map(|elt| CompositeElt {
                    key: elt.key.map(|k| map_expr(k, f)),
                    value: map_expr(elt.value, f),
                })
                .collect(),
        },
        Expr::Call(mut call) => {
            map_call(&mut call, f);
            Expr::Call(call)
        }
        Expr::Selector { id, x, sel } => Expr::Selector {
            id,
            x: Box::new(map_expr(*x, f)),
            sel,
        },
        Expr::Index { id, x, index } => Expr::Index {
            id,
            x: Box::new(map_expr(*x, f)),
            index: Box::new(map_expr(*index, f)),
        },
        Expr::Unary { id, op, x } => Expr::Unary {
            id,
            op,
            x: Box::new(map_expr(*x, f)),
        },
        Expr::Binary { id, op, x, y } => Expr::Binary {
            id,
            op,
            x: Box::new(map_expr(*x, f)),
            y: Box::new(map_expr(*y, f)),
        },
        Expr::Paren { id, x } => Expr::Paren {
            id,
            x: Box::new(map_expr(*x, f)),
        },
        Expr::FuncLit { id, sig, mut body } => {
            map_exprs_in_block(&mut body, f);
            Expr::FuncLit { id, sig, body }
        }
        other => other,
    };
    f(rebuilt)
}
