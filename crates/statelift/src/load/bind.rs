//! Name resolution over parsed packages.
//!
//! Two passes. The first collects each package's top-level declarations
//! into a package scope and records definition symbols. The second walks
//! every file resolving identifier occurrences: references to the package
//! scope are recorded in the package's `uses` map, selectors whose base
//! names an import (and is not locally shadowed) are collapsed into a
//! single qualified identifier, and written type qualifiers are replaced
//! with effective import paths.
//!
//! Local scopes are tracked as shadow sets only: a locally bound name
//! resolves to nothing, which is exactly what the later passes need.

use std::collections::{HashMap, HashSet};

use tokio_util::sync::CancellationToken;

use statelift_core::error::{LiftError, LiftResult};
use statelift_core::path::strip_vendor;
use statelift_core::program::Program;
use statelift_core::symbol::{SymbolId, SymbolKind};
use statelift_syntax::ast::*;

/// Per-package name → (symbol, kind) for top-level declarations.
pub(crate) type PackageScopes = HashMap<String, HashMap<String, (SymbolId, SymbolKind)>>;

/// Resolve names across the whole program.
pub(crate) fn bind_program(program: &mut Program, cancel: &CancellationToken) -> LiftResult<()> {
    let scopes = collect_scopes(program);

    let entries: Vec<String> = program.packages.keys().cloned().collect();
    for effective in entries {
        if cancel.is_cancelled() {
            return Err(LiftError::Canceled);
        }
        let Some(pkg) = program.packages.get_mut(&effective) else {
            continue;
        };
        let statelift_core::program::Package {
            files,
            test_files,
            uses,
            ..
        } = pkg;
        for file in files.iter_mut().chain(test_files.iter_mut()) {
            let imports = file_imports(file);
            let mut binder = Binder {
                scopes: &scopes,
                imports,
                self_path: &effective,
                locals: Vec::new(),
                uses: &mut *uses,
            };
            binder.bind_file(file);
        }
    }
    Ok(())
}

/// Collect package scopes and record definition symbols.
fn collect_scopes(program: &mut Program) -> PackageScopes {
    let mut scopes = PackageScopes::new();
    let symbols = &mut program.symbols;
    for (effective, pkg) in program.packages.iter_mut() {
        let mut scope = HashMap::new();
        let defs = &mut pkg.defs;
        for file in &pkg.files {
            for decl in &file.decls {
                match decl {
                    Decl::Var(var) => {
                        for spec in &var.specs {
                            for name in &spec.names {
                                if name.is_wildcard() {
                                    continue;
                                }
                                let sym =
                                    symbols.intern(Some(effective), &name.name, SymbolKind::Var);
                                defs.insert(name.id, sym);
                                scope.insert(name.name.clone(), (sym, SymbolKind::Var));
                            }
                        }
                    }
                    Decl::Const(konst) => {
                        for spec in &konst.specs {
                            for name in &spec.names {
                                if name.is_wildcard() {
                                    continue;
                                }
                                let sym =
                                    symbols.intern(Some(effective), &name.name, SymbolKind::Const);
                                defs.insert(name.id, sym);
                                scope.insert(name.name.clone(), (sym, SymbolKind::Const));
                            }
                        }
                    }
                    Decl::Type(td) => {
                        for spec in &td.specs {
                            let sym =
                                symbols.intern(Some(effective), &spec.name.name, SymbolKind::Type);
                            defs.insert(spec.name.id, sym);
                            scope.insert(spec.name.name.clone(), (sym, SymbolKind::Type));
                        }
                    }
                    Decl::Func(fd) => {
                        if let Some(recv) = &fd.recv {
                            let base = recv.base_name().unwrap_or("_");
                            let qualified = format!("{}.{}", base, fd.name.name);
                            let sym =
                                symbols.intern(Some(effective), &qualified, SymbolKind::Method);
                            defs.insert(fd.name.id, sym);
                        } else {
                            let sym =
                                symbols.intern(Some(effective), &fd.name.name, SymbolKind::Func);
                            defs.insert(fd.name.id, sym);
                            scope.insert(fd.name.name.clone(), (sym, SymbolKind::Func));
                        }
                    }
                }
            }
        }
        scopes.insert(effective.clone(), scope);
    }
    scopes
}

/// Local import name → effective path, for one file.
fn file_imports(file: &File) -> HashMap<String, String> {
    let mut imports = HashMap::new();
    for spec in &file.imports {
        let local = spec
            .alias
            .clone()
            .unwrap_or_else(|| last_segment(&spec.path).to_string());
        if local == "_" {
            continue;
        }
        imports.insert(local, strip_vendor(&spec.path).to_string());
    }
    imports
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

struct Binder<'a> {
    scopes: &'a PackageScopes,
    imports: HashMap<String, String>,
    self_path: &'a str,
    locals: Vec<HashSet<String>>,
    uses: &'a mut HashMap<NodeId, SymbolId>,
}

impl<'a> Binder<'a> {
    fn bind_file(&mut self, file: &mut File) {
        for decl in &mut file.decls {
            match decl {
                Decl::Var(var) => self.bind_value_specs(&mut var.specs),
                Decl::Const(konst) => self.bind_value_specs(&mut konst.specs),
                Decl::Type(td) => {
                    for spec in &mut td.specs {
                        self.bind_type(&mut spec.ty);
                    }
                }
                Decl::Func(fd) => self.bind_func_decl(fd),
            }
        }
    }

    fn bind_value_specs(&mut self, specs: &mut [ValueSpec]) {
        for spec in specs {
            if let Some(ty) = &mut spec.ty {
                self.bind_type(ty);
            }
            for value in &mut spec.values {
                self.bind_expr(value);
            }
        }
    }

    fn bind_func_decl(&mut self, decl: &mut FuncDecl) {
        self.push_scope();
        if let Some(recv) = &mut decl.recv {
            self.bind_type(&mut recv.ty);
            if let Some(name) = &recv.name {
                self.declare(&name.name);
            }
        }
        self.bind_signature(&mut decl.sig, true);
        if let Some(body) = &mut decl.body {
            self.bind_block_stmts(body);
        }
        self.pop_scope();
    }

    fn bind_signature(&mut self, sig: &mut Signature, declare: bool) {
        for param in sig.params.iter_mut().chain(sig.results.iter_mut()) {
            self.bind_type(&mut param.ty);
            if declare {
                for name in &param.names {
                    self.declare(&name.name);
                }
            }
        }
    }

    // --------------------------------------------------------------
    // Scopes
    // --------------------------------------------------------------

    fn push_scope(&mut self) {
        self.locals.push(HashSet::new());
    }

    fn pop_scope(&mut self) {
        self.locals.pop();
    }

    fn declare(&mut self, name: &str) {
        if name == "_" {
            return;
        }
        if let Some(top) = self.locals.last_mut() {
            top.insert(name.to_string());
        }
    }

    fn is_local(&self, name: &str) -> bool {
        self.locals.iter().any(|scope| scope.contains(name))
    }

    // --------------------------------------------------------------
    // Statements
    // --------------------------------------------------------------

    fn bind_block(&mut self, block: &mut Block) {
        self.push_scope();
        self.bind_block_stmts(block);
        self.pop_scope();
    }

    /// Bind a block's statements without opening a new scope; used for
    /// function bodies, whose scope already holds the parameters.
    fn bind_block_stmts(&mut self, block: &mut Block) {
        for stmt in &mut block.stmts {
            self.bind_stmt(stmt);
        }
    }

    fn bind_stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::VarDecl(decl) => {
                self.bind_value_specs(&mut decl.specs);
                for spec in &decl.specs {
                    for name in &spec.names {
                        self.declare(&name.name);
                    }
                }
            }
            Stmt::ConstDecl(decl) => {
                self.bind_value_specs(&mut decl.specs);
                for spec in &decl.specs {
                    for name in &spec.names {
                        self.declare(&name.name);
                    }
                }
            }
            Stmt::Expr { x, .. } => self.bind_expr(x),
            Stmt::Assign { lhs, op, rhs, .. } => {
                for e in rhs.iter_mut() {
                    self.bind_expr(e);
                }
                if *op == AssignOp::Define {
                    for e in lhs.iter_mut() {
                        match e {
                            Expr::Ident(ident) => {
                                let name = ident.name.clone();
                                self.declare(&name);
                            }
                            other => self.bind_expr(other),
                        }
                    }
                } else {
                    for e in lhs.iter_mut() {
                        self.bind_expr(e);
                    }
                }
            }
            Stmt::Return { results, .. } => {
                for e in results {
                    self.bind_expr(e);
                }
            }
            Stmt::If(ifs) => {
                self.push_scope();
                if let Some(init) = &mut ifs.init {
                    self.bind_stmt(init);
                }
                self.bind_expr(&mut ifs.cond);
                self.bind_block(&mut ifs.then);
                if let Some(els) = &mut ifs.els {
                    self.bind_stmt(els);
                }
                self.pop_scope();
            }
            Stmt::For(fs) => {
                self.push_scope();
                if let Some(init) = &mut fs.init {
                    self.bind_stmt(init);
                }
                if let Some(cond) = &mut fs.cond {
                    self.bind_expr(cond);
                }
                if let Some(post) = &mut fs.post {
                    self.bind_stmt(post);
                }
                self.bind_block(&mut fs.body);
                self.pop_scope();
            }
            Stmt::Range(rs) => {
                self.push_scope();
                self.bind_expr(&mut rs.x);
                if rs.define {
                    for e in rs.key.iter().chain(rs.value.iter()) {
                        if let Expr::Ident(ident) = e {
                            let name = ident.name.clone();
                            self.declare(&name);
                        }
                    }
                } else {
                    for e in rs.key.iter_mut().chain(rs.value.iter_mut()) {
                        self.bind_expr(e);
                    }
                }
                self.bind_block(&mut rs.body);
                self.pop_scope();
            }
            Stmt::Block(block) => self.bind_block(block),
            Stmt::Go { call, .. } | Stmt::Defer { call, .. } => self.bind_call(call),
            Stmt::Send { chan, value, .. } => {
                self.bind_expr(chan);
                self.bind_expr(value);
            }
            Stmt::IncDec { x, .. } => self.bind_expr(x),
            Stmt::Branch { .. } => {}
        }
    }

    // --------------------------------------------------------------
    // Expressions
    // --------------------------------------------------------------

    fn bind_call(&mut self, call: &mut CallExpr) {
        self.bind_expr(&mut call.fun);
        for arg in &mut call.args {
            self.bind_expr(arg);
        }
    }

    fn bind_expr(&mut self, expr: &mut Expr) {
        // A selector whose base names an import collapses into one
        // qualified identifier carrying the effective path.
        if let Expr::Selector { x, sel, .. } = expr {
            if let Expr::Ident(base) = x.as_ref() {
                if base.path.is_none() && !self.is_local(&base.name) {
                    if let Some(effective) = self.imports.get(&base.name).cloned() {
                        let ident = Ident {
                            id: sel.id,
                            name: sel.name.clone(),
                            path: Some(effective.clone()),
                        };
                        if let Some(&(sym, _)) = self
                            .scopes
                            .get(&effective)
                            .and_then(|scope| scope.get(&sel.name))
                        {
                            self.uses.insert(ident.id, sym);
                        }
                        *expr = Expr::Ident(ident);
                        return;
                    }
                }
            }
        }

        match expr {
            Expr::Ident(ident) => {
                if ident.path.is_some() || ident.is_wildcard() || self.is_local(&ident.name) {
                    return;
                }
                if let Some(&(sym, _)) = self
                    .scopes
                    .get(self.self_path)
                    .and_then(|scope| scope.get(&ident.name))
                {
                    self.uses.insert(ident.id, sym);
                }
            }
            Expr::Lit(_) => {}
            Expr::Composite { ty, elts, .. } => {
                let map_keys = matches!(ty, Some(TypeExpr::Map { .. }));
                if let Some(ty) = ty {
                    self.bind_type(ty);
                }
                for elt in elts {
                    if let Some(key) = &mut elt.key {
                        // Struct composite keys are field names, not
                        // references; only map keys resolve.
                        if map_keys || !matches!(key, Expr::Ident(_)) {
                            self.bind_expr(key);
                        }
                    }
                    self.bind_expr(&mut elt.value);
                }
            }
            Expr::Call(call) => self.bind_call(call),
            Expr::Selector { x, .. } => self.bind_expr(x),
            Expr::Index { x, index, .. } => {
                self.bind_expr(x);
                self.bind_expr(index);
            }
            Expr::Unary { x, .. } | Expr::Paren { x, .. } => self.bind_expr(x),
            Expr::Binary { x, y, .. } => {
                self.bind_expr(x);
                self.bind_expr(y);
            }
            Expr::FuncLit { sig, body, .. } => {
                self.push_scope();
                self.bind_signature(sig, true);
                self.bind_block_stmts(body);
                self.pop_scope();
            }
            Expr::TypeLit { ty, .. } => self.bind_type(ty),
        }
    }

    fn bind_type(&mut self, ty: &mut TypeExpr) {
        match ty {
            TypeExpr::Name(ident) => {
                if let Some(local) = ident.path.clone() {
                    if let Some(effective) = self.imports.get(&local) {
                        ident.path = Some(effective.clone());
                    }
                }
            }
            TypeExpr::Pointer(inner) => self.bind_type(inner),
            TypeExpr::Array { len, elem } => {
                if let Some(len) = len {
                    self.bind_expr(len);
                }
                self.bind_type(elem);
            }
            TypeExpr::Map { key, value } => {
                self.bind_type(key);
                self.bind_type(value);
            }
            TypeExpr::Chan { elem, .. } => self.bind_type(elem),
            TypeExpr::Func(sig) => self.bind_signature(sig, false),
            TypeExpr::Struct(st) => {
                for field in &mut st.fields {
                    self.bind_type(&mut field.ty);
                }
            }
            TypeExpr::Interface(it) => {
                for elem in &mut it.elems {
                    match elem {
                        InterfaceElem::Embedded(ty) => self.bind_type(ty),
                        InterfaceElem::Method { sig, .. } => self.bind_signature(sig, false),
                    }
                }
            }
        }
    }
}
