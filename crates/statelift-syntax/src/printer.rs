//! Canonical source printer.
//!
//! Renders a file deterministically: tab indentation, one blank line
//! between top-level declarations, leading comments re-emitted above the
//! node that carries them.
//!
//! Import declarations are recomputed rather than copied: the set of
//! qualifier paths referenced anywhere in the file decides which imports
//! are emitted, missing ones are added, unused ones are dropped, and local
//! names come from the original import's alias when present, falling back
//! to the last path segment. Blank (`_`) imports are always kept.

use std::collections::{BTreeMap, BTreeSet};

use crate::ast::*;
use crate::walk::{walk_file, Visitor};

/// Print one file to source text.
pub fn print_file(file: &File) -> String {
    let imports = resolve_imports(file);
    let mut p = Printer {
        buf: String::new(),
        indent: 0,
        locals: imports.locals,
    };
    p.file(file, &imports.specs);
    p.buf
}

struct ResolvedImports {
    /// Effective path → local name, for qualified identifier printing.
    locals: BTreeMap<String, String>,
    /// Import lines to emit: (explicit local name, path), sorted by path.
    specs: Vec<(Option<String>, String)>,
}

struct QualifierCollector {
    paths: BTreeSet<String>,
}

impl Visitor for QualifierCollector {
    fn visit_ident(&mut self, ident: &Ident) {
        if let Some(path) = &ident.path {
            self.paths.insert(path.clone());
        }
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn resolve_imports(file: &File) -> ResolvedImports {
    let mut collector = QualifierCollector {
        paths: BTreeSet::new(),
    };
    walk_file(&mut collector, file);

    // Written imports, by path and by local name. A referenced "path" that
    // is actually the local name of a written import (a tree that was never
    // bound) resolves to that import.
    let mut by_path: BTreeMap<&str, &ImportSpec> = BTreeMap::new();
    let mut by_local: BTreeMap<&str, &ImportSpec> = BTreeMap::new();
    for spec in &file.imports {
        by_path.insert(spec.path.as_str(), spec);
        let local = spec.alias.as_deref().unwrap_or(last_segment(&spec.path));
        by_local.entry(local).or_insert(spec);
    }

    let mut locals = BTreeMap::new();
    let mut specs = Vec::new();
    let mut taken: BTreeSet<String> = BTreeSet::new();

    let mut referenced: Vec<(String, Option<String>)> = Vec::new();
    for path in &collector.paths {
        if let Some(spec) = by_path.get(path.as_str()) {
            referenced.push((spec.path.clone(), spec.alias.clone()));
        } else if let Some(spec) = by_local.get(path.as_str()) {
            referenced.push((spec.path.clone(), spec.alias.clone()));
            locals.insert(path.clone(), spec.alias.clone().unwrap_or_else(|| last_segment(&spec.path).to_string()));
        } else {
            referenced.push((path.clone(), None));
        }
    }
    referenced.sort();
    referenced.dedup();

    for (path, alias) in referenced {
        let preferred = alias
            .clone()
            .unwrap_or_else(|| last_segment(&path).to_string());
        let mut local = preferred.clone();
        let mut n = 1;
        while taken.contains(&local) {
            local = format!("{}{}", preferred, n);
            n += 1;
        }
        taken.insert(local.clone());
        let explicit = if local != last_segment(&path) {
            Some(local.clone())
        } else {
            alias
        };
        locals.entry(path.clone()).or_insert_with(|| local.clone());
        specs.push((explicit, path));
    }

    // Blank imports survive unconditionally.
    for spec in &file.imports {
        if spec.alias.as_deref() == Some("_") && !specs.iter().any(|(_, p)| *p == spec.path) {
            specs.push((Some("_".to_string()), spec.path.clone()));
        }
    }
    specs.sort_by(|a, b| a.1.cmp(&b.1));

    ResolvedImports { locals, specs }
}

struct Printer {
    buf: String,
    indent: usize,
    locals: BTreeMap<String, String>,
}

impl Printer {
    fn push(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    fn line(&mut self, s: &str) {
        self.newline();
        self.push(s);
    }

    fn newline(&mut self) {
        self.buf.push('\n');
        for _ in 0..self.indent {
            self.buf.push('\t');
        }
    }

    fn blank_line(&mut self) {
        self.buf.push('\n');
    }

    fn comments(&mut self, comments: &[String]) {
        for comment in comments {
            self.line(comment);
        }
    }

    fn local_for(&self, path: &str) -> String {
        match self.locals.get(path) {
            Some(local) => local.clone(),
            None => last_segment(path).to_string(),
        }
    }

    // ------------------------------------------------------------------
    // File structure
    // ------------------------------------------------------------------

    fn file(&mut self, file: &File, imports: &[(Option<String>, String)]) {
        for comment in &file.doc {
            self.push(comment);
            self.buf.push('\n');
        }
        self.push(&format!("package {}", file.package));
        self.buf.push('\n');

        if !imports.is_empty() {
            self.blank_line();
            if imports.len() == 1 {
                match &imports[0].0 {
                    Some(alias) => self.push(&format!("import {} \"{}\"", alias, imports[0].1)),
                    None => self.push(&format!("import \"{}\"", imports[0].1)),
                }
            } else {
                self.push("import (");
                self.indent += 1;
                for (alias, path) in imports {
                    match alias {
                        Some(alias) => self.line(&format!("{} \"{}\"", alias, path)),
                        None => self.line(&format!("\"{}\"", path)),
                    }
                }
                self.indent -= 1;
                self.line(")");
            }
            self.buf.push('\n');
        }

        for decl in &file.decls {
            self.blank_line();
            self.decl(decl);
            self.buf.push('\n');
        }
    }

    fn decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Var(var) => self.value_decl("var", var.grouped, &var.specs, &var.comments),
            Decl::Const(konst) => {
                self.value_decl("const", konst.grouped, &konst.specs, &konst.comments)
            }
            Decl::Type(td) => self.type_decl(td),
            Decl::Func(fd) => self.func_decl(fd),
        }
    }

    fn value_decl(&mut self, keyword: &str, grouped: bool, specs: &[ValueSpec], comments: &[String]) {
        for comment in comments {
            self.push(comment);
            self.newline();
        }
        if grouped {
            self.push(keyword);
            self.push(" (");
            self.indent += 1;
            for spec in specs {
                self.comments(&spec.comments);
                self.newline();
                self.value_spec(spec);
            }
            self.indent -= 1;
            self.line(")");
        } else {
            self.push(keyword);
            self.push(" ");
            self.value_spec(&specs[0]);
        }
    }

    fn value_spec(&mut self, spec: &ValueSpec) {
        let names: Vec<&str> = spec.names.iter().map(|n| n.name.as_str()).collect();
        self.push(&names.join(", "));
        if let Some(ty) = &spec.ty {
            self.push(" ");
            self.type_expr(ty, false);
        }
        if !spec.values.is_empty() {
            self.push(" = ");
            for (i, value) in spec.values.iter().enumerate() {
                if i > 0 {
                    self.push(", ");
                }
                self.expr(value);
            }
        }
    }

    fn type_decl(&mut self, decl: &TypeDecl) {
        for comment in &decl.comments {
            self.push(comment);
            self.newline();
        }
        if decl.grouped {
            self.push("type (");
            self.indent += 1;
            for spec in &decl.specs {
                self.comments(&spec.comments);
                self.newline();
                self.type_spec(spec);
            }
            self.indent -= 1;
            self.line(")");
        } else {
            self.push("type ");
            self.type_spec(&decl.specs[0]);
        }
    }

    fn type_spec(&mut self, spec: &TypeSpec) {
        self.push(&spec.name.name);
        if spec.assign {
            self.push(" = ");
        } else {
            self.push(" ");
        }
        self.type_expr(&spec.ty, true);
    }

    fn func_decl(&mut self, decl: &FuncDecl) {
        for comment in &decl.comments {
            self.push(comment);
            self.newline();
        }
        self.push("func ");
        if let Some(recv) = &decl.recv {
            self.push("(");
            if let Some(name) = &recv.name {
                self.push(&name.name);
                self.push(" ");
            }
            self.type_expr(&recv.ty, false);
            self.push(") ");
        }
        self.push(&decl.name.name);
        self.signature(&decl.sig);
        match &decl.body {
            Some(body) if body.stmts.is_empty() => self.push(" {}"),
            Some(body) => {
                self.push(" ");
                self.block(body);
            }
            None => {}
        }
    }

    fn signature(&mut self, sig: &Signature) {
        self.push("(");
        self.params(&sig.params);
        self.push(")");
        match sig.results.len() {
            0 => {}
            1 if sig.results[0].names.is_empty() => {
                self.push(" ");
                self.type_expr(&sig.results[0].ty, false);
            }
            _ => {
                self.push(" (");
                self.params(&sig.results);
                self.push(")");
            }
        }
    }

    fn params(&mut self, params: &[Param]) {
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            if !param.names.is_empty() {
                let names: Vec<&str> = param.names.iter().map(|n| n.name.as_str()).collect();
                self.push(&names.join(", "));
                self.push(" ");
            }
            if param.variadic {
                self.push("...");
            }
            self.type_expr(&param.ty, false);
        }
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    /// `decl_form` selects the multi-line layout for empty struct and
    /// interface bodies used in type declarations.
    fn type_expr(&mut self, ty: &TypeExpr, decl_form: bool) {
        match ty {
            TypeExpr::Name(ident) => self.ident(ident),
            TypeExpr::Pointer(inner) => {
                self.push("*");
                self.type_expr(inner, false);
            }
            TypeExpr::Array { len, elem } => {
                self.push("[");
                if let Some(len) = len {
                    self.expr(len);
                }
                self.push("]");
                self.type_expr(elem, false);
            }
            TypeExpr::Map { key, value } => {
                self.push("map[");
                self.type_expr(key, false);
                self.push("]");
                self.type_expr(value, false);
            }
            TypeExpr::Chan { dir, elem } => {
                match dir {
                    ChanDir::Both => self.push("chan "),
                    ChanDir::Send => self.push("chan<- "),
                    ChanDir::Recv => self.push("<-chan "),
                }
                self.type_expr(elem, false);
            }
            TypeExpr::Func(sig) => {
                self.push("func");
                self.signature(sig);
            }
            TypeExpr::Struct(st) => self.struct_type(st, decl_form),
            TypeExpr::Interface(it) => self.interface_type(it, decl_form),
        }
    }

    fn struct_type(&mut self, st: &StructType, decl_form: bool) {
        if st.fields.is_empty() {
            if decl_form {
                self.push("struct {");
                self.line("}");
            } else {
                self.push("struct{}");
            }
            return;
        }
        self.push("struct {");
        self.indent += 1;
        for field in &st.fields {
            if field.blank_before {
                self.blank_line();
            }
            self.comments(&field.comments);
            self.newline();
            if !field.names.is_empty() {
                let names: Vec<&str> = field.names.iter().map(|n| n.name.as_str()).collect();
                self.push(&names.join(", "));
                self.push(" ");
            }
            self.type_expr(&field.ty, false);
            if let Some(tag) = &field.tag {
                self.push(" ");
                self.push(tag);
            }
        }
        self.indent -= 1;
        self.line("}");
    }

    fn interface_type(&mut self, it: &InterfaceType, decl_form: bool) {
        if it.elems.is_empty() {
            if decl_form {
                self.push("interface {");
                self.line("}");
            } else {
                self.push("interface{}");
            }
            return;
        }
        self.push("interface {");
        self.indent += 1;
        for elem in &it.elems {
            self.newline();
            match elem {
                InterfaceElem::Embedded(ty) => self.type_expr(ty, false),
                InterfaceElem::Method { name, sig, .. } => {
                    self.push(&name.name);
                    self.signature(sig);
                }
            }
        }
        self.indent -= 1;
        self.line("}");
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn block(&mut self, block: &Block) {
        self.push("{");
        self.indent += 1;
        for stmt in &block.stmts {
            self.newline();
            self.stmt(stmt);
        }
        self.indent -= 1;
        self.line("}");
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::VarDecl(var) => self.value_decl("var", var.grouped, &var.specs, &var.comments),
            Stmt::ConstDecl(konst) => {
                self.value_decl("const", konst.grouped, &konst.specs, &konst.comments)
            }
            Stmt::Expr { x, .. } => self.expr(x),
            Stmt::Assign { lhs, op, rhs, .. } => {
                for (i, e) in lhs.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.expr(e);
                }
                match op {
                    AssignOp::Assign => self.push(" = "),
                    AssignOp::Define => self.push(" := "),
                    AssignOp::Op(binop) => {
                        self.push(" ");
                        self.push(binop.as_str());
                        self.push("= ");
                    }
                }
                for (i, e) in rhs.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.expr(e);
                }
            }
            Stmt::Return { results, .. } => {
                self.push("return");
                for (i, e) in results.iter().enumerate() {
                    self.push(if i == 0 { " " } else { ", " });
                    self.expr(e);
                }
            }
            Stmt::If(ifs) => self.if_stmt(ifs),
            Stmt::For(fs) => {
                self.push("for ");
                match (&fs.init, &fs.cond, &fs.post) {
                    (None, None, None) => {}
                    (None, Some(cond), None) => {
                        self.expr(cond);
                        self.push(" ");
                    }
                    (init, cond, post) => {
                        if let Some(init) = init {
                            self.stmt(init);
                        }
                        self.push("; ");
                        if let Some(cond) = cond {
                            self.expr(cond);
                        }
                        self.push("; ");
                        if let Some(post) = post {
                            self.stmt(post);
                        }
                        self.push(" ");
                    }
                }
                self.block(&fs.body);
            }
            Stmt::Range(rs) => {
                self.push("for ");
                if let Some(key) = &rs.key {
                    self.expr(key);
                    if let Some(value) = &rs.value {
                        self.push(", ");
                        self.expr(value);
                    }
                    self.push(if rs.define { " := " } else { " = " });
                }
                self.push("range ");
                self.expr(&rs.x);
                self.push(" ");
                self.block(&rs.body);
            }
            Stmt::Block(block) => self.block(block),
            Stmt::Go { call, .. } => {
                self.push("go ");
                self.call(call);
            }
            Stmt::Defer { call, .. } => {
                self.push("defer ");
                self.call(call);
            }
            Stmt::Send { chan, value, .. } => {
                self.expr(chan);
                self.push(" <- ");
                self.expr(value);
            }
            Stmt::IncDec { x, inc, .. } => {
                self.expr(x);
                self.push(if *inc { "++" } else { "--" });
            }
            Stmt::Branch { keyword, .. } => match keyword {
                BranchKind::Break => self.push("break"),
                BranchKind::Continue => self.push("continue"),
            },
        }
    }

    fn if_stmt(&mut self, ifs: &IfStmt) {
        self.push("if ");
        if let Some(init) = &ifs.init {
            self.stmt(init);
            self.push("; ");
        }
        self.expr(&ifs.cond);
        self.push(" ");
        self.block(&ifs.then);
        if let Some(els) = &ifs.els {
            self.push(" else ");
            match els.as_ref() {
                Stmt::If(nested) => self.if_stmt(nested),
                Stmt::Block(block) => self.block(block),
                other => self.stmt(other),
            }
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn ident(&mut self, ident: &Ident) {
        if let Some(path) = &ident.path {
            let local = self.local_for(path);
            self.push(&local);
            self.push(".");
        }
        self.push(&ident.name);
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Ident(ident) => self.ident(ident),
            Expr::Lit(lit) => self.push(&lit.text),
            Expr::Composite { ty, elts, .. } => {
                if let Some(ty) = ty {
                    self.type_expr(ty, false);
                }
                self.push("{");
                for (i, elt) in elts.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    if let Some(key) = &elt.key {
                        self.expr(key);
                        self.push(": ");
                    }
                    self.expr(&elt.value);
                }
                self.push("}");
            }
            Expr::Call(call) => self.call(call),
            Expr::Selector { x, sel, .. } => {
                self.expr(x);
                self.push(".");
                self.push(&sel.name);
            }
            Expr::Index { x, index, .. } => {
                self.expr(x);
                self.push("[");
                self.expr(index);
                self.push("]");
            }
            Expr::Unary { op, x, .. } => {
                self.push(op.as_str());
                self.expr(x);
            }
            Expr::Binary { op, x, y, .. } => {
                self.expr(x);
                self.push(" ");
                self.push(op.as_str());
                self.push(" ");
                self.expr(y);
            }
            Expr::Paren { x, .. } => {
                self.push("(");
                self.expr(x);
                self.push(")");
            }
            Expr::FuncLit { sig, body, .. } => {
                self.push("func");
                self.signature(sig);
                self.push(" ");
                self.block(body);
            }
            Expr::TypeLit { ty, .. } => self.type_expr(ty, false),
        }
    }

    fn call(&mut self, call: &CallExpr) {
        self.expr(&call.fun);
        self.push("(");
        for (i, arg) in call.args.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.expr(arg);
        }
        if call.ellipsis {
            self.push("...");
        }
        self.push(")");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_file;

    fn roundtrip(src: &str) -> String {
        let mut ids = NodeIdGen::new();
        let file = parse_file("t.go", src, &mut ids).unwrap();
        print_file(&file)
    }

    #[test]
    fn empty_func_prints_inline_braces() {
        let out = roundtrip("package a\n\nfunc A() {}\n");
        assert_eq!(out, "package a\n\nfunc A() {}\n");
    }

    #[test]
    fn var_decl_roundtrip() {
        let out = roundtrip("package a\n\nvar B int\n");
        assert_eq!(out, "package a\n\nvar B int\n");
    }

    #[test]
    fn struct_decl_layout() {
        let out = roundtrip("package a\n\ntype T struct {\n\ti int\n}\n");
        assert_eq!(out, "package a\n\ntype T struct {\n\ti int\n}\n");
    }

    #[test]
    fn empty_struct_decl_is_two_lines() {
        let out = roundtrip("package a\n\ntype T struct {\n}\n");
        assert_eq!(out, "package a\n\ntype T struct {\n}\n");
    }

    #[test]
    fn imports_are_recomputed_from_qualifiers() {
        let mut ids = NodeIdGen::new();
        let mut file = parse_file("t.go", "package a\n\nfunc A() {}\n", &mut ids).unwrap();
        // Decorate the file with a cross-package reference by hand.
        match &mut file.decls[0] {
            Decl::Func(fd) => {
                let call = CallExpr {
                    id: ids.fresh(),
                    fun: Box::new(Expr::Ident(Ident::qualified(ids.fresh(), "B", "root/b"))),
                    args: Vec::new(),
                    ellipsis: false,
                };
                fd.body.as_mut().unwrap().stmts.push(Stmt::Expr {
                    id: ids.fresh(),
                    x: Expr::Call(call),
                });
            }
            _ => panic!("expected func decl"),
        }
        let out = print_file(&file);
        assert_eq!(
            out,
            "package a\n\nimport \"root/b\"\n\nfunc A() {\n\tb.B()\n}\n"
        );
    }

    #[test]
    fn unused_imports_are_dropped() {
        let out = roundtrip("package a\n\nimport \"root/b\"\n\nfunc A() {}\n");
        assert_eq!(out, "package a\n\nfunc A() {}\n");
    }

    #[test]
    fn blank_imports_survive() {
        let out = roundtrip("package a\n\nimport _ \"root/side\"\n\nfunc A() {}\n");
        assert_eq!(out, "package a\n\nimport _ \"root/side\"\n\nfunc A() {}\n");
    }

    #[test]
    fn alias_is_preserved_for_referenced_import() {
        let mut ids = NodeIdGen::new();
        let mut file = parse_file(
            "t.go",
            "package a\n\nimport x \"root/b\"\n\nfunc A() {}\n",
            &mut ids,
        )
        .unwrap();
        match &mut file.decls[0] {
            Decl::Func(fd) => {
                fd.body.as_mut().unwrap().stmts.push(Stmt::Expr {
                    id: ids.fresh(),
                    x: Expr::Ident(Ident::qualified(ids.fresh(), "V", "root/b")),
                });
            }
            _ => panic!("expected func decl"),
        }
        let out = print_file(&file);
        assert_eq!(
            out,
            "package a\n\nimport x \"root/b\"\n\nfunc A() {\n\tx.V\n}\n"
        );
    }

    #[test]
    fn colliding_import_names_get_suffixes() {
        let mut ids = NodeIdGen::new();
        let mut file = parse_file("t.go", "package a\n\nfunc A() {}\n", &mut ids).unwrap();
        match &mut file.decls[0] {
            Decl::Func(fd) => {
                let body = fd.body.as_mut().unwrap();
                body.stmts.push(Stmt::Expr {
                    id: ids.fresh(),
                    x: Expr::Ident(Ident::qualified(ids.fresh(), "V", "root/util")),
                });
                body.stmts.push(Stmt::Expr {
                    id: ids.fresh(),
                    x: Expr::Ident(Ident::qualified(ids.fresh(), "W", "other/util")),
                });
            }
            _ => panic!("expected func decl"),
        }
        let out = print_file(&file);
        assert!(out.contains("\"other/util\""));
        assert!(out.contains("util1 \"root/util\""));
        assert!(out.contains("util.W"));
        assert!(out.contains("util1.V"));
    }

    #[test]
    fn method_with_receiver() {
        let out = roundtrip("package a\n\nfunc (t *T) M(x int) string {\n\treturn \"\"\n}\n");
        assert_eq!(
            out,
            "package a\n\nfunc (t *T) M(x int) string {\n\treturn \"\"\n}\n"
        );
    }

    #[test]
    fn if_else_and_for_layout() {
        let src = "package a\n\nfunc F(x int) int {\n\tif x > 0 {\n\t\treturn x\n\t} else {\n\t\treturn -x\n\t}\n}\n";
        assert_eq!(roundtrip(src), src);
    }

    #[test]
    fn grouped_var_decl_layout() {
        let src = "package a\n\nvar (\n\tB int\n\tC string\n)\n";
        assert_eq!(roundtrip(src), src);
    }

    #[test]
    fn decl_comments_are_kept() {
        let src = "package a\n\n// B holds a count.\nvar B int\n";
        assert_eq!(roundtrip(src), src);
    }
}
