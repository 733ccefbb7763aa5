//! Recursive-descent parser for the Go subset.
//!
//! The parser is position-backtracking over the token stream (parameter
//! lists need one token of retreat to distinguish names from types) and
//! allocates node ids from a caller-supplied [`NodeIdGen`] so that every
//! file of a program draws from one id sequence.
//!
//! Qualified names in type position are stored with the written qualifier in
//! the identifier's `path`; the binder later replaces it with the effective
//! import path. Qualified names in expression position are parsed as
//! selectors and collapsed by the binder.

use thiserror::Error;

use crate::ast::*;
use crate::token::{tokenize, ScanError, Token, TokenKind};

/// Parser errors.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("{line}:{col}: expected {expected}, found {found:?}")]
    Expected {
        expected: &'static str,
        found: String,
        line: u32,
        col: u32,
    },

    #[error("{line}:{col}: unsupported syntax: {what}")]
    Unsupported { what: String, line: u32, col: u32 },
}

/// Result type for parser operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Parse one source file.
pub fn parse_file(name: &str, src: &str, ids: &mut NodeIdGen) -> ParseResult<File> {
    let tokens = tokenize(src)?;
    Parser {
        toks: tokens,
        pos: 0,
        ids,
        no_composite: false,
    }
    .file(name)
}

struct Parser<'a> {
    toks: Vec<Token>,
    pos: usize,
    ids: &'a mut NodeIdGen,
    /// Set while parsing `if`/`for` headers, where a `{` after an
    /// identifier opens the body rather than a composite literal.
    no_composite: bool,
}

impl<'a> Parser<'a> {
    fn cur(&self) -> &Token {
        &self.toks[self.pos.min(self.toks.len() - 1)]
    }

    fn kind(&self) -> TokenKind {
        self.cur().kind
    }

    fn peek_kind(&self) -> TokenKind {
        self.toks
            .get(self.pos + 1)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.cur().clone();
        if self.pos < self.toks.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> ParseResult<Token> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.err_expected(expected))
        }
    }

    fn err_expected(&self, expected: &'static str) -> ParseError {
        let tok = self.cur();
        ParseError::Expected {
            expected,
            found: if tok.kind == TokenKind::Eof {
                "end of file".to_string()
            } else {
                tok.text.clone()
            },
            line: tok.line,
            col: tok.col,
        }
    }

    fn unsupported(&self, what: &str) -> ParseError {
        let tok = self.cur();
        ParseError::Unsupported {
            what: what.to_string(),
            line: tok.line,
            col: tok.col,
        }
    }

    fn fresh(&mut self) -> NodeId {
        self.ids.fresh()
    }

    fn skip_semis(&mut self) {
        while self.at(TokenKind::Semi) {
            self.advance();
        }
    }

    fn ident(&mut self) -> ParseResult<Ident> {
        let tok = self.expect(TokenKind::Ident, "identifier")?;
        Ok(Ident::new(self.fresh(), tok.text))
    }

    // ------------------------------------------------------------------
    // File structure
    // ------------------------------------------------------------------

    fn file(mut self, name: &str) -> ParseResult<File> {
        let doc = self.cur().comments.clone();
        let id = self.fresh();
        self.expect(TokenKind::Package, "package clause")?;
        let package = self.expect(TokenKind::Ident, "package name")?.text;
        self.skip_semis();

        let mut imports = Vec::new();
        while self.at(TokenKind::Import) {
            self.advance();
            if self.eat(TokenKind::LParen) {
                self.skip_semis();
                while !self.at(TokenKind::RParen) {
                    imports.push(self.import_spec()?);
                    self.skip_semis();
                }
                self.expect(TokenKind::RParen, "`)`")?;
            } else {
                imports.push(self.import_spec()?);
            }
            self.skip_semis();
        }

        let mut decls = Vec::new();
        while !self.at(TokenKind::Eof) {
            decls.push(self.top_decl()?);
            self.skip_semis();
        }

        Ok(File {
            id,
            name: name.to_string(),
            package,
            doc,
            imports,
            decls,
        })
    }

    fn import_spec(&mut self) -> ParseResult<ImportSpec> {
        let id = self.fresh();
        let alias = if self.at(TokenKind::Ident) {
            Some(self.advance().text)
        } else if self.at(TokenKind::Dot) {
            return Err(self.unsupported("dot import"));
        } else {
            None
        };
        let path_tok = self.expect(TokenKind::Str, "import path")?;
        let path = path_tok.text.trim_matches('"').to_string();
        Ok(ImportSpec { id, alias, path })
    }

    fn top_decl(&mut self) -> ParseResult<Decl> {
        let comments = self.cur().comments.clone();
        match self.kind() {
            TokenKind::Var => Ok(Decl::Var(self.var_decl(comments)?)),
            TokenKind::Const => Ok(Decl::Const(self.const_decl(comments)?)),
            TokenKind::Type => Ok(Decl::Type(self.type_decl(comments)?)),
            TokenKind::Func => Ok(Decl::Func(self.func_decl(comments)?)),
            _ => Err(self.err_expected("declaration")),
        }
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn var_decl(&mut self, comments: Vec<String>) -> ParseResult<VarDecl> {
        let id = self.fresh();
        self.expect(TokenKind::Var, "`var`")?;
        let (grouped, specs) = self.value_specs()?;
        Ok(VarDecl {
            id,
            grouped,
            specs,
            comments,
        })
    }

    fn const_decl(&mut self, comments: Vec<String>) -> ParseResult<ConstDecl> {
        let id = self.fresh();
        self.expect(TokenKind::Const, "`const`")?;
        let (grouped, specs) = self.value_specs()?;
        Ok(ConstDecl {
            id,
            grouped,
            specs,
            comments,
        })
    }

    fn value_specs(&mut self) -> ParseResult<(bool, Vec<ValueSpec>)> {
        if self.eat(TokenKind::LParen) {
            self.skip_semis();
            let mut specs = Vec::new();
            while !self.at(TokenKind::RParen) {
                specs.push(self.value_spec()?);
                self.skip_semis();
            }
            self.expect(TokenKind::RParen, "`)`")?;
            Ok((true, specs))
        } else {
            Ok((false, vec![self.value_spec()?]))
        }
    }

    fn value_spec(&mut self) -> ParseResult<ValueSpec> {
        let comments = self.cur().comments.clone();
        let id = self.fresh();
        let mut names = vec![self.ident()?];
        while self.eat(TokenKind::Comma) {
            names.push(self.ident()?);
        }
        let ty = if self.starts_type() && !self.at(TokenKind::Assign) {
            Some(self.type_expr()?)
        } else {
            None
        };
        let mut values = Vec::new();
        if self.eat(TokenKind::Assign) {
            values = self.expr_list()?;
        }
        Ok(ValueSpec {
            id,
            names,
            ty,
            values,
            comments,
        })
    }

    fn type_decl(&mut self, comments: Vec<String>) -> ParseResult<TypeDecl> {
        let id = self.fresh();
        self.expect(TokenKind::Type, "`type`")?;
        if self.eat(TokenKind::LParen) {
            self.skip_semis();
            let mut specs = Vec::new();
            while !self.at(TokenKind::RParen) {
                specs.push(self.type_spec()?);
                self.skip_semis();
            }
            self.expect(TokenKind::RParen, "`)`")?;
            Ok(TypeDecl {
                id,
                grouped: true,
                specs,
                comments,
            })
        } else {
            let specs = vec![self.type_spec()?];
            Ok(TypeDecl {
                id,
                grouped: false,
                specs,
                comments,
            })
        }
    }

    fn type_spec(&mut self) -> ParseResult<TypeSpec> {
        let comments = self.cur().comments.clone();
        let id = self.fresh();
        let name = self.ident()?;
        let assign = self.eat(TokenKind::Assign);
        let ty = self.type_expr()?;
        Ok(TypeSpec {
            id,
            name,
            assign,
            ty,
            comments,
        })
    }

    fn func_decl(&mut self, comments: Vec<String>) -> ParseResult<FuncDecl> {
        let id = self.fresh();
        self.expect(TokenKind::Func, "`func`")?;

        let recv = if self.at(TokenKind::LParen) {
            Some(self.receiver()?)
        } else {
            None
        };

        let name = self.ident()?;
        let sig = self.signature()?;
        let body = if self.at(TokenKind::LBrace) {
            Some(self.block()?)
        } else {
            None
        };

        Ok(FuncDecl {
            id,
            name,
            recv,
            sig,
            body,
            comments,
        })
    }

    fn receiver(&mut self) -> ParseResult<Receiver> {
        self.expect(TokenKind::LParen, "`(`")?;
        let id = self.fresh();
        let name = if self.at(TokenKind::Ident) && self.peek_kind() != TokenKind::RParen {
            Some(self.ident()?)
        } else {
            None
        };
        let ty = self.type_expr()?;
        self.expect(TokenKind::RParen, "`)`")?;
        Ok(Receiver { id, name, ty })
    }

    fn signature(&mut self) -> ParseResult<Signature> {
        let params = self.params()?;
        let results = self.results()?;
        Ok(Signature { params, results })
    }

    fn params(&mut self) -> ParseResult<Vec<Param>> {
        self.expect(TokenKind::LParen, "`(`")?;
        let saved = std::mem::replace(&mut self.no_composite, false);
        let mut params = Vec::new();
        while !self.at(TokenKind::RParen) {
            params.push(self.param_group()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen, "`)`")?;
        self.no_composite = saved;
        Ok(params)
    }

    /// One parameter group: `a, b int`, `int`, or `xs ...int`. A tentative
    /// bare-identifier list followed by a type start means named form;
    /// otherwise the position is rewound and a single type is read.
    fn param_group(&mut self) -> ParseResult<Param> {
        let id = self.fresh();
        let saved = self.pos;

        let mut names = Vec::new();
        loop {
            if !self.at(TokenKind::Ident) {
                names.clear();
                break;
            }
            names.push(Ident::new(self.fresh(), self.advance().text));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        let named = !names.is_empty() && (self.starts_type() || self.at(TokenKind::Ellipsis));
        if !named {
            self.pos = saved;
            names.clear();
        }

        let variadic = self.eat(TokenKind::Ellipsis);
        let ty = self.type_expr()?;
        Ok(Param {
            id,
            names,
            ty,
            variadic,
        })
    }

    fn results(&mut self) -> ParseResult<Vec<Param>> {
        if self.at(TokenKind::LParen) {
            return self.params();
        }
        if self.starts_type() && !self.at(TokenKind::LBrace) {
            let id = self.fresh();
            let ty = self.type_expr()?;
            return Ok(vec![Param {
                id,
                names: Vec::new(),
                ty,
                variadic: false,
            }]);
        }
        Ok(Vec::new())
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    fn starts_type(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::Ident
                | TokenKind::LBracket
                | TokenKind::Star
                | TokenKind::Map
                | TokenKind::Chan
                | TokenKind::Arrow
                | TokenKind::Func
                | TokenKind::Struct
                | TokenKind::Interface
        )
    }

    fn type_expr(&mut self) -> ParseResult<TypeExpr> {
        match self.kind() {
            TokenKind::Ident => {
                let first = self.advance();
                if self.eat(TokenKind::Dot) {
                    let sel = self.expect(TokenKind::Ident, "type name")?;
                    Ok(TypeExpr::Name(Ident::qualified(
                        self.fresh(),
                        sel.text,
                        first.text,
                    )))
                } else {
                    Ok(TypeExpr::Name(Ident::new(self.fresh(), first.text)))
                }
            }
            TokenKind::Star => {
                self.advance();
                Ok(TypeExpr::Pointer(Box::new(self.type_expr()?)))
            }
            TokenKind::LBracket => {
                self.advance();
                if self.eat(TokenKind::RBracket) {
                    Ok(TypeExpr::Array {
                        len: None,
                        elem: Box::new(self.type_expr()?),
                    })
                } else {
                    let saved = std::mem::replace(&mut self.no_composite, false);
                    let len = self.expr()?;
                    self.no_composite = saved;
                    self.expect(TokenKind::RBracket, "`]`")?;
                    Ok(TypeExpr::Array {
                        len: Some(Box::new(len)),
                        elem: Box::new(self.type_expr()?),
                    })
                }
            }
            TokenKind::Map => {
                self.advance();
                self.expect(TokenKind::LBracket, "`[`")?;
                let key = self.type_expr()?;
                self.expect(TokenKind::RBracket, "`]`")?;
                let value = self.type_expr()?;
                Ok(TypeExpr::Map {
                    key: Box::new(key),
                    value: Box::new(value),
                })
            }
            TokenKind::Chan => {
                self.advance();
                let dir = if self.eat(TokenKind::Arrow) {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                Ok(TypeExpr::Chan {
                    dir,
                    elem: Box::new(self.type_expr()?),
                })
            }
            TokenKind::Arrow => {
                self.advance();
                self.expect(TokenKind::Chan, "`chan`")?;
                Ok(TypeExpr::Chan {
                    dir: ChanDir::Recv,
                    elem: Box::new(self.type_expr()?),
                })
            }
            TokenKind::Func => {
                self.advance();
                Ok(TypeExpr::Func(Box::new(self.signature()?)))
            }
            TokenKind::Struct => {
                self.advance();
                Ok(TypeExpr::Struct(self.struct_type()?))
            }
            TokenKind::Interface => {
                self.advance();
                Ok(TypeExpr::Interface(self.interface_type()?))
            }
            _ => Err(self.err_expected("type")),
        }
    }

    fn struct_type(&mut self) -> ParseResult<StructType> {
        self.expect(TokenKind::LBrace, "`{`")?;
        self.skip_semis();
        let mut fields = Vec::new();
        while !self.at(TokenKind::RBrace) {
            fields.push(self.struct_field()?);
            self.skip_semis();
        }
        self.expect(TokenKind::RBrace, "`}`")?;
        Ok(StructType { fields })
    }

    fn struct_field(&mut self) -> ParseResult<StructField> {
        let comments = self.cur().comments.clone();
        let blank_before = self.cur().blank_before;
        let id = self.fresh();

        // Named fields start with an identifier list; anything else (and an
        // identifier directly followed by a field end) is an embedded type.
        let saved = self.pos;
        let mut names = Vec::new();
        loop {
            if !self.at(TokenKind::Ident) {
                names.clear();
                break;
            }
            names.push(Ident::new(self.fresh(), self.advance().text));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        if names.is_empty() || !self.starts_type() {
            self.pos = saved;
            names.clear();
        }

        let ty = self.type_expr()?;
        let tag = if self.at(TokenKind::Str) || self.at(TokenKind::RawStr) {
            Some(self.advance().text)
        } else {
            None
        };

        Ok(StructField {
            id,
            names,
            ty,
            tag,
            comments,
            blank_before,
        })
    }

    fn interface_type(&mut self) -> ParseResult<InterfaceType> {
        self.expect(TokenKind::LBrace, "`{`")?;
        self.skip_semis();
        let mut elems = Vec::new();
        while !self.at(TokenKind::RBrace) {
            if self.at(TokenKind::Ident) && self.peek_kind() == TokenKind::LParen {
                let id = self.fresh();
                let name = self.ident()?;
                let sig = self.signature()?;
                elems.push(InterfaceElem::Method { id, name, sig });
            } else {
                elems.push(InterfaceElem::Embedded(self.type_expr()?));
            }
            self.skip_semis();
        }
        self.expect(TokenKind::RBrace, "`}`")?;
        Ok(InterfaceType { elems })
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn block(&mut self) -> ParseResult<Block> {
        let id = self.fresh();
        self.expect(TokenKind::LBrace, "`{`")?;
        let saved = std::mem::replace(&mut self.no_composite, false);
        self.skip_semis();
        let mut stmts = Vec::new();
        while !self.at(TokenKind::RBrace) {
            stmts.push(self.stmt()?);
            self.skip_semis();
        }
        self.expect(TokenKind::RBrace, "`}`")?;
        self.no_composite = saved;
        Ok(Block { id, stmts })
    }

    fn stmt(&mut self) -> ParseResult<Stmt> {
        match self.kind() {
            TokenKind::Var => {
                let comments = self.cur().comments.clone();
                Ok(Stmt::VarDecl(self.var_decl(comments)?))
            }
            TokenKind::Const => {
                let comments = self.cur().comments.clone();
                Ok(Stmt::ConstDecl(self.const_decl(comments)?))
            }
            TokenKind::Return => {
                let id = self.fresh();
                self.advance();
                let results = if self.at(TokenKind::Semi) || self.at(TokenKind::RBrace) {
                    Vec::new()
                } else {
                    self.expr_list()?
                };
                Ok(Stmt::Return { id, results })
            }
            TokenKind::If => self.if_stmt().map(Stmt::If),
            TokenKind::For => self.for_stmt(),
            TokenKind::Go => {
                let id = self.fresh();
                self.advance();
                let call = self.call_stmt_expr()?;
                Ok(Stmt::Go { id, call })
            }
            TokenKind::Defer => {
                let id = self.fresh();
                self.advance();
                let call = self.call_stmt_expr()?;
                Ok(Stmt::Defer { id, call })
            }
            TokenKind::Break => {
                let id = self.fresh();
                self.advance();
                Ok(Stmt::Branch {
                    id,
                    keyword: BranchKind::Break,
                })
            }
            TokenKind::Continue => {
                let id = self.fresh();
                self.advance();
                Ok(Stmt::Branch {
                    id,
                    keyword: BranchKind::Continue,
                })
            }
            TokenKind::LBrace => Ok(Stmt::Block(self.block()?)),
            TokenKind::Switch
            | TokenKind::Select
            | TokenKind::Goto
            | TokenKind::Fallthrough
            | TokenKind::Case
            | TokenKind::Default => Err(self.unsupported(&format!(
                "`{}` statement",
                self.cur().text
            ))),
            _ => self.simple_stmt(),
        }
    }

    fn call_stmt_expr(&mut self) -> ParseResult<CallExpr> {
        let expr = self.expr()?;
        match expr {
            Expr::Call(call) => Ok(call),
            _ => Err(self.err_expected("call expression")),
        }
    }

    /// Expression, assignment, short declaration, send, or inc/dec.
    fn simple_stmt(&mut self) -> ParseResult<Stmt> {
        let id = self.fresh();
        let lhs = self.expr_list()?;

        let op = match self.kind() {
            TokenKind::Assign => Some(AssignOp::Assign),
            TokenKind::Define => Some(AssignOp::Define),
            TokenKind::PlusEq => Some(AssignOp::Op(BinaryOp::Add)),
            TokenKind::MinusEq => Some(AssignOp::Op(BinaryOp::Sub)),
            TokenKind::StarEq => Some(AssignOp::Op(BinaryOp::Mul)),
            TokenKind::SlashEq => Some(AssignOp::Op(BinaryOp::Div)),
            TokenKind::PercentEq => Some(AssignOp::Op(BinaryOp::Rem)),
            TokenKind::AmpEq => Some(AssignOp::Op(BinaryOp::And)),
            TokenKind::PipeEq => Some(AssignOp::Op(BinaryOp::Or)),
            TokenKind::CaretEq => Some(AssignOp::Op(BinaryOp::Xor)),
            TokenKind::ShlEq => Some(AssignOp::Op(BinaryOp::Shl)),
            TokenKind::ShrEq => Some(AssignOp::Op(BinaryOp::Shr)),
            TokenKind::AndNotEq => Some(AssignOp::Op(BinaryOp::AndNot)),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let rhs = self.expr_list()?;
            return Ok(Stmt::Assign { id, lhs, op, rhs });
        }

        if self.at(TokenKind::Inc) || self.at(TokenKind::Dec) {
            let inc = self.at(TokenKind::Inc);
            self.advance();
            let x = self.single(lhs)?;
            return Ok(Stmt::IncDec { id, x, inc });
        }

        if self.eat(TokenKind::Arrow) {
            let chan = self.single(lhs)?;
            let value = self.expr()?;
            return Ok(Stmt::Send { id, chan, value });
        }

        let x = self.single(lhs)?;
        Ok(Stmt::Expr { id, x })
    }

    fn single(&self, mut exprs: Vec<Expr>) -> ParseResult<Expr> {
        if exprs.len() == 1 {
            Ok(exprs.remove(0))
        } else {
            Err(self.err_expected("single expression"))
        }
    }

    fn if_stmt(&mut self) -> ParseResult<IfStmt> {
        let id = self.fresh();
        self.expect(TokenKind::If, "`if`")?;

        let saved = std::mem::replace(&mut self.no_composite, true);
        let first = self.simple_stmt()?;
        let (init, cond) = if self.eat(TokenKind::Semi) {
            let cond_stmt = self.simple_stmt()?;
            (Some(Box::new(first)), self.stmt_as_expr(cond_stmt)?)
        } else {
            (None, self.stmt_as_expr(first)?)
        };
        self.no_composite = saved;

        let then = self.block()?;
        let els = if self.eat(TokenKind::Else) {
            if self.at(TokenKind::If) {
                Some(Box::new(Stmt::If(self.if_stmt()?)))
            } else {
                Some(Box::new(Stmt::Block(self.block()?)))
            }
        } else {
            None
        };

        Ok(IfStmt {
            id,
            init,
            cond,
            then,
            els,
        })
    }

    fn stmt_as_expr(&self, stmt: Stmt) -> ParseResult<Expr> {
        match stmt {
            Stmt::Expr { x, .. } => Ok(x),
            _ => Err(self.err_expected("condition expression")),
        }
    }

    fn for_stmt(&mut self) -> ParseResult<Stmt> {
        let id = self.fresh();
        self.expect(TokenKind::For, "`for`")?;

        if self.at(TokenKind::LBrace) {
            let body = self.block()?;
            return Ok(Stmt::For(ForStmt {
                id,
                init: None,
                cond: None,
                post: None,
                body,
            }));
        }

        let saved = std::mem::replace(&mut self.no_composite, true);

        if self.eat(TokenKind::Range) {
            let x = self.expr()?;
            self.no_composite = saved;
            let body = self.block()?;
            return Ok(Stmt::Range(RangeStmt {
                id,
                key: None,
                value: None,
                define: false,
                x,
                body,
            }));
        }

        let lhs = self.expr_list()?;

        // `for k, v := range x` / `for k = range x`
        if self.at(TokenKind::Define) || self.at(TokenKind::Assign) {
            let define = self.at(TokenKind::Define);
            if matches!(self.peek_kind(), TokenKind::Range) {
                self.advance();
                self.advance();
                let x = self.expr()?;
                self.no_composite = saved;
                let body = self.block()?;
                let mut iter = lhs.into_iter();
                let key = iter.next();
                let value = iter.next();
                return Ok(Stmt::Range(RangeStmt {
                    id,
                    key,
                    value,
                    define,
                    x,
                    body,
                }));
            }
        }

        let first = self.finish_simple_stmt(lhs)?;
        if self.eat(TokenKind::Semi) {
            let cond = if self.at(TokenKind::Semi) {
                None
            } else {
                Some(self.expr()?)
            };
            self.expect(TokenKind::Semi, "`;`")?;
            let post = if self.at(TokenKind::LBrace) {
                None
            } else {
                Some(Box::new(self.simple_stmt()?))
            };
            self.no_composite = saved;
            let body = self.block()?;
            return Ok(Stmt::For(ForStmt {
                id,
                init: Some(Box::new(first)),
                cond,
                post,
                body,
            }));
        }

        // Condition-only loop.
        let cond = self.stmt_as_expr(first)?;
        self.no_composite = saved;
        let body = self.block()?;
        Ok(Stmt::For(ForStmt {
            id,
            init: None,
            cond: Some(cond),
            post: None,
            body,
        }))
    }

    /// Continue a simple statement whose expression list is already parsed.
    fn finish_simple_stmt(&mut self, lhs: Vec<Expr>) -> ParseResult<Stmt> {
        let id = self.fresh();
        let op = match self.kind() {
            TokenKind::Assign => Some(AssignOp::Assign),
            TokenKind::Define => Some(AssignOp::Define),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let rhs = self.expr_list()?;
            return Ok(Stmt::Assign { id, lhs, op, rhs });
        }
        if self.at(TokenKind::Inc) || self.at(TokenKind::Dec) {
            let inc = self.at(TokenKind::Inc);
            self.advance();
            let x = self.single(lhs)?;
            return Ok(Stmt::IncDec { id, x, inc });
        }
        let x = self.single(lhs)?;
        Ok(Stmt::Expr { id, x })
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn expr_list(&mut self) -> ParseResult<Vec<Expr>> {
        let mut exprs = vec![self.expr()?];
        while self.eat(TokenKind::Comma) {
            exprs.push(self.expr()?);
        }
        Ok(exprs)
    }

    fn expr(&mut self) -> ParseResult<Expr> {
        self.binary_expr(1)
    }

    fn binary_op(&self) -> Option<BinaryOp> {
        Some(match self.kind() {
            TokenKind::LOr => BinaryOp::LOr,
            TokenKind::LAnd => BinaryOp::LAnd,
            TokenKind::Eq => BinaryOp::Eq,
            TokenKind::Ne => BinaryOp::Ne,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::Le => BinaryOp::Le,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::Ge => BinaryOp::Ge,
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Pipe => BinaryOp::Or,
            TokenKind::Caret => BinaryOp::Xor,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Rem,
            TokenKind::Shl => BinaryOp::Shl,
            TokenKind::Shr => BinaryOp::Shr,
            TokenKind::Amp => BinaryOp::And,
            TokenKind::AndNot => BinaryOp::AndNot,
            _ => return None,
        })
    }

    fn binary_expr(&mut self, min_prec: u8) -> ParseResult<Expr> {
        let mut left = self.unary_expr()?;
        while let Some(op) = self.binary_op() {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.advance();
            let right = self.binary_expr(prec + 1)?;
            left = Expr::Binary {
                id: self.fresh(),
                op,
                x: Box::new(left),
                y: Box::new(right),
            };
        }
        Ok(left)
    }

    fn unary_expr(&mut self) -> ParseResult<Expr> {
        let op = match self.kind() {
            TokenKind::Amp => Some(UnaryOp::Amp),
            TokenKind::Star => Some(UnaryOp::Star),
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Not => Some(UnaryOp::Not),
            TokenKind::Caret => Some(UnaryOp::Caret),
            TokenKind::Arrow => Some(UnaryOp::Recv),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let x = self.unary_expr()?;
            return Ok(Expr::Unary {
                id: self.fresh(),
                op,
                x: Box::new(x),
            });
        }
        self.primary_expr()
    }

    fn primary_expr(&mut self) -> ParseResult<Expr> {
        let mut expr = self.operand()?;
        loop {
            match self.kind() {
                TokenKind::Dot => {
                    self.advance();
                    let sel = self.ident()?;
                    expr = Expr::Selector {
                        id: self.fresh(),
                        x: Box::new(expr),
                        sel,
                    };
                }
                TokenKind::LParen => {
                    self.advance();
                    let saved = std::mem::replace(&mut self.no_composite, false);
                    let mut args = Vec::new();
                    let mut ellipsis = false;
                    while !self.at(TokenKind::RParen) {
                        args.push(self.arg_expr()?);
                        if self.eat(TokenKind::Ellipsis) {
                            ellipsis = true;
                        }
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(TokenKind::RParen, "`)`")?;
                    self.no_composite = saved;
                    expr = Expr::Call(CallExpr {
                        id: self.fresh(),
                        fun: Box::new(expr),
                        args,
                        ellipsis,
                    });
                }
                TokenKind::LBracket => {
                    self.advance();
                    let saved = std::mem::replace(&mut self.no_composite, false);
                    let index = self.expr()?;
                    self.no_composite = saved;
                    self.expect(TokenKind::RBracket, "`]`")?;
                    expr = Expr::Index {
                        id: self.fresh(),
                        x: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                TokenKind::LBrace if !self.no_composite => {
                    let Some(ty) = expr_as_type(&expr) else {
                        break;
                    };
                    let elts = self.composite_body()?;
                    expr = Expr::Composite {
                        id: self.fresh(),
                        ty: Some(ty),
                        elts,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// A call argument: a type (for builtins like `make`) or an expression.
    fn arg_expr(&mut self) -> ParseResult<Expr> {
        match self.kind() {
            TokenKind::LBracket
            | TokenKind::Map
            | TokenKind::Chan
            | TokenKind::Struct
            | TokenKind::Interface => {
                let id = self.fresh();
                let ty = self.type_expr()?;
                if self.at(TokenKind::LBrace) {
                    let elts = self.composite_body()?;
                    return Ok(Expr::Composite {
                        id,
                        ty: Some(ty),
                        elts,
                    });
                }
                Ok(Expr::TypeLit { id, ty })
            }
            _ => self.expr(),
        }
    }

    fn operand(&mut self) -> ParseResult<Expr> {
        match self.kind() {
            TokenKind::Ident => {
                let tok = self.advance();
                Ok(Expr::Ident(Ident::new(self.fresh(), tok.text)))
            }
            TokenKind::Int => self.lit(LitKind::Int),
            TokenKind::Float => self.lit(LitKind::Float),
            TokenKind::Char => self.lit(LitKind::Char),
            TokenKind::Str | TokenKind::RawStr => self.lit(LitKind::Str),
            TokenKind::LParen => {
                self.advance();
                let saved = std::mem::replace(&mut self.no_composite, false);
                let x = self.expr()?;
                self.no_composite = saved;
                self.expect(TokenKind::RParen, "`)`")?;
                Ok(Expr::Paren {
                    id: self.fresh(),
                    x: Box::new(x),
                })
            }
            TokenKind::Func => {
                self.advance();
                let sig = self.signature()?;
                if self.at(TokenKind::LBrace) {
                    let body = self.block()?;
                    Ok(Expr::FuncLit {
                        id: self.fresh(),
                        sig,
                        body,
                    })
                } else {
                    Ok(Expr::TypeLit {
                        id: self.fresh(),
                        ty: TypeExpr::Func(Box::new(sig)),
                    })
                }
            }
            TokenKind::LBracket
            | TokenKind::Map
            | TokenKind::Chan
            | TokenKind::Struct
            | TokenKind::Interface => {
                let id = self.fresh();
                let ty = self.type_expr()?;
                if self.at(TokenKind::LBrace) && !matches!(ty, TypeExpr::Chan { .. }) {
                    let elts = self.composite_body()?;
                    Ok(Expr::Composite {
                        id,
                        ty: Some(ty),
                        elts,
                    })
                } else {
                    Ok(Expr::TypeLit { id, ty })
                }
            }
            _ => Err(self.err_expected("expression")),
        }
    }

    fn lit(&mut self, kind: LitKind) -> ParseResult<Expr> {
        let tok = self.advance();
        Ok(Expr::Lit(Lit {
            id: self.fresh(),
            kind,
            text: tok.text,
        }))
    }

    fn composite_body(&mut self) -> ParseResult<Vec<CompositeElt>> {
        self.expect(TokenKind::LBrace, "`{`")?;
        let saved = std::mem::replace(&mut self.no_composite, false);
        self.skip_semis();
        let mut elts = Vec::new();
        while !self.at(TokenKind::RBrace) {
            let first = self.elt_value()?;
            let elt = if self.eat(TokenKind::Colon) {
                let value = self.elt_value()?;
                CompositeElt {
                    key: Some(first),
                    value,
                }
            } else {
                CompositeElt {
                    key: None,
                    value: first,
                }
            };
            elts.push(elt);
            if !self.eat(TokenKind::Comma) {
                self.skip_semis();
                break;
            }
            self.skip_semis();
        }
        self.expect(TokenKind::RBrace, "`}`")?;
        self.no_composite = saved;
        Ok(elts)
    }

    /// A composite literal element value, allowing nested elided literals.
    fn elt_value(&mut self) -> ParseResult<Expr> {
        if self.at(TokenKind::LBrace) {
            let id = self.fresh();
            let elts = self.composite_body()?;
            return Ok(Expr::Composite {
                id,
                ty: None,
                elts,
            });
        }
        self.expr()
    }
}

/// Reinterpret an expression as a type for composite literal syntax
/// (`T{...}`, `pkg.T{...}`).
fn expr_as_type(expr: &Expr) -> Option<TypeExpr> {
    match expr {
        Expr::Ident(id) => Some(TypeExpr::Name(id.clone())),
        Expr::Selector { x, sel, .. } => match x.as_ref() {
            Expr::Ident(pkg) if pkg.path.is_none() => Some(TypeExpr::Name(Ident {
                id: sel.id,
                name: sel.name.clone(),
                path: Some(pkg.name.clone()),
            })),
            _ => None,
        },
        Expr::TypeLit { ty, .. } => Some(ty.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> File {
        let mut ids = NodeIdGen::new();
        parse_file("test.go", src, &mut ids).unwrap()
    }

    #[test]
    fn package_clause_and_imports() {
        let f = parse("package a\n\nimport \"root/b\"\n");
        assert_eq!(f.package, "a");
        assert_eq!(f.imports.len(), 1);
        assert_eq!(f.imports[0].path, "root/b");
    }

    #[test]
    fn grouped_imports_with_alias() {
        let f = parse("package a\n\nimport (\n\t\"fmt\"\n\tx \"root/b\"\n)\n");
        assert_eq!(f.imports.len(), 2);
        assert_eq!(f.imports[1].alias.as_deref(), Some("x"));
    }

    #[test]
    fn var_decl_forms() {
        let f = parse("package a\n\nvar B int\n\nvar C, D = 1, 2\n\nvar (\n\tE string\n)\n");
        assert_eq!(f.decls.len(), 3);
        match &f.decls[1] {
            Decl::Var(v) => {
                assert_eq!(v.specs[0].names.len(), 2);
                assert_eq!(v.specs[0].values.len(), 2);
                assert!(v.specs[0].ty.is_none());
            }
            _ => panic!("expected var decl"),
        }
    }

    #[test]
    fn func_with_receiver() {
        let f = parse("package a\n\nfunc (t *T) M(x int) string { return \"\" }\n");
        match &f.decls[0] {
            Decl::Func(fd) => {
                assert!(fd.is_method());
                assert_eq!(fd.recv.as_ref().unwrap().base_name(), Some("T"));
                assert_eq!(fd.sig.params.len(), 1);
                assert_eq!(fd.sig.results.len(), 1);
            }
            _ => panic!("expected func decl"),
        }
    }

    #[test]
    fn unnamed_params() {
        let f = parse("package a\n\nfunc F(int, string) {}\n");
        match &f.decls[0] {
            Decl::Func(fd) => {
                assert_eq!(fd.sig.params.len(), 2);
                assert!(fd.sig.params.iter().all(|p| p.names.is_empty()));
            }
            _ => panic!("expected func decl"),
        }
    }

    #[test]
    fn grouped_named_params() {
        let f = parse("package a\n\nfunc F(a, b int, c string) {}\n");
        match &f.decls[0] {
            Decl::Func(fd) => {
                assert_eq!(fd.sig.params.len(), 2);
                assert_eq!(fd.sig.params[0].names.len(), 2);
            }
            _ => panic!("expected func decl"),
        }
    }

    #[test]
    fn qualified_call_parses_as_selector() {
        let f = parse("package a\n\nimport \"root/b\"\n\nfunc A() { b.B() }\n");
        match &f.decls[0] {
            Decl::Func(fd) => {
                let body = fd.body.as_ref().unwrap();
                match &body.stmts[0] {
                    Stmt::Expr {
                        x: Expr::Call(call),
                        ..
                    } => {
                        assert!(matches!(call.fun.as_ref(), Expr::Selector { .. }));
                    }
                    other => panic!("expected call statement, got {:?}", other),
                }
            }
            _ => panic!("expected func decl"),
        }
    }

    #[test]
    fn struct_type_decl() {
        let f = parse("package a\n\ntype T struct {\n\ti int\n\ts, u string\n}\n");
        match &f.decls[0] {
            Decl::Type(td) => match &td.specs[0].ty {
                TypeExpr::Struct(st) => {
                    assert_eq!(st.fields.len(), 2);
                    assert_eq!(st.fields[1].names.len(), 2);
                }
                other => panic!("expected struct type, got {:?}", other),
            },
            _ => panic!("expected type decl"),
        }
    }

    #[test]
    fn alias_type_decl() {
        let f = parse("package a\n\ntype Count int\n");
        match &f.decls[0] {
            Decl::Type(td) => {
                assert!(matches!(td.specs[0].ty, TypeExpr::Name(_)));
                assert!(!td.specs[0].assign);
            }
            _ => panic!("expected type decl"),
        }
    }

    #[test]
    fn composite_literal_in_if_header_requires_parens() {
        // `if x == (T{})` is fine; a bare `T{` would open the body.
        let f = parse("package a\n\nfunc F(x T) bool { if x == (T{}) { return true }\n return false }\n");
        match &f.decls[0] {
            Decl::Func(fd) => assert_eq!(fd.body.as_ref().unwrap().stmts.len(), 2),
            _ => panic!("expected func decl"),
        }
    }

    #[test]
    fn for_range_forms() {
        let f = parse("package a\n\nfunc F(m map[string]int) {\n\tfor k, v := range m {\n\t\t_ = k\n\t\t_ = v\n\t}\n}\n");
        match &f.decls[0] {
            Decl::Func(fd) => {
                assert!(matches!(fd.body.as_ref().unwrap().stmts[0], Stmt::Range(_)));
            }
            _ => panic!("expected func decl"),
        }
    }

    #[test]
    fn make_and_builtin_type_args() {
        let f = parse("package a\n\nvar m = make(map[string]int, 4)\n");
        match &f.decls[0] {
            Decl::Var(v) => match &v.specs[0].values[0] {
                Expr::Call(call) => {
                    assert!(matches!(call.args[0], Expr::TypeLit { .. }));
                }
                other => panic!("expected call, got {:?}", other),
            },
            _ => panic!("expected var decl"),
        }
    }

    #[test]
    fn unsupported_statements_are_rejected() {
        let mut ids = NodeIdGen::new();
        let err = parse_file(
            "test.go",
            "package a\n\nfunc F(x int) {\n\tswitch x {\n\t}\n}\n",
            &mut ids,
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::Unsupported { .. }));
    }

    #[test]
    fn leading_comments_attach_to_decl() {
        let f = parse("package a\n\n// B holds a count.\nvar B int\n");
        match &f.decls[0] {
            Decl::Var(v) => assert_eq!(v.comments, vec!["// B holds a count.".to_string()]),
            _ => panic!("expected var decl"),
        }
    }
}
