//! Tokenizer for the Go subset.
//!
//! Produces a flat token stream with line/column positions, Go's automatic
//! semicolon insertion, and comment capture. Comments are not tokens of their
//! own; each token carries the comments that preceded it, so the parser can
//! attach them as leading decorations.

use thiserror::Error;

/// Token kinds for the Go subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Ident,
    Int,
    Float,
    Char,
    Str,
    RawStr,

    // Keywords.
    Package,
    Import,
    Var,
    Const,
    Type,
    Func,
    Return,
    If,
    Else,
    For,
    Range,
    Go,
    Defer,
    Struct,
    Interface,
    Map,
    Chan,
    Break,
    Continue,
    Switch,
    Case,
    Default,
    Select,
    Goto,
    Fallthrough,

    // Delimiters and operators.
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semi,
    Colon,
    Dot,
    Ellipsis,
    Assign,
    Define,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Shl,
    Shr,
    AndNot,
    LAnd,
    LOr,
    Not,
    Arrow,
    Inc,
    Dec,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    AmpEq,
    PipeEq,
    CaretEq,
    ShlEq,
    ShrEq,
    AndNotEq,

    Eof,
}

impl TokenKind {
    /// Whether a newline after a token of this kind triggers semicolon insertion.
    fn ends_statement(self) -> bool {
        matches!(
            self,
            TokenKind::Ident
                | TokenKind::Int
                | TokenKind::Float
                | TokenKind::Char
                | TokenKind::Str
                | TokenKind::RawStr
                | TokenKind::Return
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Fallthrough
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
                | TokenKind::Inc
                | TokenKind::Dec
        )
    }
}

/// One token with position and leading decorations.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token. For string/char literals this is the raw
    /// text including quotes; escapes are not processed.
    pub text: String,
    pub line: u32,
    pub col: u32,
    /// Comment lines (full text, including the `//` or `/* */` markers)
    /// between the previous token and this one.
    pub comments: Vec<String>,
    /// A blank line separated this token (or its comment block) from the
    /// previous token.
    pub blank_before: bool,
}

/// Tokenizer errors.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("{line}:{col}: unexpected character {ch:?}")]
    UnexpectedChar { ch: char, line: u32, col: u32 },
    #[error("{line}:{col}: unterminated {what}")]
    Unterminated {
        what: &'static str,
        line: u32,
        col: u32,
    },
}

fn keyword_kind(word: &str) -> Option<TokenKind> {
    Some(match word {
        "package" => TokenKind::Package,
        "import" => TokenKind::Import,
        "var" => TokenKind::Var,
        "const" => TokenKind::Const,
        "type" => TokenKind::Type,
        "func" => TokenKind::Func,
        "return" => TokenKind::Return,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "for" => TokenKind::For,
        "range" => TokenKind::Range,
        "go" => TokenKind::Go,
        "defer" => TokenKind::Defer,
        "struct" => TokenKind::Struct,
        "interface" => TokenKind::Interface,
        "map" => TokenKind::Map,
        "chan" => TokenKind::Chan,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "switch" => TokenKind::Switch,
        "case" => TokenKind::Case,
        "default" => TokenKind::Default,
        "select" => TokenKind::Select,
        "goto" => TokenKind::Goto,
        "fallthrough" => TokenKind::Fallthrough,
        _ => return None,
    })
}

struct Scanner<'a> {
    src: &'a [u8],
    pos: usize,
    line: u32,
    col: u32,
    tokens: Vec<Token>,
    pending_comments: Vec<String>,
    pending_blank: bool,
    newlines_since_token: u32,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Scanner {
            src: src.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
            tokens: Vec::new(),
            pending_comments: Vec::new(),
            pending_blank: false,
            newlines_since_token: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<u8> {
        self.src.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn push(&mut self, kind: TokenKind, text: String, line: u32, col: u32) {
        let comments = std::mem::take(&mut self.pending_comments);
        let blank_before = self.pending_blank || self.newlines_since_token >= 2;
        self.pending_blank = false;
        self.newlines_since_token = 0;
        self.tokens.push(Token {
            kind,
            text,
            line,
            col,
            comments,
            blank_before,
        });
    }

    /// Insert a synthetic semicolon if the previous token allows one.
    fn maybe_insert_semi(&mut self) {
        let ends = self
            .tokens
            .last()
            .map(|t| t.kind.ends_statement())
            .unwrap_or(false);
        if ends {
            let (line, col) = (self.line, self.col);
            self.push(TokenKind::Semi, "\n".to_string(), line, col);
        }
    }

    fn scan_line_comment(&mut self) {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch == b'\n' {
                break;
            }
            self.bump();
        }
        let text = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        if self.newlines_since_token >= 2 {
            self.pending_blank = true;
        }
        self.newlines_since_token = 0;
        self.pending_comments.push(text.trim_end().to_string());
    }

    fn scan_block_comment(&mut self, line: u32, col: u32) -> Result<(), ScanError> {
        let start = self.pos;
        loop {
            match self.peek() {
                Some(b'*') if self.peek2() == Some(b'/') => {
                    let text =
                        String::from_utf8_lossy(&self.src[start - 2..self.pos + 2]).into_owned();
                    self.bump();
                    self.bump();
                    if self.newlines_since_token >= 2 {
                        self.pending_blank = true;
                    }
                    self.newlines_since_token = 0;
                    self.pending_comments.push(text);
                    return Ok(());
                }
                Some(_) => {
                    self.bump();
                }
                None => {
                    return Err(ScanError::Unterminated {
                        what: "block comment",
                        line,
                        col,
                    })
                }
            }
        }
    }

    fn scan_string(&mut self, quote: u8, line: u32, col: u32) -> Result<(), ScanError> {
        let start = self.pos - 1;
        loop {
            match self.bump() {
                Some(b'\\') => {
                    self.bump();
                }
                Some(ch) if ch == quote => break,
                Some(b'\n') | None => {
                    return Err(ScanError::Unterminated {
                        what: if quote == b'"' {
                            "string literal"
                        } else {
                            "rune literal"
                        },
                        line,
                        col,
                    })
                }
                Some(_) => {}
            }
        }
        let text = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        let kind = if quote == b'"' {
            TokenKind::Str
        } else {
            TokenKind::Char
        };
        self.push(kind, text, line, col);
        Ok(())
    }

    fn scan_raw_string(&mut self, line: u32, col: u32) -> Result<(), ScanError> {
        let start = self.pos - 1;
        loop {
            match self.bump() {
                Some(b'`') => break,
                None => {
                    return Err(ScanError::Unterminated {
                        what: "raw string literal",
                        line,
                        col,
                    })
                }
                Some(_) => {}
            }
        }
        let text = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        self.push(TokenKind::RawStr, text, line, col);
        Ok(())
    }

    fn scan_number(&mut self, line: u32, col: u32) {
        let start = self.pos;
        let mut is_float = false;
        if self.peek() == Some(b'0') && matches!(self.peek2(), Some(b'x') | Some(b'X')) {
            self.bump();
            self.bump();
            while self
                .peek()
                .is_some_and(|c| c.is_ascii_hexdigit() || c == b'_')
            {
                self.bump();
            }
        } else {
            while self.peek().is_some_and(|c| c.is_ascii_digit() || c == b'_') {
                self.bump();
            }
            if self.peek() == Some(b'.') && self.peek2().is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                self.bump();
                while self.peek().is_some_and(|c| c.is_ascii_digit() || c == b'_') {
                    self.bump();
                }
            }
            if matches!(self.peek(), Some(b'e') | Some(b'E')) {
                is_float = true;
                self.bump();
                if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                    self.bump();
                }
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
            }
        }
        let text = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        let kind = if is_float {
            TokenKind::Float
        } else {
            TokenKind::Int
        };
        self.push(kind, text, line, col);
    }

    fn scan_ident(&mut self, line: u32, col: u32) {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == b'_' {
                self.bump();
            } else {
                break;
            }
        }
        let text = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        match keyword_kind(&text) {
            Some(kind) => self.push(kind, text, line, col),
            None => self.push(TokenKind::Ident, text, line, col),
        }
    }

    fn scan_operator(&mut self, ch: u8, line: u32, col: u32) -> Result<(), ScanError> {
        use TokenKind::*;
        // Longest-match operator table; `ch` is already consumed.
        let next = self.peek();
        let next2 = self.peek2();
        let (kind, len) = match (ch, next, next2) {
            (b'<', Some(b'<'), Some(b'=')) => (ShlEq, 2),
            (b'>', Some(b'>'), Some(b'=')) => (ShrEq, 2),
            (b'&', Some(b'^'), Some(b'=')) => (AndNotEq, 2),
            (b'.', Some(b'.'), Some(b'.')) => (Ellipsis, 2),
            (b':', Some(b'='), _) => (Define, 1),
            (b'=', Some(b'='), _) => (Eq, 1),
            (b'!', Some(b'='), _) => (Ne, 1),
            (b'<', Some(b'='), _) => (Le, 1),
            (b'>', Some(b'='), _) => (Ge, 1),
            (b'<', Some(b'-'), _) => (Arrow, 1),
            (b'<', Some(b'<'), _) => (Shl, 1),
            (b'>', Some(b'>'), _) => (Shr, 1),
            (b'&', Some(b'&'), _) => (LAnd, 1),
            (b'|', Some(b'|'), _) => (LOr, 1),
            (b'&', Some(b'^'), _) => (AndNot, 1),
            (b'+', Some(b'+'), _) => (Inc, 1),
            (b'-', Some(b'-'), _) => (Dec, 1),
            (b'+', Some(b'='), _) => (PlusEq, 1),
            (b'-', Some(b'='), _) => (MinusEq, 1),
            (b'*', Some(b'='), _) => (StarEq, 1),
            (b'/', Some(b'='), _) => (SlashEq, 1),
            (b'%', Some(b'='), _) => (PercentEq, 1),
            (b'&', Some(b'='), _) => (AmpEq, 1),
            (b'|', Some(b'='), _) => (PipeEq, 1),
            (b'^', Some(b'='), _) => (CaretEq, 1),
            (b'(', _, _) => (LParen, 0),
            (b')', _, _) => (RParen, 0),
            (b'[', _, _) => (LBracket, 0),
            (b']', _, _) => (RBracket, 0),
            (b'{', _, _) => (LBrace, 0),
            (b'}', _, _) => (RBrace, 0),
            (b',', _, _) => (Comma, 0),
            (b';', _, _) => (Semi, 0),
            (b':', _, _) => (Colon, 0),
            (b'.', _, _) => (Dot, 0),
            (b'=', _, _) => (Assign, 0),
            (b'<', _, _) => (Lt, 0),
            (b'>', _, _) => (Gt, 0),
            (b'+', _, _) => (Plus, 0),
            (b'-', _, _) => (Minus, 0),
            (b'*', _, _) => (Star, 0),
            (b'/', _, _) => (Slash, 0),
            (b'%', _, _) => (Percent, 0),
            (b'&', _, _) => (Amp, 0),
            (b'|', _, _) => (Pipe, 0),
            (b'^', _, _) => (Caret, 0),
            (b'!', _, _) => (Not, 0),
            _ => {
                return Err(ScanError::UnexpectedChar {
                    ch: ch as char,
                    line,
                    col,
                })
            }
        };
        let mut text = String::new();
        text.push(ch as char);
        for _ in 0..len {
            if let Some(c) = self.bump() {
                text.push(c as char);
            }
        }
        self.push(kind, text, line, col);
        Ok(())
    }

    fn run(mut self) -> Result<Vec<Token>, ScanError> {
        while let Some(ch) = self.peek() {
            let (line, col) = (self.line, self.col);
            match ch {
                b' ' | b'\t' | b'\r' => {
                    self.bump();
                }
                b'\n' => {
                    self.maybe_insert_semi();
                    self.newlines_since_token += 1;
                    self.bump();
                }
                b'/' if self.peek2() == Some(b'/') => {
                    self.scan_line_comment();
                }
                b'/' if self.peek2() == Some(b'*') => {
                    self.bump();
                    self.bump();
                    self.scan_block_comment(line, col)?;
                }
                b'"' => {
                    self.bump();
                    self.scan_string(b'"', line, col)?;
                }
                b'\'' => {
                    self.bump();
                    self.scan_string(b'\'', line, col)?;
                }
                b'`' => {
                    self.bump();
                    self.scan_raw_string(line, col)?;
                }
                b'0'..=b'9' => self.scan_number(line, col),
                b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_ident(line, col),
                _ => {
                    self.bump();
                    self.scan_operator(ch, line, col)?;
                }
            }
        }
        self.maybe_insert_semi();
        let (line, col) = (self.line, self.col);
        self.push(TokenKind::Eof, String::new(), line, col);
        Ok(self.tokens)
    }
}

/// Tokenize a source file.
pub fn tokenize(src: &str) -> Result<Vec<Token>, ScanError> {
    Scanner::new(src).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn keywords_and_idents() {
        assert_eq!(
            kinds("package main"),
            vec![
                TokenKind::Package,
                TokenKind::Ident,
                TokenKind::Semi,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn semicolon_inserted_after_ident_and_rbrace() {
        let toks = kinds("x\n{}\n");
        assert_eq!(
            toks,
            vec![
                TokenKind::Ident,
                TokenKind::Semi,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Semi,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn no_semicolon_after_operators() {
        let toks = kinds("x +\ny");
        assert_eq!(
            toks,
            vec![
                TokenKind::Ident,
                TokenKind::Plus,
                TokenKind::Ident,
                TokenKind::Semi,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn comments_attach_to_next_token() {
        let toks = tokenize("// leading\nvar x int").unwrap();
        assert_eq!(toks[0].kind, TokenKind::Var);
        assert_eq!(toks[0].comments, vec!["// leading".to_string()]);
    }

    #[test]
    fn blank_line_detected() {
        let toks = tokenize("x\n\n\ny").unwrap();
        let y = toks.iter().find(|t| t.text == "y").unwrap();
        assert!(y.blank_before);
    }

    #[test]
    fn define_and_compound_ops() {
        assert_eq!(
            kinds("a := b\na += 1\n"),
            vec![
                TokenKind::Ident,
                TokenKind::Define,
                TokenKind::Ident,
                TokenKind::Semi,
                TokenKind::Ident,
                TokenKind::PlusEq,
                TokenKind::Int,
                TokenKind::Semi,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn string_literals_keep_raw_text() {
        let toks = tokenize(r#""a\"b""#).unwrap();
        assert_eq!(toks[0].kind, TokenKind::Str);
        assert_eq!(toks[0].text, r#""a\"b""#);
    }

    #[test]
    fn raw_string_spans_lines_without_semi() {
        let toks = tokenize("`a\nb`").unwrap();
        assert_eq!(toks[0].kind, TokenKind::RawStr);
        assert_eq!(toks[0].text, "`a\nb`");
    }

    #[test]
    fn arrow_and_ellipsis() {
        assert_eq!(
            kinds("<-ch"),
            vec![TokenKind::Arrow, TokenKind::Ident, TokenKind::Semi, TokenKind::Eof]
        );
        assert_eq!(
            kinds("f(xs...)"),
            vec![
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::Ident,
                TokenKind::Ellipsis,
                TokenKind::RParen,
                TokenKind::Semi,
                TokenKind::Eof
            ]
        );
    }
}
