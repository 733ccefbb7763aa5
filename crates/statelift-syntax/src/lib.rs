//! Concrete syntax for the Go subset the state-lifting transformer
//! operates on.
//!
//! This crate provides:
//! - A tokenizer with Go's automatic semicolon insertion and comment capture
//! - A decorated AST whose nodes carry stable integer identities
//! - A recursive-descent parser
//! - A canonical printer that recomputes import declarations from the
//!   qualifier paths referenced in the tree
//! - Read-only and mutating traversal utilities
//!
//! The crate is purely syntactic. Name resolution and type information live
//! above it; the only semantic trace in the AST is the qualifier path a
//! binder writes into identifiers that reference other packages.

pub mod ast;
pub mod parser;
pub mod printer;
pub mod token;
pub mod walk;

pub use ast::{File, Ident, NodeId, NodeIdGen};
pub use parser::{parse_file, ParseError, ParseResult};
pub use printer::print_file;
