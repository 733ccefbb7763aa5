//! Core infrastructure for the state-lifting transformer.
//!
//! This crate provides the language-frontend-independent pieces:
//! - Effective-path handling (vendor stripping, root scoping)
//! - Interned symbols usable as map keys across files and packages
//! - Semantic types as the checker reports them
//! - The program/package model with per-package classification sets
//! - The unique-name picker for generated import fields
//! - The run configuration record and unified error type
//! - The loader and emitter interfaces the transformer consumes

pub mod config;
pub mod emit;
pub mod error;
pub mod loader;
pub mod names;
pub mod path;
pub mod program;
pub mod symbol;
pub mod types;

pub use config::Config;
pub use emit::{Emitter, FsEmitter, MemoryEmitter};
pub use error::{LiftError, LiftResult};
pub use loader::Loader;
pub use names::UniqueNamePicker;
pub use path::strip_vendor;
pub use program::{ImportRef, InitEntry, Package, Program};
pub use symbol::{SymbolId, SymbolKind, SymbolTable};
pub use types::{BasicKind, ChanDir, SemField, SemParam, SemType};
