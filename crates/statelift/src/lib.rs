//! statelift converts a Go command-line program into a reusable library by
//! eliminating package-level mutable state.
//!
//! Every transformed package gains a `PackageState` struct holding its
//! former package-level variables plus pointers to the state of its
//! imported packages, and a `NewPackageState` constructor that replays the
//! package's initialization order. Functions take the state as a leading
//! parameter, methods reach it through a field injected into their
//! receiver's type, and every use site is rewritten to match. The entry
//! package's `main` becomes a callable `Main`.
//!
//! The pipeline is strictly phased: a read-only analysis half classifies
//! declarations and references across the whole typed program, then a
//! mutation half applies the edits and serializes the result. See
//! [`run`] for the entry point and the `load` module for the bundled
//! Go-subset frontend.

pub mod lift;
pub mod load;
pub mod typeconv;

mod discover;
mod rewrite;
mod statefile;

#[cfg(test)]
mod test_helpers;

pub use lift::run;
pub use load::{GoLoader, LoadError};
pub use typeconv::{type_to_syntax, TypeConvError};

pub use statelift_core::config::Config;
pub use statelift_core::emit::{Emitter, FsEmitter, MemoryEmitter};
pub use statelift_core::error::{LiftError, LiftResult};
pub use statelift_core::loader::Loader;
