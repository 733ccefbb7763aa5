//! Loader interface.
//!
//! Loading is an upstream concern: something must discover the packages
//! transitively imported by the entry, parse them, resolve names, and type
//! the package-level declarations. The transformer consumes the result
//! through this trait and never touches the disk itself during analysis.

use std::io::Write;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::LiftResult;
use crate::program::Program;

/// Produces a fully loaded, bound, and typed program.
///
/// The returned program must contain one package per in-scope effective
/// path, closed under in-scope imports, with symbol tables and expression
/// types populated. Failure conditions (I/O, parse, type errors) surface
/// unrecovered as [`crate::error::LiftError::Load`].
pub trait Loader {
    fn load(
        &self,
        config: &Config,
        cancel: &CancellationToken,
        sink: &mut dyn Write,
    ) -> LiftResult<Program>;
}
