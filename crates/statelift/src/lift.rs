//! Pipeline orchestration.
//!
//! One run is a fixed sequence: load, the read-only discovery passes, then
//! the mutation passes, then serialization. Nothing reads the original
//! syntax after mutation starts, and nothing mutates before discovery
//! finishes; the classification sets populated on one side of that line
//! are consumed on the other.
//!
//! Discovery observes the cancellation token between packages. The
//! mutation passes do not: once they start, the run must complete or the
//! output tree would be half-written.

use std::io::Write;

use tokio_util::sync::CancellationToken;
use tracing::info;

use statelift_core::config::Config;
use statelift_core::emit::Emitter;
use statelift_core::error::{LiftError, LiftResult};
use statelift_core::loader::Loader;
use statelift_core::program::Program;
use statelift_syntax::print_file;

use crate::{discover, rewrite, statefile};

/// Name of the generated per-package state file.
pub const STATE_FILE: &str = "package-state.go";

/// Run one transformation.
pub fn run(
    config: &Config,
    loader: &dyn Loader,
    emitter: &mut dyn Emitter,
    cancel: &CancellationToken,
    sink: &mut dyn Write,
) -> LiftResult<()> {
    let mut program = loader.load(config, cancel, sink)?;
    ensure_untransformed(&program)?;

    pass(sink, "discover vars", || {
        discover::vars(&mut program, cancel)
    })?;
    pass(sink, "discover var uses", || {
        discover::var_uses(&mut program, cancel)
    })?;
    pass(sink, "discover funcs and methods", || {
        discover::funcs_and_methods(&mut program, cancel)
    })?;
    pass(sink, "discover func uses", || {
        discover::func_uses(&mut program, cancel)
    })?;
    pass(sink, "discover types", || {
        discover::types(&mut program, cancel)
    })?;

    // ===== no reading after here ======
    // ===== no writing before here =====

    pass(sink, "add state files", || statefile::synthesize(&mut program))?;
    pass(sink, "add struct fields", || {
        rewrite::add_struct_fields(&mut program);
        Ok(())
    })?;
    pass(sink, "wrap aliases", || {
        rewrite::wrap_aliases(&mut program);
        Ok(())
    })?;
    pass(sink, "update func signatures", || {
        rewrite::update_func_signatures(&mut program);
        Ok(())
    })?;
    pass(sink, "update method bodies", || {
        rewrite::update_method_bodies(&mut program);
        Ok(())
    })?;
    pass(sink, "update call sites", || {
        rewrite::update_call_sites(&mut program);
        Ok(())
    })?;
    pass(sink, "delete vars", || {
        rewrite::delete_var_decls(&mut program);
        Ok(())
    })?;
    pass(sink, "rewrite var uses", || {
        rewrite::rewrite_var_uses(&mut program);
        Ok(())
    })?;
    pass(sink, "rename main", || {
        rewrite::rename_entry_point(&mut program);
        Ok(())
    })?;

    pass(sink, "save", || save(&program, emitter))?;
    Ok(())
}

/// Refuse to run over a tree that already carries generated state files;
/// transforming twice would wrap the state types themselves.
fn ensure_untransformed(program: &Program) -> LiftResult<()> {
    for pkg in program.packages.values() {
        if pkg.all_files().any(|file| file.name == STATE_FILE) {
            return Err(LiftError::load(format!(
                "{}: {} already present; the tree appears to be transformed",
                pkg.effective_path, STATE_FILE
            )));
        }
    }
    Ok(())
}

fn pass<F>(sink: &mut dyn Write, name: &str, f: F) -> LiftResult<()>
where
    F: FnOnce() -> LiftResult<()>,
{
    let _ = writeln!(sink, "{}", name);
    info!(pass = name, "running");
    f()?;
    let _ = writeln!(sink, "{} done", name);
    Ok(())
}

/// Serialize every package: files by package in effective-path order, each
/// printed canonically and handed to the emitter.
fn save(program: &Program, emitter: &mut dyn Emitter) -> LiftResult<()> {
    for pkg in program.packages.values() {
        for file in pkg.all_files() {
            let contents = print_file(file);
            emitter.emit_file(&pkg.dir, &file.name, &contents)?;
        }
    }
    Ok(())
}
