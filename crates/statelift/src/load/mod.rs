//! Bundled loader: package discovery, parsing, binding, and checking.
//!
//! Given the entry path, the loader resolves package directories under the
//! configured root (vendored locations included), parses every `.go` file,
//! and returns the packages in topological order: imports before importers,
//! duplicates unified by effective path.
//!
//! Test handling: internal test files (`package x` in `x_test.go`) join the
//! package's primary file set; external test files (`package x_test`)
//! become the package's test-only set. Test-binary pseudopackages never
//! exist in this pipeline. Imports that appear only in test files are
//! resolved in the same walk when tests are enabled.

mod bind;
mod check;

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use statelift_core::config::Config;
use statelift_core::error::{LiftError, LiftResult};
use statelift_core::loader::Loader;
use statelift_core::path::strip_vendor;
use statelift_core::program::{ImportRef, Package, Program};
use statelift_syntax::ast::File;
use statelift_syntax::parser::{parse_file, ParseError};

/// Loader failure causes. All of them surface as load errors upstream.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("parsing {file}: {source}")]
    Parse { file: String, source: ParseError },

    #[error("cannot resolve import \"{path}\" (imported by {importer})")]
    UnknownImport { path: String, importer: String },

    #[error("import cycle through {path}")]
    ImportCycle { path: String },

    #[error("no Go files in {dir}")]
    NoGoFiles { dir: String },

    #[error("package clause mismatch in {dir}: {a} vs {b}")]
    PackageClash { dir: String, a: String, b: String },

    #[error("type error: {message}")]
    Type { message: String },
}

impl From<LoadError> for LiftError {
    fn from(err: LoadError) -> Self {
        LiftError::load(err)
    }
}

/// The loader over the bundled Go-subset frontend.
#[derive(Debug, Default)]
pub struct GoLoader;

impl GoLoader {
    pub fn new() -> Self {
        GoLoader
    }
}

impl Loader for GoLoader {
    fn load(
        &self,
        config: &Config,
        cancel: &CancellationToken,
        sink: &mut dyn Write,
    ) -> LiftResult<Program> {
        let _ = writeln!(sink, "load");

        let start = Instant::now();
        let mut program = Program::new(&config.entry_path);
        let order = discover(config, cancel, &mut program)?;
        let _ = writeln!(
            sink,
            "Loaded {} paths in {} seconds",
            order.len(),
            start.elapsed().as_secs_f64()
        );

        let start = Instant::now();
        bind::bind_program(&mut program, cancel)?;
        check::check_program(&mut program, &order, cancel)?;
        let _ = writeln!(
            sink,
            "Loaded {} packages in {} seconds",
            order.len(),
            start.elapsed().as_secs_f64()
        );

        let _ = writeln!(sink, "load done");
        Ok(program)
    }
}

/// Discover, parse, and assemble all in-scope packages. Returns effective
/// paths in topological order (imports before importers).
fn discover(
    config: &Config,
    cancel: &CancellationToken,
    program: &mut Program,
) -> LiftResult<Vec<String>> {
    let mut walk = Walk {
        config,
        cancel,
        program,
        done: HashSet::new(),
        visiting: HashSet::new(),
        order: Vec::new(),
    };
    walk.process(&config.entry_path, None, None)?;
    info!(packages = walk.order.len(), "discovery complete");
    Ok(walk.order)
}

struct Walk<'a> {
    config: &'a Config,
    cancel: &'a CancellationToken,
    program: &'a mut Program,
    done: HashSet<String>,
    visiting: HashSet<String>,
    order: Vec<String>,
}

impl<'a> Walk<'a> {
    /// Process one import path. `importer` carries the importing package's
    /// directory and canonical path for vendor resolution.
    fn process(
        &mut self,
        path: &str,
        importer: Option<(&Path, &str)>,
        importer_path: Option<&str>,
    ) -> LiftResult<()> {
        if self.cancel.is_cancelled() {
            return Err(LiftError::Canceled);
        }
        if !self.config.in_scope(path) {
            return Ok(());
        }

        let (canonical, dir) = self.resolve(path, importer, importer_path)?;
        let effective = strip_vendor(&canonical).to_string();

        if self.done.contains(&effective) {
            return Ok(());
        }
        if !self.visiting.insert(effective.clone()) {
            return Err(LoadError::ImportCycle { path: effective }.into());
        }

        debug!(path = %effective, dir = %dir.display(), "loading package");
        let parsed = self.parse_dir(&canonical, &effective, &dir)?;

        // Imports before importer: recurse first, then emit.
        let mut import_paths: Vec<String> = Vec::new();
        for file in parsed.files.iter().chain(parsed.test_files.iter()) {
            for spec in &file.imports {
                if !import_paths.contains(&spec.path) {
                    import_paths.push(spec.path.clone());
                }
            }
        }
        for import in &import_paths {
            self.process(import, Some((&dir, &canonical)), Some(&effective))?;
        }

        let mut package = Package::new(&canonical, &effective);
        package.name = parsed.name;
        package.dir = dir;
        package.files = parsed.files;
        package.test_files = parsed.test_files;
        for import in &import_paths {
            let import_effective = strip_vendor(import).to_string();
            let name = self
                .program
                .packages
                .get(&import_effective)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| last_segment(import).to_string());
            package.imports.insert(
                import_effective,
                ImportRef {
                    path: import.clone(),
                    name,
                },
            );
        }
        self.program.packages.insert(effective.clone(), package);

        self.visiting.remove(&effective);
        self.done.insert(effective.clone());
        self.order.push(effective);
        Ok(())
    }

    /// Resolve an import path to a canonical path and directory. Vendored
    /// locations shadow the direct one: the importer's own `vendor`
    /// directory first, then the root's, then the plain location under the
    /// root directory.
    fn resolve(
        &self,
        path: &str,
        importer: Option<(&Path, &str)>,
        importer_path: Option<&str>,
    ) -> Result<(String, PathBuf), LoadError> {
        if let Some((importer_dir, importer_canonical)) = importer {
            let vendored = importer_dir.join("vendor").join(path);
            if vendored.is_dir() {
                return Ok((format!("{}/vendor/{}", importer_canonical, path), vendored));
            }
        }
        let root_vendored = self.config.root_dir.join("vendor").join(path);
        if root_vendored.is_dir() {
            return Ok((
                format!("{}/vendor/{}", self.config.root_path, path),
                root_vendored,
            ));
        }
        if let Some(rel) = relative_to_root(path, &self.config.root_path) {
            let dir = if rel.is_empty() {
                self.config.root_dir.clone()
            } else {
                self.config.root_dir.join(rel)
            };
            if dir.is_dir() {
                return Ok((path.to_string(), dir));
            }
        }
        Err(LoadError::UnknownImport {
            path: path.to_string(),
            importer: importer_path.unwrap_or("<entry>").to_string(),
        })
    }

    fn parse_dir(
        &mut self,
        canonical: &str,
        effective: &str,
        dir: &Path,
    ) -> Result<ParsedDir, LoadError> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .map_err(|source| LoadError::Io {
                path: dir.display().to_string(),
                source,
            })?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".go"))
            .collect();
        names.sort();

        let mut parsed = ParsedDir::default();
        for name in names {
            let is_test = name.ends_with("_test.go");
            if is_test && !self.config.include_tests {
                continue;
            }
            let full = dir.join(&name);
            let src = fs::read_to_string(&full).map_err(|source| LoadError::Io {
                path: full.display().to_string(),
                source,
            })?;
            let file =
                parse_file(&name, &src, &mut self.program.ids).map_err(|source| {
                    LoadError::Parse {
                        file: full.display().to_string(),
                        source,
                    }
                })?;

            if file.package.ends_with("_test") {
                parsed.test_files.push(file);
                continue;
            }
            if parsed.name.is_empty() {
                parsed.name = file.package.clone();
            } else if parsed.name != file.package {
                return Err(LoadError::PackageClash {
                    dir: dir.display().to_string(),
                    a: parsed.name,
                    b: file.package,
                });
            }
            parsed.files.push(file);
        }

        if parsed.files.is_empty() {
            return Err(LoadError::NoGoFiles {
                dir: dir.display().to_string(),
            });
        }
        debug!(
            path = %effective,
            canonical,
            files = parsed.files.len(),
            test_files = parsed.test_files.len(),
            "parsed package"
        );
        Ok(parsed)
    }
}

#[derive(Debug, Default)]
struct ParsedDir {
    name: String,
    files: Vec<File>,
    test_files: Vec<File>,
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Directory of `path` relative to the configured root path, when `path`
/// lives underneath it.
fn relative_to_root<'p>(path: &'p str, root: &str) -> Option<&'p str> {
    if path == root {
        return Some("");
    }
    path.strip_prefix(root)
        .and_then(|rest| rest.strip_prefix('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn write_tree(dir: &Path, files: &[(&str, &str)]) {
        for (path, contents) in files {
            let full = dir.join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, contents).unwrap();
        }
    }

    fn load(files: &[(&str, &str)], entry: &str) -> LiftResult<Program> {
        let tmp = tempfile::tempdir().unwrap();
        write_tree(tmp.path(), files);
        let config = Config {
            entry_path: entry.to_string(),
            root_path: "root".to_string(),
            root_dir: tmp.path().to_path_buf(),
            include_tests: false,
        };
        GoLoader::new().load(&config, &CancellationToken::new(), &mut io::sink())
    }

    #[test]
    fn paths_come_out_in_topological_order() {
        let program = load(
            &[
                (
                    "main/main.go",
                    "package main\n\nimport \"root/a\"\n\nfunc main() { a.A() }\n",
                ),
                ("a/a.go", "package a\n\nfunc A() {}\n"),
            ],
            "root/main",
        )
        .unwrap();
        let order: Vec<&str> = program.packages.keys().map(String::as_str).collect();
        assert_eq!(order, vec!["root/a", "root/main"]);
    }

    #[test]
    fn out_of_scope_imports_are_skipped() {
        let program = load(
            &[(
                "main/main.go",
                "package main\n\nimport \"fmt\"\n\nfunc main() { fmt.Println() }\n",
            )],
            "root/main",
        )
        .unwrap();
        assert_eq!(program.packages.len(), 1);
    }

    #[test]
    fn vendored_packages_unify_by_effective_path() {
        let program = load(
            &[
                (
                    "main/main.go",
                    "package main\n\nimport \"root/x\"\n\nfunc main() { x.X() }\n",
                ),
                ("vendor/root/x/x.go", "package x\n\nfunc X() {}\n"),
            ],
            "root/main",
        )
        .unwrap();
        let pkg = program.package("root/x").unwrap();
        assert_eq!(pkg.path, "root/vendor/root/x");
        assert_eq!(pkg.effective_path, "root/x");
    }

    #[test]
    fn missing_import_is_a_load_error() {
        let err = load(
            &[(
                "main/main.go",
                "package main\n\nimport \"root/missing\"\n\nfunc main() {}\n",
            )],
            "root/main",
        )
        .unwrap_err();
        assert!(matches!(err, LiftError::Load { .. }));
    }

    #[test]
    fn import_cycle_is_a_load_error() {
        let err = load(
            &[
                (
                    "a/a.go",
                    "package a\n\nimport \"root/b\"\n\nfunc A() { b.B() }\n",
                ),
                (
                    "b/b.go",
                    "package b\n\nimport \"root/a\"\n\nfunc B() { a.A() }\n",
                ),
            ],
            "root/a",
        )
        .unwrap_err();
        assert!(matches!(err, LiftError::Load { .. }));
    }

    #[test]
    fn internal_test_files_join_primary_set_when_enabled() {
        let tmp = tempfile::tempdir().unwrap();
        write_tree(
            tmp.path(),
            &[
                ("a/a.go", "package a\n\nfunc A() {}\n"),
                ("a/a_test.go", "package a\n\nfunc helper() {}\n"),
                ("a/ext_test.go", "package a_test\n\nfunc extHelper() {}\n"),
            ],
        );
        let config = Config {
            entry_path: "root/a".to_string(),
            root_path: "root".to_string(),
            root_dir: tmp.path().to_path_buf(),
            include_tests: true,
        };
        let program = GoLoader::new()
            .load(&config, &CancellationToken::new(), &mut io::sink())
            .unwrap();
        let pkg = program.package("root/a").unwrap();
        assert_eq!(pkg.files.len(), 2);
        assert_eq!(pkg.test_files.len(), 1);
    }

    #[test]
    fn test_files_are_ignored_by_default() {
        let program = load(
            &[
                ("a/a.go", "package a\n\nfunc A() {}\n"),
                ("a/a_test.go", "package a\n\nfunc helper() {}\n"),
            ],
            "root/a",
        )
        .unwrap();
        let pkg = program.package("root/a").unwrap();
        assert_eq!(pkg.files.len(), 1);
    }
}
