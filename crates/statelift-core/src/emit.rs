//! Emission interfaces and implementations.
//!
//! The rewriter hands every serialized file to an [`Emitter`]; the
//! filesystem implementation writes in place or, with a root remap, into a
//! parallel output tree, mirroring `testdata` directories it finds next to
//! the sources.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Destination for generated source files.
pub trait Emitter {
    /// Write one file. `dir` is the package's source directory; the
    /// implementation decides the actual destination.
    fn emit_file(&mut self, dir: &Path, name: &str, contents: &str) -> io::Result<()>;
}

/// Emitter that writes to the filesystem.
///
/// Without a remap, files are written into their package directory. With
/// one, each package directory under the source root is mapped into the
/// output root, and a `testdata` directory sitting in the package directory
/// is copied over the first time the package is touched.
#[derive(Debug, Default)]
pub struct FsEmitter {
    remap: Option<(PathBuf, PathBuf)>,
    mirrored: BTreeMap<PathBuf, ()>,
}

impl FsEmitter {
    pub fn new() -> Self {
        FsEmitter::default()
    }

    /// Redirect output from `src_root` to `dst_root`.
    pub fn with_remap(src_root: impl Into<PathBuf>, dst_root: impl Into<PathBuf>) -> Self {
        FsEmitter {
            remap: Some((src_root.into(), dst_root.into())),
            mirrored: BTreeMap::new(),
        }
    }

    fn dest_dir(&self, dir: &Path) -> PathBuf {
        match &self.remap {
            Some((src, dst)) => match dir.strip_prefix(src) {
                Ok(rel) => dst.join(rel),
                Err(_) => dir.to_path_buf(),
            },
            None => dir.to_path_buf(),
        }
    }

    fn mirror_testdata(&mut self, dir: &Path, dest: &Path) -> io::Result<()> {
        if dest == dir {
            return Ok(());
        }
        if let Entry::Vacant(entry) = self.mirrored.entry(dir.to_path_buf()) {
            entry.insert(());
            let testdata = dir.join("testdata");
            if testdata.is_dir() {
                copy_tree(&testdata, &dest.join("testdata"))?;
            }
        }
        Ok(())
    }
}

fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

impl Emitter for FsEmitter {
    fn emit_file(&mut self, dir: &Path, name: &str, contents: &str) -> io::Result<()> {
        let dest = self.dest_dir(dir);
        fs::create_dir_all(&dest)?;
        self.mirror_testdata(dir, &dest)?;
        fs::write(dest.join(name), contents)
    }
}

/// Emitter that captures files in memory, for tests.
#[derive(Debug, Default)]
pub struct MemoryEmitter {
    /// Full destination path → contents, in sorted order.
    pub files: BTreeMap<PathBuf, String>,
}

impl MemoryEmitter {
    pub fn new() -> Self {
        MemoryEmitter::default()
    }
}

impl Emitter for MemoryEmitter {
    fn emit_file(&mut self, dir: &Path, name: &str, contents: &str) -> io::Result<()> {
        self.files.insert(dir.join(name), contents.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_emitter_writes_in_place() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a");
        let mut emitter = FsEmitter::new();
        emitter.emit_file(&dir, "a.go", "package a\n").unwrap();
        assert_eq!(fs::read_to_string(dir.join("a.go")).unwrap(), "package a\n");
    }

    #[test]
    fn remapped_emitter_mirrors_testdata() {
        let tmp = tempfile::tempdir().unwrap();
        let src_root = tmp.path().join("src");
        let dst_root = tmp.path().join("out");
        let pkg = src_root.join("a");
        fs::create_dir_all(pkg.join("testdata")).unwrap();
        fs::write(pkg.join("testdata/golden.txt"), "golden").unwrap();

        let mut emitter = FsEmitter::with_remap(&src_root, &dst_root);
        emitter.emit_file(&pkg, "a.go", "package a\n").unwrap();

        assert_eq!(
            fs::read_to_string(dst_root.join("a/a.go")).unwrap(),
            "package a\n"
        );
        assert_eq!(
            fs::read_to_string(dst_root.join("a/testdata/golden.txt")).unwrap(),
            "golden"
        );
    }

    #[test]
    fn memory_emitter_collects_files() {
        let mut emitter = MemoryEmitter::new();
        emitter
            .emit_file(Path::new("/x/a"), "a.go", "package a\n")
            .unwrap();
        assert_eq!(
            emitter.files.get(Path::new("/x/a/a.go")).map(String::as_str),
            Some("package a\n")
        );
    }
}
